//! Non-socket network tables: `/proc/net/dev`, `/proc/net/route` and
//! `/proc/net/arp`.

use super::socket::IpAddress;
use super::{decimal, hex, token_count_error};
use crate::error::ParseError;
use crate::tokenizer::{rtrim, split, split_spaces};
use serde::Serialize;

/// Interface counters from `/proc/net/dev`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetDevice {
    pub interface: String,

    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub rx_errs: u64,
    pub rx_drop: u64,
    pub rx_fifo: u64,
    pub rx_frame: u64,
    pub rx_compressed: u64,
    pub rx_multicast: u64,

    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errs: u64,
    pub tx_drop: u64,
    pub tx_fifo: u64,
    pub tx_colls: u64,
    pub tx_carrier: u64,
    pub tx_compressed: u64,
}

/// An IPv4 routing table entry from `/proc/net/route`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetRoute {
    pub iface: String,
    pub destination: IpAddress,
    pub gateway: IpAddress,
    /// `RTF_*` flags.
    pub flags: u32,
    pub refcnt: u32,
    pub use_count: u32,
    pub metric: u32,
    pub mask: IpAddress,
    pub mtu: u32,
    pub window: u32,
    pub irtt: u32,
}

/// An entry of the ARP cache (`/proc/net/arp`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetArp {
    pub ip_address: String,
    pub hw_type: u32,
    pub flags: u32,
    pub hw_address: String,
    pub mask: String,
    pub device: String,
}

// ============ Net Device Parser ============

/// Parses an interface line of `/proc/net/dev`:
///
/// `eth0: 2893258    9219    0    0    0     0          0       556  1029533    7276    0    0    0     0       0          0`
pub fn parse_net_device_line(line: &str) -> Result<NetDevice, ParseError> {
    const WHAT: &str = "net device";
    const COUNT: usize = 17;

    let tokens = split_spaces(line);
    if tokens.len() != COUNT {
        return Err(token_count_error("net device line", line));
    }

    let counter = |index: usize| -> Result<u64, ParseError> { decimal(tokens[index], WHAT, line) };

    Ok(NetDevice {
        interface: tokens[0].strip_suffix(':').unwrap_or(tokens[0]).to_string(),
        rx_bytes: counter(1)?,
        rx_packets: counter(2)?,
        rx_errs: counter(3)?,
        rx_drop: counter(4)?,
        rx_fifo: counter(5)?,
        rx_frame: counter(6)?,
        rx_compressed: counter(7)?,
        rx_multicast: counter(8)?,
        tx_bytes: counter(9)?,
        tx_packets: counter(10)?,
        tx_errs: counter(11)?,
        tx_drop: counter(12)?,
        tx_fifo: counter(13)?,
        tx_colls: counter(14)?,
        tx_carrier: counter(15)?,
        tx_compressed: counter(16)?,
    })
}

// ============ Net Route Parser ============

/// Parses a tab separated line of `/proc/net/route`.
pub fn parse_net_route_line(line: &str) -> Result<NetRoute, ParseError> {
    const WHAT: &str = "net route";
    const COUNT: usize = 11;

    // The kernel pads every line with trailing spaces.
    let tokens = split(rtrim(line), '\t', false);
    if tokens.len() != COUNT {
        return Err(token_count_error(WHAT, line));
    }

    let address = |index: usize| -> Result<IpAddress, ParseError> {
        Ok(IpAddress::V4(hex(tokens[index], WHAT, line)?))
    };

    Ok(NetRoute {
        iface: tokens[0].to_string(),
        destination: address(1)?,
        gateway: address(2)?,
        flags: hex(tokens[3], WHAT, line)?,
        refcnt: decimal(tokens[4], WHAT, line)?,
        use_count: decimal(tokens[5], WHAT, line)?,
        metric: decimal(tokens[6], WHAT, line)?,
        mask: address(7)?,
        mtu: decimal(tokens[8], WHAT, line)?,
        window: decimal(tokens[9], WHAT, line)?,
        irtt: decimal(tokens[10], WHAT, line)?,
    })
}

// ============ Net Arp Parser ============

/// Parses a line of `/proc/net/arp`:
///
/// `192.168.10.1     0x1         0x2         10:20:30:40:50:60     *        eth0`
pub fn parse_net_arp_line(line: &str) -> Result<NetArp, ParseError> {
    const WHAT: &str = "net arp";
    const COUNT: usize = 6;

    let tokens = split_spaces(line);
    if tokens.len() != COUNT {
        return Err(token_count_error(WHAT, line));
    }

    Ok(NetArp {
        ip_address: tokens[0].to_string(),
        hw_type: hex(tokens[1], WHAT, line)?,
        flags: hex(tokens[2], WHAT, line)?,
        hw_address: tokens[3].to_string(),
        mask: tokens[4].to_string(),
        device: tokens[5].to_string(),
    })
}
