//! Socket tables: `/proc/net/{tcp,udp,udplite,raw,icmp}[6]`, `/proc/net/netlink`
//! and `/proc/net/unix`.

use super::{decimal, hex, token_count_error};
use crate::error::ParseError;
use crate::tokenizer::{split, split_spaces};
use serde::Serialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Inode reported for sockets whose table predates the inode column.
pub const INVALID_INODE: u64 = 0;

/// A socket address as printed by the kernel: raw 32-bit words in host
/// byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IpAddress {
    V4(u32),
    V6([u32; 4]),
}

impl Default for IpAddress {
    fn default() -> Self {
        IpAddress::V4(0)
    }
}

impl IpAddress {
    pub fn is_v4(&self) -> bool {
        matches!(self, IpAddress::V4(_))
    }

    pub fn to_ip_addr(&self) -> IpAddr {
        match self {
            IpAddress::V4(raw) => IpAddr::V4(Ipv4Addr::from(raw.to_ne_bytes())),
            IpAddress::V6(words) => {
                let mut octets = [0u8; 16];
                for (chunk, word) in octets.chunks_exact_mut(4).zip(words) {
                    chunk.copy_from_slice(&word.to_ne_bytes());
                }
                IpAddr::V6(Ipv6Addr::from(octets))
            }
        }
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ip_addr())
    }
}

/// TCP-style connection state (`include/net/tcp_states.h`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketState {
    #[default]
    Established,
    SynSent,
    SynRecv,
    FinWait1,
    FinWait2,
    TimeWait,
    Close,
    CloseWait,
    LastAck,
    Listen,
    Closing,
}

impl SocketState {
    fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            1 => SocketState::Established,
            2 => SocketState::SynSent,
            3 => SocketState::SynRecv,
            4 => SocketState::FinWait1,
            5 => SocketState::FinWait2,
            6 => SocketState::TimeWait,
            7 => SocketState::Close,
            8 => SocketState::CloseWait,
            9 => SocketState::LastAck,
            10 => SocketState::Listen,
            11 => SocketState::Closing,
            _ => return None,
        })
    }

    /// Name as printed by `netstat`.
    pub fn name(&self) -> &'static str {
        match self {
            SocketState::Established => "ESTABLISHED",
            SocketState::SynSent => "SYN_SENT",
            SocketState::SynRecv => "SYN_RECV",
            SocketState::FinWait1 => "FIN_WAIT1",
            SocketState::FinWait2 => "FIN_WAIT2",
            SocketState::TimeWait => "TIME_WAIT",
            SocketState::Close => "CLOSE",
            SocketState::CloseWait => "CLOSE_WAIT",
            SocketState::LastAck => "LAST_ACK",
            SocketState::Listen => "LISTEN",
            SocketState::Closing => "CLOSING",
        }
    }
}

/// Pending timer of a socket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    #[default]
    None,
    Retransmit,
    /// Keepalive or another timer.
    Another,
    TimeWait,
    ZeroWindow,
}

impl TimerKind {
    fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => TimerKind::None,
            1 => TimerKind::Retransmit,
            2 => TimerKind::Another,
            3 => TimerKind::TimeWait,
            4 => TimerKind::ZeroWindow,
            _ => return None,
        })
    }
}

/// A line of an IP socket table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetSocket {
    pub slot: usize,
    pub local_ip: IpAddress,
    pub local_port: u16,
    pub remote_ip: IpAddress,
    pub remote_port: u16,
    pub state: SocketState,
    pub tx_queue: usize,
    pub rx_queue: usize,
    pub timer_active: TimerKind,
    pub timer_expire_jiffies: usize,
    pub retransmits: usize,
    pub uid: u32,
    pub timeouts: usize,
    pub inode: u64,
    pub ref_count: usize,
    pub skbuff: u64,
}

/// A line of `/proc/net/netlink`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetlinkSocket {
    pub skbuff: u64,
    pub protocol: u32,
    pub port_id: u32,
    pub groups: u32,
    pub rmem: i32,
    pub wmem: i32,
    pub dumping: bool,
    pub ref_count: i32,
    pub drops: u32,
    /// `INVALID_INODE` on kernels without the column.
    pub inode: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnixSocketType {
    #[default]
    Stream,
    Datagram,
    Raw,
    Rdm,
    SeqPacket,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnixSocketState {
    #[default]
    Free,
    Unconnected,
    Connecting,
    Connected,
}

/// A line of `/proc/net/unix`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnixSocket {
    pub skbuff: u64,
    pub ref_count: u32,
    pub protocol: u32,
    pub flags: u32,
    pub socket_type: UnixSocketType,
    pub state: UnixSocketState,
    pub inode: u64,
    /// Bound path; abstract sockets start with `@`.
    pub path: Option<String>,
}

// ============ IP Socket Parser ============

const NET_SOCKET: &str = "net socket";

const IPV4_LEN: usize = 8;
const IPV6_LEN: usize = 4 * IPV4_LEN;

fn parse_address(token: &str, line: &str) -> Result<(IpAddress, u16), ParseError> {
    let parts = split(token, ':', false);
    if parts.len() != 2 {
        return Err(token_count_error("net socket address", line));
    }

    let ip = parts[0];
    let address = match ip.len() {
        IPV4_LEN => IpAddress::V4(hex(ip, NET_SOCKET, line)?),
        IPV6_LEN => {
            let mut words = [0u32; 4];
            for (i, word) in words.iter_mut().enumerate() {
                let chunk = ip
                    .get(i * IPV4_LEN..(i + 1) * IPV4_LEN)
                    .ok_or_else(|| ParseError::new("Corrupted net socket address - Bad length", line))?;
                *word = hex(chunk, NET_SOCKET, line)?;
            }
            IpAddress::V6(words)
        }
        _ => {
            return Err(ParseError::new(
                "Corrupted net socket address - Bad length",
                line,
            ));
        }
    };

    Ok((address, hex(parts[1], NET_SOCKET, line)?))
}

/// Splits a `a:b` pair of hex-or-decimal columns such as the queues.
fn pair<'a>(token: &'a str, what: &str, line: &str) -> Result<(&'a str, &'a str), ParseError> {
    let parts = split(token, ':', false);
    if parts.len() != 2 {
        return Err(token_count_error(what, line));
    }
    Ok((parts[0], parts[1]))
}

/// Parses a line of `/proc/net/{tcp,udp,udplite,raw,icmp}` or their IPv6
/// twins.
///
/// ```text
/// sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
/// 1: 3500007F:0035 00000000:0000 0A 00000000:00000000 00:00000000 00000000   101        0 15979 1 ffff9f55b1420800 100 0 0 10 0
/// ```
///
/// Columns past `skbuff` differ per protocol and are ignored.
pub fn parse_net_socket_line(line: &str) -> Result<NetSocket, ParseError> {
    const MIN_COUNT: usize = 12;

    let tokens = split_spaces(line);
    if tokens.len() < MIN_COUNT {
        return Err(token_count_error("net socket line", line));
    }

    let slot = tokens[0].strip_suffix(':').unwrap_or(tokens[0]);
    let (local_ip, local_port) = parse_address(tokens[1], line)?;
    let (remote_ip, remote_port) = parse_address(tokens[2], line)?;

    let state = SocketState::from_code(hex(tokens[3], NET_SOCKET, line)?)
        .ok_or_else(|| ParseError::new("Corrupted net socket state - Illegal value", line))?;

    let (tx_queue, rx_queue) = pair(tokens[4], "net socket queues", line)?;

    let (timer, expires) = pair(tokens[5], "net socket timer", line)?;
    let timer_active = TimerKind::from_code(decimal(timer, NET_SOCKET, line)?)
        .ok_or_else(|| ParseError::new("Corrupted net socket timer - Illegal value", line))?;

    Ok(NetSocket {
        slot: decimal(slot, NET_SOCKET, line)?,
        local_ip,
        local_port,
        remote_ip,
        remote_port,
        state,
        tx_queue: hex(tx_queue, NET_SOCKET, line)?,
        rx_queue: hex(rx_queue, NET_SOCKET, line)?,
        timer_active,
        timer_expire_jiffies: hex(expires, NET_SOCKET, line)?,
        retransmits: hex(tokens[6], NET_SOCKET, line)?,
        uid: decimal(tokens[7], NET_SOCKET, line)?,
        timeouts: decimal(tokens[8], NET_SOCKET, line)?,
        inode: decimal(tokens[9], NET_SOCKET, line)?,
        ref_count: decimal(tokens[10], NET_SOCKET, line)?,
        skbuff: hex(tokens[11], NET_SOCKET, line)?,
    })
}

// ============ Netlink Socket Parser ============

/// Parses a line of `/proc/net/netlink` (see `netlink_native_seq_show`).
///
/// ```text
/// sk               Eth Pid        Groups   Rmem     Wmem     Dump  Locks    Drops    Inode
/// ffff9f55b3e2e000 9   1          00000001 0        0        0     2        0        13723
/// ```
pub fn parse_netlink_socket_line(line: &str) -> Result<NetlinkSocket, ParseError> {
    const WHAT: &str = "netlink socket";
    const MIN_COUNT: usize = 9;
    const INODE: usize = 9;

    let tokens = split_spaces(line);
    if tokens.len() < MIN_COUNT {
        return Err(token_count_error("netlink socket line", line));
    }

    // Older kernels print the u32 port id with %d.
    let port_id: i64 = decimal(tokens[2], WHAT, line)?;
    if port_id < i64::from(i32::MIN) || port_id > i64::from(u32::MAX) {
        return Err(ParseError::new("Corrupted netlink socket - Out of range", line));
    }

    let inode = match tokens.get(INODE) {
        Some(token) => decimal(token, WHAT, line)?,
        None => INVALID_INODE,
    };

    Ok(NetlinkSocket {
        skbuff: hex(tokens[0], WHAT, line)?,
        protocol: decimal(tokens[1], WHAT, line)?,
        port_id: port_id as u32,
        groups: hex(tokens[3], WHAT, line)?,
        rmem: decimal(tokens[4], WHAT, line)?,
        wmem: decimal(tokens[5], WHAT, line)?,
        // Older kernels print the callback pointer instead of a flag.
        dumping: !matches!(tokens[6], "(null)" | "0"),
        ref_count: decimal(tokens[7], WHAT, line)?,
        drops: decimal(tokens[8], WHAT, line)?,
        inode,
    })
}

// ============ Unix Socket Parser ============

/// Parses a line of `/proc/net/unix`.
///
/// ```text
/// Num       RefCount Protocol Flags    Type St Inode Path
/// ffff8db2fd23a000: 00000003 00000000 00000000 0001 03 17031 /run/systemd/journal/stdout
/// ```
pub fn parse_unix_socket_line(line: &str) -> Result<UnixSocket, ParseError> {
    const WHAT: &str = "unix socket";
    const MIN_COUNT: usize = 7;
    const COUNT: usize = 8;
    const PATH: usize = 7;

    let tokens = split_spaces(line);
    if !(MIN_COUNT..=COUNT).contains(&tokens.len()) {
        return Err(token_count_error("unix socket line", line));
    }

    let skbuff = tokens[0].strip_suffix(':').unwrap_or(tokens[0]);

    let socket_type = match hex::<u32>(tokens[4], WHAT, line)? {
        1 => UnixSocketType::Stream,
        2 => UnixSocketType::Datagram,
        3 => UnixSocketType::Raw,
        4 => UnixSocketType::Rdm,
        5 => UnixSocketType::SeqPacket,
        _ => {
            return Err(ParseError::new(
                "Corrupted unix socket type - Illegal value",
                line,
            ));
        }
    };

    let state = match decimal::<u32>(tokens[5], WHAT, line)? {
        0 => UnixSocketState::Free,
        1 => UnixSocketState::Unconnected,
        2 => UnixSocketState::Connecting,
        3 => UnixSocketState::Connected,
        // SS_DISCONNECTING is never reported for unix sockets.
        _ => return Err(ParseError::new("Corrupted unix socket - Invalid state", line)),
    };

    Ok(UnixSocket {
        skbuff: hex(skbuff, WHAT, line)?,
        ref_count: hex(tokens[1], WHAT, line)?,
        protocol: hex(tokens[2], WHAT, line)?,
        flags: hex(tokens[3], WHAT, line)?,
        socket_type,
        state,
        inode: decimal(tokens[6], WHAT, line)?,
        path: tokens.get(PATH).map(|path| path.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lines::parse_lines;

    const TCP_LISTEN: &str = "1: 3500007F:0035 00000000:0000 0A 00000000:00000000 00:00000000 00000000   101        0 15979 1 ffff9f55b1420800 100 0 0 10 0";

    #[test]
    fn test_parse_net_socket_line_ipv4() {
        let socket = parse_net_socket_line(TCP_LISTEN).unwrap();
        assert_eq!(
            socket,
            NetSocket {
                slot: 1,
                local_ip: IpAddress::V4(0x3500007F),
                local_port: 0x35,
                remote_ip: IpAddress::V4(0),
                remote_port: 0,
                state: SocketState::Listen,
                tx_queue: 0,
                rx_queue: 0,
                timer_active: TimerKind::None,
                timer_expire_jiffies: 0,
                retransmits: 0,
                uid: 101,
                timeouts: 0,
                inode: 15979,
                ref_count: 1,
                skbuff: 0xffff9f55b1420800,
            }
        );
    }

    #[cfg(target_endian = "little")]
    #[test]
    fn test_ip_address_display() {
        assert_eq!(IpAddress::V4(0x3500007F).to_string(), "127.0.0.53");
        assert_eq!(IpAddress::V6([0, 0, 0, 0x01000000]).to_string(), "::1");
    }

    #[test]
    fn test_parse_net_socket_line_ipv6() {
        let line = "5: 00000000000000000000000000000000:006F 00000000000000000000000000000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 15737 1 ffff9f55bdb91980 100 0 0 10 0";
        let socket = parse_net_socket_line(line).unwrap();
        assert_eq!(socket.slot, 5);
        assert_eq!(socket.local_ip, IpAddress::V6([0; 4]));
        assert_eq!(socket.local_port, 0x6f);
        assert!(!socket.remote_ip.is_v4());
        assert_eq!(socket.inode, 15737);
        assert_eq!(socket.skbuff, 0xffff9f55bdb91980);
    }

    #[test]
    fn test_parse_net_socket_line_established() {
        let line = "3: 0F02000A:0016 0202000A:DA94 01 0000002C:00000000 01:00000014 00000000     0        0 71261 4 ffff9f55b1420000 20 4 25 10 -1";
        let socket = parse_net_socket_line(line).unwrap();
        assert_eq!(socket.state, SocketState::Established);
        assert_eq!(socket.remote_port, 0xDA94);
        assert_eq!(socket.tx_queue, 0x2C);
        assert_eq!(socket.timer_active, TimerKind::Retransmit);
        assert_eq!(socket.timer_expire_jiffies, 0x14);
        assert_eq!(socket.ref_count, 4);
    }

    #[test]
    fn test_parse_net_socket_line_enum_bounds() {
        let with_state = |state: &str| TCP_LISTEN.replacen(" 0A ", &format!(" {} ", state), 1);
        assert_eq!(
            parse_net_socket_line(&with_state("01")).unwrap().state,
            SocketState::Established
        );
        assert_eq!(
            parse_net_socket_line(&with_state("0B")).unwrap().state,
            SocketState::Closing
        );
        assert!(parse_net_socket_line(&with_state("00")).is_err());
        let err = parse_net_socket_line(&with_state("0C")).unwrap_err();
        assert_eq!(err.message, "Corrupted net socket state - Illegal value");

        let with_timer = |timer: &str| TCP_LISTEN.replacen(" 00:00000000 ", &format!(" {}:00000000 ", timer), 1);
        assert_eq!(
            parse_net_socket_line(&with_timer("04")).unwrap().timer_active,
            TimerKind::ZeroWindow
        );
        assert!(parse_net_socket_line(&with_timer("05")).is_err());
    }

    #[test]
    fn test_parse_net_socket_line_corrupted() {
        let line = "1: 3500007F:0035 00000000:0000 0A 00000000:00000000 00:00000000 00000000   101        0 15979 1";
        let err = parse_net_socket_line(line).unwrap_err();
        assert_eq!(err.text, line);

        let bad_ip = TCP_LISTEN.replacen("3500007F", "3500007", 1);
        let err = parse_net_socket_line(&bad_ip).unwrap_err();
        assert_eq!(err.message, "Corrupted net socket address - Bad length");

        let bad_port = TCP_LISTEN.replacen("3500007F:0035", "3500007F", 1);
        assert!(parse_net_socket_line(&bad_port).is_err());
    }

    #[test]
    fn test_parse_net_socket_line_hex_retransmits() {
        let with_retransmits =
            |count: &str| TCP_LISTEN.replacen(" 00000000   101 ", &format!(" {}   101 ", count), 1);
        assert_eq!(
            parse_net_socket_line(&with_retransmits("0000000A")).unwrap().retransmits,
            10
        );
        assert_eq!(
            parse_net_socket_line(&with_retransmits("00000010")).unwrap().retransmits,
            16
        );

        let table = format!(
            "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode\n{}\n",
            with_retransmits("0000001F")
        );
        let mut sockets = Vec::new();
        parse_lines(&table, &mut sockets, parse_net_socket_line, None, 1).unwrap();
        assert_eq!(sockets.len(), 1);
        assert_eq!(sockets[0].retransmits, 31);
    }

    #[test]
    fn test_parse_net_socket_line_decimal_slot() {
        let line = TCP_LISTEN.replacen("1: ", "  10: ", 1);
        assert_eq!(parse_net_socket_line(&line).unwrap().slot, 10);

        let line = TCP_LISTEN.replacen("1: ", " 1a: ", 1);
        assert!(parse_net_socket_line(&line).is_err());
    }

    /// Renders an IPv4 socket the way `tcp4_seq_show` prints it.
    fn tcp_line(socket: &NetSocket) -> String {
        let IpAddress::V4(local) = socket.local_ip else {
            panic!("IPv4 only");
        };
        let IpAddress::V4(remote) = socket.remote_ip else {
            panic!("IPv4 only");
        };
        let state = (1..=11)
            .find(|code| SocketState::from_code(*code) == Some(socket.state))
            .unwrap();
        let timer = (0..=4)
            .find(|code| TimerKind::from_code(*code) == Some(socket.timer_active))
            .unwrap();
        format!(
            "{:4}: {:08X}:{:04X} {:08X}:{:04X} {:02X} {:08X}:{:08X} {:02X}:{:08X} {:08X} {:5} {:8} {} {} {:x} 20 4 30 10 -1",
            socket.slot,
            local,
            socket.local_port,
            remote,
            socket.remote_port,
            state,
            socket.tx_queue,
            socket.rx_queue,
            timer,
            socket.timer_expire_jiffies,
            socket.retransmits,
            socket.uid,
            socket.timeouts,
            socket.inode,
            socket.ref_count,
            socket.skbuff,
        )
    }

    #[test]
    fn test_net_socket_line_round_trip() {
        let sockets = [
            NetSocket {
                slot: 12,
                local_ip: IpAddress::V4(0x0F02000A),
                local_port: 22,
                remote_ip: IpAddress::V4(0x0202000A),
                remote_port: 55956,
                state: SocketState::Established,
                tx_queue: 0x2C,
                rx_queue: 0,
                timer_active: TimerKind::Retransmit,
                timer_expire_jiffies: 0x1B,
                retransmits: 0x1A,
                uid: 1000,
                timeouts: 3,
                inode: 71261,
                ref_count: 4,
                skbuff: 0xffff9f55b1420000,
            },
            NetSocket {
                slot: 0,
                local_ip: IpAddress::V4(0),
                local_port: 8080,
                state: SocketState::Listen,
                timer_active: TimerKind::ZeroWindow,
                inode: 15979,
                ref_count: 1,
                skbuff: 0xffff9f55b1420800,
                ..NetSocket::default()
            },
        ];

        for socket in sockets {
            assert_eq!(parse_net_socket_line(&tcp_line(&socket)).unwrap(), socket);
        }
    }

    #[test]
    fn test_parse_netlink_socket_line() {
        let line = "ffff9f55ba8e8800 9   4280338379 00000000 0        0        0 2        0        14098";
        let socket = parse_netlink_socket_line(line).unwrap();
        assert_eq!(
            socket,
            NetlinkSocket {
                skbuff: 0xffff9f55ba8e8800,
                protocol: 9,
                port_id: 4280338379,
                groups: 0,
                rmem: 0,
                wmem: 0,
                dumping: false,
                ref_count: 2,
                drops: 0,
                inode: 14098,
            }
        );

        let line = "0000000000000000 0   464    000405d1 0        0        0 2        0        15644";
        assert_eq!(parse_netlink_socket_line(line).unwrap().groups, 0x405d1);
    }

    #[test]
    fn test_parse_netlink_socket_line_without_inode() {
        let line = "ffff880037c4a800 15  -4167  00000002 0        0        1 2        0";
        let socket = parse_netlink_socket_line(line).unwrap();
        assert_eq!(socket.port_id, -4167i32 as u32);
        assert!(socket.dumping);
        assert_eq!(socket.inode, INVALID_INODE);

        let line = "ffff880037c10800 0   4195519 00000000 0        0        (null) 2        0";
        let socket = parse_netlink_socket_line(line).unwrap();
        assert!(!socket.dumping);
        assert_eq!(socket.inode, INVALID_INODE);
    }

    #[test]
    fn test_parse_netlink_socket_line_corrupted() {
        let line = "ffff880037c10800 0   4195519 00000000 0        0        (null) 2";
        assert_eq!(parse_netlink_socket_line(line).unwrap_err().text, line);

        let line = "ffff880037c10800 0   4294967296 00000000 0        0        0 2        0";
        assert!(parse_netlink_socket_line(line).is_err());
    }

    #[test]
    fn test_parse_unix_socket_line() {
        let socket =
            parse_unix_socket_line("ffff8db2f3e09400: 00000002 00000000 00000000 0002 01 21401")
                .unwrap();
        assert_eq!(
            socket,
            UnixSocket {
                skbuff: 0xffff8db2f3e09400,
                ref_count: 2,
                protocol: 0,
                flags: 0,
                socket_type: UnixSocketType::Datagram,
                state: UnixSocketState::Unconnected,
                inode: 21401,
                path: None,
            }
        );

        let socket = parse_unix_socket_line(
            "ffff8db2fd23a000: 00000003 00000000 00000000 0001 03 17031 /run/systemd/journal/stdout",
        )
        .unwrap();
        assert_eq!(socket.socket_type, UnixSocketType::Stream);
        assert_eq!(socket.state, UnixSocketState::Connected);
        assert_eq!(socket.path.as_deref(), Some("/run/systemd/journal/stdout"));

        let socket = parse_unix_socket_line(
            "ffff880037a393c0: 00000002 00000000 00000000 0002 01  9050 @/org/kernel/udev/udevd",
        )
        .unwrap();
        assert_eq!(socket.inode, 9050);
        assert_eq!(socket.path.as_deref(), Some("@/org/kernel/udev/udevd"));
    }

    #[test]
    fn test_parse_unix_socket_line_enum_bounds() {
        let line = |kind: &str, state: &str| {
            format!("ffff8db2f3e09400: 00000002 00000000 00000000 {} {} 21401", kind, state)
        };
        assert_eq!(
            parse_unix_socket_line(&line("0005", "00")).unwrap().socket_type,
            UnixSocketType::SeqPacket
        );
        assert_eq!(
            parse_unix_socket_line(&line("0001", "03")).unwrap().state,
            UnixSocketState::Connected
        );
        assert!(parse_unix_socket_line(&line("0000", "01")).is_err());
        assert!(parse_unix_socket_line(&line("0006", "01")).is_err());
        let err = parse_unix_socket_line(&line("0001", "04")).unwrap_err();
        assert_eq!(err.message, "Corrupted unix socket - Invalid state");
        assert!(parse_unix_socket_line(&line("0001", "05")).is_err());
    }

    #[test]
    fn test_unix_socket_line_round_trip() {
        // Layout of `unix_seq_show`.
        let render = |socket: &UnixSocket| {
            let kind = match socket.socket_type {
                UnixSocketType::Stream => 1,
                UnixSocketType::Datagram => 2,
                UnixSocketType::Raw => 3,
                UnixSocketType::Rdm => 4,
                UnixSocketType::SeqPacket => 5,
            };
            let state = match socket.state {
                UnixSocketState::Free => 0,
                UnixSocketState::Unconnected => 1,
                UnixSocketState::Connecting => 2,
                UnixSocketState::Connected => 3,
            };
            let mut line = format!(
                "{:x}: {:08X} {:08X} {:08X} {:04X} {:02X} {:5}",
                socket.skbuff,
                socket.ref_count,
                socket.protocol,
                socket.flags,
                kind,
                state,
                socket.inode,
            );
            if let Some(path) = &socket.path {
                line.push(' ');
                line.push_str(path);
            }
            line
        };

        let sockets = [
            UnixSocket {
                skbuff: 0xffff8db2fd23a000,
                ref_count: 3,
                protocol: 0,
                flags: 0x10000,
                socket_type: UnixSocketType::Stream,
                state: UnixSocketState::Unconnected,
                inode: 17031,
                path: Some("/run/systemd/journal/stdout".to_string()),
            },
            UnixSocket {
                skbuff: 0xffff8db2f3e09400,
                ref_count: 2,
                protocol: 0,
                flags: 0,
                socket_type: UnixSocketType::SeqPacket,
                state: UnixSocketState::Connected,
                inode: 9050,
                path: None,
            },
            UnixSocket {
                skbuff: 0xffff880037a393c0,
                ref_count: 0x1F,
                protocol: 0,
                flags: 0,
                socket_type: UnixSocketType::Datagram,
                state: UnixSocketState::Connecting,
                inode: 1234567,
                path: Some("@/org/kernel/udev/udevd".to_string()),
            },
        ];

        for socket in sockets {
            assert_eq!(parse_unix_socket_line(&render(&socket)).unwrap(), socket);
        }
    }

    #[test]
    fn test_parse_unix_socket_line_token_count() {
        let short = "ffff8db2f3e09400: 00000002 00000000 00000000 0002 01";
        assert_eq!(parse_unix_socket_line(short).unwrap_err().text, short);

        let long = "ffff8db2f3e09400: 00000002 00000000 00000000 0002 01 21401 /a /b";
        assert!(parse_unix_socket_line(long).is_err());
    }
}
