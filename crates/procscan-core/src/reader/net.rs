//! Reader for the network tables under `<procfs>/net` and `<task>/net`.

use crate::error::{Error, ParseError};
use crate::fs::FileSystem;
use crate::parser::lines::{Action, collect_file_lines};
use crate::parser::{
    NetArp, NetDevice, NetRoute, NetSocket, NetlinkSocket, UnixSocket, parse_net_arp_line,
    parse_net_device_line, parse_net_route_line, parse_net_socket_line, parse_netlink_socket_line,
    parse_unix_socket_line,
};
use std::path::{Path, PathBuf};

/// Optional per-record predicate applied while reading a table.
pub type Filter<'f, T> = Option<&'f dyn Fn(&T) -> Action>;

/// Network tables of one network namespace.
///
/// All tables start with a header; `dev` has two header lines, the others one.
#[derive(Debug)]
pub struct Net<'a, F: FileSystem> {
    fs: &'a F,
    dir: PathBuf,
}

impl<'a, F: FileSystem> Net<'a, F> {
    pub(crate) fn new(fs: &'a F, dir: PathBuf) -> Self {
        Self { fs, dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn table<T>(
        &self,
        name: &str,
        parser: fn(&str) -> Result<T, ParseError>,
        filter: Filter<'_, T>,
        skip: usize,
    ) -> Result<Vec<T>, Error> {
        collect_file_lines(self.fs, &self.dir.join(name), parser, filter, skip)
    }

    fn sockets(&self, name: &str, filter: Filter<'_, NetSocket>) -> Result<Vec<NetSocket>, Error> {
        self.table(name, parse_net_socket_line, filter, 1)
    }

    /// Per-interface traffic counters (`dev`).
    pub fn dev(&self, filter: Filter<'_, NetDevice>) -> Result<Vec<NetDevice>, Error> {
        self.table("dev", parse_net_device_line, filter, 2)
    }

    pub fn icmp(&self, filter: Filter<'_, NetSocket>) -> Result<Vec<NetSocket>, Error> {
        self.sockets("icmp", filter)
    }

    pub fn icmp6(&self, filter: Filter<'_, NetSocket>) -> Result<Vec<NetSocket>, Error> {
        self.sockets("icmp6", filter)
    }

    pub fn raw(&self, filter: Filter<'_, NetSocket>) -> Result<Vec<NetSocket>, Error> {
        self.sockets("raw", filter)
    }

    pub fn raw6(&self, filter: Filter<'_, NetSocket>) -> Result<Vec<NetSocket>, Error> {
        self.sockets("raw6", filter)
    }

    pub fn tcp(&self, filter: Filter<'_, NetSocket>) -> Result<Vec<NetSocket>, Error> {
        self.sockets("tcp", filter)
    }

    pub fn tcp6(&self, filter: Filter<'_, NetSocket>) -> Result<Vec<NetSocket>, Error> {
        self.sockets("tcp6", filter)
    }

    pub fn udp(&self, filter: Filter<'_, NetSocket>) -> Result<Vec<NetSocket>, Error> {
        self.sockets("udp", filter)
    }

    pub fn udp6(&self, filter: Filter<'_, NetSocket>) -> Result<Vec<NetSocket>, Error> {
        self.sockets("udp6", filter)
    }

    pub fn udplite(&self, filter: Filter<'_, NetSocket>) -> Result<Vec<NetSocket>, Error> {
        self.sockets("udplite", filter)
    }

    pub fn udplite6(&self, filter: Filter<'_, NetSocket>) -> Result<Vec<NetSocket>, Error> {
        self.sockets("udplite6", filter)
    }

    pub fn netlink(&self, filter: Filter<'_, NetlinkSocket>) -> Result<Vec<NetlinkSocket>, Error> {
        self.table("netlink", parse_netlink_socket_line, filter, 1)
    }

    pub fn unix(&self, filter: Filter<'_, UnixSocket>) -> Result<Vec<UnixSocket>, Error> {
        self.table("unix", parse_unix_socket_line, filter, 1)
    }

    /// IPv4 routing table (`route`).
    pub fn route(&self, filter: Filter<'_, NetRoute>) -> Result<Vec<NetRoute>, Error> {
        self.table("route", parse_net_route_line, filter, 1)
    }

    /// ARP cache (`arp`).
    pub fn arp(&self, filter: Filter<'_, NetArp>) -> Result<Vec<NetArp>, Error> {
        self.table("arp", parse_net_arp_line, filter, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFs;
    use crate::parser::{SocketState, UnixSocketType};

    const TCP: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 3500007F:0035 00000000:0000 0A 00000000:00000000 00:00000000 00000000   101        0 15979 1 ffff9f55b1420800 100 0 0 10 0
   1: 0F02000A:0016 0202000A:DA94 01 0000002C:00000000 01:00000014 00000000     0        0 71261 4 ffff9f55b1420000 20 4 25 10 -1
";

    const DEV: &str = "Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:   93144    1366    0    0    0     0          0         0    93144    1366    0    0    0     0       0          0
  eth0: 1581394   2024    0    0    0     0          0         0   146820    1207    0    0    0     0       0          0
";

    fn net(fs: &MockFs) -> Net<'_, MockFs> {
        Net::new(fs, PathBuf::from("/proc/net"))
    }

    #[test]
    fn test_tcp_with_filter() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/net/tcp", TCP);
        let net = net(&fs);

        assert_eq!(net.tcp(None).unwrap().len(), 2);

        let listening = |socket: &NetSocket| {
            if socket.state == SocketState::Listen {
                Action::Keep
            } else {
                Action::Drop
            }
        };
        let sockets = net.tcp(Some(&listening)).unwrap();
        assert_eq!(sockets.len(), 1);
        assert_eq!(sockets[0].inode, 15979);
    }

    #[test]
    fn test_dev_skips_two_header_lines() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/net/dev", DEV);

        let devices = net(&fs).dev(None).unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].interface, "lo");
        assert_eq!(devices[1].rx_bytes, 1581394);
    }

    #[test]
    fn test_unix_route_arp() {
        let mut fs = MockFs::new();
        fs.add_file(
            "/proc/net/unix",
            "Num       RefCount Protocol Flags    Type St Inode Path\n\
             ffff8db2fd23a000: 00000003 00000000 00000000 0001 03 17031 /run/systemd/journal/stdout\n",
        );
        fs.add_file(
            "/proc/net/route",
            "Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT\n\
             eth0\t00000000\t07030301\t0003\t0\t0\t0\t00000000\t0\t0\t0\n",
        );
        fs.add_file(
            "/proc/net/arp",
            "IP address       HW type     Flags       HW address            Mask     Device\n\
             192.168.10.1     0x1         0x2         10:20:30:40:50:60     *        eth0\n",
        );
        let net = net(&fs);

        let unix = net.unix(None).unwrap();
        assert_eq!(unix[0].socket_type, UnixSocketType::Stream);
        assert_eq!(unix[0].path.as_deref(), Some("/run/systemd/journal/stdout"));

        assert_eq!(net.route(None).unwrap()[0].iface, "eth0");
        assert_eq!(net.arp(None).unwrap()[0].device, "eth0");
    }

    #[test]
    fn test_corrupted_row_reports_path() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/net/udp", "header\n   0: garbage\n");

        let err = net(&fs).udp(None).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert_eq!(err.path(), Path::new("/proc/net/udp"));
    }

    #[test]
    fn test_missing_table() {
        let fs = MockFs::new();
        assert!(net(&fs).udplite6(None).unwrap_err().is_not_found());
    }
}
