//! Parsers for `/proc` and `/sys` file formats.
//!
//! These are pure functions that turn the content of a kernel text file (or
//! a single line of it) into structured data. They never touch the
//! filesystem, so they are easily testable with string inputs.
//!
//! Every parser reports failures as a [`ParseError`] whose `text` is the
//! whole offending line, so a broken record can be found in the source file.
//!
//! Two generic engines sit next to the per-format parsers:
//! - [`kv::KeyValueParser`] for whole-file `key<delim>value` tables
//!   (`status`, `io`, `/proc/stat`)
//! - [`lines::parse_lines`] for files with one record per line

pub mod block;
pub mod cgroup;
pub mod common;
pub mod kv;
pub mod lines;
pub mod maps;
pub mod mountinfo;
pub mod net;
pub mod socket;
pub mod stat;
pub mod status;
pub mod system;
pub mod task;

use crate::error::ParseError;
use crate::tokenizer::{Base, Integer, parse_float, parse_int};

pub use block::{BlockStat, parse_block_stat, parse_rotational};
pub use cgroup::{Cgroup, CgroupController, parse_cgroup_controller_line, parse_cgroup_line};
pub use common::{Device, IdMap, TaskState, parse_device, parse_id_map_line, parse_task_state};
pub use kv::KeyValueParser;
pub use lines::{Action, parse_lines};
pub use maps::{MemMap, MemRegion, Perms, parse_maps_line, parse_smaps};
pub use mountinfo::{Mount, parse_mountinfo_line};
pub use net::{NetArp, NetDevice, NetRoute, parse_net_arp_line, parse_net_device_line, parse_net_route_line};
pub use socket::{
    INVALID_INODE, IpAddress, NetSocket, NetlinkSocket, SocketState, TimerKind, UnixSocket,
    UnixSocketState, UnixSocketType, parse_net_socket_line, parse_netlink_socket_line,
    parse_unix_socket_line,
};
pub use stat::{CpuTimes, ProcStat, Sequence, parse_proc_stat};
pub use status::{INVALID_PID, IdSet, Seccomp, SignalQueue, TaskStatus, parse_task_status};
pub use system::{
    LoadAverage, Module, ModuleState, Uptime, Zone, parse_buddyinfo_line, parse_filesystems_line,
    parse_loadavg, parse_meminfo_line, parse_modules_line, parse_uptime,
};
pub use task::{
    IoStats, MemStats, Syscall, TaskStat, parse_cmdline, parse_environ, parse_statm,
    parse_syscall, parse_task_io, parse_task_stat,
};

/// Converts `token` to an integer, reporting failures against `line`.
pub(crate) fn number<T: Integer>(
    token: &str,
    base: Base,
    what: &str,
    line: &str,
) -> Result<T, ParseError> {
    parse_int(token, base).map_err(|e| e.corrupted(what, line))
}

/// Converts `token` to a decimal integer, reporting failures against `line`.
pub(crate) fn decimal<T: Integer>(token: &str, what: &str, line: &str) -> Result<T, ParseError> {
    number(token, Base::Decimal, what, line)
}

/// Converts `token` to a hex integer, reporting failures against `line`.
pub(crate) fn hex<T: Integer>(token: &str, what: &str, line: &str) -> Result<T, ParseError> {
    number(token, Base::Hex, what, line)
}

/// Converts `token` to a float, reporting failures against `line`.
pub(crate) fn float(token: &str, what: &str, line: &str) -> Result<f64, ParseError> {
    parse_float(token).map_err(|e| e.corrupted(what, line))
}

/// Builds the `Unexpected tokens count` error used by fixed-layout formats.
pub(crate) fn token_count_error(what: &str, line: &str) -> ParseError {
    ParseError::new(format!("Corrupted {} - Unexpected tokens count", what), line)
}
