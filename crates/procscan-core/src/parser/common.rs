//! Sub-formats shared by several files: device numbers, task states and
//! user namespace id maps.

use super::{decimal, hex, token_count_error};
use crate::error::ParseError;
use crate::tokenizer::{split, split_spaces};
use serde::Serialize;

/// A device number as printed by the kernel (`major:minor`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Device {
    pub major: u32,
    pub minor: u32,
}

impl Device {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Encodes the device the way glibc's `makedev` does.
    pub fn raw(&self) -> u64 {
        let major = u64::from(self.major);
        let minor = u64::from(self.minor);
        ((major & 0xffff_f000) << 32)
            | ((major & 0x0000_0fff) << 8)
            | ((minor & 0xffff_ff00) << 12)
            | (minor & 0x0000_00ff)
    }

    /// Decodes a `dev_t` value produced by `makedev`.
    pub fn from_raw(dev: u64) -> Self {
        let major = ((dev >> 32) & 0xffff_f000) | ((dev >> 8) & 0x0000_0fff);
        let minor = ((dev >> 12) & 0xffff_ff00) | (dev & 0x0000_00ff);
        Self {
            major: major as u32,
            minor: minor as u32,
        }
    }
}

/// Parses a `major:minor` device token. Both parts are hex.
pub fn parse_device(token: &str) -> Result<Device, ParseError> {
    device(token, token)
}

/// Like [`parse_device`], but reports failures against the whole `line`.
pub(crate) fn device(token: &str, line: &str) -> Result<Device, ParseError> {
    let parts = split(token, ':', false);
    if parts.len() != 2 {
        return Err(token_count_error("device", line));
    }
    Ok(Device {
        major: hex(parts[0], "device", line)?,
        minor: hex(parts[1], "device", line)?,
    })
}

/// Parses a `<amount> kB` value as used by `status` and `smaps`.
///
/// Returns the amount in kB.
pub(crate) fn kilobytes(value: &str) -> Result<u64, ParseError> {
    const WHAT: &str = "memory size";

    let tokens = split_spaces(value);
    if tokens.len() != 2 {
        return Err(token_count_error(WHAT, value));
    }
    decimal(tokens[0], WHAT, value)
}

/// Scheduling state of a task, as shown in `stat` and `status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    #[default]
    Running,
    Sleeping,
    DiskSleep,
    Zombie,
    Stopped,
    TracingStop,
    Dead,
    Wakekill,
    Waking,
    Parked,
    Idle,
}

impl TaskState {
    /// The single-character code the kernel prints.
    pub fn code(&self) -> char {
        match self {
            TaskState::Running => 'R',
            TaskState::Sleeping => 'S',
            TaskState::DiskSleep => 'D',
            TaskState::Zombie => 'Z',
            TaskState::Stopped => 'T',
            TaskState::TracingStop => 't',
            TaskState::Dead => 'X',
            TaskState::Wakekill => 'K',
            TaskState::Waking => 'W',
            TaskState::Parked => 'P',
            TaskState::Idle => 'I',
        }
    }
}

/// Parses a task state character.
pub fn parse_task_state(state: char) -> Result<TaskState, ParseError> {
    Ok(match state {
        'R' => TaskState::Running,
        'S' => TaskState::Sleeping,
        'D' => TaskState::DiskSleep,
        'Z' => TaskState::Zombie,
        'T' => TaskState::Stopped,
        't' => TaskState::TracingStop,
        'X' | 'x' => TaskState::Dead,
        'K' => TaskState::Wakekill,
        'W' => TaskState::Waking,
        'P' => TaskState::Parked,
        'I' => TaskState::Idle,
        other => {
            return Err(ParseError::new(
                "Corrupted task state - Illegal value",
                other.to_string(),
            ));
        }
    })
}

/// A line of `/proc/<pid>/uid_map` or `gid_map`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IdMap {
    pub id_inside_ns: u32,
    pub id_outside_ns: u32,
    pub length: u32,
}

/// Parses an id map line: `inside outside length`.
pub fn parse_id_map_line(line: &str) -> Result<IdMap, ParseError> {
    const WHAT: &str = "id map";

    let tokens = split_spaces(line);
    if tokens.len() < 3 {
        return Err(token_count_error(WHAT, line));
    }

    Ok(IdMap {
        id_inside_ns: decimal(tokens[0], WHAT, line)?,
        id_outside_ns: decimal(tokens[1], WHAT, line)?,
        length: decimal(tokens[2], WHAT, line)?,
    })
}
