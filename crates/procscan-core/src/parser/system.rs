//! Parsers for system-wide single-line formats: `buddyinfo`, `loadavg`,
//! `uptime`, `modules`, `meminfo` and `filesystems`.

use super::{decimal, float, hex, token_count_error};
use crate::error::ParseError;
use crate::tokenizer::{split, split_spaces};
use serde::Serialize;
use std::time::Duration;

// ============ Buddyinfo Parser ============

/// Free page blocks of a memory zone, from `/proc/buddyinfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Zone {
    pub node_id: usize,
    pub name: String,
    /// Free blocks per order, `chunks[n]` counting blocks of `2^n` pages.
    pub chunks: [usize; Zone::CHUNKS_COUNT],
}

impl Zone {
    pub const CHUNKS_COUNT: usize = 11;
}

/// Parses a `/proc/buddyinfo` line.
///
/// Format: `Node 0, zone   Normal   216   55  189 ...` (exactly 11 counts).
pub fn parse_buddyinfo_line(line: &str) -> Result<Zone, ParseError> {
    const WHAT: &str = "buddyinfo";
    const NODE_ID: usize = 1;
    const ZONE_NAME: usize = 3;
    const FIRST_CHUNK: usize = 4;
    const COUNT: usize = FIRST_CHUNK + Zone::CHUNKS_COUNT;

    let tokens = split_spaces(line);
    if tokens.len() != COUNT {
        return Err(token_count_error(WHAT, line));
    }

    let node_id = tokens[NODE_ID]
        .strip_suffix(',')
        .ok_or_else(|| ParseError::new("Corrupted buddyinfo - Missing node delim", line))?;

    let mut zone = Zone {
        node_id: decimal(node_id, WHAT, line)?,
        name: tokens[ZONE_NAME].to_string(),
        chunks: [0; Zone::CHUNKS_COUNT],
    };
    for (chunk, token) in zone.chunks.iter_mut().zip(&tokens[FIRST_CHUNK..]) {
        *chunk = decimal(token, WHAT, line)?;
    }

    Ok(zone)
}

// ============ Loadavg Parser ============

/// Parsed data from `/proc/loadavg`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadAverage {
    pub last_1min: f64,
    pub last_5min: f64,
    pub last_15min: f64,
    /// Currently runnable scheduling entities.
    pub runnable_tasks: u32,
    /// Scheduling entities that currently exist.
    pub total_tasks: u32,
    /// PID of the most recently created task.
    pub last_created_task: i32,
}

/// Parses `/proc/loadavg` content.
///
/// Format: `0.12 0.34 5.04 1/112 5935`
pub fn parse_loadavg(content: &str) -> Result<LoadAverage, ParseError> {
    const WHAT: &str = "loadavg";

    let line = content.trim_end_matches('\n');
    let tokens = split_spaces(line);
    if tokens.len() != 5 {
        return Err(token_count_error(WHAT, line));
    }

    let counts = split(tokens[3], '/', false);
    if counts.len() != 2 {
        return Err(ParseError::new(
            "Corrupted loadavg task counts - Unexpected tokens count",
            line,
        ));
    }

    Ok(LoadAverage {
        last_1min: float(tokens[0], WHAT, line)?,
        last_5min: float(tokens[1], WHAT, line)?,
        last_15min: float(tokens[2], WHAT, line)?,
        runnable_tasks: decimal(counts[0], WHAT, line)?,
        total_tasks: decimal(counts[1], WHAT, line)?,
        last_created_task: decimal(tokens[4], WHAT, line)?,
    })
}

// ============ Uptime Parser ============

/// Parsed data from `/proc/uptime`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Uptime {
    /// Time since boot.
    pub system_time: Duration,
    /// Time spent idle, summed over all CPUs.
    pub idle_time: Duration,
}

/// Parses `/proc/uptime` content.
///
/// Format: `13543.43 52634.61`
pub fn parse_uptime(content: &str) -> Result<Uptime, ParseError> {
    const WHAT: &str = "uptime";

    let line = content.trim_end_matches('\n');
    let tokens = split_spaces(line);
    if tokens.len() != 2 {
        return Err(token_count_error(WHAT, line));
    }

    let seconds = |token: &str| -> Result<Duration, ParseError> {
        let value = float(token, WHAT, line)?;
        Duration::try_from_secs_f64(value)
            .map_err(|_| ParseError::new("Corrupted uptime - Out of range", line))
    };

    Ok(Uptime {
        system_time: seconds(tokens[0])?,
        idle_time: seconds(tokens[1])?,
    })
}

// ============ Modules Parser ============

/// Load state of a kernel module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleState {
    #[default]
    Live,
    Loading,
    Unloading,
}

/// A line of `/proc/modules`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Module {
    pub name: String,
    /// Memory size in bytes.
    pub size: u64,
    /// Number of loaded instances (reference count).
    pub instances: u32,
    pub dependencies: Vec<String>,
    pub state: ModuleState,
    /// Kernel load address.
    pub offset: u64,
    /// Taint flag `O`.
    pub is_out_of_tree: bool,
    /// Taint flag `E`.
    pub is_unsigned: bool,
}

fn parse_module_state(state: &str, line: &str) -> Result<ModuleState, ParseError> {
    match state {
        "Live" => Ok(ModuleState::Live),
        "Loading" => Ok(ModuleState::Loading),
        "Unloading" => Ok(ModuleState::Unloading),
        _ => Err(ParseError::new(
            "Corrupted module state - Unknown value",
            line,
        )),
    }
}

/// Parses a `/proc/modules` line.
///
/// Format: `name size instances deps state offset [flags]`, e.g.
/// `vboxsf 77824 2 - Live 0xffffffffc0759000 (OE)`
pub fn parse_modules_line(line: &str) -> Result<Module, ParseError> {
    const WHAT: &str = "module";
    const MIN_COUNT: usize = 6;
    const FLAGS: usize = 6;

    let tokens = split_spaces(line);
    if tokens.len() < MIN_COUNT || tokens.len() > FLAGS + 1 {
        return Err(token_count_error("modules line", line));
    }

    let dependencies = match tokens[3] {
        "-" => Vec::new(),
        deps => split(deps, ',', false)
            .into_iter()
            .map(str::to_string)
            .collect(),
    };

    let flags = tokens.get(FLAGS).copied().unwrap_or("");

    Ok(Module {
        name: tokens[0].to_string(),
        size: decimal(tokens[1], WHAT, line)?,
        instances: decimal(tokens[2], WHAT, line)?,
        dependencies,
        state: parse_module_state(tokens[4], line)?,
        offset: hex(tokens[5], WHAT, line)?,
        is_out_of_tree: flags.contains('O'),
        is_unsigned: flags.contains('E'),
    })
}

// ============ Meminfo Parser ============

/// Parses a `/proc/meminfo` line into `(key, amount)`.
///
/// Format: `MemTotal:       16316412 kB`; the unit is missing on counters
/// such as `HugePages_Total`.
pub fn parse_meminfo_line(line: &str) -> Result<(String, u64), ParseError> {
    const WHAT: &str = "meminfo";

    let tokens = split_spaces(line);
    if !(2..=3).contains(&tokens.len()) {
        return Err(token_count_error(WHAT, line));
    }

    let key = tokens[0]
        .strip_suffix(':')
        .ok_or_else(|| ParseError::new("Corrupted meminfo - Missing key delim", line))?;

    Ok((key.to_string(), decimal(tokens[1], WHAT, line)?))
}

// ============ Filesystems Parser ============

/// Parses a `/proc/filesystems` line into `(name, requires_device)`.
///
/// Format: `nodev\tsysfs` or `\text4`.
pub fn parse_filesystems_line(line: &str) -> Result<(String, bool), ParseError> {
    let tokens = split(line, '\t', false);
    match tokens.as_slice() {
        [name] => Ok((name.to_string(), true)),
        ["nodev", name] => Ok((name.to_string(), false)),
        _ => Err(token_count_error("filesystem", line)),
    }
}
