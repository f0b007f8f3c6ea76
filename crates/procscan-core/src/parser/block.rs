//! Parsers for block device files under `/sys/block/<dev>`.

use super::{decimal, token_count_error};
use crate::error::ParseError;
use crate::tokenizer::{split_spaces, trim};
use serde::Serialize;

/// I/O counters from `/sys/block/<dev>/stat`
/// (Documentation/block/stat.rst).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlockStat {
    pub read_ios: u64,
    pub read_merges: u64,
    pub read_sectors: u64,
    pub read_ticks: u64,
    pub write_ios: u64,
    pub write_merges: u64,
    pub write_sectors: u64,
    pub write_ticks: u64,
    pub in_flight: u64,
    pub io_ticks: u64,
    pub time_in_queue: u64,
    /// Since 4.18.
    pub discard_ios: u64,
    pub discard_merges: u64,
    pub discard_sectors: u64,
    pub discard_ticks: u64,
    /// Since 5.5.
    pub flush_ios: u64,
    pub flush_ticks: u64,
}

/// Parses the single line of a block device `stat` file.
///
/// Counters missing on older kernels are left at 0; columns added by newer
/// kernels are ignored.
pub fn parse_block_stat(content: &str) -> Result<BlockStat, ParseError> {
    const WHAT: &str = "block stat";
    const MIN_COUNT: usize = 11;
    const COUNT: usize = 17;

    let line = trim(content);
    let tokens = split_spaces(line);
    if tokens.len() < MIN_COUNT {
        return Err(token_count_error(WHAT, line));
    }

    let mut values = [0u64; COUNT];
    for (value, token) in values.iter_mut().zip(&tokens) {
        *value = decimal(token, WHAT, line)?;
    }

    let [
        read_ios,
        read_merges,
        read_sectors,
        read_ticks,
        write_ios,
        write_merges,
        write_sectors,
        write_ticks,
        in_flight,
        io_ticks,
        time_in_queue,
        discard_ios,
        discard_merges,
        discard_sectors,
        discard_ticks,
        flush_ios,
        flush_ticks,
    ] = values;

    Ok(BlockStat {
        read_ios,
        read_merges,
        read_sectors,
        read_ticks,
        write_ios,
        write_merges,
        write_sectors,
        write_ticks,
        in_flight,
        io_ticks,
        time_in_queue,
        discard_ios,
        discard_merges,
        discard_sectors,
        discard_ticks,
        flush_ios,
        flush_ticks,
    })
}

/// Parses `/sys/block/<dev>/queue/rotational`: `1` for spinning disks.
pub fn parse_rotational(content: &str) -> Result<bool, ParseError> {
    let value = trim(content);
    let rotational: u32 = decimal(value, "rotational", value)?;
    Ok(rotational != 0)
}
