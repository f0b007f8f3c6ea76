//! Parser for `/proc/stat`.

use super::decimal;
use super::kv::KeyValueParser;
use crate::error::ParseError;
use crate::tokenizer::split_spaces;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Time spent by a CPU in each mode, in USER_HZ ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
}

/// A total followed by its per-source breakdown (`intr`, `softirq`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sequence {
    pub total: u64,
    pub per_item: Vec<u64>,
}

/// Kernel/system statistics from `/proc/stat`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcStat {
    pub cpu_total: CpuTimes,
    pub cpus: Vec<CpuTimes>,
    pub intr: Sequence,
    pub softirq: Sequence,
    pub ctxt: u64,
    /// Boot time, in seconds since the epoch.
    pub btime: u64,
    pub processes: u64,
    pub procs_running: u64,
    pub procs_blocked: u64,
}

impl ProcStat {
    /// Boot time as a UTC timestamp.
    pub fn boot_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::try_from(self.btime).ok()?, 0)
    }
}

fn parse_cpu(value: &str) -> Result<CpuTimes, ParseError> {
    const WHAT: &str = "cpu";
    const MIN_COUNT: usize = 4;
    const COUNT: usize = 10;

    let tokens = split_spaces(value);
    if !(MIN_COUNT..=COUNT).contains(&tokens.len()) {
        return Err(super::token_count_error(WHAT, value));
    }

    let mut times = [0u64; COUNT];
    for (time, token) in times.iter_mut().zip(&tokens) {
        *time = decimal(token, WHAT, value)?;
    }

    let [user, nice, system, idle, iowait, irq, softirq, steal, guest, guest_nice] = times;
    Ok(CpuTimes {
        user,
        nice,
        system,
        idle,
        iowait,
        irq,
        softirq,
        steal,
        guest,
        guest_nice,
    })
}

fn parse_sequence(value: &str) -> Result<Sequence, ParseError> {
    const WHAT: &str = "sequence";

    let tokens = split_spaces(value);
    let Some((total, items)) = tokens.split_first() else {
        return Err(super::token_count_error(WHAT, value));
    };

    Ok(Sequence {
        total: decimal(total, WHAT, value)?,
        per_item: items
            .iter()
            .map(|token| decimal(token, WHAT, value))
            .collect::<Result<_, _>>()?,
    })
}

fn remap_cpu_key(key: &str) -> &str {
    if key == "cpu" {
        "cpu_total"
    } else if key.starts_with("cpu") {
        "cpu_single"
    } else {
        key
    }
}

static PROC_STAT_PARSER: LazyLock<KeyValueParser<ProcStat>> = LazyLock::new(|| {
    KeyValueParser::new(' ')
        .remap(remap_cpu_key)
        .field("cpu_total", |value, out: &mut ProcStat| {
            out.cpu_total = parse_cpu(value)?;
            Ok(())
        })
        .field("cpu_single", |value, out: &mut ProcStat| {
            out.cpus.push(parse_cpu(value)?);
            Ok(())
        })
        .field("intr", |value, out: &mut ProcStat| {
            out.intr = parse_sequence(value)?;
            Ok(())
        })
        .field("softirq", |value, out: &mut ProcStat| {
            out.softirq = parse_sequence(value)?;
            Ok(())
        })
        .field("ctxt", |value, out: &mut ProcStat| {
            out.ctxt = decimal(value, "number", value)?;
            Ok(())
        })
        .field("btime", |value, out: &mut ProcStat| {
            out.btime = decimal(value, "number", value)?;
            Ok(())
        })
        .field("processes", |value, out: &mut ProcStat| {
            out.processes = decimal(value, "number", value)?;
            Ok(())
        })
        .field("procs_running", |value, out: &mut ProcStat| {
            out.procs_running = decimal(value, "number", value)?;
            Ok(())
        })
        .field("procs_blocked", |value, out: &mut ProcStat| {
            out.procs_blocked = decimal(value, "number", value)?;
            Ok(())
        })
});

/// Parses the content of `/proc/stat`.
///
/// `keys` restricts parsing to the given (remapped) keys, e.g. `cpu_total`.
pub fn parse_proc_stat(
    content: &str,
    keys: Option<&HashSet<String>>,
) -> Result<ProcStat, ParseError> {
    PROC_STAT_PARSER.parse(content, keys)
}

pub(crate) fn proc_stat_parser() -> &'static KeyValueParser<ProcStat> {
    &PROC_STAT_PARSER
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROC_STAT: &str = "\
cpu  21497341 899627 8830588 433191163 93490 0 1844976 0 0 0
cpu0 2684811 115236 1094082 54162041 10674 0 890071 0 0 0
cpu1 2702513 110367 1109493 54150744 11689 0 248187 0 0 0
intr 975101428 40707218 345522235 433770 0
ctxt 1807723412
btime 1623330600
processes 3810472
procs_running 2
procs_blocked 0
softirq 381659448 33954 202863055 3 178762436
";

    #[test]
    fn test_parse_proc_stat() {
        let stat = parse_proc_stat(PROC_STAT, None).unwrap();
        assert_eq!(
            stat.cpu_total,
            CpuTimes {
                user: 21497341,
                nice: 899627,
                system: 8830588,
                idle: 433191163,
                iowait: 93490,
                irq: 0,
                softirq: 1844976,
                steal: 0,
                guest: 0,
                guest_nice: 0,
            }
        );
        assert_eq!(stat.cpus.len(), 2);
        assert_eq!(stat.cpus[1].user, 2702513);
        assert_eq!(
            stat.intr,
            Sequence {
                total: 975101428,
                per_item: vec![40707218, 345522235, 433770, 0],
            }
        );
        assert_eq!(stat.softirq.total, 381659448);
        assert_eq!(stat.softirq.per_item.len(), 4);
        assert_eq!(stat.ctxt, 1807723412);
        assert_eq!(stat.btime, 1623330600);
        assert_eq!(stat.processes, 3810472);
        assert_eq!(stat.procs_running, 2);
        assert_eq!(stat.procs_blocked, 0);
    }

    #[test]
    fn test_boot_time() {
        let stat = parse_proc_stat(PROC_STAT, None).unwrap();
        let boot = stat.boot_time().unwrap();
        assert_eq!(boot.timestamp(), 1623330600);
        assert_eq!(boot.to_rfc3339(), "2021-06-10T13:10:00+00:00");
    }

    #[test]
    fn test_parse_proc_stat_keys() {
        let keys: HashSet<String> = ["cpu_single".to_string(), "btime".to_string()].into();
        let stat = parse_proc_stat(PROC_STAT, Some(&keys)).unwrap();
        assert_eq!(stat.cpus.len(), 2);
        assert_eq!(stat.btime, 1623330600);
        assert_eq!(stat.cpu_total, CpuTimes::default());
        assert!(stat.intr.per_item.is_empty());
        assert_eq!(stat.ctxt, 0);
    }

    #[test]
    fn test_parse_cpu_old_kernel() {
        let stat = parse_proc_stat("cpu 1 2 3 4\n", None).unwrap();
        assert_eq!(stat.cpu_total.idle, 4);
        assert_eq!(stat.cpu_total.iowait, 0);
    }

    #[test]
    fn test_parse_cpu_token_count() {
        let err = parse_proc_stat("cpu 1 2 3\n", None).unwrap_err();
        assert_eq!(err.message, "Corrupted cpu - Unexpected tokens count");
        assert!(parse_proc_stat("cpu0 1 2 3 4 5 6 7 8 9 10 11\n", None).is_err());
    }

    #[test]
    fn test_parse_sequence_corrupted() {
        let err = parse_proc_stat("intr\n", None).unwrap_err();
        assert_eq!(err.message, "Corrupted sequence - Unexpected tokens count");
        assert!(parse_proc_stat("softirq 1 x\n", None).is_err());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let stat = parse_proc_stat("page 5741 1808\nswap 1 0\nctxt 12\n", None).unwrap();
        assert_eq!(stat.ctxt, 12);
    }
}
