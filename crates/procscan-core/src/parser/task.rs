//! Parsers for per-task files: `stat`, `statm`, `io`, `syscall`, `cmdline`
//! and `environ`.

use super::common::{TaskState, parse_task_state};
use super::kv::KeyValueParser;
use super::{decimal, number, token_count_error};
use crate::error::ParseError;
use crate::tokenizer::{Base, Integer, split, split_spaces, trim};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Task statistics from `/proc/<pid>/stat` (see `man 5 proc`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskStat {
    pub pid: i32,
    pub comm: String,
    pub state: TaskState,
    pub ppid: i32,
    pub pgrp: i32,
    pub session: i32,
    pub tty_nr: i32,
    pub tpgid: i32,
    pub flags: u32,
    pub minflt: u64,
    pub cminflt: u64,
    pub majflt: u64,
    pub cmajflt: u64,
    pub utime: u64,
    pub stime: u64,
    pub cutime: i64,
    pub cstime: i64,
    pub priority: i64,
    pub nice: i64,
    pub num_threads: i64,
    pub itrealvalue: i64,
    pub starttime: u64,
    pub vsize: u64,
    pub rss: i64,
    pub rsslim: u64,
    pub startcode: u64,
    pub endcode: u64,
    pub startstack: u64,
    pub kstkesp: u64,
    pub kstkeip: u64,
    pub signal: u64,
    pub blocked: u64,
    pub sigignore: u64,
    pub sigcatch: u64,
    pub wchan: u64,
    pub nswap: u64,
    pub cnswap: u64,
    // Fields below are missing on older kernels.
    pub exit_signal: i32,
    pub processor: i32,
    pub rt_priority: u32,
    pub policy: u32,
    pub delayacct_blkio_ticks: u64,
    pub guest_time: u64,
    pub cguest_time: i64,
    pub start_data: u64,
    pub end_data: u64,
    pub start_brk: u64,
    pub arg_start: u64,
    pub arg_end: u64,
    pub env_start: u64,
    pub env_end: u64,
    pub exit_code: i32,
}

impl TaskStat {
    /// Kernel threads are `kthreadd` (pid 2) and its children.
    pub fn is_kernel_thread(&self) -> bool {
        const KTHREADD_PID: i32 = 2;
        self.pid == KTHREADD_PID || self.ppid == KTHREADD_PID
    }
}

/// Memory usage from `/proc/<pid>/statm`, in pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemStats {
    pub total: u64,
    pub resident: u64,
    pub shared: u64,
    pub text: u64,
    /// Unused since 2.6, always 0.
    pub lib: u64,
    pub data: u64,
    /// Unused since 2.6, always 0.
    pub dirty: u64,
}

/// I/O accounting from `/proc/<pid>/io`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IoStats {
    pub rchar: u64,
    pub wchar: u64,
    pub syscr: u64,
    pub syscw: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub cancelled_write_bytes: u64,
}

/// The system call a task is blocked in (`/proc/<pid>/syscall`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Syscall {
    pub number: i64,
    pub args: [u64; 6],
    pub stack_pointer: u64,
    pub program_counter: u64,
}

// ============ Stat Parser ============

const TASK_STAT: &str = "task stat";

/// Reads the field at `index`, defaulting to zero when the kernel does not
/// print it.
fn optional<T: Integer + Default>(tokens: &[&str], index: usize, line: &str) -> Result<T, ParseError> {
    match tokens.get(index) {
        Some(token) => decimal(token, TASK_STAT, line),
        None => Ok(T::default()),
    }
}

/// Parses the content of `/proc/<pid>/stat`.
///
/// `comm` may contain spaces and parentheses, so it is taken as the text
/// between the first `(` and the last `)`.
pub fn parse_task_stat(content: &str) -> Result<TaskStat, ParseError> {
    const MIN_COUNT: usize = 35;

    let line = trim(content);

    let (open, close) = match (line.find('('), line.rfind(')')) {
        (Some(open), Some(close)) if open < close => (open, close),
        _ => {
            return Err(ParseError::new(
                "Corrupted task stat - Missing comm",
                line,
            ));
        }
    };

    let pid = decimal(trim(&line[..open]), TASK_STAT, line)?;
    let comm = line[open + 1..close].to_string();

    let tokens = split_spaces(&line[close + 1..]);
    if tokens.len() < MIN_COUNT {
        return Err(token_count_error(TASK_STAT, line));
    }

    let mut state = tokens[0].chars();
    let state = match (state.next(), state.next()) {
        (Some(code), None) => parse_task_state(code)?,
        _ => {
            return Err(ParseError::new(
                "Corrupted task state - Illegal value",
                line,
            ));
        }
    };

    Ok(TaskStat {
        pid,
        comm,
        state,
        ppid: optional(&tokens, 1, line)?,
        pgrp: optional(&tokens, 2, line)?,
        session: optional(&tokens, 3, line)?,
        tty_nr: optional(&tokens, 4, line)?,
        tpgid: optional(&tokens, 5, line)?,
        flags: optional(&tokens, 6, line)?,
        minflt: optional(&tokens, 7, line)?,
        cminflt: optional(&tokens, 8, line)?,
        majflt: optional(&tokens, 9, line)?,
        cmajflt: optional(&tokens, 10, line)?,
        utime: optional(&tokens, 11, line)?,
        stime: optional(&tokens, 12, line)?,
        cutime: optional(&tokens, 13, line)?,
        cstime: optional(&tokens, 14, line)?,
        priority: optional(&tokens, 15, line)?,
        nice: optional(&tokens, 16, line)?,
        num_threads: optional(&tokens, 17, line)?,
        itrealvalue: optional(&tokens, 18, line)?,
        starttime: optional(&tokens, 19, line)?,
        vsize: optional(&tokens, 20, line)?,
        rss: optional(&tokens, 21, line)?,
        rsslim: optional(&tokens, 22, line)?,
        startcode: optional(&tokens, 23, line)?,
        endcode: optional(&tokens, 24, line)?,
        startstack: optional(&tokens, 25, line)?,
        kstkesp: optional(&tokens, 26, line)?,
        kstkeip: optional(&tokens, 27, line)?,
        signal: optional(&tokens, 28, line)?,
        blocked: optional(&tokens, 29, line)?,
        sigignore: optional(&tokens, 30, line)?,
        sigcatch: optional(&tokens, 31, line)?,
        wchan: optional(&tokens, 32, line)?,
        nswap: optional(&tokens, 33, line)?,
        cnswap: optional(&tokens, 34, line)?,
        exit_signal: optional(&tokens, 35, line)?,
        processor: optional(&tokens, 36, line)?,
        rt_priority: optional(&tokens, 37, line)?,
        policy: optional(&tokens, 38, line)?,
        delayacct_blkio_ticks: optional(&tokens, 39, line)?,
        guest_time: optional(&tokens, 40, line)?,
        cguest_time: optional(&tokens, 41, line)?,
        start_data: optional(&tokens, 42, line)?,
        end_data: optional(&tokens, 43, line)?,
        start_brk: optional(&tokens, 44, line)?,
        arg_start: optional(&tokens, 45, line)?,
        arg_end: optional(&tokens, 46, line)?,
        env_start: optional(&tokens, 47, line)?,
        env_end: optional(&tokens, 48, line)?,
        exit_code: optional(&tokens, 49, line)?,
    })
}

// ============ Statm Parser ============

/// Parses `/proc/<pid>/statm`: `total resident shared text lib data dirty`.
pub fn parse_statm(content: &str) -> Result<MemStats, ParseError> {
    const WHAT: &str = "statm";

    let line = trim(content);
    let tokens = split_spaces(line);
    if tokens.len() != 7 {
        return Err(token_count_error(WHAT, line));
    }

    Ok(MemStats {
        total: decimal(tokens[0], WHAT, line)?,
        resident: decimal(tokens[1], WHAT, line)?,
        shared: decimal(tokens[2], WHAT, line)?,
        text: decimal(tokens[3], WHAT, line)?,
        lib: decimal(tokens[4], WHAT, line)?,
        data: decimal(tokens[5], WHAT, line)?,
        dirty: decimal(tokens[6], WHAT, line)?,
    })
}

// ============ IO Parser ============

macro_rules! io_fields {
    ($($key:literal => $field:ident),* $(,)?) => {
        KeyValueParser::new(':')
            $(.field($key, |value, out: &mut IoStats| {
                out.$field = decimal(value, "number", value)?;
                Ok(())
            }))*
    };
}

static IO_PARSER: LazyLock<KeyValueParser<IoStats>> = LazyLock::new(|| {
    io_fields!(
        "rchar" => rchar,
        "wchar" => wchar,
        "syscr" => syscr,
        "syscw" => syscw,
        "read_bytes" => read_bytes,
        "write_bytes" => write_bytes,
        "cancelled_write_bytes" => cancelled_write_bytes,
    )
});

/// Parses the content of `/proc/<pid>/io`.
pub fn parse_task_io(content: &str) -> Result<IoStats, ParseError> {
    IO_PARSER.parse(content, None)
}

pub(crate) fn task_io_parser() -> &'static KeyValueParser<IoStats> {
    &IO_PARSER
}

// ============ Syscall Parser ============

/// Parses `/proc/<pid>/syscall`:
/// `232 0x4 0x55a79ea3b180 0x94 0xffffffff 0x0 0x2830 0x7ffc8543e1b0 0x7f6e19d9768e`
///
/// Values are printed in mixed bases, so each is auto-detected.
pub fn parse_syscall(content: &str) -> Result<Syscall, ParseError> {
    const WHAT: &str = "syscall";
    const COUNT: usize = 9;

    let line = trim(content);
    let tokens = split_spaces(line);
    if tokens.len() != COUNT {
        return Err(token_count_error(WHAT, line));
    }

    let mut args = [0u64; 6];
    for (arg, token) in args.iter_mut().zip(&tokens[1..7]) {
        *arg = number(token, Base::Auto, WHAT, line)?;
    }

    Ok(Syscall {
        number: number(tokens[0], Base::Auto, WHAT, line)?,
        args,
        stack_pointer: number(tokens[7], Base::Auto, WHAT, line)?,
        program_counter: number(tokens[8], Base::Auto, WHAT, line)?,
    })
}

// ============ Cmdline / Environ ============

/// Splits a NUL separated `cmdline` into its arguments.
///
/// Empty arguments in the middle are preserved; the final terminator is
/// not an argument.
pub fn parse_cmdline(content: &str) -> Vec<String> {
    let content = content.strip_suffix('\0').unwrap_or(content);
    split(content, '\0', true)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Parses a NUL separated `environ` into a map. Entries without `=` are
/// dropped.
pub fn parse_environ(content: &str) -> BTreeMap<String, String> {
    split(content, '\0', false)
        .into_iter()
        .filter_map(|entry| entry.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_task_stat_kworker() {
        let content = "30739 (kworker/0:3-cgroup_destroy) I 2 0 0 0 -1 69238880 0 0 0 0 0 1485 0 0 20 0 1 0 409074 0 0 18446744073709551615 0 0 0 0 0 0 0 2147483647 0 1 0 0 17 0 0 0 0 0 0 0 0 0 0 0 0 0 0\n";
        let stat = parse_task_stat(content).unwrap();
        assert_eq!(stat.pid, 30739);
        assert_eq!(stat.comm, "kworker/0:3-cgroup_destroy");
        assert_eq!(stat.state, TaskState::Idle);
        assert_eq!(stat.ppid, 2);
        assert_eq!(stat.tpgid, -1);
        assert_eq!(stat.flags, 69238880);
        assert_eq!(stat.stime, 1485);
        assert_eq!(stat.priority, 20);
        assert_eq!(stat.num_threads, 1);
        assert_eq!(stat.starttime, 409074);
        assert_eq!(stat.rsslim, u64::MAX);
        assert_eq!(stat.sigignore, 2147483647);
        assert_eq!(stat.wchan, 1);
        assert_eq!(stat.exit_signal, 17);
        assert_eq!(stat.exit_code, 0);
        assert!(stat.is_kernel_thread());
    }

    #[test]
    fn test_parse_task_stat_comm_with_parentheses() {
        let content = "63654 (a) b (c)) S 3876 63654 3865 34909 63654 4194304 107 0 0 0 0 1 0 0 15 -5 1 0 671325 4456448 230 18446744073709551615 367560228864 367560955744 549025709984 0 0 0 0 0 58751527 1 0 0";
        let stat = parse_task_stat(content).unwrap();
        assert_eq!(stat.comm, "a) b (c)");
        assert_eq!(stat.state, TaskState::Sleeping);
        assert_eq!(stat.nice, -5);
        assert_eq!(stat.rss, 230);
        assert_eq!(stat.startcode, 367560228864);
        // Optional tail is missing.
        assert_eq!(stat.exit_signal, 0);
        assert_eq!(stat.env_end, 0);
        assert!(!stat.is_kernel_thread());
    }

    #[test]
    fn test_parse_task_stat_corrupted() {
        let short = "63654 (less) S 3876 63654 3865 34909 63654 4194304 107 0 0 0 0 1";
        let err = parse_task_stat(short).unwrap_err();
        assert_eq!(err.message, "Corrupted task stat - Unexpected tokens count");
        assert_eq!(err.text, short);

        assert!(parse_task_stat("63654 less S 3876").is_err());
        assert!(parse_task_stat("").is_err());

        let bad_state = "1 (init) Q 0 1 1 0 -1 4194560 0 0 0 0 0 0 0 0 20 0 1 0 1 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0";
        assert!(parse_task_stat(bad_state).is_err());
    }

    #[test]
    fn test_parse_statm() {
        let statm = parse_statm("5962 1154 919 232 0 258 0\n").unwrap();
        assert_eq!(
            statm,
            MemStats {
                total: 5962,
                resident: 1154,
                shared: 919,
                text: 232,
                lib: 0,
                data: 258,
                dirty: 0,
            }
        );
        assert!(parse_statm("5962 1154 919 232 0 258").is_err());
    }

    #[test]
    fn test_parse_task_io() {
        let content = "rchar: 9999\nwchar: 8888\nsyscr: 7777\nsyscw: 6666\nread_bytes: 5555\nwrite_bytes: 4444\ncancelled_write_bytes: 3333\n";
        let io = parse_task_io(content).unwrap();
        assert_eq!(
            io,
            IoStats {
                rchar: 9999,
                wchar: 8888,
                syscr: 7777,
                syscw: 6666,
                read_bytes: 5555,
                write_bytes: 4444,
                cancelled_write_bytes: 3333,
            }
        );
        assert!(parse_task_io("rchar: lots\n").is_err());
    }

    #[test]
    fn test_parse_syscall() {
        let syscall = parse_syscall(
            "232 0x4 0x55a79ea3b180 0x94 0xffffffff 0x0 0x2830 0x7ffc8543e1b0 0x7f6e19d9768e\n",
        )
        .unwrap();
        assert_eq!(syscall.number, 232);
        assert_eq!(syscall.args, [4, 94178409427328, 148, 4294967295, 0, 10288]);
        assert_eq!(syscall.stack_pointer, 140722544304560);
        assert_eq!(syscall.program_counter, 140110856812174);
    }

    #[test]
    fn test_parse_syscall_corrupted() {
        assert!(parse_syscall("running\n").is_err());
        assert!(parse_syscall("-1 0x7ffc8543e1b0 0x7f6e19d9768e\n").is_err());
        assert!(parse_syscall("232 0x4 0xzz 0x94 0xffffffff 0x0 0x2830 0x7ffc8543e1b0 0x7f6e19d9768e").is_err());
    }

    #[test]
    fn test_parse_cmdline() {
        assert_eq!(
            parse_cmdline("/usr/bin/python3\0-m\0\0http.server\0"),
            vec!["/usr/bin/python3", "-m", "", "http.server"]
        );
        assert!(parse_cmdline("").is_empty());
    }

    #[test]
    fn test_parse_environ() {
        let environ = parse_environ("HOME=/root\0LANG=C.UTF-8\0BROKEN\0OPTS=a=b\0");
        assert_eq!(environ.len(), 3);
        assert_eq!(environ["HOME"], "/root");
        assert_eq!(environ["OPTS"], "a=b");
        assert!(!environ.contains_key("BROKEN"));
    }
}
