//! Parser for `/proc/<pid>/status`.

use super::common::{TaskState, kilobytes, parse_task_state};
use super::kv::KeyValueParser;
use super::{decimal, hex, number, token_count_error};
use crate::error::ParseError;
use crate::tokenizer::{Base, split, split_spaces};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

/// Pid reported for status fields that were not parsed.
pub const INVALID_PID: i32 = -1;

/// Real, effective, saved set and filesystem ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IdSet {
    pub real: u32,
    pub effective: u32,
    pub saved_set: u32,
    pub filesystem: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Seccomp {
    #[default]
    Disabled,
    Strict,
    Filter,
}

/// Queued signals and the queue limit (`SigQ`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalQueue {
    pub queued: u64,
    pub limit: u64,
}

/// Task information from `/proc/<pid>/status`.
///
/// Memory sizes are in kB. Signal and capability masks are raw bitmaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskStatus {
    pub name: String,
    pub umask: u32,
    pub state: TaskState,
    pub tgid: i32,
    pub ngid: i32,
    pub pid: i32,
    pub ppid: i32,
    pub tracer_pid: i32,
    pub uid: IdSet,
    pub gid: IdSet,
    pub fd_size: u32,
    pub groups: BTreeSet<u32>,
    pub ns_tgid: Vec<i32>,
    pub ns_pid: Vec<i32>,
    pub ns_pgid: Vec<i32>,
    pub ns_sid: Vec<i32>,
    pub vm_peak: u64,
    pub vm_size: u64,
    pub vm_lck: u64,
    pub vm_pin: u64,
    pub vm_hwm: u64,
    pub vm_rss: u64,
    pub rss_anon: u64,
    pub rss_file: u64,
    pub rss_shmem: u64,
    pub vm_data: u64,
    pub vm_stk: u64,
    pub vm_exe: u64,
    pub vm_lib: u64,
    pub vm_pte: u64,
    pub vm_swap: u64,
    pub huge_tlb_pages: u64,
    pub core_dumping: bool,
    pub threads: u32,
    pub sig_q: SignalQueue,
    pub sig_pnd: u64,
    pub shd_pnd: u64,
    pub sig_blk: u64,
    pub sig_ign: u64,
    pub sig_cgt: u64,
    pub cap_inh: u64,
    pub cap_prm: u64,
    pub cap_eff: u64,
    pub cap_bnd: u64,
    pub cap_amb: u64,
    pub no_new_privs: bool,
    pub seccomp: Seccomp,
    pub voluntary_ctxt_switches: u64,
    pub nonvoluntary_ctxt_switches: u64,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self {
            name: String::new(),
            umask: 0,
            state: TaskState::default(),
            tgid: INVALID_PID,
            ngid: INVALID_PID,
            pid: INVALID_PID,
            ppid: INVALID_PID,
            tracer_pid: INVALID_PID,
            uid: IdSet::default(),
            gid: IdSet::default(),
            fd_size: 0,
            groups: BTreeSet::new(),
            ns_tgid: Vec::new(),
            ns_pid: Vec::new(),
            ns_pgid: Vec::new(),
            ns_sid: Vec::new(),
            vm_peak: 0,
            vm_size: 0,
            vm_lck: 0,
            vm_pin: 0,
            vm_hwm: 0,
            vm_rss: 0,
            rss_anon: 0,
            rss_file: 0,
            rss_shmem: 0,
            vm_data: 0,
            vm_stk: 0,
            vm_exe: 0,
            vm_lib: 0,
            vm_pte: 0,
            vm_swap: 0,
            huge_tlb_pages: 0,
            core_dumping: false,
            threads: 1,
            sig_q: SignalQueue::default(),
            sig_pnd: 0,
            shd_pnd: 0,
            sig_blk: 0,
            sig_ign: 0,
            sig_cgt: 0,
            cap_inh: 0,
            cap_prm: 0,
            cap_eff: 0,
            cap_bnd: 0,
            cap_amb: 0,
            no_new_privs: false,
            seccomp: Seccomp::default(),
            voluntary_ctxt_switches: 0,
            nonvoluntary_ctxt_switches: 0,
        }
    }
}

// ============ Value Parsers ============

const NUMBER: &str = "number";

fn parse_id_set(value: &str) -> Result<IdSet, ParseError> {
    const WHAT: &str = "uid set";

    let tokens = split(value, '\t', false);
    if tokens.len() != 4 {
        return Err(token_count_error(WHAT, value));
    }

    Ok(IdSet {
        real: decimal(tokens[0], WHAT, value)?,
        effective: decimal(tokens[1], WHAT, value)?,
        saved_set: decimal(tokens[2], WHAT, value)?,
        filesystem: decimal(tokens[3], WHAT, value)?,
    })
}

fn parse_ns_ids(value: &str) -> Result<Vec<i32>, ParseError> {
    split(value, '\t', false)
        .into_iter()
        .map(|token| decimal(token, "id", value))
        .collect()
}

fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value.as_bytes().first() {
        Some(b'1') => Ok(true),
        Some(b'0') => Ok(false),
        Some(_) => Err(ParseError::new("Corrupted bool - Unexpected value", value)),
        None => Err(ParseError::new("Corrupted bool - Empty value", value)),
    }
}

fn parse_sig_q(value: &str) -> Result<SignalQueue, ParseError> {
    const WHAT: &str = "sig queue";

    let tokens = split(value, '/', false);
    if tokens.len() != 2 {
        return Err(token_count_error(WHAT, value));
    }

    Ok(SignalQueue {
        queued: decimal(tokens[0], WHAT, value)?,
        limit: decimal(tokens[1], WHAT, value)?,
    })
}

macro_rules! status_fields {
    ($parser:expr, $convert:ident, $($key:literal => $field:ident),* $(,)?) => {
        $parser
            $(.field($key, |value, out: &mut TaskStatus| {
                out.$field = $convert(value)?;
                Ok(())
            }))*
    };
}

fn pid(value: &str) -> Result<i32, ParseError> {
    decimal(value, NUMBER, value)
}

fn mask(value: &str) -> Result<u64, ParseError> {
    hex(value, NUMBER, value)
}

fn count(value: &str) -> Result<u64, ParseError> {
    decimal(value, NUMBER, value)
}

static STATUS_PARSER: LazyLock<KeyValueParser<TaskStatus>> = LazyLock::new(|| {
    let parser = KeyValueParser::new(':')
        .field("Name", |value, out: &mut TaskStatus| {
            out.name = value.to_string();
            Ok(())
        })
        .field("Umask", |value, out: &mut TaskStatus| {
            out.umask = number(value, Base::Octal, NUMBER, value)?;
            Ok(())
        })
        .field("State", |value, out: &mut TaskStatus| {
            // `S (sleeping)`: only the code matters.
            let code = value
                .chars()
                .next()
                .ok_or_else(|| ParseError::new("Corrupted state - Empty value", value))?;
            out.state = parse_task_state(code)?;
            Ok(())
        })
        .field("FDSize", |value, out: &mut TaskStatus| {
            out.fd_size = decimal(value, NUMBER, value)?;
            Ok(())
        })
        .field("Groups", |value, out: &mut TaskStatus| {
            // Empty for tasks without supplementary groups.
            for token in split_spaces(value) {
                out.groups.insert(decimal(token, "groups", value)?);
            }
            Ok(())
        })
        .field("Threads", |value, out: &mut TaskStatus| {
            out.threads = decimal(value, NUMBER, value)?;
            Ok(())
        })
        .field("Seccomp", |value, out: &mut TaskStatus| {
            out.seccomp = match decimal::<u32>(value, NUMBER, value)? {
                0 => Seccomp::Disabled,
                1 => Seccomp::Strict,
                2 => Seccomp::Filter,
                _ => return Err(ParseError::new("Corrupted seccomp - Unexpected value", value)),
            };
            Ok(())
        });

    let parser = status_fields!(parser, pid,
        "Tgid" => tgid,
        "Ngid" => ngid,
        "Pid" => pid,
        "PPid" => ppid,
        "TracerPid" => tracer_pid,
    );
    let parser = status_fields!(parser, parse_id_set,
        "Uid" => uid,
        "Gid" => gid,
    );
    let parser = status_fields!(parser, parse_ns_ids,
        "NStgid" => ns_tgid,
        "NSpid" => ns_pid,
        "NSpgid" => ns_pgid,
        "NSsid" => ns_sid,
    );
    let parser = status_fields!(parser, kilobytes,
        "VmPeak" => vm_peak,
        "VmSize" => vm_size,
        "VmLck" => vm_lck,
        "VmPin" => vm_pin,
        "VmHWM" => vm_hwm,
        "VmRSS" => vm_rss,
        "RssAnon" => rss_anon,
        "RssFile" => rss_file,
        "RssShmem" => rss_shmem,
        "VmData" => vm_data,
        "VmStk" => vm_stk,
        "VmExe" => vm_exe,
        "VmLib" => vm_lib,
        "VmPTE" => vm_pte,
        "VmSwap" => vm_swap,
        "HugetlbPages" => huge_tlb_pages,
    );
    let parser = status_fields!(parser, parse_bool,
        "CoreDumping" => core_dumping,
        "NoNewPrivs" => no_new_privs,
    );
    let parser = status_fields!(parser, parse_sig_q,
        "SigQ" => sig_q,
    );
    let parser = status_fields!(parser, mask,
        "SigPnd" => sig_pnd,
        "ShdPnd" => shd_pnd,
        "SigBlk" => sig_blk,
        "SigIgn" => sig_ign,
        "SigCgt" => sig_cgt,
        "CapInh" => cap_inh,
        "CapPrm" => cap_prm,
        "CapEff" => cap_eff,
        "CapBnd" => cap_bnd,
        "CapAmb" => cap_amb,
    );
    status_fields!(parser, count,
        "voluntary_ctxt_switches" => voluntary_ctxt_switches,
        "nonvoluntary_ctxt_switches" => nonvoluntary_ctxt_switches,
    )
});

/// Parses the content of `/proc/<pid>/status`.
///
/// When `keys` is given only those keys are parsed; every other field keeps
/// its default (`INVALID_PID` for pids, 1 for `threads`).
pub fn parse_task_status(
    content: &str,
    keys: Option<&HashSet<String>>,
) -> Result<TaskStatus, ParseError> {
    STATUS_PARSER.parse(content, keys)
}

pub(crate) fn task_status_parser() -> &'static KeyValueParser<TaskStatus> {
    &STATUS_PARSER
}
