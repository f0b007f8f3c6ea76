//! Parsers for `/proc/<pid>/maps` and `/proc/<pid>/smaps`.

use super::common::{Device, device, kilobytes};
use super::kv::KeyValueParser;
use super::{decimal, hex, token_count_error};
use crate::error::ParseError;
use crate::tokenizer::{split, split_spaces};
use serde::Serialize;
use std::sync::LazyLock;

/// Access permissions of a memory region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Perms {
    pub can_read: bool,
    pub can_write: bool,
    pub can_execute: bool,
    pub is_private: bool,
    pub is_shared: bool,
}

/// A line of `/proc/<pid>/maps`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemRegion {
    pub start_address: u64,
    pub end_address: u64,
    pub perm: Perms,
    pub offset: u64,
    pub device: Device,
    pub inode: u64,
    /// Backing file or pseudo-path such as `[stack]`; empty for anonymous
    /// mappings.
    pub pathname: String,
}

/// A region of `/proc/<pid>/smaps` with its memory accounting.
///
/// All sizes are in kB.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemMap {
    pub region: MemRegion,
    pub size: u64,
    pub kernel_page_size: u64,
    pub mmu_page_size: u64,
    pub rss: u64,
    pub pss: u64,
    pub pss_dirty: u64,
    pub shared_clean: u64,
    pub shared_dirty: u64,
    pub private_clean: u64,
    pub private_dirty: u64,
    pub referenced: u64,
    pub anonymous: u64,
    pub ksm: u64,
    pub lazy_free: u64,
    pub anon_huge_pages: u64,
    pub shmem_pmd_mapped: u64,
    pub file_pmd_mapped: u64,
    pub shared_hugetlb: u64,
    pub private_hugetlb: u64,
    pub swap: u64,
    pub swap_pss: u64,
    pub locked: u64,
    pub thp_eligible: bool,
    /// Raw `VmFlags` mnemonics, e.g. `rd ex mr mw me`.
    pub vm_flags: String,
}

// ============ Maps Parser ============

fn parse_perms(token: &str, line: &str) -> Result<Perms, ParseError> {
    let bytes = token.as_bytes();
    if bytes.len() != 4 || !matches!(bytes[3], b'p' | b's') {
        return Err(ParseError::new("Corrupted permissions", line));
    }
    Ok(Perms {
        can_read: bytes[0] == b'r',
        can_write: bytes[1] == b'w',
        can_execute: bytes[2] == b'x',
        is_private: bytes[3] == b'p',
        is_shared: bytes[3] == b's',
    })
}

/// Parses a maps line (also the header line of each smaps block).
///
/// Format: `start-end perms offset major:minor inode [pathname]`, e.g.
/// `7f0b476c6000-7f0b476c7000 r--p 00027000 fd:00 2097554    /lib/ld-2.27.so`
///
/// Paths containing spaces are split by the tokenizer, so every token after
/// the inode is joined back with single spaces.
pub fn parse_maps_line(line: &str) -> Result<MemRegion, ParseError> {
    const MIN_COUNT: usize = 5;
    const PATHNAME: usize = 5;

    let tokens = split_spaces(line);
    if tokens.len() < MIN_COUNT {
        return Err(token_count_error("maps line", line));
    }

    let address = split(tokens[0], '-', false);
    if address.len() != 2 {
        return Err(token_count_error("address", line));
    }

    Ok(MemRegion {
        start_address: hex(address[0], "address", line)?,
        end_address: hex(address[1], "address", line)?,
        perm: parse_perms(tokens[1], line)?,
        offset: hex(tokens[2], "offset", line)?,
        device: device(tokens[3], line)?,
        inode: decimal(tokens[4], "inode", line)?,
        pathname: tokens[PATHNAME..].join(" "),
    })
}

// ============ Smaps Parser ============

macro_rules! size_fields {
    ($parser:expr, $($key:literal => $field:ident),* $(,)?) => {
        $parser
            $(.field($key, |value, out: &mut MemMap| {
                out.$field = kilobytes(value)?;
                Ok(())
            }))*
    };
}

static SMAPS_PARSER: LazyLock<KeyValueParser<MemMap>> = LazyLock::new(|| {
    let parser = size_fields!(
        KeyValueParser::new(':'),
        "Size" => size,
        "KernelPageSize" => kernel_page_size,
        "MMUPageSize" => mmu_page_size,
        "Rss" => rss,
        "Pss" => pss,
        "Pss_Dirty" => pss_dirty,
        "Shared_Clean" => shared_clean,
        "Shared_Dirty" => shared_dirty,
        "Private_Clean" => private_clean,
        "Private_Dirty" => private_dirty,
        "Referenced" => referenced,
        "Anonymous" => anonymous,
        "KSM" => ksm,
        "LazyFree" => lazy_free,
        "AnonHugePages" => anon_huge_pages,
        "ShmemPmdMapped" => shmem_pmd_mapped,
        "FilePmdMapped" => file_pmd_mapped,
        "Shared_Hugetlb" => shared_hugetlb,
        "Private_Hugetlb" => private_hugetlb,
        "Swap" => swap,
        "SwapPss" => swap_pss,
        "Locked" => locked,
    );

    parser
        .field("THPeligible", |value, out: &mut MemMap| {
            out.thp_eligible = decimal::<i32>(value, "THPeligible", value)? != 0;
            Ok(())
        })
        .field("VmFlags", |value, out: &mut MemMap| {
            out.vm_flags = value.to_string();
            Ok(())
        })
});

/// Returns true for the region header line that opens an smaps block.
fn is_smaps_header(line: &str) -> bool {
    let tokens = split_spaces(line);
    tokens.len() >= 5 && tokens[0] != "VmFlags:"
}

/// Parses the whole content of `/proc/<pid>/smaps`.
///
/// Each block starts with a maps-style header line followed by `Key: value`
/// lines; a block ends at the next header or at the end of the input.
pub fn parse_smaps(content: &str) -> Result<Vec<MemMap>, ParseError> {
    let mut maps = Vec::new();
    let mut current: Option<MemMap> = None;

    for line in content.lines() {
        if line.is_empty() {
            continue;
        }

        if is_smaps_header(line) {
            if let Some(done) = current.take() {
                maps.push(done);
            }
            current = Some(MemMap {
                region: parse_maps_line(line)?,
                ..Default::default()
            });
            continue;
        }

        let Some(map) = current.as_mut() else {
            return Err(ParseError::new("Corrupted block - Missing header", line));
        };
        SMAPS_PARSER.parse_line(line, None, map)?;
    }

    if let Some(done) = current {
        maps.push(done);
    }

    Ok(maps)
}
