//! Parser for `/proc/<pid>/mountinfo`.

use super::common::{Device, device};
use super::{decimal, token_count_error};
use crate::error::ParseError;
use crate::tokenizer::{split, split_spaces};
use serde::Serialize;

/// A mount point as seen from a task's mount namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Mount {
    pub id: u32,
    pub parent_id: u32,
    pub device: Device,
    /// Root of the mount within the filesystem.
    pub root: String,
    /// Mount point relative to the task's root.
    pub point: String,
    /// Per-mount options.
    pub options: Vec<String>,
    /// Optional tagged fields such as `shared:1` or `master:3`.
    pub optional: Vec<String>,
    pub filesystem_type: String,
    pub source: String,
    /// Per-superblock options.
    pub super_options: Vec<String>,
}

fn options(token: &str) -> Vec<String> {
    split(token, ',', false)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Parses a mountinfo line.
///
/// Format (man 5 proc):
/// `id parent major:minor root point options [optional...] - fstype source superoptions`
///
/// The optional section has a variable length and ends at the literal `-`.
pub fn parse_mountinfo_line(line: &str) -> Result<Mount, ParseError> {
    const WHAT: &str = "mountinfo";
    const OPTIONAL: usize = 6;
    const POST_COUNT: usize = 3;
    const MIN_COUNT: usize = OPTIONAL + 1 + POST_COUNT;

    let tokens = split_spaces(line);
    if tokens.len() < MIN_COUNT {
        return Err(token_count_error(WHAT, line));
    }

    let separator = tokens[OPTIONAL..]
        .iter()
        .position(|token| *token == "-")
        .map(|pos| OPTIONAL + pos)
        .ok_or_else(|| ParseError::new("Corrupted mountinfo - Missing separator", line))?;

    let post = &tokens[separator + 1..];
    if post.len() < POST_COUNT {
        return Err(token_count_error(WHAT, line));
    }

    Ok(Mount {
        id: decimal(tokens[0], WHAT, line)?,
        parent_id: decimal(tokens[1], WHAT, line)?,
        device: device(tokens[2], line)?,
        root: tokens[3].to_string(),
        point: tokens[4].to_string(),
        options: options(tokens[5]),
        optional: tokens[OPTIONAL..separator]
            .iter()
            .map(|token| token.to_string())
            .collect(),
        filesystem_type: post[0].to_string(),
        source: post[1].to_string(),
        super_options: options(post[2]),
    })
}
