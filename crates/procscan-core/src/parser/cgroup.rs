//! Parsers for `/proc/<pid>/cgroup` and `/proc/cgroups`.

use super::{decimal, token_count_error};
use crate::error::ParseError;
use crate::tokenizer::split;
use serde::Serialize;

/// Membership of a task in one cgroup hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cgroup {
    /// Hierarchy id; `0` for the unified (v2) hierarchy.
    pub hierarchy: u32,
    /// Controllers bound to the hierarchy, empty for v2.
    pub controllers: Vec<String>,
    pub pathname: String,
}

/// A controller line of `/proc/cgroups`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CgroupController {
    pub subsys_name: String,
    pub hierarchy: u32,
    pub num_cgroups: u32,
    pub enabled: bool,
}

/// Parses `hierarchy:controllers:pathname`, e.g. `5:cpu,cpuacct:/user.slice`
/// or `0::/init.scope`.
pub fn parse_cgroup_line(line: &str) -> Result<Cgroup, ParseError> {
    const WHAT: &str = "cgroup";

    let tokens = split(line, ':', true);
    if tokens.len() != 3 {
        return Err(token_count_error("cgroup line", line));
    }

    Ok(Cgroup {
        hierarchy: decimal(tokens[0], WHAT, line)?,
        controllers: split(tokens[1], ',', false)
            .into_iter()
            .map(str::to_string)
            .collect(),
        pathname: tokens[2].to_string(),
    })
}

/// Parses a tab separated line of `/proc/cgroups`: `cpu\t5\t33\t1`.
pub fn parse_cgroup_controller_line(line: &str) -> Result<CgroupController, ParseError> {
    const WHAT: &str = "cgroup controller";

    let tokens = split(line, '\t', false);
    if tokens.len() != 4 {
        return Err(token_count_error("cgroup controller line", line));
    }

    let enabled = match tokens[3] {
        "0" => false,
        "1" => true,
        _ => {
            return Err(ParseError::new(
                "Corrupted cgroup controller line - Unexpected enabled value",
                line,
            ));
        }
    };

    Ok(CgroupController {
        subsys_name: tokens[0].to_string(),
        hierarchy: decimal(tokens[1], WHAT, line)?,
        num_cgroups: decimal(tokens[2], WHAT, line)?,
        enabled,
    })
}
