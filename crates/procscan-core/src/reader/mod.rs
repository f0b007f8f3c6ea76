//! Typed readers binding a filesystem root to the format parsers.
//!
//! A reader only knows where a file lives and which parser understands it;
//! all I/O goes through [`FileSystem`], so every reader works against the
//! live system as well as against [`MockFs`](crate::fs::MockFs) fixtures.
//!
//! Nothing is cached: every call reads the file again.

mod net;
mod procfs;
mod sysfs;
mod task;

pub use net::{Filter, Net};
pub use procfs::Procfs;
pub use sysfs::{BlockDevice, Sysfs};
pub use task::Task;

use crate::error::{Error, ParseError};
use crate::fs::FileSystem;
use crate::tokenizer::trim;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default mount point of procfs.
pub const DEFAULT_PROCFS_ROOT: &str = "/proc";

/// Default mount point of sysfs.
pub const DEFAULT_SYSFS_ROOT: &str = "/sys";

/// Reads a whole file, mapping failures to [`Error::Open`].
pub(crate) fn read_file<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<String, Error> {
    debug!(path = %path.display(), "reading");
    fs.read_to_string(path).map_err(|e| Error::open(path, e))
}

/// Reads a single-value file such as `comm` or `/proc/version`.
pub(crate) fn read_line<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<String, Error> {
    let content = read_file(fs, path)?;
    let line = content.lines().next().unwrap_or_default();
    Ok(trim(line).to_string())
}

/// Reads `path` and hands the whole content to `parser`.
pub(crate) fn parse_file<F, T>(
    fs: &F,
    path: &Path,
    parser: impl FnOnce(&str) -> Result<T, ParseError>,
) -> Result<T, Error>
where
    F: FileSystem + ?Sized,
{
    let content = read_file(fs, path)?;
    parser(&content).map_err(|e| Error::parse(path, e))
}

/// Lists the entries of `dir` whose name is a number, in ascending order.
///
/// Used for pid and tid directories; `self`, `net` and friends are skipped.
pub(crate) fn numeric_entries<F: FileSystem + ?Sized>(
    fs: &F,
    dir: &Path,
) -> Result<Vec<(i32, PathBuf)>, Error> {
    let entries = fs.read_dir(dir).map_err(|e| Error::open(dir, e))?;

    let mut ids: Vec<(i32, PathBuf)> = entries
        .into_iter()
        .filter_map(|entry| {
            let id = entry.file_name()?.to_str()?.parse::<i32>().ok()?;
            Some((id, entry))
        })
        .collect();
    ids.sort_unstable_by_key(|(id, _)| *id);

    debug!(dir = %dir.display(), count = ids.len(), "enumerated numeric entries");
    Ok(ids)
}
