//! Driver for files holding one record per line.

use crate::error::{Error, ParseError};
use crate::fs::FileSystem;
use std::path::Path;
use tracing::debug;

/// Decision returned by a record filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Keep,
    Drop,
}

/// Parses every record line of `content` into `out`.
///
/// The first `skip` lines (column headers) are ignored unconditionally and
/// blank lines are ignored everywhere. The filter sees the fully parsed
/// record; records it drops are not inserted. The first line that fails to
/// parse aborts the whole call.
pub fn parse_lines<T, C>(
    content: &str,
    out: &mut C,
    parser: impl Fn(&str) -> Result<T, ParseError>,
    filter: Option<&dyn Fn(&T) -> Action>,
    skip: usize,
) -> Result<(), ParseError>
where
    C: Extend<T>,
{
    for line in content.lines().skip(skip) {
        if line.is_empty() {
            continue;
        }

        let record = parser(line)?;
        if filter.is_some_and(|filter| filter(&record) == Action::Drop) {
            continue;
        }
        out.extend(std::iter::once(record));
    }
    Ok(())
}

/// Reads `path` through `fs` and feeds it to [`parse_lines`].
pub fn parse_file_lines<F, T, C>(
    fs: &F,
    path: &Path,
    out: &mut C,
    parser: impl Fn(&str) -> Result<T, ParseError>,
    filter: Option<&dyn Fn(&T) -> Action>,
    skip: usize,
) -> Result<(), Error>
where
    F: FileSystem + ?Sized,
    C: Extend<T>,
{
    debug!(path = %path.display(), "reading");
    let content = fs
        .read_to_string(path)
        .map_err(|e| Error::open(path, e))?;
    parse_lines(&content, out, parser, filter, skip).map_err(|e| Error::parse(path, e))
}

/// Collects every record of `path` into a `Vec`, in file order.
pub fn collect_file_lines<F, T>(
    fs: &F,
    path: &Path,
    parser: impl Fn(&str) -> Result<T, ParseError>,
    filter: Option<&dyn Fn(&T) -> Action>,
    skip: usize,
) -> Result<Vec<T>, Error>
where
    F: FileSystem + ?Sized,
{
    let mut out = Vec::new();
    parse_file_lines(fs, path, &mut out, parser, filter, skip)?;
    Ok(out)
}
