//! Table-driven parser for whole-file `key<delim>value` tables.
//!
//! Files such as `/proc/<pid>/status`, `/proc/<pid>/io` and `/proc/stat` are
//! a list of keyed lines feeding one record. A `KeyValueParser` maps every
//! key it knows to a setter that parses the value into the record; keys it
//! does not know are skipped, so newer kernels adding fields do not break
//! parsing.

use crate::error::{Error, ParseError};
use crate::fs::FileSystem;
use crate::tokenizer::{ltrim, rtrim, split_once};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

/// Parses a single value into the record being built.
pub type ValueParser<T> = fn(&str, &mut T) -> Result<(), ParseError>;

/// Rewrites a key before dispatch, e.g. `cpu3` -> `cpu_single`.
pub type KeyRemap = fn(&str) -> &str;

/// Generic key/value file parser.
///
/// `T` is the accumulator: it starts as `T::default()`, every known key
/// mutates it in place, and it is returned once the input is exhausted.
pub struct KeyValueParser<T> {
    delim: char,
    parsers: HashMap<&'static str, ValueParser<T>>,
    remap: Option<KeyRemap>,
}

impl<T: Default> KeyValueParser<T> {
    pub fn new(delim: char) -> Self {
        Self {
            delim,
            parsers: HashMap::new(),
            remap: None,
        }
    }

    /// Registers the value parser for `key`.
    pub fn field(mut self, key: &'static str, parser: ValueParser<T>) -> Self {
        self.parsers.insert(key, parser);
        self
    }

    /// Registers the same value parser for several keys.
    pub fn fields(mut self, keys: &[&'static str], parser: ValueParser<T>) -> Self {
        for key in keys {
            self.parsers.insert(*key, parser);
        }
        self
    }

    /// Installs a key remap hook applied after the key is trimmed.
    pub fn remap(mut self, remap: KeyRemap) -> Self {
        self.remap = Some(remap);
        self
    }

    /// Parses `content` line by line.
    ///
    /// When `keys` is given, only those (remapped) keys are parsed and every
    /// other field keeps its default value.
    pub fn parse(&self, content: &str, keys: Option<&HashSet<String>>) -> Result<T, ParseError> {
        let mut output = T::default();
        for line in content.lines() {
            if line.is_empty() {
                continue;
            }
            self.parse_line(line, keys, &mut output)?;
        }
        Ok(output)
    }

    /// Dispatches a single `key<delim>value` line into `output`.
    ///
    /// Used directly by formats that interleave keyed lines with other
    /// records, such as `smaps`.
    pub fn parse_line(
        &self,
        line: &str,
        keys: Option<&HashSet<String>>,
        output: &mut T,
    ) -> Result<(), ParseError> {
        let (key, value) = split_once(line, self.delim);
        if key.is_empty() {
            return Err(ParseError::new("Corrupted line - Missing key", line));
        }

        let mut key = rtrim(key);
        if let Some(remap) = self.remap {
            key = remap(key);
        }

        if keys.is_some_and(|keys| !keys.contains(key)) {
            return Ok(());
        }

        // The value might legitimately be empty (a task without groups).
        match self.parsers.get(key) {
            Some(parser) => parser(ltrim(value), output),
            None => Ok(()),
        }
    }

    /// Reads `path` through `fs` and parses it.
    pub fn parse_file<F: FileSystem + ?Sized>(
        &self,
        fs: &F,
        path: &Path,
        keys: Option<&HashSet<String>>,
    ) -> Result<T, Error> {
        debug!(path = %path.display(), "reading");
        let content = fs
            .read_to_string(path)
            .map_err(|e| Error::open(path, e))?;
        self.parse(&content, keys)
            .map_err(|e| Error::parse(path, e))
    }
}
