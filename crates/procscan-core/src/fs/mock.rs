//! In-memory mock filesystem for testing readers without a real `/proc`.
//!
//! This module provides `MockFs`, which simulates `/proc` and `/sys` trees in
//! memory so tests run on any platform and in CI.

use super::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
    /// Set of directories (for read_dir support).
    directories: HashSet<PathBuf>,
    /// Map from symlink path to its target.
    links: HashMap<PathBuf, PathBuf>,
}

impl MockFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    /// Adds a symbolic link pointing at `target`.
    pub fn add_link(&mut self, path: impl AsRef<Path>, target: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.links.insert(path, target.as_ref().to_path_buf());
    }

    /// Adds a task directory `<root>/<pid>` with the given files.
    ///
    /// # Arguments
    /// * `root` - procfs root, usually `/proc`
    /// * `pid` - Task ID
    /// * `files` - `(name, content)` pairs relative to the task directory
    pub fn add_task(&mut self, root: impl AsRef<Path>, pid: i32, files: &[(&str, &str)]) {
        let base = root.as_ref().join(pid.to_string());
        self.add_dir(&base);
        for (name, content) in files {
            self.add_file(base.join(name), *content);
        }
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

fn not_found(kind: &str, path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} not found: {:?}", kind, path),
    )
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| not_found("file", path))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
            || self.directories.contains(path)
            || self.links.contains_key(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(not_found("directory", path));
        }

        let children = self
            .files
            .keys()
            .chain(self.links.keys())
            .chain(self.directories.iter().filter(|d| d.as_path() != path))
            .filter(|p| p.parent().is_some_and(|parent| parent == path))
            .cloned()
            .collect::<HashSet<_>>();

        Ok(children.into_iter().collect())
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        self.links
            .get(path)
            .cloned()
            .ok_or_else(|| not_found("link", path))
    }
}
