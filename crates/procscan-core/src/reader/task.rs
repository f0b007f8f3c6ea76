//! Reader for a single task directory (`/proc/<pid>` or
//! `/proc/<pid>/task/<tid>`).

use super::{Net, numeric_entries, parse_file, read_file, read_line};
use crate::error::Error;
use crate::fs::FileSystem;
use crate::parser::lines::collect_file_lines;
use crate::parser::status::task_status_parser;
use crate::parser::task::task_io_parser;
use crate::parser::{
    Cgroup, IdMap, IoStats, MemMap, MemRegion, MemStats, Mount, Syscall, TaskStat, TaskStatus,
    parse_cgroup_line, parse_cmdline, parse_environ, parse_id_map_line, parse_maps_line,
    parse_mountinfo_line, parse_smaps, parse_statm, parse_syscall, parse_task_stat,
};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A process or thread.
///
/// The handle does not keep the task alive: when it exits, every read
/// fails with a not-found [`Error::Open`].
#[derive(Debug)]
pub struct Task<'a, F: FileSystem> {
    fs: &'a F,
    id: i32,
    dir: PathBuf,
}

impl<'a, F: FileSystem> Task<'a, F> {
    pub(crate) fn new(fs: &'a F, id: i32, dir: PathBuf) -> Self {
        Self { fs, id, dir }
    }

    /// Process or thread id.
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn stat(&self) -> Result<TaskStat, Error> {
        parse_file(self.fs, &self.path("stat"), parse_task_stat)
    }

    pub fn statm(&self) -> Result<MemStats, Error> {
        parse_file(self.fs, &self.path("statm"), parse_statm)
    }

    /// Parses `status`, optionally restricted to the given keys
    /// (e.g. `Name`, `VmRSS`).
    pub fn status(&self, keys: Option<&HashSet<String>>) -> Result<TaskStatus, Error> {
        task_status_parser().parse_file(self.fs, &self.path("status"), keys)
    }

    /// I/O accounting. Only readable by the task owner or root.
    pub fn io(&self) -> Result<IoStats, Error> {
        task_io_parser().parse_file(self.fs, &self.path("io"), None)
    }

    pub fn cgroups(&self) -> Result<Vec<Cgroup>, Error> {
        collect_file_lines(self.fs, &self.path("cgroup"), parse_cgroup_line, None, 0)
    }

    /// Command line arguments. Empty for kernel threads and zombies.
    pub fn cmdline(&self) -> Result<Vec<String>, Error> {
        read_file(self.fs, &self.path("cmdline")).map(|content| parse_cmdline(&content))
    }

    pub fn comm(&self) -> Result<String, Error> {
        read_line(self.fs, &self.path("comm"))
    }

    pub fn environ(&self) -> Result<BTreeMap<String, String>, Error> {
        read_file(self.fs, &self.path("environ")).map(|content| parse_environ(&content))
    }

    pub fn maps(&self) -> Result<Vec<MemRegion>, Error> {
        collect_file_lines(self.fs, &self.path("maps"), parse_maps_line, None, 0)
    }

    pub fn smaps(&self) -> Result<Vec<MemMap>, Error> {
        parse_file(self.fs, &self.path("smaps"), parse_smaps)
    }

    /// Mounts visible from the task's mount namespace.
    pub fn mountinfo(&self) -> Result<Vec<Mount>, Error> {
        collect_file_lines(self.fs, &self.path("mountinfo"), parse_mountinfo_line, None, 0)
    }

    pub fn uid_map(&self) -> Result<Vec<IdMap>, Error> {
        collect_file_lines(self.fs, &self.path("uid_map"), parse_id_map_line, None, 0)
    }

    pub fn gid_map(&self) -> Result<Vec<IdMap>, Error> {
        collect_file_lines(self.fs, &self.path("gid_map"), parse_id_map_line, None, 0)
    }

    pub fn syscall(&self) -> Result<Syscall, Error> {
        parse_file(self.fs, &self.path("syscall"), parse_syscall)
    }

    /// Inodes of the sockets the task holds open.
    ///
    /// Descriptors closed while the directory is scanned are skipped.
    pub fn fd_socket_inodes(&self) -> Result<BTreeSet<u64>, Error> {
        let fd_dir = self.path("fd");
        let fds = self.fs.read_dir(&fd_dir).map_err(|e| Error::open(&fd_dir, e))?;

        let mut inodes = BTreeSet::new();
        for fd in fds {
            let target = match self.fs.read_link(&fd) {
                Ok(target) => target,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(fd = %fd.display(), "descriptor closed during scan");
                    continue;
                }
                Err(e) => return Err(Error::open(&fd, e)),
            };

            if let Some(inode) = target.to_str().and_then(socket_inode) {
                inodes.insert(inode);
            }
        }

        debug!(task = self.id, count = inodes.len(), "collected socket inodes");
        Ok(inodes)
    }

    /// Network tables of the task's network namespace.
    pub fn net(&self) -> Net<'a, F> {
        Net::new(self.fs, self.path("net"))
    }

    /// Threads of this task, ordered by tid.
    pub fn threads(&self) -> Result<Vec<Task<'a, F>>, Error> {
        let threads = numeric_entries(self.fs, &self.path("task"))?
            .into_iter()
            .map(|(tid, dir)| Task::new(self.fs, tid, dir))
            .collect();
        Ok(threads)
    }
}

/// Extracts `N` from a `socket:[N]` link target.
fn socket_inode(target: &str) -> Option<u64> {
    target
        .strip_prefix("socket:[")?
        .strip_suffix(']')?
        .parse()
        .ok()
}
