//! Reader for system-wide `/proc` files.

use super::{Net, Task, numeric_entries, parse_file, read_line};
use crate::error::Error;
use crate::fs::FileSystem;
use crate::parser::lines::{collect_file_lines, parse_file_lines};
use crate::parser::stat::proc_stat_parser;
use crate::parser::{
    CgroupController, LoadAverage, Module, ProcStat, Uptime, Zone, parse_buddyinfo_line,
    parse_cgroup_controller_line, parse_filesystems_line, parse_loadavg, parse_meminfo_line,
    parse_modules_line, parse_uptime,
};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Entry point for everything under a procfs mount.
///
/// # Example
///
/// ```ignore
/// use procscan_core::fs::RealFs;
/// use procscan_core::reader::{DEFAULT_PROCFS_ROOT, Procfs};
///
/// let procfs = Procfs::new(RealFs::new(), DEFAULT_PROCFS_ROOT);
/// let loadavg = procfs.loadavg()?;
/// ```
#[derive(Debug)]
pub struct Procfs<F: FileSystem> {
    fs: F,
    root: PathBuf,
}

impl<F: FileSystem> Procfs<F> {
    /// Creates a reader for the procfs mounted at `root`.
    pub fn new(fs: F, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Free memory fragments per zone (`/proc/buddyinfo`).
    pub fn buddyinfo(&self) -> Result<Vec<Zone>, Error> {
        collect_file_lines(&self.fs, &self.path("buddyinfo"), parse_buddyinfo_line, None, 0)
    }

    /// Cgroup v1 controllers (`/proc/cgroups`).
    pub fn cgroup_controllers(&self) -> Result<Vec<CgroupController>, Error> {
        const HEADER_LINES: usize = 1;
        collect_file_lines(
            &self.fs,
            &self.path("cgroups"),
            parse_cgroup_controller_line,
            None,
            HEADER_LINES,
        )
    }

    /// Kernel command line (`/proc/cmdline`).
    pub fn cmdline(&self) -> Result<String, Error> {
        read_line(&self.fs, &self.path("cmdline"))
    }

    /// Supported filesystems, mapped to whether they need a block device.
    pub fn filesystems(&self) -> Result<BTreeMap<String, bool>, Error> {
        let mut output = BTreeMap::new();
        parse_file_lines(
            &self.fs,
            &self.path("filesystems"),
            &mut output,
            parse_filesystems_line,
            None,
            0,
        )?;
        Ok(output)
    }

    /// Memory usage counters in kB (`/proc/meminfo`), keyed by name.
    pub fn meminfo(&self) -> Result<BTreeMap<String, u64>, Error> {
        let mut output = BTreeMap::new();
        parse_file_lines(
            &self.fs,
            &self.path("meminfo"),
            &mut output,
            parse_meminfo_line,
            None,
            0,
        )?;
        Ok(output)
    }

    pub fn loadavg(&self) -> Result<LoadAverage, Error> {
        parse_file(&self.fs, &self.path("loadavg"), parse_loadavg)
    }

    pub fn uptime(&self) -> Result<Uptime, Error> {
        parse_file(&self.fs, &self.path("uptime"), parse_uptime)
    }

    /// Kernel statistics (`/proc/stat`), optionally restricted to `keys`.
    pub fn stat(&self, keys: Option<&HashSet<String>>) -> Result<ProcStat, Error> {
        proc_stat_parser().parse_file(&self.fs, &self.path("stat"), keys)
    }

    /// Loaded kernel modules (`/proc/modules`).
    pub fn modules(&self) -> Result<Vec<Module>, Error> {
        collect_file_lines(&self.fs, &self.path("modules"), parse_modules_line, None, 0)
    }

    pub fn version(&self) -> Result<String, Error> {
        read_line(&self.fs, &self.path("version"))
    }

    /// Ubuntu kernel signature (`/proc/version_signature`).
    pub fn version_signature(&self) -> Result<String, Error> {
        read_line(&self.fs, &self.path("version_signature"))
    }

    /// Network tables of the namespace procfs was mounted from.
    pub fn net(&self) -> Net<'_, F> {
        Net::new(&self.fs, self.path("net"))
    }

    /// Opens the task `pid`.
    ///
    /// Fails with a not-found [`Error::Open`] when the task does not exist.
    pub fn task(&self, pid: i32) -> Result<Task<'_, F>, Error> {
        let dir = self.root.join(pid.to_string());
        if !self.fs.exists(&dir) {
            return Err(Error::open(
                dir,
                io::Error::new(io::ErrorKind::NotFound, "no such task"),
            ));
        }
        Ok(Task::new(&self.fs, pid, dir))
    }

    /// Every task currently listed in the procfs root, ordered by pid.
    ///
    /// Tasks may exit at any moment, so a listed task can fail on its first
    /// read; callers decide whether to skip it.
    pub fn tasks(&self) -> Result<Vec<Task<'_, F>>, Error> {
        let tasks = numeric_entries(&self.fs, &self.root)?
            .into_iter()
            .map(|(pid, dir)| Task::new(&self.fs, pid, dir))
            .collect();
        Ok(tasks)
    }

    /// The task reading procfs, resolved through the `self` link.
    pub fn self_task(&self) -> Result<Task<'_, F>, Error> {
        let link = self.path("self");
        let target = self
            .fs
            .read_link(&link)
            .map_err(|e| Error::open(&link, e))?;

        let pid = target
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.parse::<i32>().ok())
            .ok_or_else(|| {
                Error::open(
                    &link,
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("unexpected link target {}", target.display()),
                    ),
                )
            })?;

        debug!(pid, "resolved self task");
        self.task(pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFs;
    use crate::parser::ModuleState;
    use std::time::Duration;

    fn procfs(fs: MockFs) -> Procfs<MockFs> {
        Procfs::new(fs, "/proc")
    }

    #[test]
    fn test_system_files() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/loadavg", "0.12 0.34 5.04 1/112 5935\n");
        fs.add_file("/proc/uptime", "3600.50 7000.25\n");
        fs.add_file("/proc/cmdline", "BOOT_IMAGE=/vmlinuz root=/dev/sda1 ro quiet\n");
        fs.add_file("/proc/version", "Linux version 6.8.0-31-generic (buildd@lcy02-amd64-080)\n");
        fs.add_file("/proc/version_signature", "Ubuntu 6.8.0-31.31-generic 6.8.1\n");
        let procfs = procfs(fs);

        let loadavg = procfs.loadavg().unwrap();
        assert_eq!(loadavg.runnable_tasks, 1);
        assert_eq!(loadavg.total_tasks, 112);

        let uptime = procfs.uptime().unwrap();
        assert_eq!(uptime.system_time, Duration::from_millis(3_600_500));

        assert_eq!(
            procfs.cmdline().unwrap(),
            "BOOT_IMAGE=/vmlinuz root=/dev/sda1 ro quiet"
        );
        assert!(procfs.version().unwrap().starts_with("Linux version 6.8.0"));
        assert_eq!(
            procfs.version_signature().unwrap(),
            "Ubuntu 6.8.0-31.31-generic 6.8.1"
        );
    }

    #[test]
    fn test_meminfo_and_filesystems() {
        let mut fs = MockFs::new();
        fs.add_file(
            "/proc/meminfo",
            "MemTotal:       16323412 kB\nMemFree:         1207144 kB\nHugePages_Total:       0\n",
        );
        fs.add_file("/proc/filesystems", "nodev\tsysfs\nnodev\tproc\n\text4\n\tvfat\n");
        let procfs = procfs(fs);

        let meminfo = procfs.meminfo().unwrap();
        assert_eq!(meminfo["MemTotal"], 16323412);
        assert_eq!(meminfo["HugePages_Total"], 0);
        assert_eq!(meminfo.len(), 3);

        let filesystems = procfs.filesystems().unwrap();
        assert_eq!(filesystems.get("ext4"), Some(&true));
        assert_eq!(filesystems.get("proc"), Some(&false));
        assert_eq!(filesystems.len(), 4);
    }

    #[test]
    fn test_modules_buddyinfo_cgroups() {
        let mut fs = MockFs::new();
        fs.add_file(
            "/proc/modules",
            "raid1 40960 0 - Live 0xffffffffc03eb000\nvboxsf 81920 1 - Loading 0x0000000000000000 (OE)\n",
        );
        fs.add_file(
            "/proc/buddyinfo",
            "Node 0, zone      DMA      1      1      1      0      2      1      1      0      1      1      3\n",
        );
        fs.add_file(
            "/proc/cgroups",
            "#subsys_name\thierarchy\tnum_cgroups\tenabled\ncpuset\t6\t1\t1\nmemory\t8\t76\t1\n",
        );
        let procfs = procfs(fs);

        let modules = procfs.modules().unwrap();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[1].state, ModuleState::Loading);
        assert!(modules[1].is_out_of_tree);

        let zones = procfs.buddyinfo().unwrap();
        assert_eq!(zones[0].name, "DMA");

        let controllers = procfs.cgroup_controllers().unwrap();
        assert_eq!(controllers.len(), 2);
        assert_eq!(controllers[1].subsys_name, "memory");
        assert_eq!(controllers[1].num_cgroups, 76);
    }

    #[test]
    fn test_stat() {
        let mut fs = MockFs::new();
        fs.add_file(
            "/proc/stat",
            "cpu  10 0 5 100 0 0 0 0 0 0\ncpu0 10 0 5 100 0 0 0 0 0 0\nbtime 1623330600\n",
        );
        let procfs = procfs(fs);

        let stat = procfs.stat(None).unwrap();
        assert_eq!(stat.cpus.len(), 1);
        assert_eq!(stat.boot_time().unwrap().timestamp(), 1623330600);
    }

    #[test]
    fn test_missing_file() {
        let err = procfs(MockFs::new()).loadavg().unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.path(), Path::new("/proc/loadavg"));
    }

    #[test]
    fn test_tasks() {
        let mut fs = MockFs::new();
        fs.add_task("/proc", 1, &[("comm", "systemd\n")]);
        fs.add_task("/proc", 42, &[("comm", "bash\n")]);
        fs.add_task("/proc", 7, &[("comm", "kthreadd\n")]);
        fs.add_link("/proc/self", "42");
        fs.add_dir("/proc/sys");
        let procfs = procfs(fs);

        let ids: Vec<i32> = procfs.tasks().unwrap().iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![1, 7, 42]);

        let task = procfs.task(42).unwrap();
        assert_eq!(task.comm().unwrap(), "bash");

        assert!(procfs.task(1000).unwrap_err().is_not_found());

        let me = procfs.self_task().unwrap();
        assert_eq!(me.id(), 42);
        assert_eq!(me.dir(), Path::new("/proc/42"));
    }

    #[test]
    fn test_self_task_bad_link() {
        let mut fs = MockFs::new();
        fs.add_link("/proc/self", "not-a-pid");
        let err = procfs(fs).self_task().unwrap_err();
        assert!(matches!(err, Error::Open { .. }));
    }
}
