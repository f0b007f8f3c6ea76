//! Reader for block device attributes under `<sysfs>/block`.

use super::parse_file;
use crate::error::Error;
use crate::fs::FileSystem;
use crate::parser::{BlockStat, parse_block_stat, parse_rotational};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Entry point for a sysfs mount.
#[derive(Debug)]
pub struct Sysfs<F: FileSystem> {
    fs: F,
    root: PathBuf,
}

impl<F: FileSystem> Sysfs<F> {
    /// Creates a reader for the sysfs mounted at `root`.
    pub fn new(fs: F, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All block devices, ordered by name.
    pub fn block_devices(&self) -> Result<Vec<BlockDevice<'_, F>>, Error> {
        let block_dir = self.root.join("block");
        let entries = self
            .fs
            .read_dir(&block_dir)
            .map_err(|e| Error::open(&block_dir, e))?;

        let mut devices = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(name) = entry.file_name().and_then(|name| name.to_str()) else {
                warn!(path = %entry.display(), "skipping block device with non UTF-8 name");
                continue;
            };
            let name = name.to_string();
            devices.push(BlockDevice {
                fs: &self.fs,
                name,
                dir: entry,
            });
        }
        devices.sort_unstable_by(|a, b| a.name.cmp(&b.name));

        debug!(count = devices.len(), "enumerated block devices");
        Ok(devices)
    }

    /// The block device `name`, e.g. `sda` or `nvme0n1`. Existence is
    /// checked on the first read.
    pub fn block(&self, name: &str) -> BlockDevice<'_, F> {
        BlockDevice {
            fs: &self.fs,
            name: name.to_string(),
            dir: self.root.join("block").join(name),
        }
    }
}

/// A whole-disk block device.
#[derive(Debug)]
pub struct BlockDevice<'a, F: FileSystem> {
    fs: &'a F,
    name: String,
    dir: PathBuf,
}

impl<F: FileSystem> BlockDevice<'_, F> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// I/O counters (`stat`).
    pub fn stat(&self) -> Result<BlockStat, Error> {
        parse_file(self.fs, &self.dir.join("stat"), parse_block_stat)
    }

    pub fn is_rotational(&self) -> Result<bool, Error> {
        parse_file(
            self.fs,
            &self.dir.join("queue").join("rotational"),
            parse_rotational,
        )
    }
}
