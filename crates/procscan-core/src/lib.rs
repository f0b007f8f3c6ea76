//! procscan-core: typed access to the Linux `/proc` and `/sys` text formats.
//!
//! Provides:
//! - `tokenizer` — splitting, trimming and strict number conversion
//! - `parser` — pure per-format parsers plus the key/value and line engines
//! - `fs` — filesystem abstraction (`RealFs`, `MockFs`)
//! - `reader` — readers binding a procfs/sysfs root to the parsers
//! - `error` — `ParseError` for content, `Error` for file access
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           reader                             │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐    │
//! │  │   Procfs     │  │  Task / Net  │  │  Sysfs           │    │
//! │  │ - meminfo    │  │ - status     │  │  - block/*/stat  │    │
//! │  │ - stat       │  │ - maps       │  │  - rotational    │    │
//! │  └──────┬───────┘  └──────┬───────┘  └────────┬─────────┘    │
//! │         └─────────────────┼───────────────────┘              │
//! │                    ┌──────▼──────┐                           │
//! │                    │  FileSystem │ (trait)                   │
//! │                    └──────┬──────┘                           │
//! └───────────────────────────┼──────────────────────────────────┘
//!                             │ content
//!                      ┌──────▼──────┐      ┌──────────────┐
//!                      │   parser    │ ───▶ │  tokenizer   │
//!                      │ kv / lines  │      └──────────────┘
//!                      └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use procscan_core::{Procfs, RealFs};
//! use procscan_core::reader::DEFAULT_PROCFS_ROOT;
//!
//! let procfs = Procfs::new(RealFs::new(), DEFAULT_PROCFS_ROOT);
//! for task in procfs.tasks()? {
//!     let status = task.status(None)?;
//!     println!("{} {}", status.pid, status.name);
//! }
//! ```
//!
//! ```
//! use procscan_core::{MockFs, Procfs};
//!
//! let mut fs = MockFs::new();
//! fs.add_file("/proc/loadavg", "0.12 0.34 5.04 1/112 5935\n");
//! let procfs = Procfs::new(fs, "/proc");
//! assert_eq!(procfs.loadavg().unwrap().total_tasks, 112);
//! ```

pub mod error;
pub mod fs;
pub mod parser;
pub mod reader;
pub mod tokenizer;

pub use error::{Error, ParseError};
pub use fs::{FileSystem, MockFs, RealFs};
pub use reader::{BlockDevice, Net, Procfs, Sysfs, Task};
