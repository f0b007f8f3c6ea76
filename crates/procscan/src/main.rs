//! procscan - inspect Linux procfs and sysfs from the command line.
//!
//! Every subcommand is a thin layer over `procscan-core` readers; `--json`
//! prints the parsed records as they are.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::collections::{BTreeMap, HashSet};
use std::error::Error as StdError;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{Level, debug, info, warn};
use tracing_subscriber::EnvFilter;

use procscan_core::parser::{Action, IpAddress, NetSocket};
use procscan_core::reader::{DEFAULT_PROCFS_ROOT, DEFAULT_SYSFS_ROOT};
use procscan_core::{Error, FileSystem, Procfs, RealFs, Sysfs, Task};

type CliResult<T> = Result<T, Box<dyn StdError>>;

/// Inspect Linux procfs and sysfs.
#[derive(Parser)]
#[command(name = "procscan", about = "Inspect Linux procfs and sysfs", version)]
struct Args {
    /// Path to /proc filesystem.
    #[arg(long, default_value = DEFAULT_PROCFS_ROOT, global = true)]
    proc_path: PathBuf,

    /// Path to /sys filesystem.
    #[arg(long, default_value = DEFAULT_SYSFS_ROOT, global = true)]
    sys_path: PathBuf,

    /// Output as pretty JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace). Default is warn.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List loaded kernel modules.
    Lsmod {
        /// Only modules whose name contains this pattern.
        pattern: Option<String>,
    },
    /// List sockets owned by tasks.
    Netstat {
        #[arg(value_enum)]
        protocol: Protocol,
        /// Tasks to inspect. All tasks when omitted.
        pids: Vec<i32>,
    },
    /// Show the mount table seen by a task.
    Mounts {
        /// Task id. Defaults to procscan itself.
        pid: Option<i32>,
    },
    /// Show the status of a task.
    Status {
        pid: i32,
        /// Only parse these keys, e.g. `Name,VmRSS`.
        #[arg(long, value_delimiter = ',')]
        keys: Option<Vec<String>>,
    },
    /// Show load, uptime, memory and block devices.
    System,
}

#[derive(Clone, Copy, ValueEnum)]
enum Protocol {
    Tcp,
    Udp,
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is WARN. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) -> CliResult<()> {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("procscan={}", level).parse()?)
        .add_directive(format!("procscan_core={}", level).parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ── lsmod ────────────────────────────────────────────────────────────────────

fn lsmod<F: FileSystem>(procfs: &Procfs<F>, pattern: Option<&str>, json: bool) -> CliResult<()> {
    let modules: Vec<_> = procfs
        .modules()?
        .into_iter()
        .filter(|module| pattern.is_none_or(|pattern| module.name.contains(pattern)))
        .collect();

    if json {
        return print_json(&modules);
    }

    println!("{:<24} {:>10}  Used by", "Module", "Size");
    for module in &modules {
        println!(
            "{:<24} {:>10}  {} {}",
            module.name,
            module.size,
            module.instances,
            module.dependencies.join(",")
        );
    }
    Ok(())
}

// ── netstat ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct OwnedSocket {
    pid: i32,
    protocol: &'static str,
    #[serde(flatten)]
    socket: NetSocket,
}

/// Maps socket inodes to the task holding them.
fn socket_owners<F: FileSystem>(tasks: &[Task<'_, F>]) -> BTreeMap<u64, i32> {
    let mut owners = BTreeMap::new();
    for task in tasks {
        match task.fd_socket_inodes() {
            Ok(inodes) => {
                for inode in inodes {
                    owners.entry(inode).or_insert(task.id());
                }
            }
            Err(e) => warn!(pid = task.id(), error = %e, "skipping task"),
        }
    }
    owners
}

fn netstat<F: FileSystem>(
    procfs: &Procfs<F>,
    protocol: Protocol,
    pids: &[i32],
    json: bool,
) -> CliResult<()> {
    let tasks = if pids.is_empty() {
        procfs.tasks()?
    } else {
        let mut tasks = Vec::with_capacity(pids.len());
        for &pid in pids {
            match procfs.task(pid) {
                Ok(task) => tasks.push(task),
                Err(e) => warn!(pid, error = %e, "skipping task"),
            }
        }
        tasks
    };

    let owners = socket_owners(&tasks);
    info!(tasks = tasks.len(), sockets = owners.len(), "collected socket owners");

    let owned = |socket: &NetSocket| {
        if owners.contains_key(&socket.inode) {
            Action::Keep
        } else {
            Action::Drop
        }
    };

    let net = procfs.net();
    let tables = match protocol {
        Protocol::Tcp => [("tcp", net.tcp(Some(&owned))), ("tcp6", net.tcp6(Some(&owned)))],
        Protocol::Udp => [("udp", net.udp(Some(&owned))), ("udp6", net.udp6(Some(&owned)))],
    };

    let mut sockets = Vec::new();
    for (name, table) in tables {
        let table = match table {
            Ok(table) => table,
            // IPv6 may be disabled
            Err(e) if e.is_not_found() => {
                debug!(table = name, "table not available");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        for socket in table {
            let pid = owners.get(&socket.inode).copied().unwrap_or_default();
            sockets.push(OwnedSocket {
                pid,
                protocol: name,
                socket,
            });
        }
    }

    if json {
        return print_json(&sockets);
    }

    println!(
        "{:<6} {:<45} {:<45} {:<12} {:>8}",
        "Proto", "Local Address", "Foreign Address", "State", "PID"
    );
    for entry in &sockets {
        let socket = &entry.socket;
        println!(
            "{:<6} {:<45} {:<45} {:<12} {:>8}",
            entry.protocol,
            endpoint(&socket.local_ip, socket.local_port),
            endpoint(&socket.remote_ip, socket.remote_port),
            socket.state.name(),
            entry.pid
        );
    }
    Ok(())
}

fn endpoint(ip: &IpAddress, port: u16) -> String {
    if ip.is_v4() {
        format!("{}:{}", ip, port)
    } else {
        format!("[{}]:{}", ip, port)
    }
}

// ── mounts / status ──────────────────────────────────────────────────────────

fn mounts<F: FileSystem>(procfs: &Procfs<F>, pid: Option<i32>, json: bool) -> CliResult<()> {
    let task = match pid {
        Some(pid) => procfs.task(pid)?,
        None => procfs.self_task()?,
    };
    let mounts = task.mountinfo()?;

    if json {
        return print_json(&mounts);
    }

    for mount in &mounts {
        println!(
            "{} on {} type {} ({})",
            mount.source,
            mount.point,
            mount.filesystem_type,
            mount.options.join(",")
        );
    }
    Ok(())
}

fn status<F: FileSystem>(
    procfs: &Procfs<F>,
    pid: i32,
    keys: Option<&[String]>,
    json: bool,
) -> CliResult<()> {
    let keys: Option<HashSet<String>> = keys.map(|keys| keys.iter().cloned().collect());
    let status = procfs.task(pid)?.status(keys.as_ref())?;

    if json {
        return print_json(&status);
    }

    println!("Name:     {}", status.name);
    println!("State:    {}", status.state.code());
    println!("Pid:      {}", status.pid);
    println!("PPid:     {}", status.ppid);
    println!("Uid:      {}", status.uid.real);
    println!("Threads:  {}", status.threads);
    println!("VmRSS:    {} kB", status.vm_rss);
    Ok(())
}

// ── system ───────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct BlockSummary {
    name: String,
    rotational: bool,
    read_sectors: u64,
    write_sectors: u64,
}

#[derive(Serialize)]
struct SystemSummary {
    load: [f64; 3],
    uptime_secs: f64,
    boot_time: Option<DateTime<Utc>>,
    mem_total_kb: u64,
    mem_available_kb: u64,
    block_devices: Vec<BlockSummary>,
}

fn block_summaries<F: FileSystem>(sysfs: &Sysfs<F>) -> Vec<BlockSummary> {
    let devices = match sysfs.block_devices() {
        Ok(devices) => devices,
        Err(e) => {
            warn!(error = %e, "block devices unavailable");
            return Vec::new();
        }
    };

    let mut summaries = Vec::with_capacity(devices.len());
    for device in devices {
        let summary = device.stat().and_then(|stat| {
            Ok(BlockSummary {
                name: device.name().to_string(),
                rotational: device.is_rotational()?,
                read_sectors: stat.read_sectors,
                write_sectors: stat.write_sectors,
            })
        });
        match summary {
            Ok(summary) => summaries.push(summary),
            Err(e) => warn!(device = device.name(), error = %e, "skipping block device"),
        }
    }
    summaries
}

fn system<F: FileSystem, S: FileSystem>(
    procfs: &Procfs<F>,
    sysfs: &Sysfs<S>,
    json: bool,
) -> CliResult<()> {
    let loadavg = procfs.loadavg()?;
    let uptime = procfs.uptime()?;
    let meminfo = procfs.meminfo()?;
    let keys: HashSet<String> = ["btime".to_string()].into();
    let stat = procfs.stat(Some(&keys))?;

    let summary = SystemSummary {
        load: [loadavg.last_1min, loadavg.last_5min, loadavg.last_15min],
        uptime_secs: uptime.system_time.as_secs_f64(),
        boot_time: stat.boot_time(),
        mem_total_kb: meminfo.get("MemTotal").copied().unwrap_or_default(),
        mem_available_kb: meminfo.get("MemAvailable").copied().unwrap_or_default(),
        block_devices: block_summaries(sysfs),
    };

    if json {
        return print_json(&summary);
    }

    println!(
        "load average: {:.2}, {:.2}, {:.2}",
        summary.load[0], summary.load[1], summary.load[2]
    );
    println!("uptime:       {:.0}s", summary.uptime_secs);
    if let Some(boot_time) = summary.boot_time {
        println!("booted:       {}", boot_time.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!(
        "memory:       {} kB total, {} kB available",
        summary.mem_total_kb, summary.mem_available_kb
    );
    for device in &summary.block_devices {
        println!(
            "disk {:<12} {} read {} / written {} sectors",
            device.name,
            if device.rotational { "hdd" } else { "ssd" },
            device.read_sectors,
            device.write_sectors
        );
    }
    Ok(())
}

fn run(args: Args) -> CliResult<()> {
    let procfs = Procfs::new(RealFs::new(), &args.proc_path);
    debug!(root = %procfs.root().display(), "using procfs");

    match args.command {
        Command::Lsmod { pattern } => lsmod(&procfs, pattern.as_deref(), args.json),
        Command::Netstat { protocol, pids } => netstat(&procfs, protocol, &pids, args.json),
        Command::Mounts { pid } => mounts(&procfs, pid, args.json),
        Command::Status { pid, keys } => status(&procfs, pid, keys.as_deref(), args.json),
        Command::System => {
            let sysfs = Sysfs::new(RealFs::new(), &args.sys_path);
            system(&procfs, &sysfs, args.json)
        }
    }
}

fn print_error_chain(error: &dyn StdError) {
    eprintln!("error: {}", error);
    let mut source = error.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
}

fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(args.verbose, args.quiet) {
        eprintln!("invalid log filter: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(args) {
        if let Some(error) = e.downcast_ref::<Error>() {
            debug!(path = %error.path().display(), "failed");
        }
        print_error_chain(e.as_ref());
        std::process::exit(1);
    }
}
