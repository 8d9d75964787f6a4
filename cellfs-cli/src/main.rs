// cellfs-cli/src/main.rs

mod utils;

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use cellfs::prelude::*;
use cellfs::{format_unix, format_volume_id};
use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::utils::{LogLevel, path, set_log_level};

#[derive(Parser)]
#[command(name = "cellfs", version, about = "Inspect and edit cellfs images", long_about = None)]
struct Cli {
    /// Image file
    image: PathBuf,

    #[command(subcommand)]
    command: Commands,

    /// Only print command output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Print each step
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print device I/O counters when done
    #[arg(long, global = true)]
    stats: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create (or overwrite) an image
    Format {
        /// Image size in blocks
        #[arg(short, long, default_value_t = CELLFS_BITMAP_WIDTH)]
        blocks: u64,
        /// Volume label (up to 16 bytes)
        #[arg(short, long)]
        label: Option<String>,
        /// Zero every data block, not only the metadata blocks
        #[arg(long)]
        full: bool,
    },
    /// Show superblock and usage
    Info,
    /// List a container
    Ls {
        #[arg(default_value = "/")]
        path: String,
        /// Show id, kind, size and modification time
        #[arg(short, long)]
        long: bool,
    },
    /// Print a leaf's content
    Cat { path: String },
    /// Copy a host file into a leaf, creating it if needed
    Put {
        path: String,
        source: PathBuf,
        /// Byte offset inside the leaf
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
    /// Create a container
    Mkdir {
        path: String,
        /// Create missing parents, accept an existing container
        #[arg(short, long)]
        parents: bool,
    },
    /// Remove a leaf or an empty container
    Rm { path: String },
    /// Verify image consistency
    Check {
        /// Stop after the first phase reporting an error
        #[arg(long)]
        fail_fast: bool,
        /// Also print informational findings
        #[arg(long)]
        all: bool,
    },
}

type ImageFs<'a> = CellFs<IOCounter<StdCellIO<'a, File>>>;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    set_log_level(if cli.quiet {
        LogLevel::Quiet
    } else if cli.verbose {
        LogLevel::Verbose
    } else {
        LogLevel::Normal
    });

    if let Commands::Format { blocks, label, full } = &cli.command {
        return format_image(&cli.image, *blocks, label.clone(), *full);
    }

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(&cli.image)
        .with_context(|| format!("cannot open {}", cli.image.display()))?;
    let io = IOCounter::new(StdCellIO::durable(&mut file));
    let fs = CellFs::mount(io).with_context(|| format!("cannot mount {}", cli.image.display()))?;
    log_verbose!("mounted {}", cli.image.display());

    run(&fs, cli.command)?;

    if cli.stats {
        let s = fs.with_device(|io| io.snapshot());
        log_normal!(
            "io: {} reads ({} B), {} writes ({} B), {} flushes",
            s.reads,
            s.read_bytes,
            s.writes,
            s.write_bytes,
            s.flushes
        );
    }
    fs.unmount()?;
    Ok(())
}

fn format_image(image: &Path, blocks: u64, label: Option<String>, full: bool) -> anyhow::Result<()> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(image)
        .with_context(|| format!("cannot create {}", image.display()))?;

    let bytes = blocks
        .checked_mul(CELLFS_BLOCK_SIZE as u64)
        .context("image size overflows")?;
    if file.metadata()?.len() < bytes {
        file.set_len(bytes)?;
        log_verbose!("resized {} to {bytes} bytes", image.display());
    }

    let mut opts = FormatOptions::default().with_device_blocks(blocks);
    if let Some(label) = label {
        opts = opts.with_label(label);
    }

    let mut io = StdCellIO::durable(&mut file);
    CellFormatter::new(&mut io, opts)
        .format(full)
        .with_context(|| format!("cannot format {}", image.display()))?;

    log_info!(
        "formatted {} ({} blocks, {} format)",
        image.display(),
        blocks.min(CELLFS_BITMAP_WIDTH),
        if full { "full" } else { "quick" }
    );
    Ok(())
}

fn run(fs: &ImageFs<'_>, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Format { .. } => bail!("cannot format a mounted image"),
        Commands::Info => info(fs),
        Commands::Ls { path, long } => ls(fs, &path, long),
        Commands::Cat { path } => cat(fs, &path),
        Commands::Put {
            path,
            source,
            offset,
        } => put(fs, &path, &source, offset),
        Commands::Mkdir { path, parents } => mkdir(fs, &path, parents),
        Commands::Rm { path } => rm(fs, &path),
        Commands::Check { fail_fast, all } => check(fs, fail_fast, all),
    }
}

fn info(fs: &ImageFs<'_>) -> anyhow::Result<()> {
    let st = fs.statfs()?;
    log_normal!("label:       {}", if st.label.is_empty() { "-" } else { &st.label });
    log_normal!("volume id:   {}", format_volume_id(&st.volume_id));
    log_normal!("created:     {}", format_unix(st.created_at));
    log_normal!("block size:  {}", st.block_size);
    log_normal!("blocks:      {} free / {}", st.free_blocks, st.total_blocks);
    log_normal!("identifiers: {} free / {}", st.free_ids, st.total_ids);
    log_normal!("table slots: {} / {}", st.object_count, st.max_objects);
    Ok(())
}

fn ls(fs: &ImageFs<'_>, target: &str, long: bool) -> anyhow::Result<()> {
    let id = path::resolve(fs, &path::components(target))?;
    let entries = fs
        .list_children(id)
        .with_context(|| format!("cannot list '{target}'"))?;

    for entry in entries {
        if !long {
            log_normal!("{}", entry.name);
            continue;
        }
        let meta = fs.get_metadata(entry.id)?;
        let name = match meta.kind {
            ObjectKind::Container => format!("{}/", entry.name).blue().bold().to_string(),
            ObjectKind::Leaf => entry.name.clone(),
        };
        log_normal!(
            "{:>4}  {:<9}  {:>5}  {}  {}",
            meta.id,
            meta.kind.to_string(),
            meta.size,
            format_unix(meta.modified_at),
            name
        );
    }
    Ok(())
}

fn cat(fs: &ImageFs<'_>, target: &str) -> anyhow::Result<()> {
    let id = path::resolve(fs, &path::components(target))?;
    let bytes = fs
        .read_content(id, 0, CELLFS_BLOCK_SIZE)
        .with_context(|| format!("cannot read '{target}'"))?;
    let mut out = std::io::stdout().lock();
    out.write_all(&bytes)?;
    out.flush()?;
    Ok(())
}

fn put(fs: &ImageFs<'_>, target: &str, source: &Path, offset: u64) -> anyhow::Result<()> {
    let data = std::fs::read(source).with_context(|| format!("cannot read {}", source.display()))?;
    let (parent_parts, name) = path::split_last(target)?;
    let parent = path::resolve(fs, &parent_parts)?;

    let id = match fs.lookup(parent, name)? {
        Some(id) => id,
        None => {
            let id = fs.create_object(parent, name, ObjectKind::Leaf)?;
            log_verbose!("created leaf '{target}' (id {id})");
            id
        }
    };

    let written = fs
        .write_content(id, offset, &data)
        .with_context(|| format!("cannot write {} bytes to '{target}'", data.len()))?;
    log_info!("wrote {written} bytes to '{target}'");
    Ok(())
}

fn mkdir(fs: &ImageFs<'_>, target: &str, parents: bool) -> anyhow::Result<()> {
    let parts = path::components(target);
    if parts.is_empty() {
        bail!("the root container always exists");
    }

    let mut current = CELLFS_ROOT_ID;
    for (depth, part) in parts.iter().enumerate() {
        let last = depth + 1 == parts.len();
        current = match fs.lookup(current, part)? {
            Some(id) if !last || parents => {
                if fs.get_metadata(id)?.kind != ObjectKind::Container {
                    bail!("'{part}' is not a container");
                }
                id
            }
            Some(_) => bail!("'{target}' already exists"),
            None if last || parents => {
                let id = fs.create_object(current, part, ObjectKind::Container)?;
                log_verbose!("created container '{part}' (id {id})");
                id
            }
            None => bail!("'{part}' not found (use --parents)"),
        };
    }
    log_info!("created '{target}'");
    Ok(())
}

fn rm(fs: &ImageFs<'_>, target: &str) -> anyhow::Result<()> {
    let (parent_parts, name) = path::split_last(target)?;
    let parent = path::resolve(fs, &parent_parts)?;
    let id = fs
        .lookup(parent, name)?
        .with_context(|| format!("'{target}' not found"))?;
    fs.remove_object(parent, id, name)
        .with_context(|| format!("cannot remove '{target}'"))?;
    log_info!("removed '{target}' (id {id})");
    Ok(())
}

fn check(fs: &ImageFs<'_>, fail_fast: bool, all: bool) -> anyhow::Result<()> {
    let opts = CellCheckOptions {
        fail_fast,
        ..CellCheckOptions::default()
    };
    let report = fs.check_with(&opts)?;

    let shown = report.display_with(ReportDisplayOpts {
        min_level: if all { Severity::Info } else { Severity::Warn },
        prefix: "  ",
        show_summary: true,
        ..ReportDisplayOpts::default()
    });
    print!("{shown}");

    if report.ok() {
        log_info!("{}", "image is consistent".green());
        Ok(())
    } else {
        bail!("{}", "image has errors".red().bold());
    }
}
