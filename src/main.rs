//! kxrtools CLI - extracts KXR asset containers.
//!
//! This is the main entry point for the kxrtools command-line application.

mod inputs;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use kxrtools::archive::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_ENTRY_SIZE};
use kxrtools::prelude::*;

use crate::inputs::{default_cache_dir, default_output_dir, Inputs, MANIFEST_FILE_NAME};

/// kxrtools - KXR container extraction tool
#[derive(Parser)]
#[command(name = "kxrtools")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract KXR containers
    Extract {
        /// Container files, pkg.json files or folders holding them
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, env = "KXR_OUTPUT")]
        output: Option<PathBuf>,

        /// Package manifest naming numeric entries
        #[arg(short, long, env = "KXR_MANIFEST")]
        manifest: Option<PathBuf>,

        /// Launcher cache folder, added to the inputs when it exists
        #[arg(long, env = "KXR_CACHE_DIR")]
        cache_dir: Option<PathBuf>,

        /// Do not scan the launcher cache folder
        #[arg(long)]
        no_cache: bool,

        /// Continue without asking when the manifest is missing
        #[arg(short, long)]
        yes: bool,

        /// Deepest directory nesting accepted from a TOC
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Largest decoded size in bytes accepted for one compressed entry
        #[arg(long, default_value_t = DEFAULT_MAX_ENTRY_SIZE)]
        max_entry_size: usize,
    },

    /// List the contents of a KXR container
    List {
        /// Path to the container
        container: PathBuf,

        /// Package manifest used to show resolved names
        #[arg(short, long, env = "KXR_MANIFEST")]
        manifest: Option<PathBuf>,
    },
}

struct ExtractArgs {
    inputs: Vec<PathBuf>,
    output: PathBuf,
    manifest: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    yes: bool,
    max_depth: usize,
    max_entry_size: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Extract {
            inputs,
            output,
            manifest,
            cache_dir,
            no_cache,
            yes,
            max_depth,
            max_entry_size,
        } => {
            let cache_dir = if no_cache {
                None
            } else {
                cache_dir.or_else(default_cache_dir)
            };

            cmd_extract(ExtractArgs {
                inputs,
                output: output.unwrap_or_else(default_output_dir),
                manifest,
                cache_dir,
                yes,
                max_depth,
                max_entry_size,
            })?;
        }
        Commands::List { container, manifest } => {
            cmd_list(&container, manifest.as_deref())?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn cmd_extract(args: ExtractArgs) -> Result<()> {
    let mut paths = args.inputs;
    if let Some(cache) = args.cache_dir.filter(|dir| dir.is_dir()) {
        tracing::info!("Scanning launcher cache: {}", cache.display());
        paths.push(cache);
    }

    let inputs = Inputs::collect(paths);
    let options = ExtractOptions {
        max_depth: args.max_depth,
        max_entry_size: args.max_entry_size,
    };

    let sink = DirectorySink::create(&args.output)
        .with_context(|| format!("Failed to create output directory {}", args.output.display()))?;
    println!("Output directory: {}", sink.root().display());

    // The launcher carries pkg.json, so it goes first with an empty manifest.
    let mut manifest_path = args.manifest;
    if let Some(launcher) = &inputs.launcher {
        println!("Extracting launcher: {}", launcher.display());

        let empty = ManifestResolver::new();
        let mut extractor = Extractor::new(sink.clone(), &empty).with_options(options);
        match extractor.extract_file(launcher) {
            Ok(summary) => report(launcher, &summary),
            Err(e) => tracing::warn!("Failed to extract {}: {}", launcher.display(), e),
        }

        let extracted = sink.root().join(MANIFEST_FILE_NAME);
        if manifest_path.is_none() && extracted.is_file() {
            manifest_path = Some(extracted);
        }
    }
    let manifest_path = manifest_path.or(inputs.manifest);

    if inputs.containers.is_empty() {
        println!("No valid files were passed");
        return Ok(());
    }

    let manifest = match load_manifest(manifest_path.as_deref()) {
        Some(manifest) => manifest,
        None => {
            if !args.yes && !confirm_without_manifest()? {
                println!("Aborted");
                return Ok(());
            }
            ManifestResolver::new()
        }
    };

    println!("Extracting {} containers...", inputs.containers.len());

    let pb = ProgressBar::new(inputs.containers.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let mut extractor = Extractor::new(sink, &manifest).with_options(options);
    let mut totals = Totals::default();

    for path in &inputs.containers {
        pb.set_message(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );

        match extractor.extract_file(path) {
            Ok(summary) => {
                pb.suspend(|| report(path, &summary));
                totals.add(&summary);
            }
            Err(e) => {
                pb.suspend(|| tracing::warn!("Failed to extract {}: {}", path.display(), e));
                totals.containers_failed += 1;
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();

    println!(
        "{} files extracted, {} entries failed, {} containers incomplete, {} containers unreadable ({:?})",
        totals.files,
        totals.entries_failed,
        totals.containers_incomplete,
        totals.containers_failed,
        start.elapsed()
    );
    println!("Extraction complete!");

    Ok(())
}

fn cmd_list(container_path: &Path, manifest_path: Option<&Path>) -> Result<()> {
    let container = KxrContainer::open(container_path).context("Failed to open KXR container")?;
    let manifest = manifest_path.and_then(|p| load_manifest(Some(p))).unwrap_or_default();
    let extractor = Extractor::new(NullSink, &manifest);

    println!(
        "{} ({} bytes, TOC at {:#x}, {} bytes)",
        container.name(),
        container.len(),
        container.header().toc_offset(),
        container.header().toc_length()
    );

    let mut files = 0usize;
    let mut directories = 0usize;
    for item in container.walk() {
        match item.context("Failed to read TOC")? {
            TocItem::Directory { path, children } => {
                println!("{:>5} {:>10} {:>10} {}/ ({} children)", "dir", "", "", path.display(), children);
                directories += 1;
            }
            TocItem::File(entry) => {
                let resolved = extractor.output_path(&container, &entry);
                let path = entry.path();
                if resolved == path {
                    println!("{:>5} {:>10} {:>10} {}", entry.kind, entry.offset, entry.length, path.display());
                } else {
                    println!(
                        "{:>5} {:>10} {:>10} {} -> {}",
                        entry.kind,
                        entry.offset,
                        entry.length,
                        path.display(),
                        resolved.display()
                    );
                }
                files += 1;
            }
        }
    }

    println!("\nTotal: {} files in {} directories", files, directories);

    Ok(())
}

/// Load the manifest, logging why it is unusable.
fn load_manifest(path: Option<&Path>) -> Option<ManifestResolver> {
    let Some(path) = path else {
        tracing::warn!("No {} found", MANIFEST_FILE_NAME);
        return None;
    };

    match ManifestResolver::from_path(path) {
        Ok(manifest) => {
            tracing::info!("Loaded manifest: {}", path.display());
            Some(manifest)
        }
        Err(e) => {
            tracing::warn!("Failed to load {}: {}", path.display(), e);
            None
        }
    }
}

fn confirm_without_manifest() -> Result<bool> {
    println!("Failed to find or parse '{}'.", MANIFEST_FILE_NAME);
    println!("Output files will NOT be named correctly.");
    print!("Continue? [y/n] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_confirmation(&answer))
}

/// A single `y` or `Y` accepts.
fn is_confirmation(answer: &str) -> bool {
    matches!(answer.trim(), "y" | "Y")
}

fn report(path: &Path, summary: &ExtractSummary) {
    tracing::info!(
        "{}: {} files, {} directories, {} failed",
        path.display(),
        summary.extracted.len(),
        summary.directories,
        summary.failures.len()
    );

    if let Some(e) = &summary.toc_error {
        tracing::warn!("{}: TOC walk stopped early: {}", path.display(), e);
    }
}

#[derive(Debug, Default)]
struct Totals {
    files: usize,
    entries_failed: usize,
    /// Containers whose TOC walk stopped early
    containers_incomplete: usize,
    /// Containers that could not be opened at all
    containers_failed: usize,
}

impl Totals {
    fn add(&mut self, summary: &ExtractSummary) {
        self.files += summary.extracted.len();
        self.entries_failed += summary.failures.len();
        if summary.toc_error.is_some() {
            self.containers_incomplete += 1;
        }
    }
}

/// Sink that discards data; used where only output paths are needed.
struct NullSink;

impl OutputSink for NullSink {
    fn write(&mut self, _path: &Path, _data: &[u8]) -> io::Result<()> {
        Ok(())
    }
}
