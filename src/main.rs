//! RefHunt: finds unreferenced assets in a content repository.
//!
//! Thin binary entry point. All logic lives in the `refhunt-core` crate;
//! this file only parses arguments, wires up logging and prints results.

mod flags;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use flags::{AddressableFlag, DanglingFlag, SortFlag};
use refhunt_core::index::progress::ProgressSink;
use refhunt_core::model::size::{format_count, format_size};
use refhunt_core::model::DependencyDepth;
use refhunt_core::provider::ManifestProvider;
use refhunt_core::query::{deletion_candidates, export, QueryState};
use refhunt_core::rules::IgnoreRules;
use refhunt_core::settings::{AnalysisConfig, JsonSettingsStore};
use refhunt_core::HuntEngine;
use std::cell::Cell;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "refhunt")]
#[command(about = "Find unreferenced assets and what references a given asset", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file holding the ignore patterns
    #[arg(long, global = true, default_value = "refhunt-settings.json")]
    settings: PathBuf,

    /// Analysis config (JSON); missing file means defaults
    #[arg(long, global = true, default_value = "refhunt.json")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the whole repository for unreferenced assets
    Scan(ScanArgs),
    /// List everything that references the given assets
    Refs(RefsArgs),
    /// Show or edit the ignore patterns
    #[command(subcommand)]
    Patterns(PatternsCommand),
}

#[derive(Args)]
struct ScanArgs {
    /// Asset manifest (JSON)
    manifest: PathBuf,

    /// Report every asset with its reference count, not only unreferenced ones
    #[arg(long)]
    all: bool,

    /// Count indirect references too
    #[arg(long)]
    transitive: bool,

    /// Dependencies on assets missing from the manifest
    #[arg(long, value_enum)]
    dangling: Option<DanglingFlag>,

    /// Keep paths containing this text
    #[arg(long, default_value = "")]
    filter: String,

    /// Keep only this type name
    #[arg(long = "type")]
    type_name: Option<String>,

    #[arg(long, value_enum, default_value = "all")]
    addressable: AddressableFlag,

    /// Keep only assets with zero references (with --all)
    #[arg(long)]
    zero_refs: bool,

    /// Keep only assets with a warning (e.g. used only by their atlas)
    #[arg(long)]
    warnings: bool,

    #[arg(long, value_enum, default_value = "path")]
    sort: SortFlag,

    #[arg(long)]
    desc: bool,

    /// 0-based page to show; all rows when omitted
    #[arg(long)]
    page: Option<usize>,

    #[arg(long)]
    page_size: Option<usize>,

    /// Also write the filtered rows as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Delete the filtered unreferenced, non-addressable assets and rewrite the manifest
    #[arg(long)]
    delete: bool,

    /// With --delete, also remove the files next to the manifest
    #[arg(long, requires = "delete")]
    delete_files: bool,
}

#[derive(Args)]
struct RefsArgs {
    /// Asset manifest (JSON)
    manifest: PathBuf,

    /// Asset paths to look up
    #[arg(required = true)]
    paths: Vec<String>,
}

#[derive(Subcommand)]
enum PatternsCommand {
    /// Print the current patterns
    List,
    /// Restore the default patterns
    Reset,
    /// Replace pattern #INDEX
    Set { index: usize, pattern: String },
    /// Append a pattern
    Add { pattern: String },
    /// Remove pattern #INDEX
    Remove { index: usize },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let store = JsonSettingsStore::open(&cli.settings)
        .with_context(|| format!("failed to open settings {}", cli.settings.display()))?;

    match cli.command {
        Command::Scan(args) => scan(args, &cli.config, &store),
        Command::Refs(args) => refs(args, &cli.config, &store),
        Command::Patterns(cmd) => patterns(cmd, &store),
    }
}

/// Prints `label: NN%` on stderr whenever the percentage changes.
struct ConsoleProgress {
    last: Cell<Option<u32>>,
}

impl ConsoleProgress {
    fn new() -> Self {
        Self {
            last: Cell::new(None),
        }
    }
}

impl ProgressSink for ConsoleProgress {
    fn report(&self, label: &str, fraction: f32) {
        let percent = (fraction * 100.0) as u32;
        if self.last.get() == Some(percent) {
            return;
        }
        self.last.set(Some(percent));
        eprint!("\r{label}: {percent:>3}%");
    }

    fn finish(&self, label: &str, duration: std::time::Duration) {
        self.last.set(None);
        eprintln!("\r{label}: done in {duration:.2?}");
    }
}

fn load_config(path: &Path) -> Result<AnalysisConfig> {
    AnalysisConfig::load_or_default(path)
        .with_context(|| format!("failed to read config {}", path.display()))
}

fn load_manifest(path: &Path) -> Result<ManifestProvider> {
    ManifestProvider::load(path)
        .with_context(|| format!("failed to load manifest {}", path.display()))
}

fn scan(args: ScanArgs, config_path: &Path, store: &JsonSettingsStore) -> Result<()> {
    let mut config = load_config(config_path)?;
    if args.all {
        config.unreferenced_only = false;
    }
    if args.transitive {
        config.depth = DependencyDepth::Transitive;
    }
    if let Some(dangling) = args.dangling {
        config.unknown_dependencies = dangling.as_domain();
    }
    if let Some(page_size) = args.page_size.filter(|&n| n > 0) {
        config.page_size = page_size;
    }

    let mut meta = load_manifest(&args.manifest)?.with_file_deletion(args.delete_files);
    let mut engine = HuntEngine::new(config, IgnoreRules::load(store));
    engine.analyse(&meta, &meta, &ConsoleProgress::new());

    let state = QueryState {
        path_filter: args.filter,
        type_filter: args.type_name,
        addressable: args.addressable.as_domain(),
        zero_refs_only: args.zero_refs,
        warnings_only: args.warnings,
        sort: args.sort.as_domain(args.desc),
        page: args.page,
    };

    let Some(result) = engine.result() else {
        return Ok(());
    };
    let Some(page) = engine.query(&state) else {
        return Ok(());
    };

    let mut out = std::io::stdout().lock();
    writeln!(
        out,
        "{} (analysed {})",
        result.summary(),
        result.analysed_at().format("%Y-%m-%d %H:%M:%S")
    )?;
    let types = result
        .type_counts()
        .iter()
        .map(|(name, count)| format!("{name} ({})", format_count(*count as u64)))
        .collect::<Vec<_>>()
        .join(", ");
    writeln!(out, "Types: {types}")?;
    match state.page {
        Some(p) => writeln!(
            out,
            "Page {} of {} ({} matching)",
            p + 1,
            page.page_count.max(1),
            format_count(page.total_filtered as u64)
        )?,
        None => writeln!(out, "{} matching", format_count(page.total_filtered as u64))?,
    }
    for record in &page.items {
        write!(
            out,
            "[{}][{}] {} refs={}",
            record.type_name,
            format_size(record.size_bytes),
            record.path,
            record.references_count
        )?;
        if record.is_addressable {
            write!(out, " addressable")?;
        }
        if let Some(warning) = &record.warning {
            write!(out, " [{warning}]")?;
        }
        writeln!(out)?;
    }

    if let Some(csv_path) = &args.csv {
        export::export_csv(csv_path, &page.items)
            .with_context(|| format!("failed to write {}", csv_path.display()))?;
        tracing::info!("Wrote {} rows to {}", page.items.len(), csv_path.display());
    }

    if args.delete {
        let candidates: Vec<String> = deletion_candidates(result, &state)
            .iter()
            .map(|r| r.path.clone())
            .collect();
        let deleted = engine.delete_selected(&mut meta, &candidates);
        if deleted > 0 {
            meta.save(&args.manifest)
                .with_context(|| format!("failed to rewrite {}", args.manifest.display()))?;
        }
        writeln!(out, "Deleted {deleted} of {} candidates", candidates.len())?;
    }
    Ok(())
}

fn refs(args: RefsArgs, config_path: &Path, store: &JsonSettingsStore) -> Result<()> {
    let config = load_config(config_path)?;
    let meta = load_manifest(&args.manifest)?;
    let mut engine = HuntEngine::new(config, IgnoreRules::load(store));
    let reports = engine.find_references(&args.paths, &meta, &ConsoleProgress::new());

    let mut out = std::io::stdout().lock();
    for report in reports {
        writeln!(out, "{} ({} references)", report.path, report.referencers.len())?;
        if !report.found {
            writeln!(out, "  not found in the repository")?;
        }
        if report.is_addressable {
            writeln!(out, "  addressable: may be loaded without a reference")?;
        }
        if report.in_resources {
            writeln!(out, "  in Resources: may be loaded from code")?;
        }
        for referencer in &report.referencers {
            writeln!(out, "  {referencer}")?;
        }
    }
    Ok(())
}

fn patterns(cmd: PatternsCommand, store: &JsonSettingsStore) -> Result<()> {
    let mut rules = IgnoreRules::load(store);
    match cmd {
        PatternsCommand::List => {}
        PatternsCommand::Reset => rules.set_defaults(),
        PatternsCommand::Set { index, pattern } => {
            if index >= rules.len() {
                anyhow::bail!("no pattern #{index}; there are {}", rules.len());
            }
            rules.set_pattern(index, &pattern)?;
        }
        PatternsCommand::Add { pattern } => rules.push(pattern)?,
        PatternsCommand::Remove { index } => {
            if rules.remove(index).is_none() {
                anyhow::bail!("no pattern #{index}; there are {}", rules.len());
            }
        }
    }
    if rules.save_if_dirty(store)? {
        tracing::info!("Saved {} patterns to {}", rules.len(), store.path().display());
    }
    println!("{}", rules.describe());
    Ok(())
}
