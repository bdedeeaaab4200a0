// Tue Jan 13 2026 - Alex

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use decl_model::{
    config::Config,
    diagnostic::{Diagnostic, Severity},
    diff::{DiffReport, DifferenceSeverity, ReportFormat, TypeComparator},
    pipeline::{analyze_snapshot, SourceText},
    registry::{SnapshotModel, TypeRegistry},
    utils::{format_duration, pluralize, LoggingUtils},
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author = "Alex")]
#[command(version = "1.0.0")]
#[command(about = "Type model builder for reverse-engineered C++ declarations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Repeat for more detail (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, global = true)]
    no_color: bool,

    /// ABI and processing options (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Worker threads; 1 runs sequentially
    #[arg(short = 'j', long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the model of one snapshot and report its diagnostics
    Analyze(AnalyzeArgs),
    /// Compare two snapshots
    Diff(DiffArgs),
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Header files or directories to scan for .h/.hpp
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    #[arg(short, long, default_value = "snapshot")]
    snapshot: String,

    /// Write the model as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the computed layout of every record
    #[arg(long)]
    layouts: bool,
}

#[derive(Args, Debug)]
struct DiffArgs {
    #[arg(long, num_args = 1.., required = true)]
    old: Vec<PathBuf>,

    #[arg(long, num_args = 1.., required = true)]
    new: Vec<PathBuf>,

    /// Qualified name of the type to compare; all shared types when omitted
    #[arg(short = 't', long = "type")]
    qualified: Option<String>,

    #[arg(long)]
    json: bool,

    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not report recorded offset changes
    #[arg(long)]
    ignore_offsets: bool,

    /// Do not report field type changes
    #[arg(long)]
    ignore_types: bool,

    /// Do not report base list and size changes
    #[arg(long)]
    no_info: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Text,
    Markdown,
    Json,
}

impl From<Format> for ReportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => ReportFormat::Text,
            Format::Markdown => ReportFormat::Markdown,
            Format::Json => ReportFormat::Json,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    LoggingUtils::init(LoggingUtils::level_from_verbosity(cli.verbose), !cli.no_color);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "[!]".red(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(threads) = cli.threads {
        config = config.with_max_threads(threads.max(1)).with_parallel(threads > 1);
    }
    config.validate()?;

    match cli.command {
        Command::Analyze(args) => analyze(args, &config),
        Command::Diff(args) => diff(args, &config),
    }
}

fn analyze(args: AnalyzeArgs, config: &Config) -> Result<()> {
    let start = Instant::now();
    let sources = load_sources(&args.paths)?;
    println!("{} Analyzing {} as snapshot {}", "[*]".blue(), pluralize(sources.len(), "file", "files"), args.snapshot.as_str().cyan());

    let model = analyze_snapshot(&args.snapshot, &sources, config);
    print_diagnostics(&model.diagnostics);

    if args.layouts {
        print_layouts(&model);
    }

    if let Some(output) = &args.output {
        let json = model.to_json().context("Failed to serialize model")?;
        fs::write(output, json).with_context(|| format!("Failed to write {}", output.display()))?;
        println!("{} Model saved to: {}", "[+]".green(), output.display());
    }

    print_summary(&model, start);
    Ok(())
}

fn diff(args: DiffArgs, config: &Config) -> Result<()> {
    let registry = TypeRegistry::new();
    registry.insert(analyze_snapshot("old", &load_sources(&args.old)?, config));
    registry.insert(analyze_snapshot("new", &load_sources(&args.new)?, config));

    let comparator = TypeComparator::new()
        .with_offset_comparison(!args.ignore_offsets)
        .with_type_comparison(!args.ignore_types)
        .with_informational(!args.no_info);
    let format = if args.json { ReportFormat::Json } else { args.format.into() };
    match &args.qualified {
        Some(qualified) => {
            let diff = registry.diff_with(&comparator, "old", "new", qualified)?;
            let rendered = match format {
                ReportFormat::Json => serde_json::to_string_pretty(&diff)?,
                _ => diff.to_string(),
            };
            emit(&rendered, args.output.as_deref())?;
            if format == ReportFormat::Json && args.output.is_none() {
                return Ok(());
            }
            if diff.is_empty() {
                println!("{} No differences", "[+]".green());
            } else {
                let groups = diff.group_by_severity();
                for severity in [
                    DifferenceSeverity::Breaking,
                    DifferenceSeverity::Moderate,
                    DifferenceSeverity::Minor,
                    DifferenceSeverity::Informational,
                ] {
                    if let Some(changes) = groups.get(&severity) {
                        println!("{} {}: {}", "[*]".blue(), severity, changes.len());
                    }
                }
            }
        }
        None => {
            let (old, new) = match (registry.get("old"), registry.get("new")) {
                (Some(old), Some(new)) => (old, new),
                _ => bail!("Snapshots were not registered"),
            };
            let report = DiffReport::between(&old, &new, &comparator);
            match &args.output {
                Some(path) => {
                    report
                        .write_to_file(path, format)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("{} Report saved to: {}", "[+]".green(), path.display());
                }
                None => print!("{}", report.export(format)),
            }
            if report.has_breaking_changes() {
                eprintln!("{} Snapshots are not ABI compatible", "[!]".red());
            }
        }
    }
    Ok(())
}

fn emit(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} Diff saved to: {}", "[+]".green(), path.display());
        }
        None => println!("{}", rendered.trim_end()),
    }
    Ok(())
}

/// Expands directories into the headers they contain, recursively and in
/// name order.
fn load_sources(paths: &[PathBuf]) -> Result<Vec<SourceText>> {
    let mut files = Vec::new();
    for path in paths {
        collect_headers(path, &mut files)?;
    }
    if files.is_empty() {
        bail!("No .h or .hpp files found");
    }
    files
        .iter()
        .map(|file| SourceText::read(file).with_context(|| format!("Failed to read {}", file.display())))
        .collect()
}

fn collect_headers(path: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    if path.is_file() {
        files.push(path.to_path_buf());
        return Ok(());
    }
    if !path.is_dir() {
        bail!("No such file or directory: {}", path.display());
    }
    let mut entries: Vec<PathBuf> = fs::read_dir(path)
        .with_context(|| format!("Failed to list {}", path.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    entries.sort();
    for entry in entries {
        if entry.is_dir() {
            collect_headers(&entry, files)?;
        } else if matches!(entry.extension().and_then(|e| e.to_str()), Some("h") | Some("hpp")) {
            files.push(entry);
        }
    }
    Ok(())
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        let severity = match diagnostic.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Note => "note".blue().bold(),
        };
        println!(
            "{}: {} [{}]: {}",
            diagnostic.location.to_string().as_str().dimmed(),
            severity,
            diagnostic.kind,
            diagnostic.message
        );
    }
}

fn print_layouts(model: &SnapshotModel) {
    for ty in model.types.values() {
        if let Some(layout) = &ty.layout {
            println!();
            println!("{} {}", ty.kind.to_string().as_str().cyan(), ty.qualified.as_str().bold());
            print!("{}", layout);
        }
    }
}

fn print_summary(model: &SnapshotModel, start: Instant) {
    let count = |severity: Severity| model.diagnostics.iter().filter(|d| d.severity == severity).count();
    println!();
    println!("{}", "=".repeat(50).as_str().cyan());
    println!(
        "{} {} in {}",
        "[+]".green(),
        pluralize(model.types.len(), "type", "types"),
        format_duration(start.elapsed())
    );
    println!(
        "{} {}, {}, {}",
        "[+]".green(),
        pluralize(count(Severity::Error), "error", "errors").as_str().red(),
        pluralize(count(Severity::Warning), "warning", "warnings").as_str().yellow(),
        pluralize(count(Severity::Note), "note", "notes").as_str().blue()
    );
}
