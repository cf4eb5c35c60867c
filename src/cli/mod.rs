//! # CLI Module
//!
//! Command-line interface for the photo triage engine.
//!
//! ## Usage
//! ```bash
//! # Triage a directory
//! photo-triage scan ~/Photos
//!
//! # Stricter near-duplicate matching
//! photo-triage scan ~/Photos --threshold 3
//!
//! # JSON output for scripting
//! photo-triage scan ~/Photos --output json
//! ```

mod ingest;

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use photo_triage::core::{Category, Pipeline, TriageReport};
use photo_triage::error::Result;
use photo_triage::events::{AnalyzeEvent, Event, EventChannel, PipelineEvent};
use std::collections::HashMap;
use std::path::PathBuf;
use std::thread;
use uuid::Uuid;

/// Photo Triage - sort the keepers from the clutter
#[derive(Parser, Debug)]
#[command(name = "photo-triage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Triage directories of photos and videos
    Scan {
        /// Directories to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Near-duplicate Hamming threshold (lower = stricter, 0-64)
        #[arg(short, long, default_value = "5")]
        threshold: u32,

        /// Burst window: how many subsequent shots a pivot may claim
        #[arg(short, long, default_value = "50")]
        window: usize,

        /// Analysis downsampling width in pixels
        #[arg(long, default_value = "320")]
        analysis_width: u32,

        /// Records decoded concurrently
        #[arg(long, default_value = "64")]
        batch_size: usize,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (discard-candidate paths only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    photo_triage::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            paths,
            threshold,
            window,
            analysis_width,
            batch_size,
            output,
            verbose,
        } => run_scan(
            paths,
            threshold,
            window,
            analysis_width,
            batch_size,
            output,
            verbose,
        ),
    }
}

fn run_scan(
    paths: Vec<PathBuf>,
    threshold: u32,
    window: usize,
    analysis_width: u32,
    batch_size: usize,
    output: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();

    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Photo Triage").bold().cyan(),
            style(env!("CARGO_PKG_VERSION")).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    // Ingest
    let ingested = ingest::ingest(&paths);
    if verbose {
        for (path, reason) in &ingested.skipped {
            term.write_line(&format!(
                "{} skipped {}: {}",
                style("!").yellow(),
                path.display(),
                reason
            ))
            .ok();
        }
    }

    // Build pipeline
    let pipeline = Pipeline::builder()
        .max_distance(threshold)
        .window(window)
        .analysis_width(analysis_width)
        .batch_size(batch_size)
        .build();

    // Set up event handling
    let (sender, receiver) = EventChannel::new();

    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(ingested.records.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let verbose_clone = verbose;

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_message(format!("{}", phase));
                    }
                }
                Event::Analyze(AnalyzeEvent::Progress(p)) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_position(p.completed as u64);
                        if verbose_clone {
                            pb.set_message(p.current);
                        }
                    }
                }
                Event::Pipeline(PipelineEvent::Completed { .. }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.finish_and_clear();
                    }
                }
                _ => {}
            }
        }
    });

    // Run the pipeline
    let report = pipeline.run_with_events(&ingested.records, &sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    match output {
        OutputFormat::Pretty => print_pretty_results(&term, &report, &ingested.paths, verbose),
        OutputFormat::Json => print_json_results(&report, &ingested.paths),
        OutputFormat::Minimal => print_minimal_results(&report, &ingested.paths),
    }

    Ok(())
}

fn display_path(paths: &HashMap<Uuid, PathBuf>, id: Uuid, fallback: &str) -> String {
    paths
        .get(&id)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| fallback.to_string())
}

fn print_pretty_results(
    term: &Term,
    report: &TriageReport,
    paths: &HashMap<Uuid, PathBuf>,
    verbose: bool,
) {
    term.write_line("").ok();
    term.write_line(&format!("{} Triage Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    // Summary
    term.write_line(&format!(
        "  {} records analyzed in {:.1}s",
        style(report.total_records).cyan(),
        report.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} keep / {} discard / {} unsure",
        style(report.count(Category::Keep)).green(),
        style(report.count(Category::Discard)).red(),
        style(report.count(Category::Unsure)).yellow()
    ))
    .ok();
    term.write_line(&format!(
        "  {} burst groups found",
        style(report.groups.len()).cyan()
    ))
    .ok();
    if report.decode_failures > 0 {
        term.write_line(&format!(
            "  {} files could not be decoded",
            style(report.decode_failures).yellow()
        ))
        .ok();
    }
    term.write_line("").ok();

    // Discard recommendations
    let discards: Vec<_> = report
        .outcomes
        .iter()
        .filter(|o| o.classification.category == Category::Discard)
        .collect();

    if !discards.is_empty() {
        term.write_line(&format!("{}", style("Discard Candidates:").bold().underlined()))
            .ok();
        term.write_line("").ok();
        for outcome in discards {
            term.write_line(&format!(
                "  {} {} {}",
                style("✗").red(),
                display_path(paths, outcome.id, &outcome.filename),
                style(format!(
                    "({}, {}%)",
                    outcome.classification.reason, outcome.classification.confidence
                ))
                .dim()
            ))
            .ok();
        }
        term.write_line("").ok();
    }

    // Burst groups
    if report.groups.is_empty() {
        term.write_line(&format!("  {} No bursts found", style("·").dim()))
            .ok();
    } else {
        term.write_line(&format!("{}", style("Burst Groups:").bold().underlined()))
            .ok();
        term.write_line("").ok();

        for (i, group) in report.groups.iter().enumerate() {
            term.write_line(&format!(
                "  {} ({} shots, best ahead by {:.2})",
                style(format!("Group {}:", i + 1)).bold(),
                group.members.len(),
                group.score_gap
            ))
            .ok();

            for member in &group.members {
                let marker = if *member == group.best_id {
                    style("★").green().to_string()
                } else {
                    style("○").dim().to_string()
                };
                term.write_line(&format!(
                    "    {} {}",
                    marker,
                    display_path(paths, *member, "<unknown>")
                ))
                .ok();
            }

            if verbose {
                term.write_line(&format!(
                    "    {} {}",
                    style("Recommended:").dim(),
                    style("Keep the starred (★) shot").dim()
                ))
                .ok();
            }
            term.write_line("").ok();
        }
    }

    term.write_line(&format!(
        "{}",
        style("Remember: nothing was deleted. These are recommendations only.").dim()
    ))
    .ok();
}

fn print_json_results(report: &TriageReport, paths: &HashMap<Uuid, PathBuf>) {
    let output = serde_json::json!({
        "total_records": report.total_records,
        "kept": report.count(Category::Keep),
        "discarded": report.count(Category::Discard),
        "unsure": report.count(Category::Unsure),
        "decode_failures": report.decode_failures,
        "duration_ms": report.duration_ms,
        "outcomes": report.outcomes.iter().map(|o| {
            serde_json::json!({
                "id": o.id.to_string(),
                "path": paths.get(&o.id).map(|p| p.display().to_string()),
                "filename": o.filename,
                "category": o.classification.category,
                "confidence": o.classification.confidence,
                "reason": o.classification.reason,
                "tags": o.classification.tags,
                "quality": o.quality,
                "hash": o.hash.map(|h| h.to_hex()),
            })
        }).collect::<Vec<_>>(),
        "groups": report.groups.iter().map(|g| {
            serde_json::json!({
                "id": g.id.to_string(),
                "members": g.members.iter()
                    .map(|m| paths.get(m).map(|p| p.display().to_string()))
                    .collect::<Vec<_>>(),
                "best": paths.get(&g.best_id).map(|p| p.display().to_string()),
                "score_gap": g.score_gap,
            })
        }).collect::<Vec<_>>(),
    });

    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}

/// Paths the user could cull: explicit discards plus every burst member
/// that is not its group's best shot.
fn print_minimal_results(report: &TriageReport, paths: &HashMap<Uuid, PathBuf>) {
    for outcome in &report.outcomes {
        if outcome.classification.category == Category::Discard {
            if let Some(path) = paths.get(&outcome.id) {
                println!("{}", path.display());
            }
        }
    }
    for group in &report.groups {
        for member in &group.members {
            if *member != group.best_id {
                if let Some(path) = paths.get(member) {
                    println!("{}", path.display());
                }
            }
        }
    }
}
