//! deckflow CLI - slide-deck to timeline conversion tool
//!
//! A command-line front end for processing PPTX decks into timeline
//! results, inspecting their animations and running batches.

use clap::{Parser, Subcommand};
use colored::*;
use deckflow::animation::extract_and_convert;
use deckflow::batch::{BatchInput, BatchOptions, BatchProcessor, JobStatus};
use deckflow::{DeckContainer, ProcessOptions};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Slide-deck ingestion into keyframe-animated timelines
#[derive(Parser)]
#[command(
    name = "deckflow",
    author = "iyulab",
    version,
    about = "Convert slide decks into timeline projects",
    long_about = "deckflow - Slide-deck ingestion tool.\n\n\
                  Extracts text, images, layouts and animations from PPTX decks\n\
                  and lays them out as a keyframe-animated timeline."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a deck into a JSON result
    Process {
        /// Input file path
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output compact JSON (no indentation)
        #[arg(long)]
        compact: bool,

        /// Skip image extraction
        #[arg(long)]
        no_images: bool,

        /// Skip text extraction
        #[arg(long)]
        no_text: bool,

        /// Skip layout detection
        #[arg(long)]
        no_layouts: bool,

        /// Nominate a thumbnail image
        #[arg(long)]
        thumbnails: bool,
    },

    /// Check whether a file is a readable deck
    Validate {
        /// Input file path
        input: PathBuf,
    },

    /// Show deck metadata and statistics
    Info {
        /// Input file path
        input: PathBuf,
    },

    /// List converted animations per slide
    #[command(visible_alias = "anim")]
    Animations {
        /// Input file path
        input: PathBuf,
    },

    /// Process many decks concurrently
    Batch {
        /// Input file paths
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Files processed at the same time
        #[arg(long)]
        max_concurrent: Option<usize>,

        /// Retries per file after a failure
        #[arg(long)]
        max_retries: Option<u32>,

        /// JSON file with batch options
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the summary JSON here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Process {
            input,
            output,
            compact,
            no_images,
            no_text,
            no_layouts,
            thumbnails,
        } => {
            let pb = create_spinner("Opening deck...");

            let options = ProcessOptions::new()
                .with_images(!no_images)
                .with_text(!no_text)
                .with_layouts(!no_layouts)
                .with_thumbnails(thumbnails);
            let data = fs::read(&input)?;
            let result = deckflow::process_deck(data, &file_stem(&input), &options, &mut |stage, pct| {
                pb.set_message(format!("{} ({}%)", stage, pct));
            })?;

            let json = if compact {
                result.to_json_compact()?
            } else {
                result.to_json()?
            };

            pb.finish_and_clear();
            write_output(output.as_ref(), &json)?;

            if let Some(path) = output {
                println!(
                    "{} Processed {} slides ({} ms timeline): {}",
                    "✓".green().bold(),
                    result.slide_count(),
                    result.total_duration(),
                    path.display()
                );
            }
            for warning in &result.warnings {
                eprintln!("{} {}", "!".yellow().bold(), warning);
            }
        }

        Commands::Validate { input } => {
            let data = fs::read(&input)?;
            if deckflow::validate(&data) {
                println!("{} {} is a valid deck", "✓".green().bold(), input.display());
            } else {
                println!("{} {} is not a valid deck", "✗".red().bold(), input.display());
                std::process::exit(1);
            }
        }

        Commands::Info { input } => {
            let pb = create_spinner("Analyzing deck...");

            let data = fs::read(&input)?;
            let options = ProcessOptions::default();
            let result = deckflow::process_deck(data, &file_stem(&input), &options, &mut |_, _| {})?;
            let meta = &result.metadata;

            pb.finish_and_clear();

            println!("{}", "Deck Information".cyan().bold());
            println!("{}", "─".repeat(40));
            println!(
                "{}: {}",
                "File".bold(),
                input.file_name().unwrap_or_default().to_string_lossy()
            );
            println!("{}: {}", "Title".bold(), meta.title);
            println!("{}: {}", "Author".bold(), meta.author);
            println!("{}: {}", "Application".bold(), meta.application);
            println!("{}: {}", "Slides".bold(), meta.total_slides);
            println!(
                "{}: {} x {} EMU",
                "Canvas".bold(),
                meta.dimensions.width,
                meta.dimensions.height
            );
            if !meta.created.is_empty() {
                println!("{}: {}", "Created".bold(), meta.created);
            }
            if !meta.modified.is_empty() {
                println!("{}: {}", "Modified".bold(), meta.modified);
            }

            let stats = &result.stats;
            let words: usize = result.slides.iter().map(|s| s.word_count()).sum();
            println!("\n{}", "Content Statistics".cyan().bold());
            println!("{}", "─".repeat(40));
            println!("{}: {}", "Words".bold(), words);
            println!("{}: {}", "Images".bold(), stats.images);
            println!("{}: {}", "Shapes".bold(), stats.shapes);
            println!("{}: {}", "Charts".bold(), stats.charts);
            println!("{}: {}", "Tables".bold(), stats.tables);
            println!("{}: {} ms", "Timeline".bold(), result.total_duration());
            println!("{}: {} ms", "Processing".bold(), stats.processing_time);
        }

        Commands::Animations { input } => {
            let container = DeckContainer::open_path(&input)?;
            let slide_count = container.slide_paths().len();
            let mut total = 0;

            for number in 1..=slide_count {
                let batch = extract_and_convert(&container, number);
                if batch.total == 0 {
                    continue;
                }
                total += batch.total;
                println!(
                    "{} {} ({} supported, {} unsupported)",
                    "Slide".cyan().bold(),
                    number,
                    batch.supported,
                    batch.unsupported
                );
                for converted in &batch.converted {
                    let marker = if converted.supported {
                        "✓".green()
                    } else {
                        "~".yellow()
                    };
                    println!(
                        "  {} {:<10} {:<16} target {:<4} {:>5} ms, {} keyframes",
                        marker,
                        converted.original_type,
                        converted.original_effect,
                        converted.target_id,
                        converted.duration,
                        converted.keyframes.len()
                    );
                }
                for warning in &batch.warnings {
                    println!("  {} {}", "!".yellow().bold(), warning);
                }
            }

            if total == 0 {
                println!("{} No animations found in deck", "!".yellow().bold());
            }
        }

        Commands::Batch {
            inputs,
            max_concurrent,
            max_retries,
            config,
            output,
        } => {
            let mut options = match config {
                Some(path) => serde_json::from_str::<BatchOptions>(&fs::read_to_string(path)?)?,
                None => BatchOptions::default(),
            };
            if let Some(max) = max_concurrent {
                options.max_concurrent = max;
            }
            if let Some(retries) = max_retries {
                options.max_retries = retries;
            }
            log::debug!("batch options: {:?}", options);

            let mut batch_inputs = Vec::with_capacity(inputs.len());
            for path in &inputs {
                batch_inputs.push(BatchInput::new(
                    path.file_name().unwrap_or_default().to_string_lossy(),
                    fs::read(path)?,
                ));
            }

            let processor = BatchProcessor::new();
            let batch = processor.create_batch(batch_inputs, options);

            let multi = MultiProgress::new();
            let style = ProgressStyle::default_bar()
                .template("{prefix:>24} [{bar:30.cyan/blue}] {pos:>3}% {msg}")?
                .progress_chars("=> ");
            let mut bars = HashMap::new();
            for job_id in &batch.job_ids {
                let bar = multi.add(ProgressBar::new(100));
                bar.set_style(style.clone());
                if let Some(job) = processor.job(job_id) {
                    bar.set_prefix(job.filename);
                }
                bars.insert(job_id.clone(), bar);
            }
            let bars = Arc::new(bars);

            let runtime = tokio::runtime::Runtime::new()?;
            let callback_bars = Arc::clone(&bars);
            let summary = runtime.block_on(processor.run_batch(&batch.id, move |job, _done, _total| {
                if let Some(bar) = callback_bars.get(&job.id) {
                    bar.set_position(u64::from(job.progress));
                    bar.set_message(job.phase.clone());
                    match job.status {
                        JobStatus::Completed => bar.finish_with_message("done".green().to_string()),
                        JobStatus::Failed => bar.abandon_with_message("failed".red().to_string()),
                        JobStatus::Cancelled => {
                            bar.abandon_with_message("cancelled".yellow().to_string())
                        }
                        _ => {}
                    }
                }
            }))?;

            println!("\n{}", "Batch Summary".cyan().bold());
            println!("{}", "─".repeat(40));
            println!("{}: {}", "Files".bold(), summary.total_jobs);
            println!("{}: {}", "Completed".bold(), summary.completed.to_string().green());
            println!("{}: {}", "Failed".bold(), summary.failed.to_string().red());
            if summary.cancelled > 0 {
                println!("{}: {}", "Cancelled".bold(), summary.cancelled);
            }
            println!("{}: {}", "Slides".bold(), summary.total_slides);
            println!("{}: {} ms", "Timeline".bold(), summary.total_duration);
            println!("{}: {} ms", "Elapsed".bold(), summary.processing_time);
            for error in &summary.errors {
                eprintln!("{} {}", "✗".red().bold(), error);
            }

            if let Some(path) = output {
                fs::write(&path, summary.to_json()?)?;
                println!("{} Summary written: {}", "✓".green().bold(), path.display());
            }
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn print_version() {
    println!("{} {}", "deckflow".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Slide-deck ingestion into keyframe-animated timelines");
    println!();
    println!("Supported formats: PPTX");
    println!("Repository: https://github.com/iyulab/deckflow");
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "deck".to_string())
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.blue} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn write_output(path: Option<&PathBuf>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", content)?;
        }
    }
    Ok(())
}
