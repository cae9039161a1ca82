use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;

use design_blocks::config::{self, OutputFormat, Settings};
use design_blocks::parser::{self, Extraction, TracingObserver};
use design_blocks::{report, snapshot};

#[derive(Parser)]
#[command(name = "design_blocks", about = "Extract content blocks from assistant messages and diff report snapshots")]
struct Cli {
    /// Output format (overrides configuration)
    #[arg(short, long, global = true, value_enum)]
    output: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split messages into prose and typed blocks (reads stdin when no file is given)
    Extract {
        files: Vec<PathBuf>,
    },
    /// Compare two report snapshots (JSON)
    Diff {
        previous: PathBuf,
        next: PathBuf,
        /// Print only the one-line summary
        #[arg(long)]
        summary_only: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = config::load().context("loading settings")?;
    let output = cli.output.unwrap_or(settings.output);

    let result = match cli.command {
        Commands::Extract { files } => run_extract(&settings, output, &files),
        Commands::Diff { previous, next, summary_only } => {
            let prev = snapshot::load_report(&previous)?;
            let next = snapshot::load_report(&next)?;
            let cmp = report::compare(&prev, &next);
            match output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&cmp)?),
                OutputFormat::Human if summary_only => println!("{}", cmp.summary),
                OutputFormat::Human => print!("{}", report::render_document(&cmp)),
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn run_extract(settings: &Settings, output: OutputFormat, files: &[PathBuf]) -> anyhow::Result<()> {
    if files.is_empty() {
        let text = snapshot::read_message(None)?;
        let out = parser::extract_with(&text, &settings.multiplicity, &TracingObserver);
        match output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&out)?),
            OutputFormat::Human => print_extraction(None, &out),
        }
        return Ok(());
    }

    let results = extract_files(settings, files)?;
    match output {
        OutputFormat::Json => {
            let items: Vec<_> = results
                .iter()
                .map(|(path, out)| json!({ "file": path.display().to_string(), "extraction": out }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        OutputFormat::Human => {
            for (path, out) in &results {
                print_extraction(Some(path), out);
            }
            let blocks: usize = results.iter().map(|(_, out)| out.block_count()).sum();
            println!("\n{} files, {} blocks.", results.len(), blocks);
        }
    }
    Ok(())
}

fn extract_files(settings: &Settings, files: &[PathBuf]) -> anyhow::Result<Vec<(PathBuf, Extraction)>> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = if files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let results = files
        .par_iter()
        .map(|path| -> anyhow::Result<(PathBuf, Extraction)> {
            let text = snapshot::read_message(Some(path))?;
            let out = parser::extract_with(&text, &settings.multiplicity, &TracingObserver);
            pb.inc(1);
            Ok((path.clone(), out))
        })
        .collect::<anyhow::Result<Vec<_>>>();

    pb.finish_and_clear();
    results
}

fn print_extraction(path: Option<&PathBuf>, out: &Extraction) {
    if let Some(p) = path {
        println!("=== {} ===", p.display());
    }
    if !out.prose.is_empty() {
        println!("{}\n", out.prose);
    }
    if !out.swatches.is_empty() {
        println!("--- Color swatches ({}) ---", out.swatches.len());
        for s in &out.swatches {
            println!("  {:<20} {:<9} {}{}", s.token, s.hex, s.description, link_suffix(s.link.as_deref()));
        }
    }
    if !out.tokens.is_empty() {
        println!("--- Tokens ({}) ---", out.tokens.len());
        for t in &out.tokens {
            println!("  {:<20} {}{}", t.token, t.value, link_suffix(t.link.as_deref()));
        }
    }
    if !out.logos.is_empty() {
        println!("--- Logos ({}) ---", out.logos.len());
        for l in &out.logos {
            let status = if l.is_complete() { "" } else { " (incomplete)" };
            println!("  {} {} {}{}{}", l.brand, l.kind, l.color, link_suffix(l.link()), status);
            if let Some(dl) = l.download_path() {
                println!("    download: {}", dl);
            }
        }
    }
    if let Some(block) = out.findings_block() {
        println!(
            "--- Findings: {} ({}) ---",
            block.title.as_deref().unwrap_or("untitled"),
            block.source.as_deref().unwrap_or("unknown source")
        );
        for f in &block.findings {
            println!("  [{}] {}", f.severity, truncate(&f.issue, 72));
        }
    }
    if let Some(s) = out.review_summary() {
        let rating = s.overall_rating.map(|r| format!("{:.1}", r)).unwrap_or_else(|| "-".into());
        let total = s.total_reviews.map(|t| t.to_string()).unwrap_or_else(|| "-".into());
        println!("--- Reviews: {} from {} ---", rating, total);
        if !s.common_themes.is_empty() {
            println!("  themes: {}", s.common_themes.join(", "));
        }
        if !s.strengths.is_empty() {
            println!("  strengths: {}", s.strengths.join(", "));
        }
    }
}

fn link_suffix(link: Option<&str>) -> String {
    link.map(|l| format!(" <{}>", l)).unwrap_or_default()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
