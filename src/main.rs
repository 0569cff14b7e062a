use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use scamwatch::report::records_mentioning;
use scamwatch::{
    process, Document, Extraction, Lexicon, LexiconLists, ScanOutcome, ScanRecord, ScanReport,
    ScanSession, Settings,
};

/// Documents handed to the session per progress tick.
const CHUNK: usize = 500;

#[derive(Parser)]
#[command(name = "scamwatch", about = "Scam-signal extraction for video titles and descriptions")]
struct Cli {
    /// Settings file (default: ./scamwatch.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// JSON file replacing built-in lexicon lists
    #[arg(long, global = true)]
    lexicon: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract platforms, links and groups from one or more documents
    Extract {
        /// Title of a single document
        #[arg(long, conflicts_with = "input")]
        title: Option<String>,
        /// Body of the single document given with --title
        #[arg(long, default_value = "", requires = "title")]
        body: String,
        /// JSON lines file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Run a deduplicating scan session over a JSON lines file
    Scan {
        /// JSON lines file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Where to write records and report (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// File with one already processed document id per line
        #[arg(long)]
        known_ids: Option<PathBuf>,
        /// Rows per table in the summary
        #[arg(short = 'n', long, default_value = "10")]
        top: usize,
        /// Also list the accepted documents naming this platform
        #[arg(short, long)]
        platform: Option<String>,
    },
    /// Print the effective lexicon lists as JSON
    Lexicon,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    let lexicon = load_lexicon(cli.lexicon.as_deref(), &settings)?;

    match cli.command {
        Commands::Extract { title, body, input } => {
            let docs = match title {
                Some(title) => vec![Document::new(title, body)],
                None => read_documents(input.as_deref())?,
            };
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for doc in &docs {
                let extraction = process(doc, &lexicon, &settings.tuning);
                let line = ExtractedDocument {
                    id: doc.id.as_deref(),
                    title: &doc.title,
                    extraction,
                };
                serde_json::to_writer(&mut out, &line)?;
                writeln!(out)?;
            }
        }
        Commands::Scan {
            input,
            output,
            known_ids,
            top,
            platform,
        } => {
            let docs = read_documents(input.as_deref())?;
            if docs.is_empty() {
                eprintln!("No documents to scan.");
                return Ok(());
            }
            let mut session = ScanSession::new(&lexicon, &settings.tuning);
            if let Some(path) = known_ids {
                let ids = read_known_ids(&path)?;
                info!(count = ids.len(), "loaded known document ids");
                session = session.with_known_ids(ids);
            }

            let outcomes = scan_documents(&session, docs)?;
            let result = ScanOutput::new(outcomes);
            write_output(output.as_deref(), &result)?;
            print_summary(&result, top);
            if let Some(platform) = platform {
                print_mentions(&result, &platform);
            }
        }
        Commands::Lexicon => {
            println!("{}", serde_json::to_string_pretty(lexicon.lists())?);
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }
    Ok(())
}

#[derive(Serialize)]
struct ExtractedDocument<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    title: &'a str,
    #[serde(flatten)]
    extraction: Extraction,
}

#[derive(Serialize)]
struct StampedRecord {
    #[serde(flatten)]
    record: ScanRecord,
    scanned_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ScanOutput {
    records: Vec<StampedRecord>,
    skipped: Vec<ScanOutcome>,
    report: ScanReport,
    #[serde(skip)]
    accepted: Vec<ScanRecord>,
}

impl ScanOutput {
    fn new(outcomes: Vec<ScanOutcome>) -> Self {
        let scanned_at = Utc::now();
        let mut accepted = Vec::new();
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                ScanOutcome::Accepted(record) => accepted.push(record),
                other => skipped.push(other),
            }
        }
        let report = ScanReport::build(&accepted);
        let records = accepted
            .iter()
            .cloned()
            .map(|record| StampedRecord { record, scanned_at })
            .collect();
        ScanOutput {
            records,
            skipped,
            report,
            accepted,
        }
    }
}

fn load_lexicon(cli_path: Option<&Path>, settings: &Settings) -> anyhow::Result<Lexicon> {
    match cli_path.or(settings.lexicon.as_deref()) {
        Some(path) => Lexicon::from_file(path)
            .with_context(|| format!("loading lexicon from {}", path.display())),
        None => Ok(Lexicon::new(LexiconLists::default())?),
    }
}

/// Reads JSON lines from a file or stdin. Malformed lines are logged and skipped.
fn read_documents(path: Option<&Path>) -> anyhow::Result<Vec<Document>> {
    let reader: Box<dyn BufRead> = match path {
        Some(p) => Box::new(BufReader::new(
            File::open(p).with_context(|| format!("opening {}", p.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut docs = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line.context("reading input")?;
        if line.trim().is_empty() {
            continue;
        }
        match Document::from_json_line(&line) {
            Ok(doc) => docs.push(doc),
            Err(e) => warn!(line = n + 1, error = %e, "skipping input line"),
        }
    }
    Ok(docs)
}

fn read_known_ids(path: &Path) -> anyhow::Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading known ids from {}", path.display()))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

fn scan_documents(session: &ScanSession, docs: Vec<Document>) -> anyhow::Result<Vec<ScanOutcome>> {
    let pb = ProgressBar::new(docs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut outcomes = Vec::with_capacity(docs.len());
    let mut pending = docs.into_iter().peekable();
    while pending.peek().is_some() {
        let chunk: Vec<Document> = pending.by_ref().take(CHUNK).collect();
        let n = chunk.len() as u64;
        outcomes.extend(session.scan_batch(chunk));
        pb.inc(n);
    }

    pb.finish_and_clear();
    Ok(outcomes)
}

fn write_output(path: Option<&Path>, result: &ScanOutput) -> anyhow::Result<()> {
    match path {
        Some(p) => {
            let file = File::create(p).with_context(|| format!("creating {}", p.display()))?;
            let mut w = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut w, result)?;
            w.flush()?;
            eprintln!("Wrote {}", p.display());
        }
        None => {
            let stdout = io::stdout();
            let mut w = stdout.lock();
            serde_json::to_writer_pretty(&mut w, result)?;
            writeln!(w)?;
        }
    }
    Ok(())
}

fn print_summary(result: &ScanOutput, top: usize) {
    let totals = &result.report.totals;
    let duplicates = result
        .skipped
        .iter()
        .filter(|o| matches!(o, ScanOutcome::Duplicate { .. }))
        .count();
    let silent = result.accepted.iter().filter(|r| r.extraction.is_empty()).count();
    eprintln!("Accepted:       {}", totals.documents);
    eprintln!("No signals:     {}", silent);
    eprintln!("Duplicates:     {}", duplicates);
    eprintln!("Already seen:   {}", result.skipped.len() - duplicates);
    eprintln!("With platforms: {}", totals.with_platforms);
    eprintln!("With links:     {}", totals.with_links);
    eprintln!(
        "With groups:    {} ({} WhatsApp, {} Telegram)",
        totals.with_groups, totals.whatsapp_groups, totals.telegram_groups
    );

    let platforms = result.report.top_platforms(top);
    if !platforms.is_empty() {
        eprintln!("\n{:>3} | {:<24} | {:>5}", "#", "Platform", "Docs");
        eprintln!("{}", "-".repeat(38));
        for (i, p) in platforms.iter().enumerate() {
            eprintln!("{:>3} | {:<24} | {:>5}", i + 1, truncate(&p.platform, 24), p.count);
        }
    }

    let domains = result.report.top_domains(top);
    if !domains.is_empty() {
        eprintln!("\n{:>3} | {:<32} | {:>5} | {:>4}", "#", "Domain", "Links", "Docs");
        eprintln!("{}", "-".repeat(53));
        for (i, d) in domains.iter().enumerate() {
            eprintln!(
                "{:>3} | {:<32} | {:>5} | {:>4}",
                i + 1,
                truncate(&d.domain, 32),
                d.count,
                d.documents.len()
            );
        }
    }
}

fn print_mentions(result: &ScanOutput, platform: &str) {
    let hits = records_mentioning(&result.accepted, platform);
    eprintln!("\n{} document(s) naming {}:", hits.len(), platform);
    for r in hits {
        eprintln!("  {:<16} {}", truncate(&r.id, 16), truncate(&r.title, 60));
    }
}

/// At most `max` chars, with an ellipsis when cut.
fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    let (h, m, s) = (secs / 3600, secs % 3600 / 60, secs % 60);
    match (h, m) {
        (0, 0) => format!("{:.1}s", d.as_secs_f64()),
        (0, _) => format!("{}m {}s", m, s),
        _ => format!("{}h {}m {}s", h, m, s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate("ação", 4), "ação");
        assert_eq!(truncate("ação rápida", 4), "ação...");
    }

    #[test]
    fn durations() {
        use std::time::Duration;
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(5400)), "1h 30m 0s");
    }
}
