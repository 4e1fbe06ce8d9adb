//! Batch extraction command for many document files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use docid_core::{DocumentPipeline, ExtractedDocument};

use super::extract::{OutputFormat, format_document};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Document type hint applied to every file
    #[arg(short = 't', long = "type", default_value = "passport")]
    doc_type: String,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    index: usize,
    path: PathBuf,
    document: Option<ExtractedDocument>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    // Kind is sniffed from content, so anything that is a file goes in.
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let multi_progress = MultiProgress::new();
    let overall_pb = multi_progress.add(ProgressBar::new(files.len() as u64));
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    // One pipeline serves every worker.
    let pipeline = Arc::new(DocumentPipeline::new(&config));
    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut tasks = JoinSet::new();

    for (index, path) in files.into_iter().enumerate() {
        let pipeline = Arc::clone(&pipeline);
        let semaphore = Arc::clone(&semaphore);
        let pb = overall_pb.clone();
        let hint = args.doc_type.clone();

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await?;
            let result = tokio::task::spawn_blocking(move || {
                let file_start = Instant::now();
                let outcome = process_single_file(&pipeline, &path, &hint);
                let processing_time_ms = file_start.elapsed().as_millis() as u64;
                pb.inc(1);

                match outcome {
                    Ok(document) => ProcessResult {
                        index,
                        path,
                        document: Some(document),
                        error: None,
                        processing_time_ms,
                    },
                    Err(e) => ProcessResult {
                        index,
                        path,
                        document: None,
                        error: Some(e.to_string()),
                        processing_time_ms,
                    },
                }
            })
            .await?;
            anyhow::Ok(result)
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let result = joined??;
        if let Some(error_msg) = &result.error {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), error_msg);
            } else {
                error!("Failed to process {}: {}", result.path.display(), error_msg);
                tasks.abort_all();
                anyhow::bail!("Processing failed: {}", error_msg);
            }
        }
        results.push(result);
    }
    results.sort_by_key(|r| r.index);

    overall_pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.document.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            if let Some(document) = &result.document {
                let output_name = result.path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("document");
                let output_path = output_dir.join(format!("{}.{}", output_name, args.format.extension()));

                fs::write(&output_path, format_document(document, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args.output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(pipeline: &DocumentPipeline, path: &Path, hint: &str) -> anyhow::Result<ExtractedDocument> {
    let bytes = fs::read(path)?;
    let document = pipeline.try_extract(&bytes, hint, None, Local::now().date_naive())?;
    Ok(document)
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    write_summary_records(&mut wtr, results)?;
    wtr.flush()?;
    Ok(())
}

fn write_summary_records<W: std::io::Write>(
    wtr: &mut csv::Writer<W>,
    results: &[ProcessResult],
) -> anyhow::Result<()> {
    wtr.write_record([
        "filename",
        "status",
        "number",
        "document_country",
        "expiration_date",
        "confidence",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result.path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(document) = &result.document {
            wtr.write_record([
                filename,
                "success",
                document.number.as_deref().unwrap_or(""),
                document.document_country.as_deref().unwrap_or(""),
                &document.expiration_date.map(|d| d.to_string()).unwrap_or_default(),
                &format!("{:.2}", document.confidence),
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summary_rows() {
        let results = vec![
            ProcessResult {
                index: 0,
                path: PathBuf::from("scans/dni.png"),
                document: Some(ExtractedDocument {
                    number: Some("12345678Z".to_string()),
                    document_country: Some("ESP".to_string()),
                    expiration_date: NaiveDate::from_ymd_opt(2030, 1, 1),
                    confidence: 1.0,
                    validation_errors: vec![],
                    warnings: vec![],
                }),
                error: None,
                processing_time_ms: 12,
            },
            ProcessResult {
                index: 1,
                path: PathBuf::from("scans/notes.txt"),
                document: None,
                error: Some("unsupported file kind".to_string()),
                processing_time_ms: 0,
            },
        ];

        let mut wtr = csv::Writer::from_writer(vec![]);
        write_summary_records(&mut wtr, &results).unwrap();
        let data = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = data.lines().collect();

        assert_eq!(
            lines,
            vec![
                "filename,status,number,document_country,expiration_date,confidence,processing_time_ms,error",
                "dni.png,success,12345678Z,ESP,2030-01-01,1.00,12,",
                "notes.txt,error,,,,,0,unsupported file kind",
            ]
        );
    }
}
