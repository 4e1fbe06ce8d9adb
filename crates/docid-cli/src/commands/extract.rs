//! Extract command - pull identity fields from a single document.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use docid_core::{DocumentPipeline, ExtractedDocument, RawMrz};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Document type: passport, visa, id_card, drivers_license, or a strategy key (ESP, EGY, EU, USA, ...)
    #[arg(short = 't', long = "type", default_value = "passport")]
    doc_type: String,

    /// JSON file with MRZ fields already read from the document
    #[arg(long)]
    mrz: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Show confidence, validation errors and warnings
    #[arg(long)]
    show_confidence: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let raw_mrz: Option<RawMrz> = match &args.mrz {
        Some(path) => Some(serde_json::from_str(&fs::read_to_string(path)?)?),
        None => None,
    };

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message("Extracting fields...");

    let pipeline = DocumentPipeline::new(&config);
    if !pipeline.has_ocr() {
        pb.println(format!(
            "{} No OCR engine available, only PDFs with a text layer can be read",
            style("!").yellow()
        ));
    }

    let bytes = fs::read(&args.input)?;
    let hint = args.doc_type.clone();
    let document =
        tokio::task::spawn_blocking(move || pipeline.extract(&bytes, &hint, raw_mrz.as_ref())).await?;

    pb.finish_and_clear();

    let Some(document) = document else {
        anyhow::bail!("No text could be extracted from {}", args.input.display());
    };

    let output = format_document(&document, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_confidence {
        println!();
        println!(
            "{} Extraction confidence: {:.0}%",
            style("ℹ").blue(),
            document.confidence * 100.0
        );
        for error in &document.validation_errors {
            println!("  {} {}", style("✗").red(), error);
        }
        for warning in &document.warnings {
            println!("  {} {}", style("!").yellow(), warning);
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_document(document: &ExtractedDocument, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(document)?),
        OutputFormat::Csv => format_csv(document),
        OutputFormat::Text => Ok(format_text(document)),
    }
}

fn format_csv(document: &ExtractedDocument) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "number",
        "document_country",
        "expiration_date",
        "confidence",
        "validation_errors",
        "warnings",
    ])?;

    wtr.write_record([
        document.number.clone().unwrap_or_default(),
        document.document_country.clone().unwrap_or_default(),
        document.expiration_date.map(|d| d.to_string()).unwrap_or_default(),
        format!("{:.2}", document.confidence),
        document.validation_errors.join("; "),
        document.warnings.join("; "),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(document: &ExtractedDocument) -> String {
    let missing = || "-".to_string();
    let mut output = String::new();

    output.push_str(&format!("Number:     {}\n", document.number.clone().unwrap_or_else(missing)));
    output.push_str(&format!(
        "Country:    {}\n",
        document.document_country.clone().unwrap_or_else(missing)
    ));
    output.push_str(&format!(
        "Expires:    {}\n",
        document.expiration_date.map(|d| d.to_string()).unwrap_or_else(missing)
    ));
    output.push_str(&format!("Confidence: {:.2}\n", document.confidence));

    if !document.validation_errors.is_empty() {
        output.push_str("\nErrors:\n");
        for error in &document.validation_errors {
            output.push_str(&format!("  - {}\n", error));
        }
    }
    if !document.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &document.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn document() -> ExtractedDocument {
        ExtractedDocument {
            number: Some("12345678Z".to_string()),
            document_country: Some("ESP".to_string()),
            expiration_date: NaiveDate::from_ymd_opt(2030, 1, 1),
            confidence: 0.9,
            validation_errors: vec![],
            warnings: vec!["Suspiciously far future date: 2030-01-01".to_string()],
        }
    }

    #[test]
    fn test_format_csv() {
        let csv = format_document(&document(), OutputFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("number,document_country,expiration_date,confidence,validation_errors,warnings")
        );
        assert_eq!(
            lines.next(),
            Some("12345678Z,ESP,2030-01-01,0.90,,Suspiciously far future date: 2030-01-01")
        );
    }

    #[test]
    fn test_format_text_marks_missing_fields() {
        let mut doc = document();
        doc.number = None;
        let text = format_document(&doc, OutputFormat::Text).unwrap();
        assert!(text.contains("Number:     -\n"));
        assert!(text.contains("Warnings:\n  - Suspiciously far future date"));
    }

    #[test]
    fn test_format_json_keys() {
        let json = format_document(&document(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["document_country"], "ESP");
        assert_eq!(value["expiration_date"], "2030-01-01");
    }
}
