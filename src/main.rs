// PLEADING ANALYZER - court pleading in, legal fields + named entities out
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use pleading_analyzer::debug_capture;
use pleading_analyzer::export::write_artifacts;
use pleading_analyzer::{Analysis, Analyzer, AnalyzerConfig, AnalyzerError, Document, FieldValue};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Pleading to analyze (.pdf or .docx)
    file: PathBuf,
    /// Where extracted_info.csv / extracted_info.json are written
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,
    /// TOML config (falls back to $PLEADING_ANALYZER_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    no_export: bool,
    /// Also print the JSON document to stdout
    #[arg(long)]
    print_json: bool,
    /// Dump captured diagnostics to stderr when done
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    debug_capture::set_echo(false);
    let verbose = args.verbose;

    let result = run(args).await;

    if verbose {
        for line in debug_capture::get_debug_messages() {
            eprintln!("{}", line);
        }
    }

    if let Err(e) = result {
        let message = match e.downcast_ref::<AnalyzerError>() {
            Some(err) => err.user_message(),
            None => format!("{:#}", e),
        };
        eprintln!("Error: {}", message);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = AnalyzerConfig::load(args.config.as_deref())?;

    // Model is loaded before any document is touched
    let analyzer = Analyzer::from_config(config);

    let max_bytes = analyzer.config().limits.max_upload_bytes;
    let document = Document::from_path(&args.file, max_bytes)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let analysis = analyzer.analyze(&document).await?;

    render(&analysis, analyzer.ner_backend_id());

    if args.print_json {
        println!("{}", analysis.to_json()?);
    }

    if !args.no_export {
        let artifacts =
            write_artifacts(&args.out_dir, &analyzer.config().output, &analysis.merged())?;
        println!();
        println!("Saved {}", artifacts.csv_path.display());
        println!("Saved {}", artifacts.json_path.display());
    }

    Ok(())
}

fn render(analysis: &Analysis, ner_backend: &str) {
    println!("{}", analysis.filename);
    if let Some(report) = &analysis.pdf_report {
        println!(
            "  {} of {} pages read, {} via OCR{}",
            report.pages.len(),
            report.total_pages,
            report.ocr_pages(),
            if report.truncated { " (truncated)" } else { "" }
        );
    }

    println!();
    println!("Extracted Information");
    for (name, value) in analysis.fields.iter() {
        let shown = match value {
            FieldValue::Scalar(Some(s)) => s.replace('\n', " / "),
            FieldValue::Scalar(None) => "-".to_string(),
            FieldValue::List(items) if items.is_empty() => "-".to_string(),
            FieldValue::List(items) => items.join("; "),
        };
        println!("  {}: {}", title_case(name), shown);
    }

    println!();
    println!("Named Entities ({})", ner_backend);
    if analysis.entities.is_empty() {
        println!("  (none)");
    }
    for (label, texts) in &analysis.entities {
        let joined: Vec<&str> = texts.iter().map(String::as_str).collect();
        println!("  {}: {}", label, joined.join(", "));
    }
}

/// `case_number` -> `Case Number`
fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
