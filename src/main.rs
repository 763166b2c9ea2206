use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use doccompare::compare::ErrorPolicy;
use doccompare::config::Config;
use doccompare::extract::ocr::TesseractEngine;
use doccompare::output;
use doccompare::pipeline;

/// doccompare: how similar are two German documents?
///
/// Extracts text from PDFs (text layer) and scanned images (Tesseract OCR),
/// then scores documents with TF-IDF over unigrams and bigrams.
#[derive(Parser)]
#[command(name = "doccompare", version, about)]
struct Cli {
    /// What a failed extraction means: abort, zero or inline
    /// (overrides DOCCOMPARE_ON_ERROR)
    #[arg(long, global = true)]
    on_error: Option<ErrorPolicy>,

    /// OCR timeout in seconds (overrides DOCCOMPARE_OCR_TIMEOUT_SECS)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    ocr_timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the text extracted from a single file
    Extract {
        file: PathBuf,
    },

    /// Score the similarity of two files
    Compare {
        file1: PathBuf,
        file2: PathBuf,

        /// Emit JSON instead of a formatted report
        #[arg(long)]
        json: bool,
    },

    /// Rank candidate files by similarity to a reference file
    Rank {
        reference: PathBuf,

        #[arg(required = true)]
        candidates: Vec<PathBuf>,

        /// Emit JSON instead of a formatted report
        #[arg(long)]
        json: bool,

        /// Number of files to extract in parallel (default: 4)
        #[arg(long, default_value = "4")]
        concurrency: usize,
    },

    /// Show the OCR engine version and installed language models
    CheckOcr,

    /// Start the upload web server
    #[cfg(feature = "web")]
    Serve {
        /// Port to listen on (default: 5000)
        #[arg(long, default_value = "5000")]
        port: u16,

        /// Address to bind (default: 0.0.0.0)
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("doccompare=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(policy) = cli.on_error {
        config.error_policy = policy;
    }
    if let Some(secs) = cli.ocr_timeout {
        config.ocr_timeout = Duration::from_secs(secs);
    }

    match cli.command {
        Commands::Extract { file } => {
            let extractor = config.extractor();
            let extraction = pipeline::extract_file(&extractor, &file).await?;
            output::terminal::display_extraction(&extraction);
        }

        Commands::Compare { file1, file2, json } => {
            let extractor = config.extractor();
            let comparator = config.comparator();

            let (reference, candidate) = tokio::try_join!(
                pipeline::extract_file(&extractor, &file1),
                pipeline::extract_file(&extractor, &file2),
            )?;
            let comparison = comparator.compare_documents(&reference, &candidate)?;

            if json {
                output::print_json(&comparison)?;
            } else {
                output::terminal::display_comparison(&comparison);
            }
        }

        Commands::Rank {
            reference,
            candidates,
            json,
            concurrency,
        } => {
            let extractor = config.extractor();
            let comparator = config.comparator();

            info!(candidates = candidates.len(), "Ranking documents");
            let reference = pipeline::extract_file(&extractor, &reference).await?;
            let extracted =
                pipeline::extract_files(&extractor, &candidates, concurrency, !json).await?;
            let ranked = comparator.rank_documents(&reference, &extracted)?;

            if json {
                output::print_json(&serde_json::json!({
                    "reference": doccompare::compare::DocumentSummary::of(&reference),
                    "ranking": ranked,
                }))?;
            } else {
                output::terminal::display_ranking(&reference, &ranked);
            }
        }

        Commands::CheckOcr => {
            let engine = TesseractEngine::new(config.tesseract_cmd.clone());
            if !engine.is_available() {
                anyhow::bail!(
                    "'{}' not found on PATH. Install Tesseract or set DOCCOMPARE_TESSERACT_CMD.",
                    engine.program()
                );
            }

            let version = engine
                .version()
                .await
                .context("Failed to query Tesseract version")?;
            let languages = engine
                .languages()
                .await
                .context("Failed to list Tesseract languages")?;

            println!("{}", "=== OCR Engine ===".bold());
            println!("  Binary:    {}", engine.program());
            println!("  Version:   {version}");
            println!("  Languages: {}", languages.join(", "));

            if languages.iter().any(|l| l == &config.ocr_language) {
                println!(
                    "  {}",
                    format!("Language model '{}' is installed.", config.ocr_language).green()
                );
            } else {
                println!(
                    "  {}",
                    format!(
                        "Language model '{}' is missing; OCR will fail.",
                        config.ocr_language
                    )
                    .red()
                );
            }
        }

        #[cfg(feature = "web")]
        Commands::Serve { port, bind } => {
            doccompare::web::run_server(config, port, &bind).await?;
        }
    }

    Ok(())
}
