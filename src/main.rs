use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use comment_matcher::config::{Config, OracleBackend};
use comment_matcher::dataset::Dataset;
use comment_matcher::matching::prompt::build_prompt;
use comment_matcher::matching::{is_flagged, parse_score, PairwiseComparator};
use comment_matcher::oracle::{create_oracle, SimilarityOracle};
use comment_matcher::output::{report, terminal, truncate_chars};

/// Comment matcher: compare transaction comments across two sheets.
///
/// Every comment in the first sheet is scored against every comment in the
/// second by a language model, and pairs scoring below 80 are flagged.
#[derive(Parser)]
#[command(name = "comment-matcher", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare the `Comment` column of two sheets and write a results workbook
    Compare {
        /// First sheet (.xlsx, .xls, .ods, .csv or .tsv)
        sheet1: PathBuf,

        /// Second sheet
        sheet2: PathBuf,

        /// Where to write the results (.xlsx, or .csv)
        #[arg(long, short, default_value = report::DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Number of model calls in flight at once (default: 1, sequential)
        #[arg(long, default_value = "1")]
        concurrency: u32,

        /// Result rows to preview in the terminal (default: 20)
        #[arg(long, default_value = "20")]
        show: usize,
    },

    /// Score a single pair of comments and show the raw model reply
    Check {
        comment1: String,
        comment2: String,
    },

    /// Serve the upload form and comparison API
    #[cfg(feature = "web")]
    Serve {
        /// Port to listen on (default: 3000)
        #[arg(long, default_value = "3000")]
        port: u16,

        /// Address to bind (default: 127.0.0.1)
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,

        /// Number of model calls in flight per comparison (default: 1)
        #[arg(long, default_value = "1")]
        concurrency: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("comment_matcher=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compare {
            sheet1,
            sheet2,
            output,
            concurrency,
            show,
        } => {
            let config = load_config()?;

            // Both inputs are validated before the first model call
            let dataset_a = Dataset::from_path(&sheet1)?;
            let dataset_b = Dataset::from_path(&sheet2)?;

            let oracle = create_oracle(&config)?;
            let total = dataset_a.len() * dataset_b.len();

            println!(
                "Comparing {} comments from {} with {} from {} ({} pairs)...",
                dataset_a.len(),
                dataset_a.name,
                dataset_b.len(),
                dataset_b.name,
                total,
            );

            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  Comparing [{bar:30}] {pos}/{len} ({eta})")
                    .context("Invalid progress bar template")?,
            );

            let comparator =
                PairwiseComparator::new(oracle.as_ref()).with_concurrency(concurrency as usize);
            let comparison = comparator
                .compare(&dataset_a, &dataset_b, |done, _| pb.set_position(done as u64))
                .await;
            pb.finish_and_clear();

            println!("{}", "Comparison complete!".green().bold());
            terminal::display_summary(&comparison);
            terminal::display_results(&comparison.results, show);
            terminal::display_warnings(&comparison);

            report::write_report(&comparison.results, &output)?;
            println!(
                "\n{}",
                format!("Results saved to: {}", output.display()).bold()
            );
        }

        Commands::Check { comment1, comment2 } => {
            let config = load_config()?;
            let oracle = create_oracle(&config)?;

            let reply = oracle.complete(&build_prompt(&comment1, &comment2)).await?;
            println!("Raw reply: '{}'", truncate_chars(&reply, 200));

            let score = parse_score(&reply)?;
            let verdict = if is_flagged(score) {
                format!("{score} (flagged)").red()
            } else {
                format!("{score}").green()
            };
            println!("Parsed similarity score: {verdict}");
        }

        #[cfg(feature = "web")]
        Commands::Serve {
            port,
            bind,
            concurrency,
        } => {
            let config = load_config()?;
            let oracle = create_oracle(&config)?;
            let state = comment_matcher::web::AppState {
                oracle: std::sync::Arc::from(oracle),
                concurrency: (concurrency as usize).max(1),
            };
            comment_matcher::web::run_server(state, port, &bind).await?;
        }
    }

    Ok(())
}

/// Load configuration and refuse to start without the selected backend's
/// credentials. Shows which credential was picked up, masked.
fn load_config() -> Result<Config> {
    let config = Config::load()?;
    config.require_oracle()?;

    match config.oracle_backend {
        OracleBackend::Chat => {
            info!(
                model = %config.openai_model,
                api_key = %config.masked_credential(),
                "API key loaded"
            );
        }
        OracleBackend::Direct => {
            info!(
                endpoint = %truncate_chars(&config.azure_endpoint, 40),
                api_key = %config.masked_credential(),
                "API key loaded"
            );
        }
    }

    Ok(config)
}
