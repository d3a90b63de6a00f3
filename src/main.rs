mod config;
mod error;
mod extract;
mod fetch;
mod gemini;
mod model;
mod pipeline;
mod retry;

use std::time::Instant;

use anyhow::bail;
use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing::warn;

use crate::config::Config;
use crate::gemini::GeminiClient;

const SAMPLE_PROMPT: &str = "A beautiful sunset over the ocean, vibrant colors, photorealistic";

#[derive(Parser)]
#[command(
    name = "twitterhot_etl",
    about = "Daily TwitterHot AI prompt ETL: fetch, translate, tag, embed"
)]
struct Cli {
    /// Max tweets to process
    #[arg(long, default_value_t = config::DEFAULT_LIMIT)]
    limit: usize,
    /// Target date (YYYY-MM-DD), default today
    #[arg(long)]
    date: Option<String>,
    /// Run one transform and one embedding call against a sample prompt, then exit
    #[arg(long)]
    test_api: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let cfg = Config::from_env();

    if cli.test_api {
        return test_api(&cfg).await;
    }

    if cfg.api_key.is_none() {
        // Suspicious but intentional: the run proceeds, every enrichment call
        // fails, and every tweet ends up skipped.
        warn!("GOOGLE_API_KEY is not set; enrichment calls will fail and all tweets will be skipped");
    }

    let date = match cli.date {
        Some(d) => {
            NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                .map_err(|_| anyhow::anyhow!("--date must be YYYY-MM-DD, got `{d}`"))?;
            d
        }
        None => Local::now().format("%Y-%m-%d").to_string(),
    };

    let stats = pipeline::run(&cfg, &date, cli.limit).await?;
    println!(
        "Processed {}/{} tweets ({} skipped).",
        stats.processed, stats.attempted, stats.skipped
    );

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("Done in {:.1}s", elapsed.as_secs_f64());
    }
    Ok(())
}

/// One transform plus one embedding against a fixed sample prompt. Hard-exits
/// when the credential is missing; writes no output file.
async fn test_api(cfg: &Config) -> anyhow::Result<()> {
    if cfg.api_key.is_none() {
        bail!("GOOGLE_API_KEY is not set; cannot run the API test");
    }

    let client = fetch::build_client(cfg)?;
    let gemini = GeminiClient::new(client, cfg);

    println!("Testing transform with sample prompt...");
    match gemini.transform_prompt(SAMPLE_PROMPT).await {
        Ok(result) => {
            println!("Transform OK:");
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Err(e) => println!("Transform failed: {e}"),
    }

    match gemini.embed(SAMPLE_PROMPT).await {
        Ok(v) => println!("Embedding OK ({} dimensions)", v.len()),
        Err(e) => println!("Embedding failed: {e}"),
    }

    Ok(())
}
