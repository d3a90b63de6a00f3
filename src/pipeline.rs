use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use tracing::{info, warn};

use crate::config::Config;
use crate::extract::extract_prompt;
use crate::fetch;
use crate::gemini::GeminiClient;
use crate::model::{ListItem, ProcessedItem};
use crate::retry::with_retry;

/// Run totals reported after completion.
pub struct RunStats {
    pub attempted: usize,
    pub processed: usize,
    pub skipped: usize,
}

/// Full ETL run for one date: list fetch, then a strictly sequential
/// detail/extract/transform/embed cycle per tweet, then one output write.
/// A failing tweet is skipped with a diagnostic; the run itself only ends
/// early when the listing comes back empty.
pub async fn run(cfg: &Config, date: &str, limit: usize) -> Result<RunStats> {
    let client = fetch::build_client(cfg)?;
    let gemini = GeminiClient::new(client.clone(), cfg);

    let tweets = with_retry(&cfg.retry, "tweet list", || {
        fetch::fetch_tweet_list(&client, cfg, date)
    })
    .await
    .unwrap_or_else(|e| {
        warn!("tweet list fetch failed: {}", e);
        Vec::new()
    });

    if tweets.is_empty() {
        warn!("no tweets returned for {}; nothing to do", date);
        return Ok(RunStats {
            attempted: 0,
            processed: 0,
            skipped: 0,
        });
    }

    let tweets: Vec<ListItem> = tweets.into_iter().take(limit).collect();
    let total = tweets.len();
    info!("processing {} tweets for {}", total, date);

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut results: Vec<ProcessedItem> = Vec::new();
    for (idx, tweet) in tweets.iter().enumerate() {
        if let Some(item) = process_one(&client, cfg, &gemini, idx + 1, total, tweet).await {
            results.push(item);
            // stay under hosted-API rate limits
            tokio::time::sleep(cfg.item_pause).await;
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let path = output_path(cfg, date);
    write_output(&path, &results)?;
    info!(
        "ETL complete: {}/{} prompts -> {}",
        results.len(),
        total,
        path.display()
    );

    Ok(RunStats {
        attempted: total,
        processed: results.len(),
        skipped: total - results.len(),
    })
}

/// One tweet through the whole chain. `None` means skipped; the caller moves
/// on unconditionally.
async fn process_one(
    client: &Client,
    cfg: &Config,
    gemini: &GeminiClient,
    idx: usize,
    total: usize,
    tweet: &ListItem,
) -> Option<ProcessedItem> {
    let Some(id) = tweet.id() else {
        warn!("[{}/{}] skipping item with no id", idx, total);
        return None;
    };
    info!("[{}/{}] processing tweet {}", idx, total, id);

    let detail = match with_retry(&cfg.retry, "tweet detail", || {
        fetch::fetch_tweet_detail(client, cfg, &id)
    })
    .await
    {
        Ok(d) => d,
        Err(e) => {
            warn!("[{}/{}] skipping {}: detail fetch failed: {}", idx, total, id, e);
            return None;
        }
    };

    let Some(prompt) = extract_prompt(&detail) else {
        warn!("[{}/{}] skipping {}: no prompt found", idx, total, id);
        return None;
    };
    info!("prompt: {}", preview(&prompt, 80));

    let enriched = match with_retry(&cfg.retry, "transform", || gemini.transform_prompt(&prompt))
        .await
    {
        Ok(t) => t,
        Err(e) => {
            warn!("[{}/{}] skipping {}: transform failed: {}", idx, total, id, e);
            return None;
        }
    };

    // Embedding failure degrades instead of skipping: the item is still
    // emitted, with an explicitly empty vector.
    let embedding = match with_retry(&cfg.retry, "embedding", || gemini.embed(&prompt)).await {
        Ok(v) => v,
        Err(e) => {
            warn!("embedding failed for {}, emitting empty vector: {}", id, e);
            Vec::new()
        }
    };

    info!("done: {}", preview(&enriched.translated_text_zh, 50));

    Some(ProcessedItem {
        id,
        original_prompt: prompt,
        translated_prompt_zh: enriched.translated_text_zh,
        cleaned_prompt: enriched.cleaned_text,
        tags: enriched.tags,
        api_tags: tweet.flat_tags.clone(),
        embedding,
        author: tweet.author.clone(),
        publish_date: tweet.publish_date.clone(),
        processed_at: Local::now().to_rfc3339(),
    })
}

/// `twitterhot_prompts_<YYYYMMDD>.json` under the configured output dir.
pub fn output_path(cfg: &Config, date: &str) -> PathBuf {
    cfg.output_dir
        .join(format!("twitterhot_prompts_{}.json", date.replace('-', "")))
}

fn write_output(path: &PathBuf, items: &[ProcessedItem]) -> Result<()> {
    let json = serde_json::to_string_pretty(items)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn preview(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
