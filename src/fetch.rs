use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::config::Config;
use crate::error::ApiError;
use crate::model::{DetailRecord, ListItem, ListResponse};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Shared HTTP client with the fixed per-request timeout baked in.
pub fn build_client(cfg: &Config) -> Result<Client> {
    Client::builder()
        .timeout(cfg.request_timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build HTTP client")
}

/// Fetch the day's tweet list. The caller collapses any final failure to an
/// empty list; "nothing to do" and "listing endpoint down" are deliberately
/// indistinguishable here.
pub async fn fetch_tweet_list(
    client: &Client,
    cfg: &Config,
    date: &str,
) -> Result<Vec<ListItem>, ApiError> {
    let url = format!("{}?date={}", cfg.list_base, date);
    info!("fetching tweet list: {}", url);
    let response: ListResponse = get_json(client, &url).await?;
    Ok(response.into_items())
}

/// Fetch one tweet's full record. All-or-nothing; no partial result exists.
pub async fn fetch_tweet_detail(
    client: &Client,
    cfg: &Config,
    id: &str,
) -> Result<DetailRecord, ApiError> {
    let url = format!("{}?id={}", cfg.detail_base, id);
    get_json(client, &url).await
}

async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T, ApiError> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(ApiError::from_reqwest)?;

    let status = resp.status();
    if !status.is_success() {
        return Err(ApiError::Status(status.as_u16()));
    }

    let body = resp.text().await.map_err(ApiError::from_reqwest)?;
    serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
}
