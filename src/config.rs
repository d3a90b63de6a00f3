use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

pub const DEFAULT_LIMIT: usize = 10;

const TWEET_LIST_API: &str = "https://ttmouse.com/api/tweets";
const TWEET_DETAIL_API: &str = "https://twitterhot.vercel.app/api/tweet_info";
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const GEMINI_MODEL: &str = "gemini-1.5-flash";
const EMBEDDING_MODEL: &str = "text-embedding-004";

/// Runtime configuration, built once in `main` and passed by reference into
/// every component. Base URLs are fields (not constants at the call sites) so
/// tests can point the pipeline at a local stub server.
#[derive(Debug, Clone)]
pub struct Config {
    pub list_base: String,
    pub detail_base: String,
    pub gemini_base: String,
    /// `GOOGLE_API_KEY`. Absent is allowed for the full pipeline run, which
    /// then warns and proceeds; every enrichment call will fail downstream.
    pub api_key: Option<String>,
    pub gemini_model: String,
    pub embedding_model: String,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    /// Pause after each successfully processed item, to stay under hosted-API
    /// rate limits.
    pub item_pause: Duration,
    pub output_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        Self {
            list_base: TWEET_LIST_API.into(),
            detail_base: TWEET_DETAIL_API.into(),
            gemini_base: GEMINI_API_BASE.into(),
            api_key,
            gemini_model: GEMINI_MODEL.into(),
            embedding_model: EMBEDDING_MODEL.into(),
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            item_pause: Duration::from_millis(500),
            output_dir: PathBuf::from("."),
        }
    }
}
