use anyhow::{Context, Result};
use std::time::Duration;

pub const DEFAULT_TRANSLATION_API_URL: &str = "http://mymemory.translated.net/api/get";

#[derive(Debug, Clone)]
pub struct Config {
    // Translation back-end
    pub translation_api_url: String,
    pub request_timeout: Duration,
    /// Sleep after every back-end call
    pub request_interval: Duration,
    /// Longest piece of text sent in one request
    pub max_chunk_chars: usize,

    // Resources
    /// Language of the base `values/strings.xml`
    pub source_language: String,

    /// Write to `<file>.bak` and skip real translation
    pub dry_run: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let max_chunk_chars: usize = parse_var("MAX_CHUNK_CHARS", 1000)?;
        if max_chunk_chars == 0 {
            anyhow::bail!("MAX_CHUNK_CHARS must be greater than zero");
        }

        Ok(Self {
            translation_api_url: std::env::var("TRANSLATION_API_URL")
                .unwrap_or_else(|_| DEFAULT_TRANSLATION_API_URL.to_string()),
            request_timeout: Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", 30)?),
            request_interval: Duration::from_secs(parse_var("REQUEST_INTERVAL_SECS", 3)?),
            max_chunk_chars,

            source_language: std::env::var("SOURCE_LANGUAGE").unwrap_or_else(|_| "en".to_string()),

            // Real writes are opt-in
            dry_run: std::env::var("DRY_RUN")
                .map(|v| !is_falsy(&v))
                .unwrap_or(true),
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(v) => v
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", name, v)),
        Err(_) => Ok(default),
    }
}

fn is_falsy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}
