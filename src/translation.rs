use crate::config::Config;
use crate::retry::{with_retry_if, RetryConfig};
use anyhow::{Context, Result};
use rand::Rng;
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Returned for every string while dry-run is on
pub const DRY_RUN_TEXT: &str = "This is a dry-run string";

/// Browser-like agents sent to the back-end, one picked per request
const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.7; rv:11.0) Gecko/20100101 Firefox/11.0",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:22.0) Gecko/20100 101 Firefox/22.0",
    "Mozilla/5.0 (Windows NT 6.1; rv:11.0) Gecko/20100101 Firefox/11.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_7_4) AppleWebKit/536.5 (KHTML, like Gecko) Chrome/19.0.1084.46 Safari/536.5",
    "Mozilla/5.0 (Windows; Windows NT 6.1) AppleWebKit/536.5 (KHTML, like Gecko) Chrome/19.0.1084.46Safari/536.5",
];

/// Something that turns text in one language into another
pub trait Translate {
    fn translate(
        &self,
        text: &str,
        from_lang: &str,
        to_lang: &str,
    ) -> impl Future<Output = Result<String>>;
}

/// Translator backed by the MyMemory `/api/get` endpoint
#[derive(Debug, Clone)]
pub struct MyMemoryTranslator {
    client: reqwest::Client,
    api_url: String,
    request_interval: Duration,
    max_chunk_chars: usize,
    dry_run: bool,
    retry: RetryConfig,
}

/// Non-success HTTP status from the back-end
#[derive(Debug, Error)]
#[error("Translation API error ({status}): {body}")]
pub struct ApiStatusError {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct TranslationResponse {
    #[serde(rename = "responseData", default)]
    response_data: Option<ResponseData>,
    #[serde(default, deserialize_with = "lenient_matches")]
    matches: Vec<Match>,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    #[serde(rename = "translatedText", default, deserialize_with = "text_or_none")]
    translated_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Match {
    #[serde(default, deserialize_with = "text_or_none")]
    translation: Option<String>,
}

/// The back-end sends `false` in place of a string when it has nothing
fn text_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => Ok(Some(text)),
        _ => Ok(None),
    }
}

/// `matches` is sometimes an empty string instead of a list
fn lenient_matches<'de, D>(deserializer: D) -> Result<Vec<Match>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

impl TranslationResponse {
    /// Primary translation, else the first match that carries a string
    fn best_translation(self) -> Option<String> {
        if let Some(text) = self.response_data.and_then(|d| d.translated_text) {
            return Some(text);
        }

        self.matches
            .into_iter()
            .find_map(|m| m.translation)
    }
}

impl MyMemoryTranslator {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: config.translation_api_url.clone(),
            request_interval: config.request_interval,
            max_chunk_chars: config.max_chunk_chars,
            dry_run: config.dry_run,
            retry: RetryConfig::translation_api(),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Ask the back-end for one chunk. `Ok(None)` means it had no usable translation.
    async fn fetch_translation(
        &self,
        chunk: &str,
        from_lang: &str,
        to_lang: &str,
    ) -> Result<Option<String>> {
        let langpair = format!("{}|{}", from_lang, to_lang);

        with_retry_if(
            &self.retry,
            &format!("Translation {}", langpair),
            || async {
                let response = self
                    .client
                    .get(&self.api_url)
                    .query(&[("q", chunk), ("langpair", langpair.as_str())])
                    .header(USER_AGENT, random_user_agent())
                    .send()
                    .await
                    .context("Failed to send request to translation API")?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
                    return Err(anyhow::Error::new(ApiStatusError { status, body }));
                }

                let parsed: TranslationResponse = response
                    .json()
                    .await
                    .context("Failed to parse translation API response")?;

                Ok::<_, anyhow::Error>(parsed.best_translation())
            },
            is_retryable_error,
        )
        .await
    }
}

impl Translate for MyMemoryTranslator {
    async fn translate(&self, text: &str, from_lang: &str, to_lang: &str) -> Result<String> {
        if self.dry_run {
            return Ok(DRY_RUN_TEXT.to_string());
        }
        if from_lang == to_lang {
            return Ok(text.to_string());
        }

        let mut translated = String::with_capacity(text.len());
        for chunk in split_into_chunks(text, self.max_chunk_chars) {
            match self.fetch_translation(chunk, from_lang, to_lang).await? {
                Some(result) => {
                    info!("Finished translation : {} -> {}", chunk, result);
                    translated.push_str(&result);
                }
                None => {
                    warn!("Finished translation : {} use the original str", chunk);
                    translated.push_str(chunk);
                }
            }

            if !self.request_interval.is_zero() {
                tokio::time::sleep(self.request_interval).await;
            }
        }

        Ok(translated)
    }
}

/// Retry network failures, 429 and 5xx. Other 4xx responses fail at once.
fn is_retryable_error(error: &anyhow::Error) -> bool {
    match error.downcast_ref::<ApiStatusError>() {
        Some(e) => e.status == StatusCode::TOO_MANY_REQUESTS || e.status.is_server_error(),
        None => true,
    }
}

fn random_user_agent() -> &'static str {
    USER_AGENTS[rand::rng().random_range(0..USER_AGENTS.len())]
}

/// Split `text` into pieces of at most `max_chars` characters.
///
/// Breaks after the last whitespace that fits, or mid-word when a single
/// word is longer than the limit. Concatenating the pieces gives back `text`.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let Some((limit, _)) = rest.char_indices().nth(max_chars) else {
            chunks.push(rest);
            break;
        };

        let window = &rest[..limit];
        let split = window
            .char_indices()
            .rev()
            .find(|&(i, c)| c.is_whitespace() && !window[..i].trim().is_empty())
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(limit);

        chunks.push(&rest[..split]);
        rest = &rest[split..];
    }

    chunks
}
