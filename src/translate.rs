//! Japanese/English translation through the public `translate_a/single`
//! endpoint.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

static JAPANESE_SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new("[ぁ-んァ-ヶー一-龠]").expect("valid character class"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetLanguage {
    English,
    Japanese,
}

impl TargetLanguage {
    /// Japanese script (kana or common kanji) anywhere in the text means it
    /// goes to English; everything else goes to Japanese.
    pub fn for_text(text: &str) -> Self {
        if JAPANESE_SCRIPT.is_match(text) {
            TargetLanguage::English
        } else {
            TargetLanguage::Japanese
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            TargetLanguage::English => "en",
            TargetLanguage::Japanese => "ja",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationResult {
    Translated(String),
    Failed,
}

impl TranslationResult {
    pub fn is_translated(&self) -> bool {
        matches!(self, TranslationResult::Translated(_))
    }
}

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("service returned {0}")]
    Status(reqwest::StatusCode),
    #[error("response is not JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response has no segment array")]
    Shape,
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// Never fails outright; every error is folded into
    /// [`TranslationResult::Failed`].
    async fn translate(&self, text: &str) -> TranslationResult;
}

pub fn build_url(endpoint: &str, target: TargetLanguage, text: &str) -> String {
    let sep = if endpoint.contains('?') { '&' } else { '?' };
    format!(
        "{}{}client=gtx&sl=auto&tl={}&dt=t&q={}",
        endpoint,
        sep,
        target.code(),
        urlencoding::encode(text)
    )
}

/// Joins the first element of every segment in `body[0]`, in order.
pub fn parse_segments(body: &Value) -> Result<String, TranslateError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or(TranslateError::Shape)?;
    let mut out = String::new();
    for segment in segments {
        if let Some(fragment) = segment.get(0).and_then(Value::as_str) {
            out.push_str(fragment);
        }
    }
    Ok(out)
}

pub struct TranslationClient {
    http: reqwest::Client,
    endpoint: String,
}

impl TranslationClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TranslateError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub async fn request(&self, text: &str) -> Result<String, TranslateError> {
        let target = TargetLanguage::for_text(text);
        let url = build_url(&self.endpoint, target, text);
        tracing::debug!(chars = text.chars().count(), tl = target.code(), "requesting translation");

        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(TranslateError::Status(resp.status()));
        }
        let body = resp.text().await?;
        let value: Value = serde_json::from_str(&body)?;
        parse_segments(&value)
    }
}

#[async_trait]
impl Translator for TranslationClient {
    async fn translate(&self, text: &str) -> TranslationResult {
        match self.request(text).await {
            Ok(out) => TranslationResult::Translated(out),
            Err(err) => {
                tracing::warn!(%err, "translation failed");
                TranslationResult::Failed
            }
        }
    }
}
