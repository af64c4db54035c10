//! Image synthesis client, the generated side of the pipeline
//!
//! The prompt is a pure function of the source metadata so a given APOD
//! always asks for the same picture; what the model paints is its business.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;

use crate::config::SynthesisConfig;
use crate::db::{AiImageInput, ApodInput};
use crate::errors::{AppError, Result};

/// The four metadata fields the prompt is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApodMetadata {
    pub title: String,
    pub explanation: String,
    pub date: NaiveDate,
    pub copyright: Option<String>,
}

impl From<&ApodInput> for ApodMetadata {
    fn from(input: &ApodInput) -> Self {
        Self {
            title: input.title.clone(),
            explanation: input.explanation.clone(),
            date: input.date,
            copyright: input.copyright.clone(),
        }
    }
}

#[async_trait]
pub trait ImageSynthesizer: Send + Sync {
    async fn generate(&self, metadata: &ApodMetadata) -> Result<AiImageInput>;
}

/// Build the generation prompt. Same metadata in, same text out.
pub fn build_prompt(metadata: &ApodMetadata) -> String {
    let credit = metadata
        .copyright
        .as_deref()
        .map(|c| format!("by {}", c.trim()))
        .unwrap_or_else(|| "unknown".to_string());

    format!(
        "Generate an image titled \"{title}\". The scene should capture: {explanation}. \
         Mimic the original image as closely as possible using only this description, \
         without seeing the image itself. Ensure that the generated image includes all \
         the key elements described in the metadata, such as {title}, the location \
         ({credit}), and the celestial objects or phenomena mentioned. The goal is to \
         create an image that could convincingly resemble the original photograph taken \
         on {date}.",
        title = metadata.title,
        explanation = metadata.explanation,
        credit = credit,
        date = metadata.date,
    )
}

/// Map an upstream synthesis failure to its user-facing class.
///
/// 429 means rate limited; a "budget" complaint in the body means the
/// monthly spend cap is gone; anything else is a plain generation failure.
pub fn classify_failure(status: u16, message: &str) -> AppError {
    if status == 429 {
        AppError::RateLimited
    } else if message.to_ascii_lowercase().contains("budget") {
        AppError::BudgetExceeded
    } else {
        AppError::Generation(format!("upstream status {status}: {message}"))
    }
}

pub struct DalleClient {
    client: reqwest::Client,
    config: SynthesisConfig,
}

impl DalleClient {
    pub fn new(config: SynthesisConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(anyhow::Error::from)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ImageSynthesizer for DalleClient {
    async fn generate(&self, metadata: &ApodMetadata) -> Result<AiImageInput> {
        let payload = serde_json::json!({
            "model": self.config.model,
            "prompt": build_prompt(metadata),
            "n": 1,
            "size": self.config.image_size,
        });

        let res = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("request failed: {e}")))?;

        let status = res.status();
        if !status.is_success() {
            let message = res.text().await.unwrap_or_default();
            return Err(classify_failure(status.as_u16(), &message));
        }

        let body: serde_json::Value = res
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("invalid response body: {e}")))?;

        let image_url = body["data"][0]["url"]
            .as_str()
            .ok_or_else(|| AppError::Generation("response carried no image url".to_string()))?
            .to_string();

        Ok(AiImageInput {
            image_url,
            title: metadata.title.clone(),
            date: metadata.date,
            description: metadata.explanation.clone(),
            copyright: metadata.copyright.clone(),
        })
    }
}
