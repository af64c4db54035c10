//! NASA APOD client, the source-record side of the pipeline
//!
//! One request, no caching, no retries. Failures surface as
//! [`AppError::SourceFetch`] with whatever the provider told us.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

use crate::config::ApodConfig;
use crate::db::ApodInput;
use crate::errors::{AppError, Result};

/// Query against the APOD archive: an explicit date, or `count` random picks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApodQuery {
    pub date: Option<NaiveDate>,
    pub count: Option<u32>,
}

impl ApodQuery {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            count: None,
        }
    }

    pub fn random(count: u32) -> Self {
        Self {
            date: None,
            count: Some(count),
        }
    }
}

#[async_trait]
pub trait ApodProvider: Send + Sync {
    async fn fetch(&self, query: ApodQuery) -> Result<Vec<ApodInput>>;
}

/// Raw item as served by api.nasa.gov. Video entries carry a thumbnail
/// (when requested with `thumbs=true`) instead of a displayable `url`.
#[derive(Debug, Deserialize)]
pub struct RawApod {
    pub title: String,
    pub explanation: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
}

/// Normalize a raw item into a displayable source record.
///
/// Video items fall back to their thumbnail; items with no usable image
/// reference are dropped so the pipeline never sees a non-renderable pair.
pub fn normalize(raw: RawApod) -> Option<ApodInput> {
    let url = match raw.media_type.as_deref() {
        Some("video") => raw.thumbnail_url,
        _ => raw.url.or(raw.thumbnail_url),
    }?;

    Some(ApodInput {
        title: raw.title,
        explanation: raw.explanation,
        date: raw.date,
        url,
        copyright: raw.copyright.map(|c| c.trim().to_string()),
    })
}

pub struct NasaApodClient {
    client: reqwest::Client,
    config: ApodConfig,
}

impl NasaApodClient {
    pub fn new(config: ApodConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(anyhow::Error::from)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ApodProvider for NasaApodClient {
    async fn fetch(&self, query: ApodQuery) -> Result<Vec<ApodInput>> {
        let mut params: Vec<(&str, String)> = vec![
            ("api_key", self.config.api_key.clone()),
            ("thumbs", "true".to_string()),
        ];
        if let Some(date) = query.date {
            params.push(("date", date.to_string()));
        }
        if let Some(count) = query.count {
            params.push(("count", count.to_string()));
        }

        let res = self
            .client
            .get(&self.config.api_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| AppError::SourceFetch(format!("request failed: {e}")))?;

        let status = res.status();
        if !status.is_success() {
            return Err(AppError::SourceFetch(format!(
                "APOD API returned status {status}"
            )));
        }

        let body: serde_json::Value = res
            .json()
            .await
            .map_err(|e| AppError::SourceFetch(format!("invalid response body: {e}")))?;

        // A dated request answers with a single object, a count request
        // with an array.
        let raw: Vec<RawApod> = if body.is_array() {
            serde_json::from_value(body)
        } else {
            serde_json::from_value(body).map(|one| vec![one])
        }
        .map_err(|e| AppError::SourceFetch(format!("unexpected response shape: {e}")))?;

        Ok(raw.into_iter().filter_map(normalize).collect())
    }
}
