//! Pair pipeline service
//!
//! Orchestrates the core workflow:
//! 1. Check the store for a qualifying pair
//! 2. Fetch the real APOD record
//! 3. Generate the AI counterpart from its metadata
//! 4. Persist both rows in one transaction
//!
//! A duplicate insert is a normal outcome of concurrent first access, not a
//! failure: the pipeline re-reads the stored pair and returns that.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::models::AiApod;
use crate::db::{InsertOutcome, Pair, Repository};
use crate::errors::{AppError, Result};
use crate::providers::{ApodMetadata, ApodProvider, ApodQuery, ImageSynthesizer};

/// Sort key for the administrative listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Title,
    #[default]
    Date,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

pub struct PairService {
    repo: Repository,
    apod: Arc<dyn ApodProvider>,
    synthesizer: Arc<dyn ImageSynthesizer>,
}

impl PairService {
    pub fn new(
        repo: Repository,
        apod: Arc<dyn ApodProvider>,
        synthesizer: Arc<dyn ImageSynthesizer>,
    ) -> Self {
        Self {
            repo,
            apod,
            synthesizer,
        }
    }

    /// Return today's pair, creating it on first access.
    pub async fn get_or_create_daily_pair(&self) -> Result<Pair> {
        self.get_or_create_pair_for(Utc::now().date_naive()).await
    }

    /// Daily flow pinned to an explicit date so the existence check and the
    /// fetched record stay on the same calendar day.
    pub async fn get_or_create_pair_for(&self, date: NaiveDate) -> Result<Pair> {
        if let Some(pair) = self.repo.find_pair_by_date(date).await? {
            tracing::debug!(%date, apod_id = %pair.apod.id, "daily pair already stored");
            return Ok(pair);
        }
        self.materialize(ApodQuery::for_date(date)).await
    }

    /// Create a pair from a randomly selected archive record.
    pub async fn create_random_pair(&self) -> Result<Pair> {
        self.materialize(ApodQuery::random(1)).await
    }

    /// fetch source -> generate synthetic -> persist, in that order, with a
    /// suspension point at each external call. No retries anywhere.
    async fn materialize(&self, query: ApodQuery) -> Result<Pair> {
        let start = Instant::now();

        let mut records = self.apod.fetch(query).await?;
        let input = records
            .pop()
            .ok_or_else(|| AppError::SourceFetch("provider returned no usable records".to_string()))?;

        let ai = self
            .synthesizer
            .generate(&ApodMetadata::from(&input))
            .await?;

        match self.repo.insert_pair_atomic(input.clone(), ai).await? {
            InsertOutcome::Created(pair) => {
                metrics::counter!("nasa_or_not_pairs_created_total").increment(1);
                tracing::info!(
                    apod_id = %pair.apod.id,
                    ai_id = %pair.ai.id,
                    date = %pair.apod.date,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "pair materialized"
                );
                Ok(pair)
            }
            InsertOutcome::Duplicate => {
                // Lost the race with a concurrent creator; the stored pair wins.
                metrics::counter!("nasa_or_not_pair_conflicts_total").increment(1);
                tracing::info!(
                    title = %input.title,
                    date = %input.date,
                    "pair already present, returning stored copy"
                );
                self.repo
                    .find_pair_matching(&input.title, input.date)
                    .await?
                    .ok_or(AppError::DuplicatePair)
            }
        }
    }

    /// Administrative listing: filter and sort are view concerns applied
    /// over the full scan, since the store guarantees no ordering. A source
    /// record can carry more than one synthetic; each one lists as its own
    /// pair.
    pub async fn list_pairs(
        &self,
        filter: Option<&str>,
        sort_by: SortField,
        order: SortOrder,
    ) -> Result<Vec<Pair>> {
        let apods = self.repo.list_apods().await?;
        let ai_images = self.repo.list_ai_images().await?;

        let mut by_apod: HashMap<Uuid, Vec<AiApod>> = HashMap::new();
        for ai in ai_images {
            by_apod.entry(ai.nasa_apod_id).or_default().push(ai);
        }

        let mut pairs: Vec<Pair> = apods
            .into_iter()
            .filter_map(|apod| by_apod.remove(&apod.id).map(|ais| (apod, ais)))
            .flat_map(|(apod, ais)| {
                ais.into_iter().map(move |ai| Pair {
                    apod: apod.clone(),
                    ai,
                })
            })
            .collect();

        if let Some(needle) = filter {
            let needle = needle.to_lowercase();
            pairs.retain(|p| {
                p.apod.title.to_lowercase().contains(&needle)
                    || p.apod.date.to_string().contains(&needle)
            });
        }

        pairs.sort_by(|a, b| match sort_by {
            SortField::Title => a.apod.title.cmp(&b.apod.title),
            SortField::Date => a.apod.date.cmp(&b.apod.date),
            SortField::CreatedAt => a.apod.created_at.cmp(&b.apod.created_at),
        });
        if order == SortOrder::Desc {
            pairs.reverse();
        }

        Ok(pairs)
    }

    /// Administrative removal. The store does not cascade, so the AI rows
    /// go first; a missing APOD row leaves the store untouched.
    pub async fn delete_pair(&self, apod_id: Uuid) -> Result<()> {
        if self.repo.find_apod(apod_id).await?.is_none() {
            return Err(AppError::NotFound {
                resource: "pair",
                id: apod_id.to_string(),
            });
        }

        let ai_rows = self.repo.delete_ai_for_apod(apod_id).await?;
        self.repo.delete_apod(apod_id).await?;

        tracing::info!(%apod_id, ai_rows, "pair deleted");
        Ok(())
    }
}
