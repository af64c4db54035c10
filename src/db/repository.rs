//! Repository pattern for the paired-record store
//!
//! The one operation with real teeth is [`Repository::insert_pair_atomic`]:
//! the dedup check and both inserts run inside a single transaction, and the
//! unique constraints on title and date catch the window where two creators
//! both pass the check before either commits. Either way a check-then-insert
//! race resolves to exactly one stored pair. Every other operation is a
//! plain query.

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::{ai_apod, apod, AiApod, AiApodColumn, AiApodEntity, Apod, ApodColumn, ApodEntity};
use crate::errors::{AppError, Result};

/// Normalized APOD metadata as delivered by the source provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApodInput {
    pub title: String,
    pub explanation: String,
    pub date: NaiveDate,
    pub url: String,
    pub copyright: Option<String>,
}

/// Generated counterpart as delivered by the synthesis provider.
///
/// Everything but `image_url` is echoed source metadata; the store copies
/// those fields from the APOD row rather than trusting the echo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiImageInput {
    pub image_url: String,
    pub title: String,
    pub date: NaiveDate,
    pub description: String,
    pub copyright: Option<String>,
}

/// Ephemeral view of one stored real/synthetic pair. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pair {
    pub apod: Apod,
    pub ai: AiApod,
}

/// Outcome of an atomic pair insert.
#[derive(Debug)]
pub enum InsertOutcome {
    Created(Pair),
    /// A row matching the title or date already existed; nothing was written.
    Duplicate,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    db: DatabaseConnection,
}

impl Repository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.db
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection(format!("ping failed: {e}")))?;
        Ok(())
    }

    /// The dedup predicate: one APOD row per distinct title or date.
    fn dedup_filter(title: &str, date: NaiveDate) -> Condition {
        Condition::any()
            .add(ApodColumn::Title.eq(title))
            .add(ApodColumn::Date.eq(date))
    }

    pub async fn exists_by_title_or_date(&self, title: &str, date: NaiveDate) -> Result<bool> {
        let count = ApodEntity::find()
            .filter(Self::dedup_filter(title, date))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Insert a source record and its generated counterpart as one unit.
    ///
    /// Re-checks the dedup predicate inside the transaction, inserts the
    /// APOD row, then the AI row referencing its freshly assigned id, and
    /// commits. A duplicate aborts cleanly with [`InsertOutcome::Duplicate`];
    /// any other failure rolls back before the error surfaces, so readers
    /// never observe exactly one of the two rows.
    pub async fn insert_pair_atomic(
        &self,
        apod: ApodInput,
        ai: AiImageInput,
    ) -> Result<InsertOutcome> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Persist(format!("failed to open transaction: {e}")))?;

        match Self::insert_pair_in_txn(&txn, apod, ai).await {
            Ok(Some(pair)) => {
                txn.commit()
                    .await
                    .map_err(|e| AppError::Persist(format!("commit failed: {e}")))?;
                Ok(InsertOutcome::Created(pair))
            }
            Ok(None) => {
                // Duplicate found inside the transaction; nothing was written.
                txn.rollback()
                    .await
                    .map_err(|e| AppError::Persist(format!("rollback failed: {e}")))?;
                Ok(InsertOutcome::Duplicate)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback failed after aborted pair insert");
                }
                Err(err)
            }
        }
    }

    async fn insert_pair_in_txn(
        txn: &DatabaseTransaction,
        apod: ApodInput,
        ai: AiImageInput,
    ) -> Result<Option<Pair>> {
        let existing = ApodEntity::find()
            .filter(Self::dedup_filter(&apod.title, apod.date))
            .one(txn)
            .await
            .map_err(|e| AppError::Persist(format!("dedup check failed: {e}")))?;

        if existing.is_some() {
            return Ok(None);
        }

        let now = chrono::Utc::now();

        let inserted = apod::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(apod.title.clone()),
            explanation: Set(apod.explanation.clone()),
            date: Set(apod.date),
            url: Set(apod.url),
            copyright: Set(apod.copyright.clone()),
            created_at: Set(now.into()),
        }
        .insert(txn)
        .await;

        let apod_row = match inserted {
            Ok(row) => row,
            // Under READ COMMITTED a concurrent transaction can pass the
            // dedup check before we commit; the unique constraints on title
            // and date then reject its insert here, and that rejection means
            // the pair already exists.
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Ok(None);
            }
            Err(err) => return Err(AppError::Persist(format!("apod insert failed: {err}"))),
        };

        let ai_row = ai_apod::ActiveModel {
            id: Set(Uuid::new_v4()),
            nasa_apod_id: Set(apod_row.id),
            title: Set(apod.title),
            explanation: Set(apod.explanation),
            date: Set(apod.date),
            url: Set(ai.image_url),
            copyright: Set(apod.copyright),
            created_at: Set(now.into()),
        }
        .insert(txn)
        .await
        .map_err(|e| AppError::Persist(format!("ai insert failed: {e}")))?;

        Ok(Some(Pair {
            apod: apod_row,
            ai: ai_row,
        }))
    }

    /// Cheap existence lookup for the daily-game path.
    pub async fn find_pair_by_date(&self, date: NaiveDate) -> Result<Option<Pair>> {
        let Some(apod) = ApodEntity::find()
            .filter(ApodColumn::Date.eq(date))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        self.pair_for(apod).await
    }

    /// Lookup mirroring the dedup predicate, used to recover from a
    /// duplicate insert by returning the pair that won.
    pub async fn find_pair_matching(&self, title: &str, date: NaiveDate) -> Result<Option<Pair>> {
        let Some(apod) = ApodEntity::find()
            .filter(Self::dedup_filter(title, date))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        self.pair_for(apod).await
    }

    async fn pair_for(&self, apod: Apod) -> Result<Option<Pair>> {
        let ai = AiApodEntity::find()
            .filter(AiApodColumn::NasaApodId.eq(apod.id))
            .one(&self.db)
            .await?;
        Ok(ai.map(|ai| Pair { apod, ai }))
    }

    pub async fn find_apod(&self, id: Uuid) -> Result<Option<Apod>> {
        ApodEntity::find_by_id(id).one(&self.db).await.map_err(Into::into)
    }

    // Full scans; the store guarantees no ordering, callers sort.

    pub async fn list_apods(&self) -> Result<Vec<Apod>> {
        ApodEntity::find().all(&self.db).await.map_err(Into::into)
    }

    pub async fn list_ai_images(&self) -> Result<Vec<AiApod>> {
        AiApodEntity::find().all(&self.db).await.map_err(Into::into)
    }

    pub async fn count_apods(&self) -> Result<u64> {
        ApodEntity::find().count(&self.db).await.map_err(Into::into)
    }

    pub async fn count_ai_images(&self) -> Result<u64> {
        AiApodEntity::find().count(&self.db).await.map_err(Into::into)
    }

    /// Delete a single APOD row. Does not cascade.
    pub async fn delete_apod(&self, id: Uuid) -> Result<bool> {
        let result = ApodEntity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    /// Delete the AI rows referencing an APOD row.
    pub async fn delete_ai_for_apod(&self, apod_id: Uuid) -> Result<u64> {
        let result = AiApodEntity::delete_many()
            .filter(AiApodColumn::NasaApodId.eq(apod_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
