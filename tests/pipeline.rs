//! Integration tests for the pair pipeline over an in-memory store.
//!
//! The repository runs against SQLite with the same entities the service
//! uses in production; the two upstream providers are stubbed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set, SqlErr};
use uuid::Uuid;

use nasa_or_not::db::models::{AiApodActiveModel, ApodActiveModel};
use nasa_or_not::db::{self, AiImageInput, ApodInput, InsertOutcome, Repository};
use nasa_or_not::errors::{AppError, Result};
use nasa_or_not::providers::{ApodMetadata, ApodProvider, ApodQuery, ImageSynthesizer};
use nasa_or_not::services::{PairService, SortField, SortOrder};

/// Store plus the raw connection, for tests that write rows directly.
async fn test_store() -> (DatabaseConnection, Repository) {
    // A single connection: every in-memory SQLite connection is its own
    // database, and it also serializes concurrent writers like the
    // production store does.
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1);
    let conn = Database::connect(opts).await.expect("connect sqlite");
    db::ensure_schema(&conn).await.expect("create schema");
    (conn.clone(), Repository::new(conn))
}

async fn test_repo() -> Repository {
    test_store().await.1
}

fn eagle_nebula() -> ApodInput {
    ApodInput {
        title: "Eagle Nebula".to_string(),
        explanation: "Pillars of gas and dust in M16.".to_string(),
        date: date(2024, 5, 1),
        url: "https://x/real.jpg".to_string(),
        copyright: None,
    }
}

fn crab_nebula() -> ApodInput {
    ApodInput {
        title: "Crab Nebula".to_string(),
        explanation: "The expanding remnant of a supernova.".to_string(),
        date: date(2024, 5, 2),
        url: "https://x/crab.jpg".to_string(),
        copyright: Some("Jane Doe".to_string()),
    }
}

fn ai_echo(input: &ApodInput, image_url: &str) -> AiImageInput {
    AiImageInput {
        image_url: image_url.to_string(),
        title: input.title.clone(),
        date: input.date,
        description: input.explanation.clone(),
        copyright: input.copyright.clone(),
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct StubApodProvider {
    record: ApodInput,
}

#[async_trait]
impl ApodProvider for StubApodProvider {
    async fn fetch(&self, _query: ApodQuery) -> Result<Vec<ApodInput>> {
        Ok(vec![self.record.clone()])
    }
}

struct StubSynthesizer {
    image_url: String,
}

#[async_trait]
impl ImageSynthesizer for StubSynthesizer {
    async fn generate(&self, metadata: &ApodMetadata) -> Result<AiImageInput> {
        Ok(AiImageInput {
            image_url: self.image_url.clone(),
            title: metadata.title.clone(),
            date: metadata.date,
            description: metadata.explanation.clone(),
            copyright: metadata.copyright.clone(),
        })
    }
}

/// Emulates the image API answering 429.
struct RateLimitedSynthesizer;

#[async_trait]
impl ImageSynthesizer for RateLimitedSynthesizer {
    async fn generate(&self, _metadata: &ApodMetadata) -> Result<AiImageInput> {
        Err(AppError::RateLimited)
    }
}

fn service(repo: &Repository, record: ApodInput) -> PairService {
    PairService::new(
        repo.clone(),
        Arc::new(StubApodProvider { record }),
        Arc::new(StubSynthesizer {
            image_url: "https://x/ai.jpg".to_string(),
        }),
    )
}

#[tokio::test]
async fn daily_pair_is_created_and_linked() {
    let repo = test_repo().await;
    let svc = service(&repo, eagle_nebula());

    let pair = svc.get_or_create_pair_for(date(2024, 5, 1)).await.unwrap();

    assert_eq!(pair.apod.title, "Eagle Nebula");
    assert_eq!(pair.apod.url, "https://x/real.jpg");
    assert_eq!(pair.ai.url, "https://x/ai.jpg");
    assert_eq!(pair.ai.nasa_apod_id, pair.apod.id);
    assert_eq!(pair.ai.title, pair.apod.title);
    assert_eq!(pair.ai.date, pair.apod.date);

    assert_eq!(repo.count_apods().await.unwrap(), 1);
    assert_eq!(repo.count_ai_images().await.unwrap(), 1);
}

#[tokio::test]
async fn repeated_daily_call_returns_the_stored_pair() {
    let repo = test_repo().await;
    let svc = service(&repo, eagle_nebula());

    let first = svc.get_or_create_pair_for(date(2024, 5, 1)).await.unwrap();
    let second = svc.get_or_create_pair_for(date(2024, 5, 1)).await.unwrap();

    assert_eq!(first.apod.id, second.apod.id);
    assert_eq!(first.ai.id, second.ai.id);
    assert_eq!(repo.count_apods().await.unwrap(), 1);
    assert_eq!(repo.count_ai_images().await.unwrap(), 1);
}

#[tokio::test]
async fn conflicting_insert_is_recovered_as_the_existing_pair() {
    let repo = test_repo().await;
    let svc = service(&repo, eagle_nebula());

    // First call stores the pair under 2024-05-01.
    let stored = svc.get_or_create_pair_for(date(2024, 5, 1)).await.unwrap();

    // A request for another day misses the date check, fetches the same
    // record, and collides on insert; the stored pair must win.
    let recovered = svc.get_or_create_pair_for(date(2024, 5, 2)).await.unwrap();

    assert_eq!(recovered.apod.id, stored.apod.id);
    assert_eq!(repo.count_apods().await.unwrap(), 1);
}

#[tokio::test]
async fn duplicate_title_or_date_never_inserts_a_second_row() {
    let repo = test_repo().await;

    let outcome = repo
        .insert_pair_atomic(eagle_nebula(), ai_echo(&eagle_nebula(), "https://x/ai.jpg"))
        .await
        .unwrap();
    assert!(matches!(outcome, InsertOutcome::Created(_)));

    // Same title, different date.
    let mut same_title = eagle_nebula();
    same_title.date = date(2024, 6, 1);
    let outcome = repo
        .insert_pair_atomic(same_title, ai_echo(&eagle_nebula(), "https://x/ai2.jpg"))
        .await
        .unwrap();
    assert!(matches!(outcome, InsertOutcome::Duplicate));

    // Same date, different title.
    let mut same_date = crab_nebula();
    same_date.date = date(2024, 5, 1);
    let outcome = repo
        .insert_pair_atomic(same_date.clone(), ai_echo(&same_date, "https://x/ai3.jpg"))
        .await
        .unwrap();
    assert!(matches!(outcome, InsertOutcome::Duplicate));

    assert_eq!(repo.count_apods().await.unwrap(), 1);
    assert_eq!(repo.count_ai_images().await.unwrap(), 1);
    assert!(repo
        .exists_by_title_or_date("Eagle Nebula", date(2020, 1, 1))
        .await
        .unwrap());
}

#[tokio::test]
async fn racing_insert_is_stopped_by_the_unique_constraints() {
    let (conn, repo) = test_store().await;
    repo.insert_pair_atomic(eagle_nebula(), ai_echo(&eagle_nebula(), "https://x/ai.jpg"))
        .await
        .unwrap();

    // Writes that skip the dedup check, the way a concurrent transaction's
    // inserts land after both passed it: the schema itself must reject them.
    let same_title = ApodActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set("Eagle Nebula".to_string()),
        explanation: Set("A second copy under another date.".to_string()),
        date: Set(date(2024, 6, 1)),
        url: Set("https://x/dup-title.jpg".to_string()),
        copyright: Set(None),
        created_at: Set(chrono::Utc::now().into()),
    }
    .insert(&conn)
    .await
    .unwrap_err();
    assert!(matches!(
        same_title.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(_))
    ));

    let same_date = ApodActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set("Crab Nebula".to_string()),
        explanation: Set("Another record on the stored date.".to_string()),
        date: Set(date(2024, 5, 1)),
        url: Set("https://x/dup-date.jpg".to_string()),
        copyright: Set(None),
        created_at: Set(chrono::Utc::now().into()),
    }
    .insert(&conn)
    .await
    .unwrap_err();
    assert!(matches!(
        same_date.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(_))
    ));

    assert_eq!(repo.count_apods().await.unwrap(), 1);
}

#[tokio::test]
async fn synthesis_failure_leaves_the_store_untouched() {
    let repo = test_repo().await;
    let svc = PairService::new(
        repo.clone(),
        Arc::new(StubApodProvider {
            record: eagle_nebula(),
        }),
        Arc::new(RateLimitedSynthesizer),
    );

    let err = svc.create_random_pair().await.unwrap_err();
    assert!(matches!(err, AppError::RateLimited));

    assert_eq!(repo.count_apods().await.unwrap(), 0);
    assert_eq!(repo.count_ai_images().await.unwrap(), 0);
}

#[tokio::test]
async fn stored_ai_rows_always_resolve_their_source() {
    let repo = test_repo().await;
    let svc = service(&repo, eagle_nebula());
    svc.get_or_create_pair_for(date(2024, 5, 1)).await.unwrap();

    let apods = repo.list_apods().await.unwrap();
    for ai in repo.list_ai_images().await.unwrap() {
        assert!(apods.iter().any(|a| a.id == ai.nasa_apod_id));
    }
}

#[tokio::test]
async fn concurrent_daily_creation_stores_exactly_one_pair() {
    let repo = test_repo().await;
    let svc = Arc::new(service(&repo, eagle_nebula()));
    let day = date(2024, 5, 1);

    let calls = (0..5).map(|_| {
        let svc = svc.clone();
        tokio::spawn(async move { svc.get_or_create_pair_for(day).await })
    });
    let results = futures::future::join_all(calls).await;

    let mut apod_ids = Vec::new();
    for joined in results {
        let pair = joined.expect("task panicked").expect("pipeline failed");
        apod_ids.push(pair.apod.id);
    }
    apod_ids.dedup();
    assert_eq!(apod_ids.len(), 1);

    assert_eq!(repo.count_apods().await.unwrap(), 1);
    assert_eq!(repo.count_ai_images().await.unwrap(), 1);
}

#[tokio::test]
async fn delete_pair_removes_both_rows() {
    let repo = test_repo().await;
    let svc = service(&repo, eagle_nebula());
    let pair = svc.get_or_create_pair_for(date(2024, 5, 1)).await.unwrap();

    svc.delete_pair(pair.apod.id).await.unwrap();

    assert_eq!(repo.count_apods().await.unwrap(), 0);
    assert_eq!(repo.count_ai_images().await.unwrap(), 0);
}

#[tokio::test]
async fn delete_pair_on_unknown_id_is_not_found() {
    let repo = test_repo().await;
    let svc = service(&repo, eagle_nebula());
    svc.get_or_create_pair_for(date(2024, 5, 1)).await.unwrap();

    let err = svc.delete_pair(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));

    // Store unchanged.
    assert_eq!(repo.count_apods().await.unwrap(), 1);
    assert_eq!(repo.count_ai_images().await.unwrap(), 1);
}

#[tokio::test]
async fn every_synthetic_for_a_source_lists_as_its_own_pair() {
    let (conn, repo) = test_store().await;
    let svc = service(&repo, eagle_nebula());
    let pair = svc.get_or_create_pair_for(date(2024, 5, 1)).await.unwrap();

    // A regenerated image for the same source record.
    AiApodActiveModel {
        id: Set(Uuid::new_v4()),
        nasa_apod_id: Set(pair.apod.id),
        title: Set(pair.apod.title.clone()),
        explanation: Set(pair.apod.explanation.clone()),
        date: Set(pair.apod.date),
        url: Set("https://x/ai-retake.jpg".to_string()),
        copyright: Set(None),
        created_at: Set(chrono::Utc::now().into()),
    }
    .insert(&conn)
    .await
    .unwrap();

    let listed = svc
        .list_pairs(None, SortField::Date, SortOrder::Asc)
        .await
        .unwrap();

    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|p| p.apod.id == pair.apod.id));
    let urls: Vec<&str> = listed.iter().map(|p| p.ai.url.as_str()).collect();
    assert!(urls.contains(&"https://x/ai.jpg"));
    assert!(urls.contains(&"https://x/ai-retake.jpg"));
}

#[tokio::test]
async fn list_pairs_filters_and_sorts_client_side() {
    let repo = test_repo().await;
    repo.insert_pair_atomic(eagle_nebula(), ai_echo(&eagle_nebula(), "https://x/ai1.jpg"))
        .await
        .unwrap();
    repo.insert_pair_atomic(crab_nebula(), ai_echo(&crab_nebula(), "https://x/ai2.jpg"))
        .await
        .unwrap();
    let svc = service(&repo, eagle_nebula());

    let filtered = svc
        .list_pairs(Some("eAgLe"), SortField::Date, SortOrder::Asc)
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].apod.title, "Eagle Nebula");

    let by_date = svc
        .list_pairs(Some("2024-05-02"), SortField::Date, SortOrder::Asc)
        .await
        .unwrap();
    assert_eq!(by_date.len(), 1);
    assert_eq!(by_date[0].apod.title, "Crab Nebula");

    let by_title = svc
        .list_pairs(None, SortField::Title, SortOrder::Asc)
        .await
        .unwrap();
    assert_eq!(by_title[0].apod.title, "Crab Nebula");
    assert_eq!(by_title[1].apod.title, "Eagle Nebula");

    let newest_first = svc
        .list_pairs(None, SortField::Date, SortOrder::Desc)
        .await
        .unwrap();
    assert_eq!(newest_first[0].apod.date, date(2024, 5, 2));
}
