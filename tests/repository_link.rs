//! PostgreSQL repository tests. Each test gets a fresh database from
//! `#[sqlx::test]` with the migrations applied; run with
//! `DATABASE_URL=... cargo test -- --ignored`.

use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use url_shortener::domain::entities::NewLink;
use url_shortener::domain::repositories::{ClickRepository, LinkRepository};
use url_shortener::error::AppError;
use url_shortener::infrastructure::persistence::{PgClickRepository, PgLinkRepository};

fn new_link(code: &str, url: &str) -> NewLink {
    NewLink {
        code: code.to_string(),
        long_url: url.to_string(),
    }
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_link(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let link = repo
        .create(new_link("test123", "https://example.com"))
        .await
        .unwrap();

    assert_eq!(link.code, "test123");
    assert_eq!(link.long_url, "https://example.com");
    assert_eq!(link.click_count, 0);
    assert!(link.healthy);
    assert!(link.last_checked_at.is_none());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_duplicate_code_conflicts(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    repo.create(new_link("dup", "https://a.example"))
        .await
        .unwrap();

    let result = repo.create(new_link("dup", "https://b.example")).await;

    assert!(matches!(result, Err(AppError::Conflict { .. })));
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_find_by_code(pool: PgPool) {
    sqlx::query("INSERT INTO links (code, long_url) VALUES ($1, $2)")
        .bind("abc123")
        .bind("https://example.com")
        .execute(&pool)
        .await
        .unwrap();

    let repo = PgLinkRepository::new(Arc::new(pool));

    let found = repo.find_by_code("abc123").await.unwrap();
    assert_eq!(found.map(|l| l.code), Some("abc123".to_string()));

    let missing = repo.find_by_code("notfound").await.unwrap();
    assert!(missing.is_none());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_list_all_in_insertion_order(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    for code in ["first", "second", "third"] {
        repo.create(new_link(code, "https://example.com"))
            .await
            .unwrap();
    }

    let codes: Vec<String> = repo
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.code)
        .collect();

    assert_eq!(codes, vec!["first", "second", "third"]);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_health(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    let link = repo
        .create(new_link("probe", "https://down.example"))
        .await
        .unwrap();

    repo.update_health(link.id, false, Utc::now())
        .await
        .unwrap();

    let updated = repo.find_by_code("probe").await.unwrap().unwrap();
    assert!(!updated.healthy);
    assert!(updated.last_checked_at.is_some());

    let missing = repo.update_health(link.id + 1000, true, Utc::now()).await;
    assert!(matches!(missing, Err(AppError::NotFound { .. })));
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_ping(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    assert!(repo.ping().await.is_ok());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_increments(pool: PgPool) {
    let pool = Arc::new(pool);
    let links = PgLinkRepository::new(pool.clone());
    let clicks = Arc::new(PgClickRepository::new(pool));
    let link = links
        .create(new_link("hot", "https://example.com"))
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let clicks = clicks.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..25 {
                clicks.increment_count(link.id).await.unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(clicks.count_for_link(link.id).await.unwrap(), 100);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_click_for_missing_link(pool: PgPool) {
    let clicks = PgClickRepository::new(Arc::new(pool));

    assert!(matches!(
        clicks.increment_count(42).await,
        Err(AppError::NotFound { .. })
    ));
    assert!(matches!(
        clicks.count_for_link(42).await,
        Err(AppError::NotFound { .. })
    ));
}
