//! PostgreSQL implementation of click counters.

use async_trait::async_trait;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::repositories::ClickRepository;
use crate::error::AppError;

/// PostgreSQL repository for per-link click counts.
///
/// The increment is a single `UPDATE ... SET click_count = click_count + 1`
/// statement, so concurrent workers never lose updates.
pub struct PgClickRepository {
    pool: Arc<PgPool>,
}

impl PgClickRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClickRepository for PgClickRepository {
    async fn increment_count(&self, link_id: i64) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE links
            SET click_count = click_count + 1
            WHERE id = $1
            "#,
        )
        .bind(link_id)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                "Link not found",
                json!({ "link_id": link_id }),
            ));
        }

        Ok(())
    }

    async fn count_for_link(&self, link_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT click_count FROM links WHERE id = $1")
            .bind(link_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        count.ok_or_else(|| AppError::not_found("Link not found", json!({ "link_id": link_id })))
    }
}
