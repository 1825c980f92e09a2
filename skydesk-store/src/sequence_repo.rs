use async_trait::async_trait;
use skydesk_core::repository::SequenceRepository;
use skydesk_core::CoreResult;

use crate::database::{DbResultExt, PgStore};

#[async_trait]
impl SequenceRepository for PgStore {
    async fn next_value(&self, key: &str) -> CoreResult<i64> {
        // Single statement, so concurrent callers never see the same value.
        sqlx::query_scalar(
            r#"
            INSERT INTO sequences (key, value) VALUES ($1, 1)
            ON CONFLICT (key) DO UPDATE SET value = sequences.value + 1
            RETURNING value
            "#,
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await
        .db()
    }
}
