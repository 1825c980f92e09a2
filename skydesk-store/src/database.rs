use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Pool, Postgres, QueryBuilder};
use skydesk_core::{CoreError, CoreResult};
use skydesk_shared::{Page, PageRequest};
use std::time::Duration;
use tracing::info;

use crate::app_config::DatabaseConfig;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

/// Postgres implementation of every repository trait.
#[derive(Clone)]
pub struct PgStore {
    pub(crate) pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const UNIQUE_VIOLATION: &str = "23505";
const CHECK_VIOLATION: &str = "23514";
const FOREIGN_KEY_VIOLATION: &str = "23503";

pub(crate) fn map_db_error(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db) = &err {
        match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) | Some(CHECK_VIOLATION) => {
                return CoreError::Conflict(db.message().to_string());
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                return CoreError::Validation(db.message().to_string());
            }
            _ => {}
        }
    }
    CoreError::Storage(err.to_string())
}

/// `.db()?` on sqlx results.
pub(crate) trait DbResultExt<T> {
    fn db(self) -> CoreResult<T>;
}

impl<T> DbResultExt<T> for Result<T, sqlx::Error> {
    fn db(self) -> CoreResult<T> {
        self.map_err(map_db_error)
    }
}

/// Runs a filtered `COUNT(*)` plus the matching page of rows.
///
/// `from` is everything after `SELECT ...` up to and including a `WHERE TRUE`;
/// `filters` appends ` AND ...` clauses to both queries.
pub(crate) async fn fetch_page<R, M, F>(
    pool: &PgPool,
    columns: &str,
    from: &str,
    filters: F,
    order_by: &str,
    page: PageRequest,
) -> CoreResult<Page<M>>
where
    R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    M: TryFrom<R, Error = CoreError>,
    F: for<'a> Fn(&mut QueryBuilder<'a, Postgres>),
{
    let mut count = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) {}", from));
    filters(&mut count);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await.db()?;

    let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} {}", columns, from));
    filters(&mut select);
    select
        .push(format!(" ORDER BY {} LIMIT ", order_by))
        .push_bind(page.limit() as i64)
        .push(" OFFSET ")
        .push_bind(page.offset() as i64);
    let rows: Vec<R> = select.build_query_as().fetch_all(pool).await.db()?;

    let items = rows.into_iter().map(M::try_from).collect::<CoreResult<Vec<M>>>()?;
    Ok(Page::new(items, page, total.max(0) as u64))
}

/// Case-insensitive `LIKE` pattern for free-text filters. Wildcards typed by the
/// user match literally, as they do in the memory backend.
pub(crate) fn like_pattern(q: &str) -> String {
    let escaped = q
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
