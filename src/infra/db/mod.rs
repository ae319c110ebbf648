//! Postgres-backed repository implementations.

mod comments;
mod follows;
mod groups;
mod posts;
mod users;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{
    Postgres, QueryBuilder,
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::repos::{HealthRepo, PostQueryFilter, RepoError};

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(pool).await
    }

    /// Appends the `AND ...` conditions for `filter`. Expects `posts p` in scope.
    fn apply_post_filter<'q>(qb: &mut QueryBuilder<'q, Postgres>, filter: &'q PostQueryFilter) {
        if let Some(group_id) = filter.group_id {
            qb.push(" AND p.group_id = ");
            qb.push_bind(group_id);
        }

        if let Some(author_id) = filter.author_id {
            qb.push(" AND p.author_id = ");
            qb.push_bind(author_id);
        }

        if let Some(user_id) = filter.followed_by {
            qb.push(
                " AND EXISTS (SELECT 1 FROM follows f WHERE f.author_id = p.author_id AND f.user_id = ",
            );
            qb.push_bind(user_id);
            qb.push(")");
        }

        if let Some(search) = filter.search.as_ref() {
            qb.push(" AND p.text ILIKE ");
            qb.push_bind(format!("%{}%", escape_like(search)));
        }
    }

    fn convert_count(value: i64) -> Result<u64, RepoError> {
        value
            .try_into()
            .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
    }
}

#[async_trait]
impl HealthRepo for PostgresRepositories {
    async fn health_check(&self) -> Result<(), RepoError> {
        query("SELECT 1")
            .execute(self.pool())
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
