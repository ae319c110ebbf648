use async_trait::async_trait;
use sqlx::QueryBuilder;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::application::repos::{
    CreatePostParams, PostQueryFilter, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::PostRecord;

use super::{PostgresRepositories, map_sqlx_error};

const POST_SELECT: &str = "SELECT p.id, p.text, p.pub_date, p.author_id, u.username AS author_username, \
     p.group_id, g.slug AS group_slug, g.title AS group_title, p.image \
     FROM posts p \
     INNER JOIN users u ON u.id = p.author_id \
     LEFT JOIN groups g ON g.id = p.group_id";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    text: String,
    pub_date: OffsetDateTime,
    author_id: Uuid,
    author_username: String,
    group_id: Option<Uuid>,
    group_slug: Option<String>,
    group_title: Option<String>,
    image: Option<String>,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
            pub_date: row.pub_date,
            author_id: row.author_id,
            author_username: row.author_username,
            group_id: row.group_id,
            group_slug: row.group_slug,
            group_title: row.group_title,
            image: row.image,
        }
    }
}

impl PostgresRepositories {
    /// Writes return the bare row; re-read it with the joined author and group.
    async fn load_post(&self, id: Uuid) -> Result<PostRecord, RepoError> {
        self.find_post(id).await?.ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(
        &self,
        filter: &PostQueryFilter,
        page: PageRequest,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let offset = i64::try_from(page.offset)
            .map_err(|_| RepoError::InvalidInput {
                message: "page offset out of range".to_string(),
            })?;

        let mut qb = QueryBuilder::new(POST_SELECT);
        qb.push(" WHERE 1=1");
        Self::apply_post_filter(&mut qb, filter);
        qb.push(" ORDER BY p.pub_date DESC, p.id DESC LIMIT ");
        qb.push_bind(i64::from(page.limit));
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn count_posts(&self, filter: &PostQueryFilter) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM posts p WHERE 1=1");
        Self::apply_post_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar::<i64>()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(&format!("{POST_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO posts (id, text, author_id, group_id, image) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(&params.text)
        .bind(params.author_id)
        .bind(params.group_id)
        .bind(params.image.as_deref())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        self.load_post(id).await
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let result = sqlx::query(
            "UPDATE posts SET text = $2, group_id = $3, image = COALESCE($4, image) \
             WHERE id = $1",
        )
        .bind(params.id)
        .bind(&params.text)
        .bind(params.group_id)
        .bind(params.image.as_deref())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        self.load_post(params.id).await
    }

    async fn set_post_group(
        &self,
        id: Uuid,
        group_id: Option<Uuid>,
    ) -> Result<PostRecord, RepoError> {
        let result = sqlx::query("UPDATE posts SET group_id = $2 WHERE id = $1")
            .bind(id)
            .bind(group_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        self.load_post(id).await
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
