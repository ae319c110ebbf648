use async_trait::async_trait;
use sqlx::QueryBuilder;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreateGroupParams, GroupsRepo, GroupsWriteRepo, RepoError, UpdateGroupParams,
};
use crate::domain::entities::GroupRecord;

use super::{PostgresRepositories, escape_like, map_sqlx_error};

const GROUP_COLUMNS: &str = "id, title, slug, description, created_at";

#[derive(sqlx::FromRow)]
struct GroupRow {
    id: Uuid,
    title: String,
    slug: String,
    description: String,
    created_at: OffsetDateTime,
}

impl From<GroupRow> for GroupRecord {
    fn from(row: GroupRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl GroupsRepo for PostgresRepositories {
    async fn list_groups(&self, search: Option<&str>) -> Result<Vec<GroupRecord>, RepoError> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(GROUP_COLUMNS);
        qb.push(" FROM groups WHERE 1=1");

        if let Some(search) = search {
            qb.push(" AND description ILIKE ");
            qb.push_bind(format!("%{}%", escape_like(search)));
        }

        qb.push(" ORDER BY title, slug");

        let rows = qb
            .build_query_as::<GroupRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(GroupRecord::from).collect())
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
        let row = sqlx::query_as::<_, GroupRow>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(GroupRecord::from))
    }
}

#[async_trait]
impl GroupsWriteRepo for PostgresRepositories {
    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError> {
        let row = sqlx::query_as::<_, GroupRow>(&format!(
            "INSERT INTO groups (id, title, slug, description) VALUES ($1, $2, $3, $4) \
             RETURNING {GROUP_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&params.title)
        .bind(&params.slug)
        .bind(&params.description)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_group(&self, params: UpdateGroupParams) -> Result<GroupRecord, RepoError> {
        let row = sqlx::query_as::<_, GroupRow>(&format!(
            "UPDATE groups SET title = $2, description = $3 WHERE id = $1 \
             RETURNING {GROUP_COLUMNS}"
        ))
        .bind(params.id)
        .bind(&params.title)
        .bind(&params.description)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_group(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
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
