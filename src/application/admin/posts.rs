use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::pagination::{Page, PageNumber};
use crate::application::repos::{GroupsRepo, PostQueryFilter, PostsRepo, PostsWriteRepo, RepoError};
use crate::domain::entities::PostRecord;

const ADMIN_PAGE_SIZE: u32 = 50;

#[derive(Debug, Error)]
pub enum AdminPostError {
    #[error("post not found")]
    NotFound,
    #[error("unknown group `{0}`")]
    UnknownGroup(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct AdminPostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    groups: Arc<dyn GroupsRepo>,
}

impl AdminPostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        groups: Arc<dyn GroupsRepo>,
    ) -> Self {
        Self {
            reader,
            writer,
            groups,
        }
    }

    /// Newest posts first, optionally narrowed to text containing `search`.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: PageNumber,
    ) -> Result<Page<PostRecord>, AdminPostError> {
        let filter = PostQueryFilter {
            search: search
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            ..PostQueryFilter::default()
        };

        let total = self.reader.count_posts(&filter).await?;
        let request = page.request(ADMIN_PAGE_SIZE);
        let items = if request.offset >= total {
            Vec::new()
        } else {
            self.reader.list_posts(&filter, request).await?
        };

        Ok(Page::new(items, page, ADMIN_PAGE_SIZE, total))
    }

    /// Move a post into a group, or out of any group when `group_slug` is `None`.
    pub async fn assign_group(
        &self,
        post_id: Uuid,
        group_slug: Option<&str>,
    ) -> Result<PostRecord, AdminPostError> {
        let group_id = match group_slug.map(str::trim).filter(|value| !value.is_empty()) {
            Some(slug) => Some(
                self.groups
                    .find_group_by_slug(slug)
                    .await?
                    .ok_or_else(|| AdminPostError::UnknownGroup(slug.to_string()))?
                    .id,
            ),
            None => None,
        };

        let post = self
            .writer
            .set_post_group(post_id, group_id)
            .await
            .map_err(not_found_or_repo)?;

        info!(
            target = "murmur::admin::posts",
            post_id = %post_id,
            group = post.group_slug.as_deref().unwrap_or(""),
            "post group reassigned"
        );
        Ok(post)
    }

    pub async fn delete(&self, post_id: Uuid) -> Result<(), AdminPostError> {
        self.writer
            .delete_post(post_id)
            .await
            .map_err(not_found_or_repo)?;

        info!(target = "murmur::admin::posts", post_id = %post_id, "post deleted");
        Ok(())
    }
}

fn not_found_or_repo(err: RepoError) -> AdminPostError {
    match err {
        RepoError::NotFound => AdminPostError::NotFound,
        other => AdminPostError::Repo(other),
    }
}
