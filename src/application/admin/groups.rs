use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{
    CreateGroupParams, GroupsRepo, GroupsWriteRepo, RepoError, UpdateGroupParams,
};
use crate::domain::entities::GroupRecord;
use crate::domain::error::DomainError;
use crate::domain::groups::{validate_description, validate_title};
use crate::domain::slug::{SlugAsyncError, SlugError, generate_unique_slug_async, validate_slug};

#[derive(Debug, Error)]
pub enum AdminGroupError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error("group slug `{0}` is already taken")]
    ConstraintViolation(String),
    #[error("group not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreateGroupCommand {
    pub title: String,
    /// Derived from the title when absent.
    pub slug: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateGroupCommand {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct AdminGroupService {
    reader: Arc<dyn GroupsRepo>,
    writer: Arc<dyn GroupsWriteRepo>,
}

impl AdminGroupService {
    pub fn new(reader: Arc<dyn GroupsRepo>, writer: Arc<dyn GroupsWriteRepo>) -> Self {
        Self { reader, writer }
    }

    /// Groups whose description contains `search` (case-insensitive), or all of them.
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<GroupRecord>, AdminGroupError> {
        let search = search.map(str::trim).filter(|value| !value.is_empty());
        self.reader
            .list_groups(search)
            .await
            .map_err(AdminGroupError::from)
    }

    pub async fn find(&self, slug: &str) -> Result<GroupRecord, AdminGroupError> {
        self.reader
            .find_group_by_slug(slug)
            .await?
            .ok_or(AdminGroupError::NotFound)
    }

    pub async fn create(&self, command: CreateGroupCommand) -> Result<GroupRecord, AdminGroupError> {
        let title = validate_title(&command.title)?;
        let description = validate_description(&command.description)?;

        let slug = match command.slug.as_deref().map(str::trim) {
            Some(explicit) if !explicit.is_empty() => validate_slug(explicit)?,
            _ => self.unique_slug_for(&title).await?,
        };

        let group = self
            .writer
            .create_group(CreateGroupParams {
                title,
                slug: slug.clone(),
                description,
            })
            .await
            .map_err(|err| match err {
                RepoError::Duplicate { .. } => AdminGroupError::ConstraintViolation(slug),
                other => AdminGroupError::Repo(other),
            })?;

        info!(target = "murmur::admin::groups", slug = %group.slug, "group created");
        Ok(group)
    }

    pub async fn update(
        &self,
        slug: &str,
        command: UpdateGroupCommand,
    ) -> Result<GroupRecord, AdminGroupError> {
        let existing = self.find(slug).await?;

        let title = match command.title.as_deref() {
            Some(title) => validate_title(title)?,
            None => existing.title,
        };
        let description = match command.description.as_deref() {
            Some(description) => validate_description(description)?,
            None => existing.description,
        };

        let group = self
            .writer
            .update_group(UpdateGroupParams {
                id: existing.id,
                title,
                description,
            })
            .await
            .map_err(|err| match err {
                RepoError::NotFound => AdminGroupError::NotFound,
                other => AdminGroupError::Repo(other),
            })?;

        info!(target = "murmur::admin::groups", slug = %group.slug, "group updated");
        Ok(group)
    }

    /// Delete the group. Its posts stay, detached from any group.
    pub async fn delete(&self, slug: &str) -> Result<(), AdminGroupError> {
        let existing = self.find(slug).await?;
        self.writer
            .delete_group(existing.id)
            .await
            .map_err(|err| match err {
                RepoError::NotFound => AdminGroupError::NotFound,
                other => AdminGroupError::Repo(other),
            })?;

        info!(target = "murmur::admin::groups", slug = %slug, "group deleted");
        Ok(())
    }

    async fn unique_slug_for(&self, title: &str) -> Result<String, AdminGroupError> {
        let reader = self.reader.clone();
        generate_unique_slug_async(title, move |candidate| {
            let reader = reader.clone();
            let candidate = candidate.to_string();
            async move {
                reader
                    .find_group_by_slug(&candidate)
                    .await
                    .map(|found| found.is_none())
            }
        })
        .await
        .map_err(|err| match err {
            SlugAsyncError::Slug(slug) => AdminGroupError::Slug(slug),
            SlugAsyncError::Predicate(repo) => AdminGroupError::Repo(repo),
        })
    }
}
