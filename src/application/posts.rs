use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{
    CommentsRepo, CreateCommentParams, CreatePostParams, GroupsRepo, PostQueryFilter, PostsRepo,
    PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord};
use crate::domain::error::DomainError;
use crate::domain::posts::normalize_text;
use crate::infra::uploads::{UploadStorage, UploadStorageError};

#[derive(Debug, Error)]
pub enum PostError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("unknown group `{0}`")]
    UnknownGroup(String),
    #[error("image rejected: {0}")]
    Image(#[source] UploadStorageError),
    #[error("post not found")]
    NotFound,
    #[error("only the author may change this post")]
    Forbidden,
    #[error("failed to store image: {0}")]
    Storage(#[source] UploadStorageError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl PostError {
    /// Errors caused by the submitted form rather than by the system.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PostError::Validation(_) | PostError::UnknownGroup(_) | PostError::Image(_)
        )
    }
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub author_id: Uuid,
    pub text: String,
    pub group_slug: Option<String>,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone)]
pub struct EditPostCommand {
    pub post_id: Uuid,
    pub editor_id: Uuid,
    pub text: String,
    pub group_slug: Option<String>,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone)]
pub struct AddCommentCommand {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: PostRecord,
    pub comments: Vec<CommentRecord>,
    pub author_post_count: u64,
}

#[derive(Clone)]
pub struct PostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    groups: Arc<dyn GroupsRepo>,
    comments: Arc<dyn CommentsRepo>,
    uploads: Arc<UploadStorage>,
}

impl PostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        groups: Arc<dyn GroupsRepo>,
        comments: Arc<dyn CommentsRepo>,
        uploads: Arc<UploadStorage>,
    ) -> Self {
        Self {
            reader,
            writer,
            groups,
            comments,
            uploads,
        }
    }

    /// Groups offered in the post form.
    pub async fn group_choices(&self) -> Result<Vec<GroupRecord>, PostError> {
        self.groups.list_groups(None).await.map_err(PostError::from)
    }

    pub async fn find(&self, post_id: Uuid) -> Result<PostRecord, PostError> {
        self.reader
            .find_post(post_id)
            .await?
            .ok_or(PostError::NotFound)
    }

    pub async fn detail(&self, post_id: Uuid) -> Result<PostDetail, PostError> {
        let post = self.find(post_id).await?;
        let comments = self.comments.list_comments(post_id).await?;
        let author_post_count = self
            .reader
            .count_posts(&PostQueryFilter::author(post.author_id))
            .await?;

        Ok(PostDetail {
            post,
            comments,
            author_post_count,
        })
    }

    pub async fn create_post(&self, command: CreatePostCommand) -> Result<PostRecord, PostError> {
        let text = normalize_text("text", &command.text)?;
        let group_id = self.resolve_group(command.group_slug.as_deref()).await?;
        let image = self.store_image(command.image).await?;

        let post = self
            .writer
            .create_post(CreatePostParams {
                author_id: command.author_id,
                text,
                group_id,
                image,
            })
            .await?;

        info!(
            target = "murmur::posts",
            post_id = %post.id,
            author = %post.author_username,
            group = post.group_slug.as_deref().unwrap_or(""),
            "post created"
        );
        Ok(post)
    }

    /// Rewrite text, group and optionally image. Only the author may edit;
    /// `pub_date` is never touched.
    pub async fn edit_post(&self, command: EditPostCommand) -> Result<PostRecord, PostError> {
        let existing = self.find(command.post_id).await?;
        if existing.author_id != command.editor_id {
            return Err(PostError::Forbidden);
        }

        let text = normalize_text("text", &command.text)?;
        let group_id = self.resolve_group(command.group_slug.as_deref()).await?;
        let image = self.store_image(command.image).await?;

        let post = self
            .writer
            .update_post(UpdatePostParams {
                id: existing.id,
                text,
                group_id,
                image,
            })
            .await
            .map_err(|err| match err {
                RepoError::NotFound => PostError::NotFound,
                other => PostError::Repo(other),
            })?;

        info!(target = "murmur::posts", post_id = %post.id, "post edited");
        Ok(post)
    }

    pub async fn delete_post(&self, post_id: Uuid, actor_id: Uuid) -> Result<(), PostError> {
        let existing = self.find(post_id).await?;
        if existing.author_id != actor_id {
            return Err(PostError::Forbidden);
        }

        self.writer.delete_post(post_id).await?;
        info!(target = "murmur::posts", post_id = %post_id, "post deleted");
        Ok(())
    }

    pub async fn add_comment(&self, command: AddCommentCommand) -> Result<CommentRecord, PostError> {
        let text = normalize_text("text", &command.text)?;
        let post = self.find(command.post_id).await?;

        let comment = self
            .comments
            .create_comment(CreateCommentParams {
                post_id: post.id,
                author_id: command.author_id,
                text,
            })
            .await?;

        info!(
            target = "murmur::posts",
            post_id = %post.id,
            comment_id = %comment.id,
            "comment added"
        );
        Ok(comment)
    }

    async fn resolve_group(&self, slug: Option<&str>) -> Result<Option<Uuid>, PostError> {
        let Some(slug) = slug.map(str::trim).filter(|value| !value.is_empty()) else {
            return Ok(None);
        };

        self.groups
            .find_group_by_slug(slug)
            .await?
            .map(|group| Some(group.id))
            .ok_or_else(|| PostError::UnknownGroup(slug.to_string()))
    }

    async fn store_image(&self, image: Option<ImageUpload>) -> Result<Option<String>, PostError> {
        let Some(image) = image else {
            return Ok(None);
        };

        match self.uploads.store_image(&image.file_name, image.data).await {
            Ok(stored) => Ok(Some(stored.stored_path)),
            Err(
                err @ (UploadStorageError::EmptyPayload | UploadStorageError::UnsupportedImage),
            ) => Err(PostError::Image(err)),
            Err(err) => Err(PostError::Storage(err)),
        }
    }
}
