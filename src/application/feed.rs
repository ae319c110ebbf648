use std::sync::Arc;

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::application::pagination::{PAGE_SIZE, Page, PageNumber};
use crate::application::repos::{
    FollowsRepo, GroupsRepo, PostQueryFilter, PostsRepo, RepoError, UsersRepo,
};
use crate::domain::entities::{GroupRecord, PostRecord, UserRecord};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unknown group `{0}`")]
    UnknownGroup(String),
    #[error("unknown author `{0}`")]
    UnknownAuthor(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct GroupFeed {
    pub group: GroupRecord,
    pub page: Page<PostRecord>,
}

#[derive(Debug, Clone)]
pub struct AuthorFeed {
    pub author: UserRecord,
    pub page: Page<PostRecord>,
    pub post_count: u64,
    pub follower_count: u64,
}

/// Read side of the site: the four paginated post feeds.
#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    groups: Arc<dyn GroupsRepo>,
    users: Arc<dyn UsersRepo>,
    follows: Arc<dyn FollowsRepo>,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        groups: Arc<dyn GroupsRepo>,
        users: Arc<dyn UsersRepo>,
        follows: Arc<dyn FollowsRepo>,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
            follows,
        }
    }

    pub async fn global(&self, page: PageNumber) -> Result<Page<PostRecord>, FeedError> {
        self.paginate(&PostQueryFilter::default(), page).await
    }

    pub async fn group(&self, slug: &str, page: PageNumber) -> Result<GroupFeed, FeedError> {
        let group = self
            .groups
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| FeedError::UnknownGroup(slug.to_string()))?;

        let page = self.paginate(&PostQueryFilter::group(group.id), page).await?;
        Ok(GroupFeed { group, page })
    }

    pub async fn author(&self, username: &str, page: PageNumber) -> Result<AuthorFeed, FeedError> {
        let author = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| FeedError::UnknownAuthor(username.to_string()))?;

        let page = self
            .paginate(&PostQueryFilter::author(author.id), page)
            .await?;
        let follower_count = self.follows.count_followers(author.id).await?;

        Ok(AuthorFeed {
            post_count: page.total_items,
            follower_count,
            author,
            page,
        })
    }

    /// Posts by every author `user_id` follows. Following nobody yields an empty page.
    pub async fn subscriptions(
        &self,
        user_id: Uuid,
        page: PageNumber,
    ) -> Result<Page<PostRecord>, FeedError> {
        self.paginate(&PostQueryFilter::followed_by(user_id), page)
            .await
    }

    async fn paginate(
        &self,
        filter: &PostQueryFilter,
        page: PageNumber,
    ) -> Result<Page<PostRecord>, FeedError> {
        let total = self.posts.count_posts(filter).await?;
        let request = page.request(PAGE_SIZE);

        if request.offset >= total {
            debug!(
                target = "murmur::feed",
                page = page.get(),
                total,
                "page past the end of the feed"
            );
            return Ok(Page::new(Vec::new(), page, PAGE_SIZE, total));
        }

        let items = self.posts.list_posts(filter, request).await?;
        Ok(Page::new(items, page, PAGE_SIZE, total))
    }
}
