#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderName;
use murmur::application::admin::{
    groups::AdminGroupService, posts::AdminPostService, users::AdminUserService,
};
use murmur::application::feed::FeedService;
use murmur::application::follows::FollowService;
use murmur::application::pagination::PageRequest;
use murmur::application::posts::PostService;
use murmur::application::repos::{
    CommentsRepo, CreateCommentParams, CreateGroupParams, CreatePostParams, FollowsRepo,
    GroupsRepo, GroupsWriteRepo, HealthRepo, PostQueryFilter, PostsRepo, PostsWriteRepo,
    RepoError, UpdateGroupParams, UpdatePostParams, UsersRepo,
};
use murmur::cache::FeedPageCache;
use murmur::config::AuthSettings;
use murmur::domain::entities::{CommentRecord, FollowRecord, GroupRecord, PostRecord, UserRecord};
use murmur::infra::http::{AdminState, AuthContext, HttpState};
use murmur::infra::uploads::UploadStorage;
use time::OffsetDateTime;
use time::macros::datetime;
use uuid::Uuid;

pub const USER_HEADER: &str = "x-remote-user";
pub const LOGIN_URL: &str = "/auth/login/";

#[derive(Debug, Clone)]
struct StoredPost {
    id: Uuid,
    text: String,
    pub_date: OffsetDateTime,
    author_id: Uuid,
    group_id: Option<Uuid>,
    image: Option<String>,
}

#[derive(Default)]
struct Tables {
    users: Vec<UserRecord>,
    groups: Vec<GroupRecord>,
    posts: Vec<StoredPost>,
    comments: Vec<CommentRecord>,
    follows: Vec<FollowRecord>,
}

/// In-memory stand-in for the Postgres repositories, applying the same
/// ordering and on-delete rules as the schema.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    clock: AtomicI64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            clock: AtomicI64::new(0),
        }
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store lock poisoned")
    }

    /// Every write moves the clock forward one second, so later writes sort newer.
    fn tick(&self) -> OffsetDateTime {
        let step = self.clock.fetch_add(1, Ordering::SeqCst);
        datetime!(2024-01-01 00:00 UTC) + time::Duration::seconds(step)
    }

    pub fn seed_user(&self, username: &str) -> UserRecord {
        let user = UserRecord {
            id: Uuid::new_v4(),
            username: username.to_string(),
            created_at: self.tick(),
        };
        self.tables().users.push(user.clone());
        user
    }

    pub fn seed_group(&self, title: &str, slug: &str) -> GroupRecord {
        let group = GroupRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
            slug: slug.to_string(),
            description: format!("About {title}"),
            created_at: self.tick(),
        };
        self.tables().groups.push(group.clone());
        group
    }

    pub fn seed_post(
        &self,
        author: &UserRecord,
        text: &str,
        group: Option<&GroupRecord>,
    ) -> PostRecord {
        let pub_date = self.tick();
        self.seed_post_at(author, text, group, pub_date)
    }

    pub fn seed_post_at(
        &self,
        author: &UserRecord,
        text: &str,
        group: Option<&GroupRecord>,
        pub_date: OffsetDateTime,
    ) -> PostRecord {
        let stored = StoredPost {
            id: Uuid::new_v4(),
            text: text.to_string(),
            pub_date,
            author_id: author.id,
            group_id: group.map(|group| group.id),
            image: None,
        };
        let mut tables = self.tables();
        tables.posts.push(stored.clone());
        join_post(&tables, &stored)
    }

    pub fn seed_follow(&self, user: &UserRecord, author: &UserRecord) {
        let created_at = self.tick();
        self.tables().follows.push(FollowRecord {
            id: Uuid::new_v4(),
            user_id: user.id,
            author_id: author.id,
            created_at,
        });
    }

    pub fn post_count(&self) -> usize {
        self.tables().posts.len()
    }

    pub fn comment_count(&self) -> usize {
        self.tables().comments.len()
    }

    pub fn follow_count(&self) -> usize {
        self.tables().follows.len()
    }

    pub fn post_group(&self, post_id: Uuid) -> Option<Option<Uuid>> {
        self.tables()
            .posts
            .iter()
            .find(|post| post.id == post_id)
            .map(|post| post.group_id)
    }
}

fn join_post(tables: &Tables, post: &StoredPost) -> PostRecord {
    let author_username = tables
        .users
        .iter()
        .find(|user| user.id == post.author_id)
        .map(|user| user.username.clone())
        .unwrap_or_default();
    let group = post
        .group_id
        .and_then(|id| tables.groups.iter().find(|group| group.id == id));

    PostRecord {
        id: post.id,
        text: post.text.clone(),
        pub_date: post.pub_date,
        author_id: post.author_id,
        author_username,
        group_id: group.map(|group| group.id),
        group_slug: group.map(|group| group.slug.clone()),
        group_title: group.map(|group| group.title.clone()),
        image: post.image.clone(),
    }
}

fn matches_filter(tables: &Tables, post: &StoredPost, filter: &PostQueryFilter) -> bool {
    let group_ok = filter.group_id.is_none() || post.group_id == filter.group_id;
    let author_ok = filter
        .author_id
        .is_none_or(|author_id| post.author_id == author_id);
    let followed_ok = filter.followed_by.is_none_or(|follower| {
        tables
            .follows
            .iter()
            .any(|edge| edge.user_id == follower && edge.author_id == post.author_id)
    });
    let search_ok = filter
        .search
        .as_deref()
        .is_none_or(|search| post.text.to_lowercase().contains(&search.to_lowercase()));

    group_ok && author_ok && followed_ok && search_ok
}

fn filtered_posts(tables: &Tables, filter: &PostQueryFilter) -> Vec<StoredPost> {
    let mut posts: Vec<StoredPost> = tables
        .posts
        .iter()
        .filter(|post| matches_filter(tables, post, filter))
        .cloned()
        .collect();
    posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
    posts
}

#[async_trait]
impl UsersRepo for MemoryStore {
    async fn create_user(&self, username: &str) -> Result<UserRecord, RepoError> {
        if self
            .tables()
            .users
            .iter()
            .any(|user| user.username == username)
        {
            return Err(RepoError::Duplicate {
                constraint: "users_username_key".to_string(),
            });
        }
        Ok(self.seed_user(username))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        Ok(self.tables().users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables();
        let before = tables.users.len();
        tables.users.retain(|user| user.id != id);
        if tables.users.len() == before {
            return Err(RepoError::NotFound);
        }

        let owned_posts: Vec<Uuid> = tables
            .posts
            .iter()
            .filter(|post| post.author_id == id)
            .map(|post| post.id)
            .collect();
        tables.posts.retain(|post| post.author_id != id);
        tables
            .comments
            .retain(|comment| comment.author_id != id && !owned_posts.contains(&comment.post_id));
        tables
            .follows
            .retain(|edge| edge.user_id != id && edge.author_id != id);
        Ok(())
    }
}

#[async_trait]
impl GroupsRepo for MemoryStore {
    async fn list_groups(&self, search: Option<&str>) -> Result<Vec<GroupRecord>, RepoError> {
        let needle = search.map(str::to_lowercase);
        let mut groups: Vec<GroupRecord> = self
            .tables()
            .groups
            .iter()
            .filter(|group| match needle.as_deref() {
                Some(needle) => group.description.to_lowercase().contains(needle),
                None => true,
            })
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.slug.cmp(&b.slug)));
        Ok(groups)
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
        Ok(self
            .tables()
            .groups
            .iter()
            .find(|group| group.slug == slug)
            .cloned())
    }
}

#[async_trait]
impl GroupsWriteRepo for MemoryStore {
    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError> {
        if self
            .tables()
            .groups
            .iter()
            .any(|group| group.slug == params.slug)
        {
            return Err(RepoError::Duplicate {
                constraint: "groups_slug_key".to_string(),
            });
        }
        let created_at = self.tick();
        let group = GroupRecord {
            id: Uuid::new_v4(),
            title: params.title,
            slug: params.slug,
            description: params.description,
            created_at,
        };
        self.tables().groups.push(group.clone());
        Ok(group)
    }

    async fn update_group(&self, params: UpdateGroupParams) -> Result<GroupRecord, RepoError> {
        let mut tables = self.tables();
        let group = tables
            .groups
            .iter_mut()
            .find(|group| group.id == params.id)
            .ok_or(RepoError::NotFound)?;
        group.title = params.title;
        group.description = params.description;
        Ok(group.clone())
    }

    async fn delete_group(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables();
        let before = tables.groups.len();
        tables.groups.retain(|group| group.id != id);
        if tables.groups.len() == before {
            return Err(RepoError::NotFound);
        }
        for post in tables.posts.iter_mut() {
            if post.group_id == Some(id) {
                post.group_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PostsRepo for MemoryStore {
    async fn list_posts(
        &self,
        filter: &PostQueryFilter,
        page: PageRequest,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let tables = self.tables();
        let offset = usize::try_from(page.offset).unwrap_or(usize::MAX);
        Ok(filtered_posts(&tables, filter)
            .iter()
            .skip(offset)
            .take(page.limit as usize)
            .map(|post| join_post(&tables, post))
            .collect())
    }

    async fn count_posts(&self, filter: &PostQueryFilter) -> Result<u64, RepoError> {
        let tables = self.tables();
        Ok(filtered_posts(&tables, filter).len() as u64)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let tables = self.tables();
        Ok(tables
            .posts
            .iter()
            .find(|post| post.id == id)
            .map(|post| join_post(&tables, post)))
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryStore {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let pub_date = self.tick();
        let mut tables = self.tables();
        if !tables.users.iter().any(|user| user.id == params.author_id) {
            return Err(RepoError::InvalidInput {
                message: "posts_author_id_fkey".to_string(),
            });
        }
        let stored = StoredPost {
            id: Uuid::new_v4(),
            text: params.text,
            pub_date,
            author_id: params.author_id,
            group_id: params.group_id,
            image: params.image,
        };
        tables.posts.push(stored.clone());
        Ok(join_post(&tables, &stored))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut tables = self.tables();
        let post = tables
            .posts
            .iter_mut()
            .find(|post| post.id == params.id)
            .ok_or(RepoError::NotFound)?;
        post.text = params.text;
        post.group_id = params.group_id;
        if params.image.is_some() {
            post.image = params.image;
        }
        let stored = post.clone();
        Ok(join_post(&tables, &stored))
    }

    async fn set_post_group(
        &self,
        id: Uuid,
        group_id: Option<Uuid>,
    ) -> Result<PostRecord, RepoError> {
        let mut tables = self.tables();
        let post = tables
            .posts
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or(RepoError::NotFound)?;
        post.group_id = group_id;
        let stored = post.clone();
        Ok(join_post(&tables, &stored))
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables();
        let before = tables.posts.len();
        tables.posts.retain(|post| post.id != id);
        if tables.posts.len() == before {
            return Err(RepoError::NotFound);
        }
        tables.comments.retain(|comment| comment.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl CommentsRepo for MemoryStore {
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        let mut comments: Vec<CommentRecord> = self
            .tables()
            .comments
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let created = self.tick();
        let mut tables = self.tables();
        if !tables.posts.iter().any(|post| post.id == params.post_id) {
            return Err(RepoError::InvalidInput {
                message: "comments_post_id_fkey".to_string(),
            });
        }
        let author_username = tables
            .users
            .iter()
            .find(|user| user.id == params.author_id)
            .map(|user| user.username.clone())
            .ok_or_else(|| RepoError::InvalidInput {
                message: "comments_author_id_fkey".to_string(),
            })?;

        let comment = CommentRecord {
            id: Uuid::new_v4(),
            post_id: params.post_id,
            author_id: params.author_id,
            author_username,
            text: params.text,
            created,
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }
}

#[async_trait]
impl FollowsRepo for MemoryStore {
    async fn create_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        if user_id == author_id {
            return Err(RepoError::Integrity {
                message: "follows_no_self_follow".to_string(),
            });
        }
        let created_at = self.tick();
        let mut tables = self.tables();
        if tables
            .follows
            .iter()
            .any(|edge| edge.user_id == user_id && edge.author_id == author_id)
        {
            return Ok(false);
        }
        tables.follows.push(FollowRecord {
            id: Uuid::new_v4(),
            user_id,
            author_id,
            created_at,
        });
        Ok(true)
    }

    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables();
        let before = tables.follows.len();
        tables
            .follows
            .retain(|edge| !(edge.user_id == user_id && edge.author_id == author_id));
        Ok(tables.follows.len() != before)
    }

    async fn follow_exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        Ok(self
            .tables()
            .follows
            .iter()
            .any(|edge| edge.user_id == user_id && edge.author_id == author_id))
    }

    async fn count_followers(&self, author_id: Uuid) -> Result<u64, RepoError> {
        Ok(self
            .tables()
            .follows
            .iter()
            .filter(|edge| edge.author_id == author_id)
            .count() as u64)
    }

    async fn count_following(&self, user_id: Uuid) -> Result<u64, RepoError> {
        Ok(self
            .tables()
            .follows
            .iter()
            .filter(|edge| edge.user_id == user_id)
            .count() as u64)
    }
}

#[async_trait]
impl HealthRepo for MemoryStore {
    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

/// Services and router states wired against one shared [`MemoryStore`].
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub feed: Arc<FeedService>,
    pub follows: Arc<FollowService>,
    pub posts: Arc<PostService>,
    pub admin_groups: Arc<AdminGroupService>,
    pub admin_posts: Arc<AdminPostService>,
    pub admin_users: Arc<AdminUserService>,
    pub uploads: Arc<UploadStorage>,
    pub cache: Option<Arc<FeedPageCache>>,
}

impl TestApp {
    pub fn new(upload_root: &Path) -> Self {
        Self::build(upload_root, None)
    }

    pub fn with_cache(upload_root: &Path, ttl: Duration) -> Self {
        Self::build(upload_root, Some(Arc::new(FeedPageCache::with_ttl(ttl))))
    }

    fn build(upload_root: &Path, cache: Option<Arc<FeedPageCache>>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let uploads = Arc::new(
            UploadStorage::new(upload_root.to_path_buf()).expect("upload root should be creatable"),
        );

        let feed = Arc::new(FeedService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        ));
        let follows = Arc::new(FollowService::new(store.clone(), store.clone()));
        let posts = Arc::new(PostService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            uploads.clone(),
        ));
        let admin_groups = Arc::new(AdminGroupService::new(store.clone(), store.clone()));
        let admin_posts = Arc::new(AdminPostService::new(
            store.clone(),
            store.clone(),
            store.clone(),
        ));
        let admin_users = Arc::new(AdminUserService::new(store.clone()));

        Self {
            store,
            feed,
            follows,
            posts,
            admin_groups,
            admin_posts,
            admin_users,
            uploads,
            cache,
        }
    }

    pub fn http_state(&self) -> HttpState {
        HttpState {
            feed: self.feed.clone(),
            posts: self.posts.clone(),
            follows: self.follows.clone(),
            auth: AuthContext {
                users: self.store.clone(),
                settings: AuthSettings {
                    user_header: HeaderName::from_static(USER_HEADER),
                    login_url: LOGIN_URL.to_string(),
                },
            },
            health: self.store.clone(),
            upload_storage: self.uploads.clone(),
            upload_limit_bytes: 1024 * 1024,
            cache: self.cache.clone(),
        }
    }

    pub fn admin_state(&self) -> AdminState {
        AdminState {
            groups: self.admin_groups.clone(),
            posts: self.admin_posts.clone(),
            users: self.admin_users.clone(),
            health: self.store.clone(),
            cache: self.cache.clone(),
        }
    }
}

/// A 1x1 transparent GIF.
pub const TINY_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];
