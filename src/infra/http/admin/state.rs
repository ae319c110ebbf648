use std::sync::Arc;

use crate::application::admin::{
    groups::AdminGroupService, posts::AdminPostService, users::AdminUserService,
};
use crate::application::repos::HealthRepo;
use crate::cache::FeedPageCache;

#[derive(Clone)]
pub struct AdminState {
    pub groups: Arc<AdminGroupService>,
    pub posts: Arc<AdminPostService>,
    pub users: Arc<AdminUserService>,
    pub health: Arc<dyn HealthRepo>,
    /// Shared with the public router; `None` when the feed cache is disabled.
    pub cache: Option<Arc<FeedPageCache>>,
}
