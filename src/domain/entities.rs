//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::posts;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRecord {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub created_at: OffsetDateTime,
}

/// A post joined with the author's username and, when assigned, its group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: Uuid,
    pub text: String,
    pub pub_date: OffsetDateTime,
    pub author_id: Uuid,
    pub author_username: String,
    pub group_id: Option<Uuid>,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
    pub image: Option<String>,
}

impl PostRecord {
    /// Short label used wherever a post is referred to by name.
    pub fn preview(&self) -> String {
        posts::preview(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub text: String,
    pub created: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub author_id: Uuid,
    pub created_at: OffsetDateTime,
}
