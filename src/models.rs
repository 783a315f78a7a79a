use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Prefixed string identifiers ("thread-…", "comment-…", "reply-…", "like-…")
/// generated by the storage backends.
pub type Id = String;

/// Authenticated actor, extracted from JWT claims.
#[derive(Debug, Clone)]
pub struct Author {
    pub id: Id,
    pub username: String,
}

// ---------------- storage rows ----------------

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Thread {
    pub id: Id,
    pub owner: Id,
    pub owner_username: String,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Id,
    pub owner: Id,
    pub owner_username: String,
    pub thread_id: Id,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>, // soft delete marker
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reply {
    pub id: Id,
    pub owner: Id,
    pub owner_username: String,
    pub comment_id: Id,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>, // soft delete marker
}

/// One row per (owner, comment) pair; toggling flips `liked` in place.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Like {
    pub id: Id,
    pub owner: Id,
    pub comment_id: Id,
    pub liked: bool,
}

// ---------------- request payloads ----------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewThread {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewComment {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewReply {
    pub content: String,
}

// ---------------- created-entity views ----------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct AddedThread {
    pub id: Id,
    pub title: String,
    pub owner: Id,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct AddedComment {
    pub id: Id,
    pub content: String,
    pub owner: Id,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct AddedReply {
    pub id: Id,
    pub content: String,
    pub owner: Id,
}

// ---------------- aggregate views ----------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReplyView {
    pub id: Id,
    pub username: String,
    pub date: DateTime<Utc>,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentView {
    pub id: Id,
    pub username: String,
    pub date: DateTime<Utc>,
    pub content: String,
    #[serde(rename = "likeCount")]
    pub like_count: i64,
    pub replies: Vec<ReplyView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ThreadView {
    pub id: Id,
    pub title: String,
    pub body: String,
    pub date: DateTime<Utc>,
    pub username: String,
    pub comments: Vec<CommentView>,
}
