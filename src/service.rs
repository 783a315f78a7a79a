use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures_util::future::try_join;

use crate::models::*;
use crate::repo::{Repo, RepoError};

/// Wire literal shown in place of a soft-deleted comment's content.
pub const DELETED_COMMENT_PLACEHOLDER: &str = "**komentar telah dihapus**";
/// Wire literal shown in place of a soft-deleted reply's content.
pub const DELETED_REPLY_PLACEHOLDER: &str = "**balasan telah dihapus**";

/// Longest accepted thread title, in characters.
pub const TITLE_MAX_CHARS: usize = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Thread,
    Comment,
    Reply,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Thread => f.write_str("thread"),
            EntityKind::Comment => f.write_str("comment"),
            EntityKind::Reply => f.write_str("reply"),
        }
    }
}

/// Which placeholder a masked view gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Comment,
    Reply,
}

impl ContentKind {
    fn placeholder(self) -> &'static str {
        match self {
            ContentKind::Comment => DELETED_COMMENT_PLACEHOLDER,
            ContentKind::Reply => DELETED_REPLY_PLACEHOLDER,
        }
    }
}

/// Display value of stored content. Applied only while assembling views;
/// persisted content is never rewritten.
pub fn display_content(content: &str, deleted: bool, kind: ContentKind) -> String {
    if deleted {
        kind.placeholder().to_string()
    } else {
        content.to_string()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0} not found")]
    NotFound(EntityKind),
    #[error("forbidden")]
    Forbidden,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

fn require_id(value: &str, field: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidInput(format!("{field} is required")));
    }
    Ok(())
}

fn require_content(value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidInput("content must be a non-empty string".into()));
    }
    Ok(())
}

/// Thread/comment/reply orchestration over a storage backend.
///
/// Every mutation runs the existence/ownership chain for its target depth
/// before touching storage: thread, then comment, then reply, then owner,
/// stopping at the first failure.
#[derive(Clone)]
pub struct Forum {
    repo: Arc<dyn Repo>,
}

impl Forum {
    pub fn new(repo: Arc<dyn Repo>) -> Self {
        Self { repo }
    }

    // ---------------- verifier chain ----------------

    async fn verify_thread(&self, thread_id: &str) -> ServiceResult<()> {
        if self.repo.thread_exists(thread_id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound(EntityKind::Thread))
        }
    }

    async fn verify_comment(&self, thread_id: &str, comment_id: &str) -> ServiceResult<()> {
        if self.repo.comment_in_thread(thread_id, comment_id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound(EntityKind::Comment))
        }
    }

    async fn verify_reply(&self, comment_id: &str, reply_id: &str) -> ServiceResult<()> {
        if self.repo.reply_in_comment(comment_id, reply_id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound(EntityKind::Reply))
        }
    }

    async fn verify_comment_owner(&self, comment_id: &str, user_id: &str) -> ServiceResult<()> {
        if self.repo.comment_owned_by(comment_id, user_id).await? {
            Ok(())
        } else {
            Err(ServiceError::Forbidden)
        }
    }

    async fn verify_reply_owner(&self, reply_id: &str, user_id: &str) -> ServiceResult<()> {
        if self.repo.reply_owned_by(reply_id, user_id).await? {
            Ok(())
        } else {
            Err(ServiceError::Forbidden)
        }
    }

    // ---------------- mutations ----------------

    pub async fn add_thread(&self, author: &Author, new: NewThread) -> ServiceResult<AddedThread> {
        if new.title.trim().is_empty() {
            return Err(ServiceError::InvalidInput("title must be a non-empty string".into()));
        }
        if new.title.chars().count() > TITLE_MAX_CHARS {
            return Err(ServiceError::InvalidInput(format!(
                "title must be at most {TITLE_MAX_CHARS} characters"
            )));
        }
        if new.body.trim().is_empty() {
            return Err(ServiceError::InvalidInput("body must be a non-empty string".into()));
        }
        Ok(self.repo.create_thread(author, new).await?)
    }

    pub async fn add_comment(
        &self,
        author: &Author,
        thread_id: &str,
        new: NewComment,
    ) -> ServiceResult<AddedComment> {
        require_id(thread_id, "threadId")?;
        require_content(&new.content)?;
        self.verify_thread(thread_id).await?;
        Ok(self.repo.create_comment(author, thread_id, new).await?)
    }

    pub async fn delete_comment(
        &self,
        author: &Author,
        thread_id: &str,
        comment_id: &str,
    ) -> ServiceResult<()> {
        require_id(thread_id, "threadId")?;
        require_id(comment_id, "commentId")?;
        self.verify_thread(thread_id).await?;
        self.verify_comment(thread_id, comment_id).await?;
        self.verify_comment_owner(comment_id, &author.id).await?;
        self.repo.soft_delete_comment(comment_id).await?;
        Ok(())
    }

    pub async fn add_reply(
        &self,
        author: &Author,
        thread_id: &str,
        comment_id: &str,
        new: NewReply,
    ) -> ServiceResult<AddedReply> {
        require_id(thread_id, "threadId")?;
        require_id(comment_id, "commentId")?;
        require_content(&new.content)?;
        self.verify_thread(thread_id).await?;
        self.verify_comment(thread_id, comment_id).await?;
        Ok(self.repo.create_reply(author, comment_id, new).await?)
    }

    pub async fn delete_reply(
        &self,
        author: &Author,
        thread_id: &str,
        comment_id: &str,
        reply_id: &str,
    ) -> ServiceResult<()> {
        require_id(thread_id, "threadId")?;
        require_id(comment_id, "commentId")?;
        require_id(reply_id, "replyId")?;
        self.verify_thread(thread_id).await?;
        self.verify_comment(thread_id, comment_id).await?;
        self.verify_reply(comment_id, reply_id).await?;
        self.verify_reply_owner(reply_id, &author.id).await?;
        self.repo.soft_delete_reply(reply_id).await?;
        Ok(())
    }

    /// Flips the actor's like on a comment, returning the resulting state.
    pub async fn toggle_like(
        &self,
        author: &Author,
        thread_id: &str,
        comment_id: &str,
    ) -> ServiceResult<bool> {
        require_id(thread_id, "threadId")?;
        require_id(comment_id, "commentId")?;
        self.verify_thread(thread_id).await?;
        self.verify_comment(thread_id, comment_id).await?;
        Ok(self.repo.toggle_like(&author.id, comment_id).await?)
    }

    // ---------------- aggregation ----------------

    /// Full thread view: comments ascending by creation time, each with its
    /// ordered replies and like count, deleted content masked.
    pub async fn get_thread_detail(&self, thread_id: &str) -> ServiceResult<ThreadView> {
        require_id(thread_id, "threadId")?;
        self.verify_thread(thread_id).await?;

        let thread = self.repo.get_thread(thread_id).await?;
        let comments = self.repo.list_comments(thread_id).await?;
        let comment_ids: Vec<Id> = comments.iter().map(|c| c.id.clone()).collect();

        // replies and like counts are independent reads; fetch both at once,
        // each id-batched in a single round trip
        let (replies, likes) = try_join(
            self.repo.list_replies_by_comment_ids(&comment_ids),
            self.repo.count_likes_by_comment_ids(&comment_ids),
        )
        .await?;

        // group replies per comment; repo ordering is already ascending
        let mut replies_by_comment: HashMap<Id, Vec<ReplyView>> = HashMap::new();
        for reply in replies {
            let view = ReplyView {
                content: display_content(
                    &reply.content,
                    reply.deleted_at.is_some(),
                    ContentKind::Reply,
                ),
                id: reply.id,
                username: reply.owner_username,
                date: reply.created_at,
            };
            replies_by_comment.entry(reply.comment_id).or_default().push(view);
        }

        let comments = comments
            .into_iter()
            .map(|comment| CommentView {
                like_count: likes.get(&comment.id).copied().unwrap_or(0),
                replies: replies_by_comment.remove(&comment.id).unwrap_or_default(),
                content: display_content(
                    &comment.content,
                    comment.deleted_at.is_some(),
                    ContentKind::Comment,
                ),
                id: comment.id,
                username: comment.owner_username,
                date: comment.created_at,
            })
            .collect();

        Ok(ThreadView {
            id: thread.id,
            title: thread.title,
            body: thread.body,
            date: thread.created_at,
            username: thread.owner_username,
            comments,
        })
    }
}
