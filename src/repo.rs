use std::collections::HashMap;

use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("not found")] NotFound,
    #[error("conflict")] Conflict,
    #[error("storage: {0}")] Internal(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

use async_trait::async_trait;

fn fresh_id(prefix: &str) -> Id {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

#[async_trait]
pub trait ThreadRepo: Send + Sync {
    async fn create_thread(&self, author: &Author, new: NewThread) -> RepoResult<AddedThread>;
    async fn thread_exists(&self, thread_id: &str) -> RepoResult<bool>;
    async fn get_thread(&self, thread_id: &str) -> RepoResult<Thread>;
}

#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn create_comment(
        &self,
        author: &Author,
        thread_id: &str,
        new: NewComment,
    ) -> RepoResult<AddedComment>;
    /// True when the comment exists and belongs to the given thread.
    async fn comment_in_thread(&self, thread_id: &str, comment_id: &str) -> RepoResult<bool>;
    async fn comment_owned_by(&self, comment_id: &str, user_id: &str) -> RepoResult<bool>;
    async fn soft_delete_comment(&self, comment_id: &str) -> RepoResult<()>;
    /// Comments of a thread, ascending by creation time (ties broken by id).
    async fn list_comments(&self, thread_id: &str) -> RepoResult<Vec<Comment>>;
}

#[async_trait]
pub trait ReplyRepo: Send + Sync {
    async fn create_reply(
        &self,
        author: &Author,
        comment_id: &str,
        new: NewReply,
    ) -> RepoResult<AddedReply>;
    /// True when the reply exists and belongs to the given comment.
    async fn reply_in_comment(&self, comment_id: &str, reply_id: &str) -> RepoResult<bool>;
    async fn reply_owned_by(&self, reply_id: &str, user_id: &str) -> RepoResult<bool>;
    async fn soft_delete_reply(&self, reply_id: &str) -> RepoResult<()>;
    /// Replies of all given comments in one round trip, ascending by creation
    /// time (ties broken by id).
    async fn list_replies_by_comment_ids(&self, comment_ids: &[Id]) -> RepoResult<Vec<Reply>>;
}

#[async_trait]
pub trait LikeRepo: Send + Sync {
    /// Flips the (user, comment) like state, inserting the row on first use.
    /// Returns the resulting state.
    async fn toggle_like(&self, user_id: &str, comment_id: &str) -> RepoResult<bool>;
    /// Count of currently-liked rows per comment id, in one round trip.
    /// Comments with no likes are absent from the map.
    async fn count_likes_by_comment_ids(
        &self,
        comment_ids: &[Id],
    ) -> RepoResult<HashMap<Id, i64>>;
}

pub trait Repo: ThreadRepo + CommentRepo + ReplyRepo + LikeRepo {}

impl<T> Repo for T where T: ThreadRepo + CommentRepo + ReplyRepo + LikeRepo {}

#[cfg(feature = "inmem-store")]
pub mod inmem {
    use super::*;
    use chrono::Utc;
    use serde::{Deserialize, Serialize};
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, RwLock};

    const SNAPSHOT_PATH: &str = "data/state.json";

    #[derive(Default, Serialize, Deserialize)]
    struct State {
        threads: HashMap<Id, Thread>,
        comments: HashMap<Id, Comment>,
        replies: HashMap<Id, Reply>,
        likes: HashMap<Id, Like>,
    }

    #[derive(Clone)]
    pub struct InMemRepo {
        state: Arc<RwLock<State>>,
        snapshot_path: Arc<PathBuf>,
    }

    impl InMemRepo {
        // resolve data dir (env override)
        fn snapshot_path() -> PathBuf {
            match std::env::var("FORUM_DATA_DIR") {
                Ok(dir) => {
                    let mut p = PathBuf::from(dir);
                    p.push("state.json");
                    p
                }
                Err(_) => PathBuf::from(SNAPSHOT_PATH),
            }
        }

        fn load_state_from(path: &Path) -> State {
            match std::fs::read(path) {
                Ok(bytes) => match serde_json::from_slice::<State>(&bytes) {
                    Ok(s) => {
                        eprintln!("[inmem] Loaded snapshot '{}'", path.display());
                        s
                    }
                    Err(e) => {
                        eprintln!("[inmem] Failed to parse snapshot '{}': {e}. Starting empty.", path.display());
                        State::default()
                    }
                },
                Err(e) => {
                    eprintln!("[inmem] No snapshot at '{}': {e}. Starting empty.", path.display());
                    State::default()
                }
            }
        }

        fn persist(&self) {
            let path = self.snapshot_path.clone();
            if let Ok(s) = serde_json::to_vec_pretty(&*self.state.read().unwrap()) {
                if let Some(dir) = path.parent() {
                    let _ = std::fs::create_dir_all(dir);
                }
                if let Err(e) = std::fs::write(&*path, s) {
                    eprintln!("[inmem] Failed to write snapshot '{}': {e}", path.display());
                }
            }
        }

        pub fn new() -> Self {
            let snapshot_path = Self::snapshot_path();
            let state = Self::load_state_from(&snapshot_path);
            Self {
                state: Arc::new(RwLock::new(state)),
                snapshot_path: Arc::new(snapshot_path),
            }
        }
    }

    impl Default for InMemRepo {
        fn default() -> Self { Self::new() }
    }

    #[async_trait]
    impl ThreadRepo for InMemRepo {
        async fn create_thread(&self, author: &Author, new: NewThread) -> RepoResult<AddedThread> {
            let mut s = self.state.write().unwrap();
            let id = fresh_id("thread");
            let thread = Thread {
                id: id.clone(),
                owner: author.id.clone(),
                owner_username: author.username.clone(),
                title: new.title,
                body: new.body,
                created_at: Utc::now(),
            };
            let added = AddedThread {
                id: thread.id.clone(),
                title: thread.title.clone(),
                owner: thread.owner.clone(),
            };
            s.threads.insert(id, thread);
            drop(s); // release lock before persisting
            self.persist();
            Ok(added)
        }

        async fn thread_exists(&self, thread_id: &str) -> RepoResult<bool> {
            let s = self.state.read().unwrap();
            Ok(s.threads.contains_key(thread_id))
        }

        async fn get_thread(&self, thread_id: &str) -> RepoResult<Thread> {
            let s = self.state.read().unwrap();
            s.threads.get(thread_id).cloned().ok_or(RepoError::NotFound)
        }
    }

    #[async_trait]
    impl CommentRepo for InMemRepo {
        async fn create_comment(
            &self,
            author: &Author,
            thread_id: &str,
            new: NewComment,
        ) -> RepoResult<AddedComment> {
            let mut s = self.state.write().unwrap();
            if !s.threads.contains_key(thread_id) { return Err(RepoError::NotFound); }
            let id = fresh_id("comment");
            let comment = Comment {
                id: id.clone(),
                owner: author.id.clone(),
                owner_username: author.username.clone(),
                thread_id: thread_id.to_string(),
                content: new.content,
                created_at: Utc::now(),
                deleted_at: None,
            };
            let added = AddedComment {
                id: comment.id.clone(),
                content: comment.content.clone(),
                owner: comment.owner.clone(),
            };
            s.comments.insert(id, comment);
            drop(s);
            self.persist();
            Ok(added)
        }

        async fn comment_in_thread(&self, thread_id: &str, comment_id: &str) -> RepoResult<bool> {
            let s = self.state.read().unwrap();
            Ok(s.comments.get(comment_id).map(|c| c.thread_id == thread_id).unwrap_or(false))
        }

        async fn comment_owned_by(&self, comment_id: &str, user_id: &str) -> RepoResult<bool> {
            let s = self.state.read().unwrap();
            let comment = s.comments.get(comment_id).ok_or(RepoError::NotFound)?;
            Ok(comment.owner == user_id)
        }

        async fn soft_delete_comment(&self, comment_id: &str) -> RepoResult<()> {
            let mut s = self.state.write().unwrap();
            let comment = s.comments.get_mut(comment_id).ok_or(RepoError::NotFound)?;
            // repeated deletes keep the first timestamp
            comment.deleted_at.get_or_insert_with(Utc::now);
            drop(s);
            self.persist();
            Ok(())
        }

        async fn list_comments(&self, thread_id: &str) -> RepoResult<Vec<Comment>> {
            let s = self.state.read().unwrap();
            let mut rows: Vec<_> = s.comments.values()
                .filter(|c| c.thread_id == thread_id)
                .cloned()
                .collect();
            // ascending by creation time, id breaks ties
            rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
            Ok(rows)
        }
    }

    #[async_trait]
    impl ReplyRepo for InMemRepo {
        async fn create_reply(
            &self,
            author: &Author,
            comment_id: &str,
            new: NewReply,
        ) -> RepoResult<AddedReply> {
            let mut s = self.state.write().unwrap();
            if !s.comments.contains_key(comment_id) { return Err(RepoError::NotFound); }
            let id = fresh_id("reply");
            let reply = Reply {
                id: id.clone(),
                owner: author.id.clone(),
                owner_username: author.username.clone(),
                comment_id: comment_id.to_string(),
                content: new.content,
                created_at: Utc::now(),
                deleted_at: None,
            };
            let added = AddedReply {
                id: reply.id.clone(),
                content: reply.content.clone(),
                owner: reply.owner.clone(),
            };
            s.replies.insert(id, reply);
            drop(s);
            self.persist();
            Ok(added)
        }

        async fn reply_in_comment(&self, comment_id: &str, reply_id: &str) -> RepoResult<bool> {
            let s = self.state.read().unwrap();
            Ok(s.replies.get(reply_id).map(|r| r.comment_id == comment_id).unwrap_or(false))
        }

        async fn reply_owned_by(&self, reply_id: &str, user_id: &str) -> RepoResult<bool> {
            let s = self.state.read().unwrap();
            let reply = s.replies.get(reply_id).ok_or(RepoError::NotFound)?;
            Ok(reply.owner == user_id)
        }

        async fn soft_delete_reply(&self, reply_id: &str) -> RepoResult<()> {
            let mut s = self.state.write().unwrap();
            let reply = s.replies.get_mut(reply_id).ok_or(RepoError::NotFound)?;
            reply.deleted_at.get_or_insert_with(Utc::now);
            drop(s);
            self.persist();
            Ok(())
        }

        async fn list_replies_by_comment_ids(&self, comment_ids: &[Id]) -> RepoResult<Vec<Reply>> {
            let s = self.state.read().unwrap();
            let mut rows: Vec<_> = s.replies.values()
                .filter(|r| comment_ids.iter().any(|id| *id == r.comment_id))
                .cloned()
                .collect();
            rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
            Ok(rows)
        }
    }

    #[async_trait]
    impl LikeRepo for InMemRepo {
        async fn toggle_like(&self, user_id: &str, comment_id: &str) -> RepoResult<bool> {
            let mut s = self.state.write().unwrap();
            if !s.comments.contains_key(comment_id) { return Err(RepoError::NotFound); }
            let liked = match s.likes.values_mut()
                .find(|l| l.owner == user_id && l.comment_id == comment_id)
            {
                Some(like) => {
                    like.liked = !like.liked;
                    like.liked
                }
                None => {
                    let id = fresh_id("like");
                    let like = Like {
                        id: id.clone(),
                        owner: user_id.to_string(),
                        comment_id: comment_id.to_string(),
                        liked: true,
                    };
                    s.likes.insert(id, like);
                    true
                }
            };
            drop(s);
            self.persist();
            Ok(liked)
        }

        async fn count_likes_by_comment_ids(
            &self,
            comment_ids: &[Id],
        ) -> RepoResult<HashMap<Id, i64>> {
            let s = self.state.read().unwrap();
            let mut counts: HashMap<Id, i64> = HashMap::new();
            for like in s.likes.values() {
                if like.liked && comment_ids.iter().any(|id| *id == like.comment_id) {
                    *counts.entry(like.comment_id.clone()).or_insert(0) += 1;
                }
            }
            Ok(counts)
        }
    }
}

// Postgres implementation (feature = "postgres-store")
#[cfg(feature = "postgres-store")]
pub mod pg {
    use super::*;
    use sqlx::{Pool, Postgres};

    #[derive(Clone)]
    pub struct PgRepo { pool: Pool<Postgres> }

    impl PgRepo {
        pub fn new(pool: Pool<Postgres>) -> Self { Self { pool } }
    }

    fn db_err(e: sqlx::Error) -> RepoError {
        match e {
            sqlx::Error::RowNotFound => RepoError::NotFound,
            e => RepoError::Internal(e.to_string()),
        }
    }

    #[async_trait]
    impl ThreadRepo for PgRepo {
        async fn create_thread(&self, author: &Author, new: NewThread) -> RepoResult<AddedThread> {
            let id = fresh_id("thread");
            sqlx::query_as::<_, AddedThread>(
                "INSERT INTO threads (id, owner, owner_username, title, body)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING id, title, owner",
            )
            .bind(&id)
            .bind(&author.id)
            .bind(&author.username)
            .bind(&new.title)
            .bind(&new.body)
            .fetch_one(&self.pool).await.map_err(db_err)
        }

        async fn thread_exists(&self, thread_id: &str) -> RepoResult<bool> {
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM threads WHERE id = $1)")
                .bind(thread_id)
                .fetch_one(&self.pool).await.map_err(db_err)
        }

        async fn get_thread(&self, thread_id: &str) -> RepoResult<Thread> {
            sqlx::query_as::<_, Thread>(
                "SELECT id, owner, owner_username, title, body, created_at
                 FROM threads WHERE id = $1",
            )
            .bind(thread_id)
            .fetch_one(&self.pool).await.map_err(db_err)
        }
    }

    #[async_trait]
    impl CommentRepo for PgRepo {
        async fn create_comment(
            &self,
            author: &Author,
            thread_id: &str,
            new: NewComment,
        ) -> RepoResult<AddedComment> {
            let id = fresh_id("comment");
            sqlx::query_as::<_, AddedComment>(
                "INSERT INTO comments (id, owner, owner_username, thread_id, content)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING id, content, owner",
            )
            .bind(&id)
            .bind(&author.id)
            .bind(&author.username)
            .bind(thread_id)
            .bind(&new.content)
            .fetch_one(&self.pool).await.map_err(db_err)
        }

        async fn comment_in_thread(&self, thread_id: &str, comment_id: &str) -> RepoResult<bool> {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM comments WHERE id = $1 AND thread_id = $2)",
            )
            .bind(comment_id)
            .bind(thread_id)
            .fetch_one(&self.pool).await.map_err(db_err)
        }

        async fn comment_owned_by(&self, comment_id: &str, user_id: &str) -> RepoResult<bool> {
            let owner = sqlx::query_scalar::<_, String>("SELECT owner FROM comments WHERE id = $1")
                .bind(comment_id)
                .fetch_optional(&self.pool).await.map_err(db_err)?;
            owner.map(|o| o == user_id).ok_or(RepoError::NotFound)
        }

        async fn soft_delete_comment(&self, comment_id: &str) -> RepoResult<()> {
            let res = sqlx::query(
                "UPDATE comments SET deleted_at = COALESCE(deleted_at, now()) WHERE id = $1",
            )
            .bind(comment_id)
            .execute(&self.pool).await.map_err(db_err)?;
            if res.rows_affected() == 0 { return Err(RepoError::NotFound); }
            Ok(())
        }

        async fn list_comments(&self, thread_id: &str) -> RepoResult<Vec<Comment>> {
            sqlx::query_as::<_, Comment>(
                "SELECT id, owner, owner_username, thread_id, content, created_at, deleted_at
                 FROM comments
                 WHERE thread_id = $1
                 ORDER BY created_at ASC, id ASC",
            )
            .bind(thread_id)
            .fetch_all(&self.pool).await.map_err(db_err)
        }
    }

    #[async_trait]
    impl ReplyRepo for PgRepo {
        async fn create_reply(
            &self,
            author: &Author,
            comment_id: &str,
            new: NewReply,
        ) -> RepoResult<AddedReply> {
            let id = fresh_id("reply");
            sqlx::query_as::<_, AddedReply>(
                "INSERT INTO replies (id, owner, owner_username, comment_id, content)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING id, content, owner",
            )
            .bind(&id)
            .bind(&author.id)
            .bind(&author.username)
            .bind(comment_id)
            .bind(&new.content)
            .fetch_one(&self.pool).await.map_err(db_err)
        }

        async fn reply_in_comment(&self, comment_id: &str, reply_id: &str) -> RepoResult<bool> {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM replies WHERE id = $1 AND comment_id = $2)",
            )
            .bind(reply_id)
            .bind(comment_id)
            .fetch_one(&self.pool).await.map_err(db_err)
        }

        async fn reply_owned_by(&self, reply_id: &str, user_id: &str) -> RepoResult<bool> {
            let owner = sqlx::query_scalar::<_, String>("SELECT owner FROM replies WHERE id = $1")
                .bind(reply_id)
                .fetch_optional(&self.pool).await.map_err(db_err)?;
            owner.map(|o| o == user_id).ok_or(RepoError::NotFound)
        }

        async fn soft_delete_reply(&self, reply_id: &str) -> RepoResult<()> {
            let res = sqlx::query(
                "UPDATE replies SET deleted_at = COALESCE(deleted_at, now()) WHERE id = $1",
            )
            .bind(reply_id)
            .execute(&self.pool).await.map_err(db_err)?;
            if res.rows_affected() == 0 { return Err(RepoError::NotFound); }
            Ok(())
        }

        async fn list_replies_by_comment_ids(&self, comment_ids: &[Id]) -> RepoResult<Vec<Reply>> {
            sqlx::query_as::<_, Reply>(
                "SELECT id, owner, owner_username, comment_id, content, created_at, deleted_at
                 FROM replies
                 WHERE comment_id = ANY($1)
                 ORDER BY created_at ASC, id ASC",
            )
            .bind(comment_ids.to_vec())
            .fetch_all(&self.pool).await.map_err(db_err)
        }
    }

    #[async_trait]
    impl LikeRepo for PgRepo {
        async fn toggle_like(&self, user_id: &str, comment_id: &str) -> RepoResult<bool> {
            // atomic upsert: concurrent toggles serialize on the unique
            // (owner, comment_id) constraint instead of racing a read-then-write
            let id = fresh_id("like");
            sqlx::query_scalar::<_, bool>(
                "INSERT INTO likes (id, owner, comment_id, liked)
                 VALUES ($1, $2, $3, TRUE)
                 ON CONFLICT (owner, comment_id) DO UPDATE SET liked = NOT likes.liked
                 RETURNING liked",
            )
            .bind(&id)
            .bind(user_id)
            .bind(comment_id)
            .fetch_one(&self.pool).await.map_err(db_err)
        }

        async fn count_likes_by_comment_ids(
            &self,
            comment_ids: &[Id],
        ) -> RepoResult<HashMap<Id, i64>> {
            let rows = sqlx::query_as::<_, (Id, i64)>(
                "SELECT comment_id, COUNT(*) FROM likes
                 WHERE liked AND comment_id = ANY($1)
                 GROUP BY comment_id",
            )
            .bind(comment_ids.to_vec())
            .fetch_all(&self.pool).await.map_err(db_err)?;
            Ok(rows.into_iter().collect())
        }
    }
}
