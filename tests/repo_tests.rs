#![cfg(feature = "inmem-store")]

use rif::{
    models::{Author, NewComment, NewReply, NewThread},
    repo::{inmem::InMemRepo, RepoError},
};
// Bring trait method namespaces into scope so calls on InMemRepo resolve.
use rif::repo::{CommentRepo, LikeRepo, ReplyRepo, ThreadRepo};

/// Helper that returns a fresh, empty repository for every test run.
fn repo() -> InMemRepo {
    // isolate state: do **not** persist to the default file path
    std::env::set_var("FORUM_DATA_DIR", tempfile::tempdir().unwrap().path());
    InMemRepo::new()
}

fn alice() -> Author {
    Author { id: "user-1".into(), username: "alice".into() }
}

fn bob() -> Author {
    Author { id: "user-2".into(), username: "bob".into() }
}

#[tokio::test]
async fn thread_comment_reply_flow() {
    let r = repo();

    let thread = r
        .create_thread(&alice(), NewThread { title: "First".into(), body: "OP body".into() })
        .await
        .unwrap();
    assert!(thread.id.starts_with("thread-"));
    assert_eq!(thread.owner, "user-1");
    assert!(r.thread_exists(&thread.id).await.unwrap());
    assert!(!r.thread_exists("thread-nope").await.unwrap());

    let stored = r.get_thread(&thread.id).await.unwrap();
    assert_eq!(stored.owner_username, "alice");

    let comment = r
        .create_comment(&bob(), &thread.id, NewComment { content: "hi".into() })
        .await
        .unwrap();
    assert!(r.comment_in_thread(&thread.id, &comment.id).await.unwrap());
    // scoping: same comment under a different thread id does not match
    assert!(!r.comment_in_thread("thread-other", &comment.id).await.unwrap());

    let reply = r
        .create_reply(&alice(), &comment.id, NewReply { content: "hello".into() })
        .await
        .unwrap();
    assert!(r.reply_in_comment(&comment.id, &reply.id).await.unwrap());
    assert!(!r.reply_in_comment("comment-other", &reply.id).await.unwrap());

    let comments = r.list_comments(&thread.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].id, comment.id);
    assert!(comments[0].deleted_at.is_none());

    let replies = r.list_replies_by_comment_ids(&[comment.id.clone()]).await.unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].comment_id, comment.id);
}

#[tokio::test]
async fn creating_under_missing_parent_is_not_found() {
    let r = repo();

    let err = r
        .create_comment(&alice(), "thread-missing", NewComment { content: "x".into() })
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound));

    let err = r
        .create_reply(&alice(), "comment-missing", NewReply { content: "x".into() })
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound));
}

#[tokio::test]
async fn comment_listing_is_ordered_and_stable() {
    let r = repo();
    let thread = r
        .create_thread(&alice(), NewThread { title: "T".into(), body: "B".into() })
        .await
        .unwrap();

    for content in ["one", "two", "three"] {
        r.create_comment(&bob(), &thread.id, NewComment { content: content.into() })
            .await
            .unwrap();
    }

    let listed = r.list_comments(&thread.id).await.unwrap();
    assert_eq!(listed.len(), 3);
    // ascending by creation time, ties broken by id; stable across calls
    assert!(listed.windows(2).all(|w| {
        (w[0].created_at, w[0].id.as_str()) <= (w[1].created_at, w[1].id.as_str())
    }));
    let again = r.list_comments(&thread.id).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|c| c.id.clone()).collect();
    let ids_again: Vec<_> = again.iter().map(|c| c.id.clone()).collect();
    assert_eq!(ids, ids_again);
}

#[tokio::test]
async fn soft_delete_marks_without_erasing_and_is_idempotent() {
    let r = repo();
    let thread = r
        .create_thread(&alice(), NewThread { title: "T".into(), body: "B".into() })
        .await
        .unwrap();
    let comment = r
        .create_comment(&bob(), &thread.id, NewComment { content: "keep me".into() })
        .await
        .unwrap();

    r.soft_delete_comment(&comment.id).await.unwrap();
    let listed = r.list_comments(&thread.id).await.unwrap();
    let first_ts = listed[0].deleted_at;
    assert!(first_ts.is_some());
    // raw content survives the delete; only views mask it
    assert_eq!(listed[0].content, "keep me");

    // second delete keeps the original timestamp
    r.soft_delete_comment(&comment.id).await.unwrap();
    let listed = r.list_comments(&thread.id).await.unwrap();
    assert_eq!(listed[0].deleted_at, first_ts);

    let err = r.soft_delete_comment("comment-missing").await.unwrap_err();
    assert!(matches!(err, RepoError::NotFound));
}

#[tokio::test]
async fn toggle_like_flips_state_and_counts_liked_rows_only() {
    let r = repo();
    let thread = r
        .create_thread(&alice(), NewThread { title: "T".into(), body: "B".into() })
        .await
        .unwrap();
    let comment = r
        .create_comment(&bob(), &thread.id, NewComment { content: "c".into() })
        .await
        .unwrap();
    let ids = vec![comment.id.clone()];

    // no row yet counts as unliked
    assert!(r.count_likes_by_comment_ids(&ids).await.unwrap().is_empty());

    assert!(r.toggle_like("user-1", &comment.id).await.unwrap());
    assert!(r.toggle_like("user-2", &comment.id).await.unwrap());
    let counts = r.count_likes_by_comment_ids(&ids).await.unwrap();
    assert_eq!(counts.get(&comment.id), Some(&2));

    // second toggle returns to unliked; the row stays but stops counting
    assert!(!r.toggle_like("user-1", &comment.id).await.unwrap());
    let counts = r.count_likes_by_comment_ids(&ids).await.unwrap();
    assert_eq!(counts.get(&comment.id), Some(&1));

    assert!(!r.toggle_like("user-2", &comment.id).await.unwrap());
    assert!(r.count_likes_by_comment_ids(&ids).await.unwrap().is_empty());
}

#[tokio::test]
async fn ownership_helpers() {
    let r = repo();
    let thread = r
        .create_thread(&alice(), NewThread { title: "T".into(), body: "B".into() })
        .await
        .unwrap();
    let comment = r
        .create_comment(&bob(), &thread.id, NewComment { content: "c".into() })
        .await
        .unwrap();
    let reply = r
        .create_reply(&alice(), &comment.id, NewReply { content: "r".into() })
        .await
        .unwrap();

    assert!(r.comment_owned_by(&comment.id, "user-2").await.unwrap());
    assert!(!r.comment_owned_by(&comment.id, "user-1").await.unwrap());
    assert!(r.reply_owned_by(&reply.id, "user-1").await.unwrap());
    assert!(!r.reply_owned_by(&reply.id, "user-2").await.unwrap());

    let err = r.comment_owned_by("comment-missing", "user-1").await.unwrap_err();
    assert!(matches!(err, RepoError::NotFound));
}
