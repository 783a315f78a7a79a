#![cfg(feature = "postgres-store")]

use rif::models::{Author, NewComment, NewThread};
use rif::repo::pg::PgRepo;
use rif::repo::{CommentRepo, LikeRepo, ThreadRepo};
use sqlx::postgres::PgPoolOptions;

async fn pg_repo() -> Option<PgRepo> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await
        .ok()?;
    sqlx::migrate!("./migrations").run(&pool).await.ok()?;
    Some(PgRepo::new(pool))
}

fn author(id: &str) -> Author {
    Author { id: id.into(), username: format!("user:{id}") }
}

#[tokio::test]
#[serial_test::serial]
async fn pg_thread_and_comment_flow() {
    let Some(repo) = pg_repo().await else { eprintln!("skip: no DATABASE_URL"); return };

    let thread = repo
        .create_thread(&author("user-1"), NewThread { title: "T".into(), body: "B".into() })
        .await
        .unwrap();
    assert!(repo.thread_exists(&thread.id).await.unwrap());

    let comment = repo
        .create_comment(&author("user-2"), &thread.id, NewComment { content: "c".into() })
        .await
        .unwrap();
    assert!(repo.comment_in_thread(&thread.id, &comment.id).await.unwrap());
    assert!(!repo.comment_in_thread("thread-other", &comment.id).await.unwrap());
    assert!(repo.comment_owned_by(&comment.id, "user-2").await.unwrap());
}

#[tokio::test]
#[serial_test::serial]
async fn pg_toggle_like_is_atomic_upsert() {
    let Some(repo) = pg_repo().await else { eprintln!("skip: no DATABASE_URL"); return };

    let thread = repo
        .create_thread(&author("user-1"), NewThread { title: "T".into(), body: "B".into() })
        .await
        .unwrap();
    let comment = repo
        .create_comment(&author("user-2"), &thread.id, NewComment { content: "c".into() })
        .await
        .unwrap();
    let ids = vec![comment.id.clone()];

    assert!(repo.toggle_like("user-1", &comment.id).await.unwrap());
    let counts = repo.count_likes_by_comment_ids(&ids).await.unwrap();
    assert_eq!(counts.get(&comment.id), Some(&1));

    // two toggles net out to unliked; the row is reused, never duplicated
    assert!(!repo.toggle_like("user-1", &comment.id).await.unwrap());
    let counts = repo.count_likes_by_comment_ids(&ids).await.unwrap();
    assert!(counts.get(&comment.id).is_none());
}

#[tokio::test]
#[serial_test::serial]
async fn pg_soft_delete_keeps_first_timestamp() {
    let Some(repo) = pg_repo().await else { eprintln!("skip: no DATABASE_URL"); return };

    let thread = repo
        .create_thread(&author("user-1"), NewThread { title: "T".into(), body: "B".into() })
        .await
        .unwrap();
    let comment = repo
        .create_comment(&author("user-2"), &thread.id, NewComment { content: "c".into() })
        .await
        .unwrap();

    repo.soft_delete_comment(&comment.id).await.unwrap();
    let first = repo.list_comments(&thread.id).await.unwrap()[0].deleted_at;
    assert!(first.is_some());

    repo.soft_delete_comment(&comment.id).await.unwrap();
    let second = repo.list_comments(&thread.id).await.unwrap()[0].deleted_at;
    assert_eq!(first, second);
}
