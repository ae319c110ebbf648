mod support;

use murmur::application::follows::{FollowError, FollowOutcome, UnfollowOutcome};
use murmur::application::pagination::PageNumber;
use support::TestApp;
use tempfile::TempDir;

fn app() -> (TempDir, TestApp) {
    let dir = TempDir::new().expect("temp dir");
    let app = TestApp::new(dir.path());
    (dir, app)
}

#[tokio::test]
async fn following_twice_keeps_a_single_edge() {
    let (_dir, app) = app();
    let reader = app.store.seed_user("sam");
    app.store.seed_user("leo");

    let first = app.follows.follow(reader.id, "leo").await.expect("follow");
    assert_eq!(first, FollowOutcome::Created);

    let second = app.follows.follow(reader.id, "leo").await.expect("repeat");
    assert_eq!(second, FollowOutcome::AlreadyFollowing);

    assert_eq!(app.store.follow_count(), 1);
    assert_eq!(app.follows.following_count(reader.id).await.expect("count"), 1);
}

#[tokio::test]
async fn self_follow_is_rejected_without_writing() {
    let (_dir, app) = app();
    let reader = app.store.seed_user("sam");

    let err = app
        .follows
        .follow(reader.id, "sam")
        .await
        .expect_err("self follow");
    assert!(matches!(err, FollowError::SelfFollow));
    assert_eq!(app.store.follow_count(), 0);
    assert!(!app.follows.is_following(reader.id, reader.id).await.expect("check"));
}

#[tokio::test]
async fn following_unknown_author_fails() {
    let (_dir, app) = app();
    let reader = app.store.seed_user("sam");

    let err = app
        .follows
        .follow(reader.id, "ghost")
        .await
        .expect_err("unknown author");
    assert!(matches!(err, FollowError::UnknownAuthor(name) if name == "ghost"));
}

#[tokio::test]
async fn unfollow_removes_edge_and_tolerates_missing_ones() {
    let (_dir, app) = app();
    let reader = app.store.seed_user("sam");
    let author = app.store.seed_user("leo");
    app.store.seed_follow(&reader, &author);

    assert!(app.follows.is_following(reader.id, author.id).await.expect("check"));

    let removed = app.follows.unfollow(reader.id, "leo").await.expect("unfollow");
    assert_eq!(removed, UnfollowOutcome::Removed);
    assert!(!app.follows.is_following(reader.id, author.id).await.expect("check"));

    let again = app.follows.unfollow(reader.id, "leo").await.expect("repeat");
    assert_eq!(again, UnfollowOutcome::NotFollowing);

    let unknown = app.follows.unfollow(reader.id, "ghost").await.expect("unknown");
    assert_eq!(unknown, UnfollowOutcome::NotFollowing);
}

#[tokio::test]
async fn unfollowing_drops_author_from_subscription_feed() {
    let (_dir, app) = app();
    let reader = app.store.seed_user("sam");
    let author = app.store.seed_user("leo");
    app.store.seed_post(&author, "hello", None);

    app.follows.follow(reader.id, "leo").await.expect("follow");
    let page = app
        .feed
        .subscriptions(reader.id, PageNumber::FIRST)
        .await
        .expect("feed");
    assert_eq!(page.items.len(), 1);

    app.follows.unfollow(reader.id, "leo").await.expect("unfollow");
    let page = app
        .feed
        .subscriptions(reader.id, PageNumber::FIRST)
        .await
        .expect("feed");
    assert!(page.is_empty());
}
