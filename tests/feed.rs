mod support;

use murmur::application::feed::FeedError;
use murmur::application::pagination::{PAGE_SIZE, PageNumber};
use support::TestApp;
use tempfile::TempDir;
use time::macros::datetime;

fn app() -> (TempDir, TestApp) {
    let dir = TempDir::new().expect("temp dir");
    let app = TestApp::new(dir.path());
    (dir, app)
}

#[tokio::test]
async fn global_feed_pages_ten_posts_newest_first() {
    let (_dir, app) = app();
    let author = app.store.seed_user("leo");
    for n in 0..13 {
        app.store.seed_post(&author, &format!("post {n}"), None);
    }

    let first = app.feed.global(PageNumber::FIRST).await.expect("page one");
    assert_eq!(first.items.len(), PAGE_SIZE as usize);
    assert_eq!(first.total_items, 13);
    assert_eq!(first.total_pages(), 2);
    assert_eq!(first.items[0].text, "post 12");
    assert!(
        first
            .items
            .windows(2)
            .all(|pair| pair[0].pub_date >= pair[1].pub_date)
    );
    assert_eq!(first.next_number(), Some(2));

    let second = app.feed.global(PageNumber::new(2)).await.expect("page two");
    assert_eq!(second.items.len(), 3);
    assert_eq!(second.items[2].text, "post 0");
    assert!(!second.has_next());
}

#[tokio::test]
async fn two_authors_split_across_every_feed() {
    let (_dir, app) = app();
    let alice = app.store.seed_user("alice");
    let bob = app.store.seed_user("bob");
    let reader = app.store.seed_user("reader");
    let knitting = app.store.seed_group("Knitting", "knitting");
    for n in 0..13 {
        app.store.seed_post(&alice, &format!("alice {n}"), Some(&knitting));
    }
    for n in 0..2 {
        app.store.seed_post(&bob, &format!("bob {n}"), None);
    }
    app.store.seed_follow(&reader, &alice);

    let first = app.feed.global(PageNumber::FIRST).await.expect("page one");
    assert_eq!(first.items.len(), 10);
    let second = app.feed.global(PageNumber::new(2)).await.expect("page two");
    assert_eq!(second.items.len(), 5);
    assert_eq!(first.total_items, 15);

    let group = app
        .feed
        .group("knitting", PageNumber::FIRST)
        .await
        .expect("group feed");
    assert_eq!(group.page.total_items, 13);
    assert!(group.page.items.iter().all(|post| post.author_id == alice.id));

    let bobs = app
        .feed
        .author("bob", PageNumber::FIRST)
        .await
        .expect("author feed");
    assert_eq!(bobs.page.items.len(), 2);
    assert_eq!(bobs.post_count, 2);
    assert!(bobs.page.items.iter().all(|post| post.author_id == bob.id));

    let followed = app
        .feed
        .subscriptions(reader.id, PageNumber::FIRST)
        .await
        .expect("reader subscriptions");
    assert_eq!(followed.total_items, 13);
    assert!(followed.items.iter().all(|post| post.author_id == alice.id));

    let unsubscribed = app
        .feed
        .subscriptions(alice.id, PageNumber::FIRST)
        .await
        .expect("alice subscriptions");
    assert!(unsubscribed.is_empty());
    assert_eq!(unsubscribed.total_items, 0);
}

#[tokio::test]
async fn ordering_follows_pub_date_not_insertion() {
    let (_dir, app) = app();
    let author = app.store.seed_user("leo");
    app.store
        .seed_post_at(&author, "middle", None, datetime!(2023-06-01 12:00 UTC));
    app.store
        .seed_post_at(&author, "newest", None, datetime!(2023-12-01 12:00 UTC));
    app.store
        .seed_post_at(&author, "oldest", None, datetime!(2023-01-01 12:00 UTC));

    let page = app.feed.global(PageNumber::FIRST).await.expect("feed");
    let texts: Vec<&str> = page.items.iter().map(|post| post.text.as_str()).collect();
    assert_eq!(texts, ["newest", "middle", "oldest"]);
}

#[tokio::test]
async fn out_of_range_pages_are_clamped_or_empty() {
    let (_dir, app) = app();
    let author = app.store.seed_user("leo");
    for n in 0..3 {
        app.store.seed_post(&author, &format!("post {n}"), None);
    }

    for raw in ["0", "-4", "abc", ""] {
        let page = app
            .feed
            .global(PageNumber::parse(Some(raw)))
            .await
            .expect("feed");
        assert_eq!(page.number, 1, "raw page `{raw}`");
        assert_eq!(page.items.len(), 3);
    }

    let beyond = app.feed.global(PageNumber::new(9)).await.expect("feed");
    assert!(beyond.is_empty());
    assert_eq!(beyond.total_items, 3);
    assert_eq!(beyond.previous_number(), Some(1));
}

#[tokio::test]
async fn group_feed_only_lists_posts_in_that_group() {
    let (_dir, app) = app();
    let author = app.store.seed_user("leo");
    let cats = app.store.seed_group("Cats", "cats");
    let dogs = app.store.seed_group("Dogs", "dogs");
    app.store.seed_post(&author, "cat one", Some(&cats));
    app.store.seed_post(&author, "dog one", Some(&dogs));
    app.store.seed_post(&author, "no group", None);
    app.store.seed_post(&author, "cat two", Some(&cats));

    let feed = app.feed.group("cats", PageNumber::FIRST).await.expect("group feed");
    assert_eq!(feed.group.slug, "cats");
    let texts: Vec<&str> = feed.page.items.iter().map(|post| post.text.as_str()).collect();
    assert_eq!(texts, ["cat two", "cat one"]);
    assert!(
        feed.page
            .items
            .iter()
            .all(|post| post.group_slug.as_deref() == Some("cats"))
    );
}

#[tokio::test]
async fn unknown_group_and_author_are_reported() {
    let (_dir, app) = app();

    let err = app
        .feed
        .group("missing", PageNumber::FIRST)
        .await
        .expect_err("unknown group");
    assert!(matches!(err, FeedError::UnknownGroup(slug) if slug == "missing"));

    let err = app
        .feed
        .author("ghost", PageNumber::FIRST)
        .await
        .expect_err("unknown author");
    assert!(matches!(err, FeedError::UnknownAuthor(name) if name == "ghost"));
}

#[tokio::test]
async fn author_feed_reports_post_and_follower_counts() {
    let (_dir, app) = app();
    let author = app.store.seed_user("leo");
    let other = app.store.seed_user("mia");
    let reader = app.store.seed_user("sam");
    for n in 0..12 {
        app.store.seed_post(&author, &format!("leo {n}"), None);
    }
    app.store.seed_post(&other, "mia", None);
    app.store.seed_follow(&reader, &author);
    app.store.seed_follow(&other, &author);

    let feed = app
        .feed
        .author("leo", PageNumber::FIRST)
        .await
        .expect("author feed");
    assert_eq!(feed.author.id, author.id);
    assert_eq!(feed.post_count, 12);
    assert_eq!(feed.follower_count, 2);
    assert_eq!(feed.page.items.len(), PAGE_SIZE as usize);
    assert!(feed.page.items.iter().all(|post| post.author_id == author.id));
}

#[tokio::test]
async fn subscription_feed_contains_only_followed_authors() {
    let (_dir, app) = app();
    let reader = app.store.seed_user("sam");
    let leo = app.store.seed_user("leo");
    let mia = app.store.seed_user("mia");
    let zed = app.store.seed_user("zed");
    app.store.seed_post(&leo, "from leo", None);
    app.store.seed_post(&zed, "from zed", None);
    app.store.seed_post(&mia, "from mia", None);
    app.store.seed_post(&reader, "from sam", None);

    let empty = app
        .feed
        .subscriptions(reader.id, PageNumber::FIRST)
        .await
        .expect("empty subscriptions");
    assert!(empty.is_empty());
    assert_eq!(empty.total_items, 0);

    app.store.seed_follow(&reader, &leo);
    app.store.seed_follow(&reader, &mia);

    let page = app
        .feed
        .subscriptions(reader.id, PageNumber::FIRST)
        .await
        .expect("subscriptions");
    let texts: Vec<&str> = page.items.iter().map(|post| post.text.as_str()).collect();
    assert_eq!(texts, ["from mia", "from leo"]);
}
