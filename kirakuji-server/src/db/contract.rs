//! Behaviour every store backend must share. Driven from each backend's tests.

use shared::{Draw, DrawStatus, Post, PostStatus};

use super::{DrawStore, PostStore, StoreError};

pub async fn post_store_contract(posts: &dyn PostStore) {
    assert!(posts.find_pending().await.unwrap().is_none());
    assert!(posts.find_by_id("missing").await.unwrap().is_none());

    let post = Post::create("p-1", "眠れない夜が続いています").unwrap();
    posts.create(&post).await.unwrap();
    assert!(matches!(
        posts.create(&post).await,
        Err(StoreError::AlreadyExists(id)) if id == "p-1"
    ));

    let found = posts.find_pending().await.unwrap().unwrap();
    assert_eq!(found, post);

    let mut ready = found;
    ready.update_content("あなたの夜にも朝は必ず来ます。").unwrap();
    ready.mark_ready().unwrap();
    posts.update(&ready).await.unwrap();

    let stored = posts.find_by_id("p-1").await.unwrap().unwrap();
    assert_eq!(stored.status(), PostStatus::Ready);
    assert_eq!(stored.content(), "あなたの夜にも朝は必ず来ます。");
    assert!(posts.find_pending().await.unwrap().is_none());

    let ghost = Post::create("ghost", "闇").unwrap();
    assert!(matches!(
        posts.update(&ghost).await,
        Err(StoreError::NotFound(id)) if id == "ghost"
    ));
}

pub async fn pending_rotation_contract(posts: &dyn PostStore) {
    for id in ["b", "a", "c"] {
        posts.create(&Post::create(id, "闇").unwrap()).await.unwrap();
    }

    let mut seen = Vec::new();
    for _ in 0..4 {
        let post = posts.find_pending().await.unwrap().unwrap();
        seen.push(post.id().to_string());
    }
    assert_eq!(seen, ["a", "b", "c", "a"]);

    // a Ready post drops out of the rotation
    let mut b = posts.find_by_id("b").await.unwrap().unwrap();
    b.mark_ready().unwrap();
    posts.update(&b).await.unwrap();

    let next = posts.find_pending().await.unwrap().unwrap();
    assert_eq!(next.id(), "c");
    let next = posts.find_pending().await.unwrap().unwrap();
    assert_eq!(next.id(), "a");
}

pub async fn draw_store_contract(draws: &dyn DrawStore) {
    assert!(draws.list_verified().await.unwrap().is_empty());
    assert!(matches!(
        draws.get_by_post_id("p-1").await,
        Err(StoreError::NotFound(id)) if id == "p-1"
    ));

    let mut verified = Draw::create("p-1", "今日のあなたは十分がんばっています。").unwrap();
    verified.mark_verified().unwrap();
    draws.create(&verified).await.unwrap();
    assert!(matches!(
        draws.create(&verified).await,
        Err(StoreError::AlreadyExists(id)) if id == "p-1"
    ));

    let mut rejected = Draw::create("p-2", "短い").unwrap();
    rejected.mark_rejected("too short").unwrap();
    draws.create(&rejected).await.unwrap();

    let stored = draws.get_by_post_id("p-2").await.unwrap();
    assert_eq!(stored.status(), DrawStatus::Rejected);
    assert_eq!(stored.rejection_reason(), Some("too short"));

    let listed = draws.list_verified().await.unwrap();
    assert_eq!(listed, vec![verified]);
}
