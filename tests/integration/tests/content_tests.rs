//! Edit/delete lifecycle integration tests
//!
//! Run with: cargo test -p integration-tests --test content_tests

use agora_common::EngineConfig;
use agora_core::{CacheBridge, CacheKey, ContentKind, ContentStore, DomainError, EditPhase, EntityId};
use agora_service::dto::CreateContentRequest;
use agora_service::services::{BoardScope, DeleteOutcome, EditOutcome, SaveOutcome};
use agora_service::ContentService;
use integration_tests::{wait_until, CallKind, TestApp, Write};

// ============================================================================
// Saving
// ============================================================================

#[tokio::test]
async fn test_failed_save_keeps_draft() {
    let mut app = TestApp::new().unwrap();
    let group = EntityId::generate();
    let author = EntityId::generate();
    let post = app.seed_post(group, author, "original text").await;

    let ctx = app.ctx.clone();
    let service = ContentService::new(&ctx);
    let board = service
        .load(BoardScope::GroupPosts(group), Some(author))
        .await
        .unwrap();
    service.start_editing(&board, post.id).unwrap();
    service.update_draft(&board, "carefully typed draft");

    app.store.fail_next(
        CallKind::UpdateContent,
        DomainError::StoreUnavailable("connection reset".to_string()),
    );
    let err = service.save(&board).await.unwrap_err();

    assert!(err.is_store_failure());
    let session = board.session().expect("editor stays open");
    assert_eq!(session.draft(), "carefully typed draft");
    assert_eq!(session.phase(), EditPhase::Editing);
    assert_eq!(board.item(post.id).unwrap().content, "original text");
    assert_eq!(app.next_notice().await.code, "STORE_UNAVAILABLE");

    // Retrying the same draft succeeds
    let outcome = service.save(&board).await.unwrap();
    assert!(matches!(outcome, SaveOutcome::Saved(ref item) if item.content == "carefully typed draft"));
    assert!(board.session().is_none());
}

#[tokio::test]
async fn test_board_shows_old_content_until_confirmed() {
    let app = TestApp::new().unwrap();
    let author = EntityId::generate();
    let parent = app.seed_post(EntityId::generate(), author, "parent").await;
    let comment = app.seed_comment(parent.id, author, "before").await;

    let service = ContentService::new(&app.ctx);
    let board = service
        .load(BoardScope::PostComments(parent.id), Some(author))
        .await
        .unwrap();
    service.start_editing(&board, comment.id).unwrap();
    service.update_draft(&board, "after");

    let hold = app.store.hold_next(CallKind::UpdateContent);
    let (outcome, seen) = tokio::join!(service.save(&board), async {
        hold.entered().await;
        let seen = (
            board.item(comment.id).unwrap().content,
            board.session().unwrap().phase(),
            service.update_draft(&board, "late keystroke"),
            service.cancel_editing(&board),
        );
        hold.release();
        seen
    });

    assert_eq!(
        seen,
        (
            "before".to_string(),
            EditPhase::Saving,
            EditOutcome::Busy,
            EditOutcome::Busy
        )
    );
    assert!(matches!(outcome.unwrap(), SaveOutcome::Saved(_)));
    assert_eq!(board.item(comment.id).unwrap().content, "after");
    assert!(board.item(comment.id).unwrap().is_edited());
}

#[tokio::test]
async fn test_too_long_draft_rejected_without_write() {
    let mut app = TestApp::with_engine(EngineConfig {
        max_content_length: 10,
        ..EngineConfig::default()
    })
    .unwrap();
    let group = EntityId::generate();
    let author = EntityId::generate();
    let post = app.seed_post(group, author, "short").await;

    let service = ContentService::new(&app.ctx);
    let board = service
        .load(BoardScope::GroupPosts(group), Some(author))
        .await
        .unwrap();
    service.start_editing(&board, post.id).unwrap();
    service.update_draft(&board, "definitely more than ten");

    let outcome = service.save(&board).await.unwrap();

    assert_eq!(outcome, SaveOutcome::Rejected(DomainError::ContentTooLong { max: 10 }));
    assert!(app.store.writes().is_empty());
    assert_eq!(board.session().unwrap().phase(), EditPhase::Editing);
    assert_eq!(app.next_notice().await.code, "CONTENT_TOO_LONG");
}

// ============================================================================
// Deleting
// ============================================================================

#[tokio::test]
async fn test_delete_is_not_optimistic() {
    let app = TestApp::new().unwrap();
    let group = EntityId::generate();
    let author = EntityId::generate();
    let post = app.seed_post(group, author, "to be removed").await;

    let service = ContentService::new(&app.ctx);
    let board = service
        .load(BoardScope::GroupPosts(group), Some(author))
        .await
        .unwrap();

    let hold = app.store.hold_next(CallKind::DeleteContent);
    let (outcome, during) = tokio::join!(service.delete(&board, post.id), async {
        hold.entered().await;
        let during = (
            board.item(post.id).is_some(),
            board.is_deleting(post.id),
            service.delete(&board, post.id).await.unwrap(),
        );
        hold.release();
        during
    });

    assert_eq!(during, (true, true, DeleteOutcome::Busy));
    assert_eq!(outcome.unwrap(), DeleteOutcome::Deleted);
    assert!(board.item(post.id).is_none());
    assert!(!board.is_deleting(post.id));
    assert_eq!(app.store.writes(), vec![Write::DeleteContent(post.id)]);
}

#[tokio::test]
async fn test_failed_delete_keeps_item() {
    let mut app = TestApp::new().unwrap();
    let group = EntityId::generate();
    let author = EntityId::generate();
    let post = app.seed_post(group, author, "sticky").await;

    let service = ContentService::new(&app.ctx);
    let board = service
        .load(BoardScope::GroupPosts(group), Some(author))
        .await
        .unwrap();

    app.store.set_offline(true);
    service.delete(&board, post.id).await.unwrap_err();

    assert!(board.item(post.id).is_some());
    assert!(!board.is_deleting(post.id));
    assert_eq!(app.cache.invalidation_count(&CacheKey::PostList(group)), 0);
    assert_eq!(app.next_notice().await.code, "STORE_UNAVAILABLE");
}

#[tokio::test]
async fn test_deleting_edited_item_closes_editor() {
    let app = TestApp::new().unwrap();
    let group = EntityId::generate();
    let author = EntityId::generate();
    let post = app.seed_post(group, author, "draft target").await;

    let service = ContentService::new(&app.ctx);
    let board = service
        .load(BoardScope::GroupPosts(group), Some(author))
        .await
        .unwrap();
    service.start_editing(&board, post.id).unwrap();

    service.delete(&board, post.id).await.unwrap();

    assert!(board.session().is_none());
    assert!(app
        .store
        .inner()
        .find_content(ContentKind::Post, post.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_unmount_during_save_leaves_board_alone() {
    let app = TestApp::new().unwrap();
    let group = EntityId::generate();
    let author = EntityId::generate();
    let post = app.seed_post(group, author, "old").await;

    let service = ContentService::new(&app.ctx);
    let board = service
        .load(BoardScope::GroupPosts(group), Some(author))
        .await
        .unwrap();
    service.start_editing(&board, post.id).unwrap();
    service.update_draft(&board, "new");

    let hold = app.store.hold_next(CallKind::UpdateContent);
    let (outcome, ()) = tokio::join!(service.save(&board), async {
        hold.entered().await;
        board.unmount();
        hold.release();
    });

    assert_eq!(outcome.unwrap(), SaveOutcome::Unmounted);
    assert_eq!(board.item(post.id).unwrap().content, "old");
    assert!(board.session().is_some());
    // The write itself still completed
    let stored = app
        .store
        .inner()
        .find_content(ContentKind::Post, post.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.content, "new");
    assert!(app.cache.get(&CacheKey::Item(ContentKind::Post, post.id)).is_none());
}

#[tokio::test]
async fn test_unmount_during_delete_leaves_board_alone() {
    let app = TestApp::new().unwrap();
    let group = EntityId::generate();
    let author = EntityId::generate();
    let post = app.seed_post(group, author, "going away").await;

    let service = ContentService::new(&app.ctx);
    let board = service
        .load(BoardScope::GroupPosts(group), Some(author))
        .await
        .unwrap();
    service.start_editing(&board, post.id).unwrap();

    let hold = app.store.hold_next(CallKind::DeleteContent);
    let (outcome, ()) = tokio::join!(service.delete(&board, post.id), async {
        hold.entered().await;
        board.unmount();
        hold.release();
    });

    assert_eq!(outcome.unwrap(), DeleteOutcome::Unmounted);
    assert!(board.item(post.id).is_some());
    assert!(board.session().is_some());
    assert!(!board.is_deleting(post.id));
    assert_eq!(app.store.writes(), vec![Write::DeleteContent(post.id)]);
}

// ============================================================================
// Creating and live updates
// ============================================================================

#[tokio::test]
async fn test_created_post_appears_on_watching_board() {
    let app = TestApp::new().unwrap();
    let group = EntityId::generate();
    let author = EntityId::generate();
    let service = ContentService::new(&app.ctx);
    let subscriptions = app.subscriptions();

    let board = service
        .load(BoardScope::GroupPosts(group), Some(EntityId::generate()))
        .await
        .unwrap();
    subscriptions.watch_board(&app.ctx, board.clone()).await.unwrap();

    let created = service
        .create_post(
            Some(author),
            group,
            CreateContentRequest {
                content: "hello group".to_string(),
            },
        )
        .await
        .unwrap();

    wait_until(|| board.item(created.id).is_some()).await;
    assert_eq!(app.cache.invalidation_count(&CacheKey::PostList(group)), 1);
}

#[tokio::test]
async fn test_remote_delete_closes_open_editor() {
    let app = TestApp::new().unwrap();
    let group = EntityId::generate();
    let author = EntityId::generate();
    let post = app.seed_post(group, author, "mine").await;
    let service = ContentService::new(&app.ctx);
    let subscriptions = app.subscriptions();

    // Same author, two devices
    let phone = service
        .load(BoardScope::GroupPosts(group), Some(author))
        .await
        .unwrap();
    let laptop = service
        .load(BoardScope::GroupPosts(group), Some(author))
        .await
        .unwrap();
    subscriptions.watch_board(&app.ctx, phone.clone()).await.unwrap();
    service.start_editing(&phone, post.id).unwrap();

    service.delete(&laptop, post.id).await.unwrap();

    wait_until(|| phone.item(post.id).is_none()).await;
    assert!(phone.session().is_none());
}

#[tokio::test]
async fn test_remote_edit_keeps_local_draft() {
    let app = TestApp::new().unwrap();
    let group = EntityId::generate();
    let author = EntityId::generate();
    let post = app.seed_post(group, author, "v1").await;
    let service = ContentService::new(&app.ctx);
    let subscriptions = app.subscriptions();

    let phone = service
        .load(BoardScope::GroupPosts(group), Some(author))
        .await
        .unwrap();
    subscriptions.watch_board(&app.ctx, phone.clone()).await.unwrap();
    service.start_editing(&phone, post.id).unwrap();
    service.update_draft(&phone, "phone draft");

    app.store
        .inner()
        .update_content(ContentKind::Post, post.id, "v2 from laptop")
        .await
        .unwrap();

    wait_until(|| phone.item(post.id).is_some_and(|i| i.content == "v2 from laptop")).await;
    assert_eq!(phone.session().unwrap().draft(), "phone draft");
    assert!(app.cache.get(&CacheKey::PostList(group)).is_some());
}
