//! Live subscription integration tests
//!
//! Run with: cargo test -p integration-tests --test feed_tests

use std::sync::Arc;

use agora_core::{ChangeEvent, ChangeRecord, EntityId, ReactionStore, ReactionSubject, ReactionType};
use agora_service::services::{BoardScope, ChangeHandler, Visibility};
use agora_service::{ContentService, ReactionService};
use async_trait::async_trait;
use integration_tests::{wait_until, TestApp};
use parking_lot::Mutex;

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<ChangeEvent>>,
}

#[async_trait]
impl ChangeHandler for Recorder {
    async fn on_insert(&self, event: &ChangeEvent) {
        self.events.lock().push(event.clone());
    }

    async fn on_update(&self, event: &ChangeEvent) {
        self.events.lock().push(event.clone());
    }

    async fn on_delete(&self, event: &ChangeEvent) {
        self.events.lock().push(event.clone());
    }
}

#[tokio::test]
async fn test_returning_to_foreground_resyncs_missed_changes() {
    let app = TestApp::new().unwrap();
    let service = ReactionService::new(&app.ctx);
    let subscriptions = app.subscriptions();
    let subject = ReactionSubject::post(EntityId::generate());

    let handle = service.mount(subject, Some(EntityId::generate())).await.unwrap();
    subscriptions
        .watch_reactions(&app.ctx, handle.clone())
        .await
        .unwrap();

    subscriptions.set_visibility(Visibility::Hidden).await.unwrap();
    assert_eq!(app.feed.subscription_count(), 0);

    app.store
        .inner()
        .insert_reaction(&subject, EntityId::generate(), ReactionType::Heart)
        .await
        .unwrap();
    tokio::task::yield_now().await;
    assert_eq!(handle.view().count(ReactionType::Heart), 0);

    subscriptions.set_visibility(Visibility::Visible).await.unwrap();

    // The resync hook refreshed before set_visibility returned
    assert_eq!(handle.view().count(ReactionType::Heart), 1);
    assert_eq!(app.feed.subscription_count(), 1);
    assert_eq!(subscriptions.visibility().await, Visibility::Visible);
}

#[tokio::test]
async fn test_torn_down_view_gets_no_updates() {
    let app = TestApp::new().unwrap();
    let service = ReactionService::new(&app.ctx);
    let subscriptions = app.subscriptions();
    let subject = ReactionSubject::comment(EntityId::generate());

    let handle = service.mount(subject, Some(EntityId::generate())).await.unwrap();
    let watch = subscriptions
        .watch_reactions(&app.ctx, handle.clone())
        .await
        .unwrap();

    assert!(subscriptions.teardown(watch).await);
    handle.unmount();

    app.store
        .inner()
        .insert_reaction(&subject, EntityId::generate(), ReactionType::Like)
        .await
        .unwrap();
    tokio::task::yield_now().await;

    assert_eq!(handle.view().count(ReactionType::Like), 0);
    assert_eq!(app.feed.subscription_count(), 0);
}

#[tokio::test]
async fn test_content_lifecycle_is_pushed_in_order() {
    let app = TestApp::new().unwrap();
    let group = EntityId::generate();
    let author = EntityId::generate();
    let subscriptions = app.subscriptions();
    let recorder = Arc::new(Recorder::default());
    subscriptions
        .subscribe(BoardScope::GroupPosts(group).topic(), recorder.clone())
        .await
        .unwrap();

    let post = app.seed_post(group, author, "first").await;
    let service = ContentService::new(&app.ctx);
    let board = service
        .load(BoardScope::GroupPosts(group), Some(author))
        .await
        .unwrap();
    service.start_editing(&board, post.id).unwrap();
    service.update_draft(&board, "second");
    service.save(&board).await.unwrap();
    service.delete(&board, post.id).await.unwrap();

    wait_until(|| recorder.events.lock().len() == 3).await;
    let records: Vec<ChangeRecord> = recorder
        .events
        .lock()
        .iter()
        .map(|e| e.record.clone())
        .collect();

    assert!(matches!(&records[0], ChangeRecord::Content(item) if item.content == "first"));
    assert!(matches!(&records[1], ChangeRecord::Content(item) if item.content == "second"));
    assert!(matches!(&records[2], ChangeRecord::RemovedContent { id, .. } if *id == post.id));
}
