//! Reaction engine integration tests
//!
//! Run with: cargo test -p integration-tests --test reaction_tests

use agora_core::{
    CacheBridge, CacheEntry, CacheKey, DomainError, EntityId, ReactionStore, ReactionSubject,
    ReactionType,
};
use agora_service::dto::ReactionSummary;
use agora_service::{ReactionService, ServiceError, ToggleOutcome};
use integration_tests::{wait_until, CallKind, TestApp, Write};

// ============================================================================
// Toggle semantics
// ============================================================================

#[tokio::test]
async fn test_swap_deletes_before_inserting() {
    let app = TestApp::new().unwrap();
    let service = ReactionService::new(&app.ctx);
    let subject = ReactionSubject::post(EntityId::generate());
    let user = EntityId::generate();
    let handle = service.mount(subject, Some(user)).await.unwrap();

    service.toggle(&handle, ReactionType::Heart).await.unwrap();
    app.store.clear_writes();

    let outcome = service.toggle(&handle, ReactionType::ThumbsUp).await.unwrap();

    assert_eq!(
        app.store.writes(),
        vec![
            Write::DeleteReaction(ReactionType::Heart),
            Write::InsertReaction(ReactionType::ThumbsUp),
        ]
    );
    let ToggleOutcome::Applied(view) = outcome else {
        panic!("expected applied, got {outcome:?}");
    };
    assert_eq!(view.count(ReactionType::Heart), 0);
    assert_eq!(view.count(ReactionType::ThumbsUp), 1);
    assert_eq!(view.user_active(), Some(ReactionType::ThumbsUp));
}

#[tokio::test]
async fn test_at_most_one_active_and_counts_match_store() {
    let app = TestApp::new().unwrap();
    let service = ReactionService::new(&app.ctx);
    let subject = ReactionSubject::comment(EntityId::generate());
    let user = EntityId::generate();

    // Someone else already likes it
    app.store
        .inner()
        .insert_reaction(&subject, EntityId::generate(), ReactionType::Like)
        .await
        .unwrap();

    let handle = service.mount(subject, Some(user)).await.unwrap();
    let clicks = [
        ReactionType::Like,
        ReactionType::Heart,
        ReactionType::ThumbsDown,
        ReactionType::ThumbsDown,
        ReactionType::Like,
        ReactionType::ThumbsUp,
        ReactionType::Heart,
    ];

    for click in clicks {
        service.toggle(&handle, click).await.unwrap();

        let view = handle.view();
        let held: Vec<_> = app
            .store
            .inner()
            .edges_on(&subject)
            .into_iter()
            .filter(|e| e.user_id == user)
            .collect();
        assert!(held.len() <= 1, "user holds {} reactions", held.len());
        assert_eq!(held.first().map(|e| e.reaction), view.user_active());

        let server = app.store.inner().fetch_reaction_counts(&subject).await.unwrap();
        assert_eq!(view.counts(), &server);
    }

    assert_eq!(handle.view().user_active(), Some(ReactionType::Heart));
    assert_eq!(handle.view().count(ReactionType::Like), 1);
}

#[tokio::test]
async fn test_double_toggle_returns_to_original() {
    let app = TestApp::new().unwrap();
    let service = ReactionService::new(&app.ctx);
    let subject = ReactionSubject::post(EntityId::generate());
    app.store
        .inner()
        .insert_reaction(&subject, EntityId::generate(), ReactionType::ThumbsDown)
        .await
        .unwrap();
    let handle = service.mount(subject, Some(EntityId::generate())).await.unwrap();
    let original = handle.view();

    for reaction in [ReactionType::ThumbsUp, ReactionType::ThumbsDown, ReactionType::Heart] {
        service.toggle(&handle, reaction).await.unwrap();
        service.toggle(&handle, reaction).await.unwrap();
        assert_eq!(handle.view(), original);
    }
    assert_eq!(app.store.inner().edges_on(&subject).len(), 1);
}

#[tokio::test]
async fn test_two_users_on_one_subject() {
    let app = TestApp::new().unwrap();
    let service = ReactionService::new(&app.ctx);
    let subject = ReactionSubject::post(EntityId::generate());
    let alice = service.mount(subject, Some(EntityId::generate())).await.unwrap();
    let bob = service.mount(subject, Some(EntityId::generate())).await.unwrap();

    service.toggle(&alice, ReactionType::Heart).await.unwrap();
    service.toggle(&bob, ReactionType::Heart).await.unwrap();
    service.refresh(&alice).await.unwrap();

    assert_eq!(alice.view().count(ReactionType::Heart), 2);
    assert!(alice.view().is_active(ReactionType::Heart));

    let summary = ReactionSummary::from(&bob.view());
    assert_eq!(summary.total, 2);
    assert!(summary.button(ReactionType::Heart).unwrap().active);
    assert!(!summary.locked);
}

#[tokio::test]
async fn test_signed_out_click_is_silent() {
    let mut app = TestApp::new().unwrap();
    let service = ReactionService::new(&app.ctx);
    let handle = service
        .mount(ReactionSubject::post(EntityId::generate()), None)
        .await
        .unwrap();

    let outcome = service.toggle(&handle, ReactionType::Heart).await.unwrap();

    assert_eq!(outcome, ToggleOutcome::Unauthenticated);
    assert!(app.store.writes().is_empty());
    app.assert_no_notice();
}

// ============================================================================
// Failure and rollback
// ============================================================================

#[tokio::test]
async fn test_offline_thumbs_down_on_comment_rolls_back() {
    let mut app = TestApp::new().unwrap();
    let ctx = app.ctx.clone();
    let service = ReactionService::new(&ctx);
    let subject = ReactionSubject::comment(EntityId::generate());
    let handle = service.mount(subject, Some(EntityId::generate())).await.unwrap();
    let before = handle.view();
    let key = CacheKey::Reactions(subject);

    app.store.set_offline(true);
    let hold = app.store.hold_next(CallKind::InsertReaction);
    let (result, (shown, cached)) = tokio::join!(service.toggle(&handle, ReactionType::ThumbsDown), async {
        hold.entered().await;
        let shown = handle.view();
        let cached = app.cache.get(&key);
        hold.release();
        (shown, cached)
    });

    // The click shows up before the store answers
    assert_eq!(
        shown.count(ReactionType::ThumbsDown),
        before.count(ReactionType::ThumbsDown) + 1
    );
    assert_eq!(shown.user_active(), Some(ReactionType::ThumbsDown));
    match cached {
        Some(CacheEntry::Reactions(view)) => {
            assert_eq!(view.count(ReactionType::ThumbsDown), shown.count(ReactionType::ThumbsDown));
            assert_eq!(view.user_active(), Some(ReactionType::ThumbsDown));
        }
        other => panic!("expected patched reactions entry, got {other:?}"),
    }

    let err = result.unwrap_err();
    assert!(err.is_store_failure());
    assert_eq!(handle.view(), before);
    assert_eq!(app.cache.get(&key), Some(CacheEntry::Reactions(before.clone())));
    assert!(app.store.inner().edges_on(&subject).is_empty());

    let notice = app.next_notice().await;
    assert!(notice.is_error());
    assert_eq!(notice.code, "STORE_UNAVAILABLE");

    // Back online the same click goes through
    app.store.set_offline(false);
    service.toggle(&handle, ReactionType::ThumbsDown).await.unwrap();
    assert!(handle.view().is_active(ReactionType::ThumbsDown));
}

#[tokio::test]
async fn test_rollback_restores_exact_snapshot() {
    let mut app = TestApp::new().unwrap();
    let service = ReactionService::new(&app.ctx);
    let subject = ReactionSubject::post(EntityId::generate());
    let user = EntityId::generate();
    let store = app.store.inner();
    store
        .insert_reaction(&subject, EntityId::generate(), ReactionType::Heart)
        .await
        .unwrap();
    store
        .insert_reaction(&subject, user, ReactionType::ThumbsUp)
        .await
        .unwrap();

    let handle = service.mount(subject, Some(user)).await.unwrap();
    let before = handle.view();
    let key = CacheKey::Reactions(subject);

    app.store.fail_next(
        CallKind::DeleteReaction,
        DomainError::StoreRejected("permission denied for table reactions".to_string()),
    );
    let err = service.toggle(&handle, ReactionType::Heart).await.unwrap_err();

    assert!(matches!(err, ServiceError::Domain(DomainError::StoreRejected(_))));
    assert_eq!(handle.view(), before);
    assert_eq!(app.cache.get(&key), Some(CacheEntry::Reactions(before)));
    assert!(!app.cache.has_pending(&key));
    assert_eq!(app.cache.invalidation_count(&key), 0);
    assert_eq!(app.next_notice().await.code, "STORE_REJECTED");
}

#[tokio::test]
async fn test_partial_swap_failure_invalidates_cache() {
    let app = TestApp::new().unwrap();
    let service = ReactionService::new(&app.ctx);
    let subject = ReactionSubject::comment(EntityId::generate());
    let user = EntityId::generate();
    let handle = service.mount(subject, Some(user)).await.unwrap();
    service.toggle(&handle, ReactionType::Like).await.unwrap();
    let before = handle.view();

    app.store.fail_next(
        CallKind::InsertReaction,
        DomainError::StoreUnavailable("timeout".to_string()),
    );
    service.toggle(&handle, ReactionType::Heart).await.unwrap_err();

    // The view is rolled back even though the delete landed
    assert_eq!(handle.view(), before);
    let key = CacheKey::Reactions(subject);
    assert_eq!(app.cache.invalidation_count(&key), 1);
    assert!(app.cache.get(&key).is_none());

    // The next refresh repairs the divergence
    assert!(service.refresh(&handle).await.unwrap());
    assert_eq!(handle.view().user_active(), None);
    assert_eq!(handle.view().count(ReactionType::Like), 0);
}

// ============================================================================
// In-flight writes
// ============================================================================

#[tokio::test]
async fn test_second_click_while_submitting_is_ignored() {
    let app = TestApp::new().unwrap();
    let service = ReactionService::new(&app.ctx);
    let subject = ReactionSubject::post(EntityId::generate());
    let handle = service.mount(subject, Some(EntityId::generate())).await.unwrap();

    let hold = app.store.hold_next(CallKind::InsertReaction);
    let (first, (second, locked)) = tokio::join!(service.toggle(&handle, ReactionType::Heart), async {
        hold.entered().await;
        let locked = handle.view().is_submitting();
        let second = service.toggle(&handle, ReactionType::ThumbsUp).await;
        hold.release();
        (second, locked)
    });

    assert!(locked);
    assert_eq!(second.unwrap(), ToggleOutcome::Busy);
    assert!(matches!(first.unwrap(), ToggleOutcome::Applied(_)));
    assert_eq!(app.store.writes(), vec![Write::InsertReaction(ReactionType::Heart)]);
    assert!(!handle.view().is_submitting());
}

#[tokio::test]
async fn test_unmount_during_write_leaves_view_alone() {
    let app = TestApp::new().unwrap();
    let service = ReactionService::new(&app.ctx);
    let subject = ReactionSubject::post(EntityId::generate());
    let handle = service.mount(subject, Some(EntityId::generate())).await.unwrap();

    let hold = app.store.hold_next(CallKind::InsertReaction);
    let (outcome, ()) = tokio::join!(service.toggle(&handle, ReactionType::Heart), async {
        hold.entered().await;
        handle.unmount();
        hold.release();
    });

    assert_eq!(outcome.unwrap(), ToggleOutcome::Unmounted);
    // The write itself still completed
    assert_eq!(app.store.inner().edges_on(&subject).len(), 1);
    assert!(!service.refresh(&handle).await.unwrap());
}

// ============================================================================
// Live updates
// ============================================================================

#[tokio::test]
async fn test_pushed_change_updates_other_view() {
    let app = TestApp::new().unwrap();
    let service = ReactionService::new(&app.ctx);
    let subscriptions = app.subscriptions();
    let subject = ReactionSubject::comment(EntityId::generate());

    let watcher = service.mount(subject, Some(EntityId::generate())).await.unwrap();
    subscriptions
        .watch_reactions(&app.ctx, watcher.clone())
        .await
        .unwrap();

    let actor = service.mount(subject, Some(EntityId::generate())).await.unwrap();
    service.toggle(&actor, ReactionType::Like).await.unwrap();

    wait_until(|| watcher.view().count(ReactionType::Like) == 1).await;
    assert_eq!(watcher.view().user_active(), None);

    subscriptions.teardown_all().await;
    assert_eq!(app.feed.subscription_count(), 0);
}
