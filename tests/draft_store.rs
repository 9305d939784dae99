//! Integration tests for the draft store, the event log, and the
//! session dispatch path, against a live PostgreSQL database.
//!
//! Run with `DATABASE_URL` pointing at a scratch database; without it
//! every test skips itself.

mod common;

use chrono::{Duration, Utc};
use common::database::TestDatabase;
use serde_json::json;
use serial_test::serial;
use uuid::Uuid;

use draftsync::backend::billing::DraftTtl;
use draftsync::backend::draft::events::DraftEventLog;
use draftsync::backend::draft::snapshot::Snapshot;
use draftsync::backend::draft::store::DraftStore;
use draftsync::backend::error::StoreError;
use draftsync::backend::server::state::AppState;
use draftsync::backend::ws::protocol::{ClientMessage, ServerMessage};
use draftsync::backend::ws::session::dispatch;

fn store_for(db: &TestDatabase) -> DraftStore {
    let pool = db.pool().clone();
    DraftStore::new(pool.clone(), DraftTtl::new(pool))
}

fn app_state_for(db: &TestDatabase) -> AppState {
    let pool = db.pool().clone();
    AppState {
        db_pool: pool.clone(),
        store: store_for(db),
        event_log: DraftEventLog::Database(pool),
    }
}

fn snapshot(value: serde_json::Value) -> Snapshot {
    serde_json::from_value(value).expect("test snapshot must parse")
}

#[tokio::test]
#[serial]
async fn test_patch_without_draft_creates_nothing() {
    let Some(db) = TestDatabase::connect().await else {
        return;
    };
    let store = store_for(&db);
    let user = db.create_user().await;

    let result = store
        .apply_patch(user, &[json!({"op": "set_name", "name": "x"})])
        .await;
    assert!(matches!(result, Err(StoreError::NotFound)));

    // The store stays in the "absent" state - patches never create
    assert!(store.load(user).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn test_commit_then_load_round_trips() {
    let Some(db) = TestDatabase::connect().await else {
        return;
    };
    db.set_ttl_hours(24).await;
    let store = store_for(&db);
    let user = db.create_user().await;

    let committed = snapshot(json!({
        "name": "contract",
        "pages": [{"landscape": true, "overlays": [{"id": "s1", "kind": "sign"}]}]
    }));
    store.commit(user, committed.clone()).await.unwrap();

    let draft = store.load(user).await.unwrap().expect("draft must exist");
    assert_eq!(draft.data, committed);

    let expected_expiry = Utc::now() + Duration::hours(24);
    let delta = (draft.expires_at - expected_expiry).num_seconds().abs();
    assert!(delta < 30, "expires_at should be ~now+24h, off by {}s", delta);
}

#[tokio::test]
#[serial]
async fn test_commit_reads_ttl_live() {
    let Some(db) = TestDatabase::connect().await else {
        return;
    };
    let store = store_for(&db);
    let user = db.create_user().await;

    db.set_ttl_hours(24).await;
    store.commit(user, Snapshot::default()).await.unwrap();
    let first = store.load(user).await.unwrap().unwrap();

    // Operators can change retention live; the next write must pick it
    // up without any restart or cache invalidation
    db.set_ttl_hours(2).await;
    store.commit(user, Snapshot::default()).await.unwrap();
    let second = store.load(user).await.unwrap().unwrap();

    assert!(second.expires_at < first.expires_at);
    let expected = Utc::now() + Duration::hours(2);
    assert!((second.expires_at - expected).num_seconds().abs() < 30);

    db.set_ttl_hours(24).await;
}

#[tokio::test]
#[serial]
async fn test_patch_applies_and_refreshes_expiry() {
    let Some(db) = TestDatabase::connect().await else {
        return;
    };
    db.set_ttl_hours(24).await;
    let store = store_for(&db);
    let user = db.create_user().await;

    store
        .commit(user, snapshot(json!({"pages": [{}]})))
        .await
        .unwrap();

    let outcome = store
        .apply_patch(
            user,
            &[
                json!({"op": "rotate_page", "page": 0, "landscape": true}),
                json!({"op": "rotate_page", "page": 9, "landscape": true}),
            ],
        )
        .await
        .unwrap();
    assert_eq!(outcome.applied, 1);
    assert_eq!(outcome.skipped, 1);

    let draft = store.load(user).await.unwrap().unwrap();
    assert!(draft.data.pages[0].landscape);
    assert!(draft.expires_at > Utc::now() + Duration::hours(23));
}

#[tokio::test]
#[serial]
async fn test_expired_draft_reads_as_absent_and_is_purged() {
    let Some(db) = TestDatabase::connect().await else {
        return;
    };
    let store = store_for(&db);
    let user = db.create_user().await;

    store.commit(user, Snapshot::default()).await.unwrap();
    db.expire_draft(user).await;

    assert!(store.load(user).await.unwrap().is_none());

    // The stale row was deleted by the read, so a patch now finds no
    // draft rather than resurrecting the expired one
    let result = store.apply_patch(user, &[]).await;
    assert!(matches!(result, Err(StoreError::NotFound)));
}

#[tokio::test]
#[serial]
async fn test_purge_spares_a_draft_refreshed_by_commit() {
    let Some(db) = TestDatabase::connect().await else {
        return;
    };
    db.set_ttl_hours(24).await;
    let store = store_for(&db);
    let user = db.create_user().await;

    // A reader saw this draft expired, but before its purge ran a
    // commit replaced the row with fresh data and a new expiry. The
    // purge re-checks expiry at delete time and must leave the
    // committed draft in place.
    store.commit(user, Snapshot::default()).await.unwrap();
    db.expire_draft(user).await;
    store
        .commit(user, snapshot(json!({"name": "fresh"})))
        .await
        .unwrap();

    assert!(!store.purge_expired(user).await.unwrap());
    let draft = store.load(user).await.unwrap().expect("commit must win");
    assert_eq!(draft.data.name, "fresh");

    // Once the draft really is expired the purge deletes it
    db.expire_draft(user).await;
    assert!(store.purge_expired(user).await.unwrap());
    assert!(store.load(user).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn test_clear_is_idempotent() {
    let Some(db) = TestDatabase::connect().await else {
        return;
    };
    let store = store_for(&db);
    let user = db.create_user().await;

    store.clear(user).await.unwrap();

    store.commit(user, Snapshot::default()).await.unwrap();
    store.clear(user).await.unwrap();
    assert!(store.load(user).await.unwrap().is_none());

    store.clear(user).await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_commit_backfills_overlay_ids() {
    let Some(db) = TestDatabase::connect().await else {
        return;
    };
    let store = store_for(&db);
    let user = db.create_user().await;

    store
        .commit(
            user,
            snapshot(json!({
                "pages": [{"overlays": [{"kind": "seal"}, {"id": "x"}]}]
            })),
        )
        .await
        .unwrap();

    let draft = store.load(user).await.unwrap().unwrap();
    let overlays = &draft.data.pages[0].overlays;
    assert!(!overlays[0].id.is_empty());
    assert_eq!(overlays[1].id, "x");
    assert_ne!(overlays[0].id, overlays[1].id);
}

#[tokio::test]
#[serial]
async fn test_event_log_appends_and_clears_per_client() {
    let Some(db) = TestDatabase::connect().await else {
        return;
    };
    let log = DraftEventLog::Database(db.pool().clone());
    let user = db.create_user().await;

    let ops = vec![
        json!({"op": "set_name", "name": "doc"}),
        json!({"op": "rotate_page", "page": 0, "landscape": true}),
    ];
    assert_eq!(log.append(user, "tab-a", &ops).await, 2);
    assert_eq!(log.append(user, "tab-b", &ops[..1]).await, 1);

    assert_eq!(db.event_count(user, "tab-a").await, 2);
    assert_eq!(db.event_count(user, "tab-b").await, 1);

    // Commit success clears only the committing client's trail
    log.clear_for_client(user, "tab-a").await;
    assert_eq!(db.event_count(user, "tab-a").await, 0);
    assert_eq!(db.event_count(user, "tab-b").await, 1);
}

#[tokio::test]
#[serial]
async fn test_dispatch_patch_before_first_commit_acks_zero() {
    let Some(db) = TestDatabase::connect().await else {
        return;
    };
    let state = app_state_for(&db);
    let user = db.create_user().await;

    let reply = dispatch(
        &state,
        user,
        "tab-1",
        ClientMessage::Patch {
            ops: vec![json!({"op": "set_name", "name": "early"})],
        },
    )
    .await;
    assert_eq!(reply, ServerMessage::Ack { saved: 0 });

    // Still no draft afterwards
    assert!(state.store.load(user).await.unwrap().is_none());
    // But the operation reached the recovery trail
    assert_eq!(db.event_count(user, "tab-1").await, 1);
}

#[tokio::test]
#[serial]
async fn test_dispatch_commit_then_patch_flow() {
    let Some(db) = TestDatabase::connect().await else {
        return;
    };
    let state = app_state_for(&db);
    let user = db.create_user().await;

    let reply = dispatch(
        &state,
        user,
        "tab-1",
        ClientMessage::Commit {
            snapshot: json!({"name": "doc", "pages": [{}]}),
        },
    )
    .await;
    assert_eq!(reply, ServerMessage::Committed { ok: true });
    assert_eq!(db.event_count(user, "tab-1").await, 0);

    let reply = dispatch(
        &state,
        user,
        "tab-1",
        ClientMessage::Patch {
            ops: vec![json!({"op": "rotate_page", "page": 0, "landscape": true})],
        },
    )
    .await;
    assert_eq!(reply, ServerMessage::Ack { saved: 1 });

    let draft = state.store.load(user).await.unwrap().unwrap();
    assert!(draft.data.pages[0].landscape);

    let reply = dispatch(&state, user, "tab-1", ClientMessage::Ping).await;
    assert_eq!(reply, ServerMessage::Pong);
}

#[tokio::test]
#[serial]
async fn test_dispatch_non_object_commit_stores_empty_snapshot() {
    let Some(db) = TestDatabase::connect().await else {
        return;
    };
    let state = app_state_for(&db);
    let user = db.create_user().await;

    let reply = dispatch(
        &state,
        user,
        "tab-1",
        ClientMessage::Commit {
            snapshot: json!("not an object"),
        },
    )
    .await;
    assert_eq!(reply, ServerMessage::Committed { ok: true });

    let draft = state.store.load(user).await.unwrap().unwrap();
    assert_eq!(draft.data, Snapshot::default());
}

#[tokio::test]
#[serial]
async fn test_resolve_user_token_paths() {
    let Some(db) = TestDatabase::connect().await else {
        return;
    };
    let user = db.create_user().await;

    let token =
        draftsync::backend::auth::sessions::create_token(user, "t@example.com".to_string())
            .unwrap();
    let resolved = draftsync::backend::auth::resolve_user(db.pool(), &token).await;
    assert_eq!(resolved.map(|u| u.id), Some(user));

    // Unknown user id collapses to anonymous, same as a garbage token
    let ghost = draftsync::backend::auth::sessions::create_token(
        Uuid::new_v4(),
        "ghost@example.com".to_string(),
    )
    .unwrap();
    assert!(draftsync::backend::auth::resolve_user(db.pool(), &ghost)
        .await
        .is_none());
    assert!(
        draftsync::backend::auth::resolve_user(db.pool(), "not-a-token")
            .await
            .is_none()
    );
}
