//! Unit tests for `TaskChannelRegistry`.
//!
//! These tests exercise the registry directly, without performing any HTTP
//! upgrades. They verify replacement semantics, event delivery, close-after
//! behaviour and shutdown.

use axum::extract::ws::Message;
use stylist_api::ws::TaskChannelRegistry;
use stylist_core::error_code::ErrorCode;
use stylist_core::messages::TaskEvent;
use uuid::Uuid;

fn text_of(msg: Message) -> serde_json::Value {
    match msg {
        Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("expected text frame, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Test: register and remove
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_adds_channel() {
    let registry = TaskChannelRegistry::new();
    let task_id = Uuid::new_v4();

    let _rx = registry.register(task_id, Uuid::new_v4()).await;

    assert!(registry.is_registered(task_id).await);
    assert_eq!(registry.connection_count().await, 1);
}

#[tokio::test]
async fn remove_only_drops_matching_connection() {
    let registry = TaskChannelRegistry::new();
    let task_id = Uuid::new_v4();
    let conn_id = Uuid::new_v4();

    let _rx = registry.register(task_id, conn_id).await;

    assert!(!registry.remove(task_id, Uuid::new_v4()).await);
    assert!(registry.is_registered(task_id).await);

    assert!(registry.remove(task_id, conn_id).await);
    assert_eq!(registry.connection_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: a second connection for the same task replaces the first
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_replaces_and_closes_previous_connection() {
    let registry = TaskChannelRegistry::new();
    let task_id = Uuid::new_v4();
    let first = Uuid::new_v4();

    let mut old_rx = registry.register(task_id, first).await;
    let mut new_rx = registry.register(task_id, Uuid::new_v4()).await;

    assert!(matches!(old_rx.recv().await, Some(Message::Close(_))));
    assert_eq!(registry.connection_count().await, 1);

    // Late cleanup of the replaced connection must not drop the new one.
    assert!(!registry.remove(task_id, first).await);

    assert!(registry.notify(task_id, &TaskEvent::processing()).await);
    assert_eq!(text_of(new_rx.recv().await.unwrap())["status"], "PROCESSING");
}

// ---------------------------------------------------------------------------
// Test: delivery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_terminal_event_keeps_channel_open() {
    let registry = TaskChannelRegistry::new();
    let task_id = Uuid::new_v4();
    let mut rx = registry.register(task_id, Uuid::new_v4()).await;

    assert!(registry.notify(task_id, &TaskEvent::processing()).await);

    assert_eq!(text_of(rx.try_recv().unwrap()), serde_json::json!({ "status": "PROCESSING" }));
    assert!(rx.try_recv().is_err());
    assert!(registry.is_registered(task_id).await);
}

#[tokio::test]
async fn terminal_event_is_followed_by_close() {
    let registry = TaskChannelRegistry::new();
    let task_id = Uuid::new_v4();
    let mut rx = registry.register(task_id, Uuid::new_v4()).await;

    assert!(registry.notify(task_id, &TaskEvent::failed(ErrorCode::TransformerError)).await);

    let json = text_of(rx.try_recv().unwrap());
    assert_eq!(json["status"], "FAILED");
    assert_eq!(json["errorCode"], -104);
    assert!(matches!(rx.try_recv(), Ok(Message::Close(_))));
    assert!(!registry.is_registered(task_id).await);

    // Nothing further is delivered once closed.
    assert!(!registry.notify(task_id, &TaskEvent::canceled()).await);
}

#[tokio::test]
async fn push_without_channel_is_noop() {
    let registry = TaskChannelRegistry::new();

    assert!(!registry.notify(Uuid::new_v4(), &TaskEvent::processing()).await);
}

#[tokio::test]
async fn push_to_dropped_receiver_removes_entry() {
    let registry = TaskChannelRegistry::new();
    let task_id = Uuid::new_v4();
    let rx = registry.register(task_id, Uuid::new_v4()).await;
    drop(rx);

    assert!(!registry.notify(task_id, &TaskEvent::processing()).await);
    assert!(!registry.is_registered(task_id).await);
}

// ---------------------------------------------------------------------------
// Test: shutdown and heartbeat
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shutdown_all_closes_every_channel() {
    let registry = TaskChannelRegistry::new();
    let mut rx1 = registry.register(Uuid::new_v4(), Uuid::new_v4()).await;
    let mut rx2 = registry.register(Uuid::new_v4(), Uuid::new_v4()).await;

    registry.shutdown_all().await;

    assert!(matches!(rx1.recv().await, Some(Message::Close(_))));
    assert!(matches!(rx2.recv().await, Some(Message::Close(_))));
    assert_eq!(registry.connection_count().await, 0);
}

#[tokio::test]
async fn ping_all_sends_ping_frames() {
    let registry = TaskChannelRegistry::new();
    let mut rx = registry.register(Uuid::new_v4(), Uuid::new_v4()).await;

    registry.ping_all().await;

    assert!(matches!(rx.recv().await, Some(Message::Ping(_))));
}
