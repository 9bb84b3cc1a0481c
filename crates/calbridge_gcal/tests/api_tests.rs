
use axum::body::Body;
use axum::http::{Request, StatusCode};
use calbridge_common::services::CalendarGateway;
use calbridge_gcal::{RetrySweeper, SweeperSettings};
use fixtures::{create_test_app, send, send_json};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn settings() -> SweeperSettings {
    SweeperSettings {
        interval: Duration::from_secs(60),
        max_attempts: 5,
    }
}

#[tokio::test]
async fn test_outage_then_recovery_delivers_queued_event() {
    let app = create_test_app();
    app.gateway.set_down(true);

    let (status, body) = send_json(
        &app.router,
        "POST",
        "/create-event",
        json!({
            "summary": "Quarterly planning",
            "startDateTime": "2025-03-03T09:00:00",
            "endDateTime": "2025-03-03T10:30:00",
            "attendees": ["ana@example.com"],
            "reminders": { "useDefault": true }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["queuePosition"], 1);

    let sweeper = RetrySweeper::new(
        app.queue.clone(),
        app.gateway.clone() as Arc<dyn CalendarGateway>,
        settings(),
    );
    assert_eq!(sweeper.sweep_once().await.retried, 1);

    app.gateway.set_down(false);
    assert_eq!(sweeper.sweep_once().await.delivered, 1);
    assert!(app.queue.is_empty());

    let created = app.gateway.created();
    assert_eq!(created.len(), 1);
    let (calendar, draft) = &created[0];
    assert_eq!(calendar, "team@example.com");
    assert_eq!(draft.time_zone, "Europe/Zurich");
    assert!(draft.attendees.is_empty());
    assert_eq!(draft.reminders, Some(json!({ "useDefault": true })));
    // 09:00 in Zurich in March is 08:00 UTC
    assert_eq!(draft.start.to_rfc3339(), "2025-03-03T08:00:00+00:00");
}

#[tokio::test]
async fn test_sync_scenario_through_the_api() {
    let app = create_test_app();
    app.gateway.set_down(true);

    let (_, body) = send_json(
        &app.router,
        "POST",
        "/create-event",
        json!({
            "summary": "Sync",
            "startDateTime": "2025-01-01T10:00:00Z",
            "endDateTime": "2025-01-01T11:00:00Z"
        }),
    )
    .await;
    let queued_id = body["eventId"].as_str().unwrap().to_string();
    assert_eq!(app.queue.get(&queued_id).unwrap().attempts, 0);
    assert_eq!(app.gateway.create_calls(), 1);

    let sweeper = RetrySweeper::new(
        app.queue.clone(),
        app.gateway.clone() as Arc<dyn CalendarGateway>,
        settings(),
    );
    for _ in 0..5 {
        sweeper.sweep_once().await;
    }
    assert!(app.queue.get(&queued_id).is_none());
    assert_eq!(app.gateway.create_calls(), 6);

    sweeper.sweep_once().await;
    assert_eq!(app.gateway.create_calls(), 6);

    let request = Request::builder()
        .uri("/status")
        .body(Body::empty())
        .unwrap();
    let (_, status) = send(&app.router, request).await;
    assert_eq!(status["pendingEvents"], 0);
    assert_eq!(status["environment"], "test");
    assert_eq!(status["defaultCalendarId"], "team@example.com");
}

#[tokio::test]
async fn test_non_create_paths_have_no_fallback() {
    let app = create_test_app();
    app.gateway.set_down(true);

    let request = Request::builder()
        .uri("/list-calendars")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Backend Error");
    assert_eq!(body["details"]["error"]["code"], 503);
    assert!(app.queue.is_empty());
}

#[tokio::test]
async fn test_delete_already_deleted_upstream_is_success() {
    let app = create_test_app();
    for _ in 0..2 {
        let (status, body) = send_json(
            &app.router,
            "DELETE",
            "/delete-event",
            json!({ "eventId": "long-gone" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }
}
