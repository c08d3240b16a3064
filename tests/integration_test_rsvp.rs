mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::TestApp;
use rsvp_backend::domain::models::role::RoleName;
use serde_json::{json, Value};

async fn public_get(app: &TestApp, token: &str) -> (StatusCode, Value) {
    app.request(Method::GET, &format!("/api/rsvp/{}", token), None, None).await
}

async fn public_answer(app: &TestApp, token: &str, answer: Value) -> (StatusCode, Value) {
    app.request(Method::POST, &format!("/api/rsvp/{}", token), None, Some(answer)).await
}

/// Host, event, invited guest and the guest's RSVP token.
async fn invited(app: &TestApp, event: Value) -> (String, String, String, String) {
    let host = app.token_for("host", &[RoleName::EventHost]).await;
    let event_id = app.create_event(&host, event).await;
    let guest_id = app.create_guest(&host, "Ada", "Lovelace", Some("ada@example.com")).await;
    app.invite(&host, &event_id, &guest_id).await;
    let token = app.rsvp_token(&event_id, &guest_id).await;
    (host, event_id, guest_id, token)
}

#[tokio::test]
async fn test_public_view_hides_organizer_fields() {
    let app = TestApp::new().await;
    let (host, event_id, _, token) = invited(&app, json!({ "name": "Wedding", "allow_plus_ones": true, "max_plus_ones": 1 })).await;
    app.post(&format!("/api/events/{}/venues", event_id), &host, json!({ "name": "Chapel", "is_primary": true })).await;

    let (status, body) = public_get(&app, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["guest_first_name"], "Ada");
    assert_eq!(body["event"]["name"], "Wedding");
    assert_eq!(body["event"]["max_plus_ones"], 1);
    assert!(body["event"].get("created_by").is_none());
    assert!(body["event"].get("id").is_none());
    assert_eq!(body["venue"]["name"], "Chapel");
    assert_eq!(body["rsvp"]["status"], "pending");
    assert_eq!(body["open"], true);

    let (status, _) = public_get(&app, "no-such-token").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = public_answer(&app, "no-such-token", json!({ "status": "attending" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_answer_rules_and_plus_ones() {
    let app = TestApp::new().await;
    let (_, _, _, token) = invited(&app, json!({ "allow_plus_ones": true, "max_plus_ones": 1 })).await;

    let (status, _) = public_answer(&app, &token, json!({ "status": "pending" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = public_answer(&app, &token, json!({ "status": "attending", "guests_count": 0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = public_answer(&app, &token, json!({
        "status": "attending",
        "plus_ones": [{ "first_name": "Charles" }, { "first_name": "Mary" }],
    })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "At most 1 plus-ones are allowed");

    let (status, body) = public_answer(&app, &token, json!({
        "status": "attending",
        "guests_count": 2,
        "dietary_requirements": "vegetarian",
        "plus_ones": [{ "first_name": "Charles", "last_name": "Babbage", "age_group": "adult" }],
    })).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "attending");
    assert_eq!(body["guests_count"], 2);
    assert!(body["responded_at"].is_string());
    assert_eq!(body["plus_ones"].as_array().unwrap().len(), 1);
    assert_eq!(body["plus_ones"][0]["first_name"], "Charles");

    // Declining drops the companions.
    let (status, body) = public_answer(&app, &token, json!({ "status": "not_attending" })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["plus_ones"].as_array().unwrap().is_empty());

    let (_, view) = public_get(&app, &token).await;
    assert_eq!(view["rsvp"]["status"], "not_attending");
    assert!(view["rsvp"]["plus_ones"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_plus_ones_rejected_when_not_allowed() {
    let app = TestApp::new().await;
    let (_, _, _, token) = invited(&app, json!({})).await;

    let (status, body) = public_answer(&app, &token, json!({
        "status": "attending",
        "plus_ones": [{ "first_name": "Charles" }],
    })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "This event does not allow plus-ones");
}

#[tokio::test]
async fn test_deadline_closes_public_answers_but_not_staff_edits() {
    let app = TestApp::new().await;
    let deadline = Utc::now() - Duration::hours(1);
    let (host, _, _, token) = invited(&app, json!({ "rsvp_deadline": deadline.to_rfc3339() })).await;

    let (_, view) = public_get(&app, &token).await;
    assert_eq!(view["open"], false);

    let (status, body) = public_answer(&app, &token, json!({ "status": "attending" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "RSVP is closed for this event");

    let rsvp_id = view["rsvp"]["id"].as_str().unwrap().to_string();
    let (status, body) = app.put(&format!("/api/rsvps/{}", rsvp_id), &host, json!({
        "status": "attending",
        "message": "Phoned in",
    })).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "attending");
    assert!(body["responded_at"].is_string());

    let (status, body) = app.put(&format!("/api/rsvps/{}", rsvp_id), &host, json!({ "status": "pending" })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["responded_at"].is_null());
}

#[tokio::test]
async fn test_cancelled_event_closes_rsvp() {
    let app = TestApp::new().await;
    let (host, event_id, _, token) = invited(&app, json!({})).await;

    let (status, _) = app.post(&format!("/api/events/{}/status", event_id), &host, json!({ "status": "cancelled" })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = public_answer(&app, &token, json!({ "status": "maybe" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_public_answer_is_audited_without_actor() {
    let app = TestApp::new().await;
    let admin = app.token_for("root", &[RoleName::Admin]).await;
    let (_, _, _, token) = invited(&app, json!({})).await;

    let (status, answered) = public_answer(&app, &token, json!({ "status": "maybe", "message": "Trying to make it" })).await;
    assert_eq!(status, StatusCode::OK);
    let rsvp_id = answered["id"].as_str().unwrap();

    let (status, logs) = app.get(&format!("/api/logs?entity_type=rsvp&entity_id={}", rsvp_id), &admin).await;
    assert_eq!(status, StatusCode::OK);
    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["action"], "update");
    assert!(logs[0]["user_id"].is_null());
    assert_eq!(logs[0]["old_values"]["status"], "pending");
    assert_eq!(logs[0]["new_values"]["status"], "maybe");
}

#[tokio::test]
async fn test_staff_rsvp_management() {
    let app = TestApp::new().await;
    let (host, event_id, guest_id, _) = invited(&app, json!({})).await;
    let rsvps_uri = format!("/api/events/{}/rsvps", event_id);

    let (status, _) = app.post(&rsvps_uri, &host, json!({ "guest_id": guest_id })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let stranger = app.create_guest(&host, "Alan", "Turing", None).await;
    let (status, _) = app.post(&rsvps_uri, &host, json!({ "guest_id": stranger })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, list) = app.get(&rsvps_uri, &host).await;
    let rsvp_id = list[0]["id"].as_str().unwrap().to_string();

    let (status, _) = app.put(&format!("/api/rsvps/{}", rsvp_id), &host, json!({ "guests_count": -1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.delete(&format!("/api/rsvps/{}", rsvp_id), &host).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.post(&rsvps_uri, &host, json!({ "guest_id": guest_id })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
}
