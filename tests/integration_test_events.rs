mod common;

use axum::http::StatusCode;
use common::TestApp;
use rsvp_backend::domain::models::role::RoleName;
use serde_json::json;

#[tokio::test]
async fn test_event_crud_defaults() {
    let app = TestApp::new().await;
    let host = app.token_for("host", &[RoleName::EventHost]).await;

    let (status, body) = app.post("/api/events", &host, json!({
        "name": "  Launch  ",
        "start_date": "2030-05-01T18:00:00Z",
        "end_date": "2030-05-01T22:00:00Z",
    })).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["name"], "Launch");
    assert_eq!(body["status"], "draft");
    assert_eq!(body["event_type"], "other");
    assert_eq!(body["timezone"], "UTC");
    assert_eq!(body["is_private"], false);
    assert_eq!(body["max_plus_ones"], 0);
    let id = body["id"].as_str().unwrap().to_string();

    let (status, body) = app.put(&format!("/api/events/{}", id), &host, json!({
        "description": "Product launch",
        "allow_plus_ones": true,
        "max_plus_ones": 2,
    })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "Product launch");
    assert_eq!(body["max_plus_ones"], 2);

    let (status, body) = app.get(&format!("/api/events/{}", id), &host).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Launch");
    assert_eq!(body["venues"], json!([]));

    let (status, _) = app.delete(&format!("/api/events/{}", id), &host).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&format!("/api/events/{}", id), &host).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_event_validation() {
    let app = TestApp::new().await;
    let host = app.token_for("host", &[RoleName::EventHost]).await;

    let cases = [
        json!({ "name": " ", "start_date": "2030-05-01T18:00:00Z", "end_date": "2030-05-01T22:00:00Z" }),
        json!({ "name": "Backwards", "start_date": "2030-05-02T18:00:00Z", "end_date": "2030-05-01T22:00:00Z" }),
        json!({ "name": "Bad zone", "start_date": "2030-05-01T18:00:00Z", "end_date": "2030-05-01T22:00:00Z", "timezone": "Mars/Olympus" }),
        json!({ "name": "Late deadline", "start_date": "2030-05-01T18:00:00Z", "end_date": "2030-05-01T22:00:00Z", "rsvp_deadline": "2030-05-02T00:00:00Z" }),
        json!({ "name": "Negative", "start_date": "2030-05-01T18:00:00Z", "end_date": "2030-05-01T22:00:00Z", "max_plus_ones": -1 }),
        json!({ "name": "No rule", "start_date": "2030-05-01T18:00:00Z", "end_date": "2030-05-01T22:00:00Z", "is_recurring": true }),
        json!({ "name": "Zero interval", "start_date": "2030-05-01T18:00:00Z", "end_date": "2030-05-01T22:00:00Z", "is_recurring": true,
                "recurrence_rule": { "frequency": "weekly", "interval": 0 } }),
    ];
    for payload in cases {
        let (status, body) = app.post("/api/events", &host, payload.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {} answered {}", payload, body);
    }

    let (status, body) = app.post("/api/events", &host, json!({
        "name": "Weekly standup",
        "start_date": "2030-05-01T09:00:00Z",
        "end_date": "2030-05-01T09:15:00Z",
        "is_recurring": true,
        "recurrence_rule": { "frequency": "weekly" },
    })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["recurrence_rule"]["frequency"], "weekly");
    assert_eq!(body["recurrence_rule"]["interval"], 1);

    // A rule without recurrence is dropped.
    let (status, body) = app.post("/api/events", &host, json!({
        "name": "One-off",
        "start_date": "2030-05-01T09:00:00Z",
        "end_date": "2030-05-01T10:00:00Z",
        "recurrence_rule": { "frequency": "daily" },
    })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["recurrence_rule"].is_null());
}

#[tokio::test]
async fn test_rsvp_deadline_can_be_cleared() {
    let app = TestApp::new().await;
    let host = app.token_for("host", &[RoleName::EventHost]).await;
    let event_id = app.create_event(&host, json!({
        "start_date": "2030-05-01T18:00:00Z",
        "end_date": "2030-05-01T22:00:00Z",
        "rsvp_deadline": "2030-04-20T00:00:00Z",
    })).await;
    let uri = format!("/api/events/{}", event_id);

    // Leaving the field out keeps the deadline.
    let (status, body) = app.put(&uri, &host, json!({ "name": "Renamed" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rsvp_deadline"], "2030-04-20T00:00:00Z");

    let (status, body) = app.put(&uri, &host, json!({ "rsvp_deadline": null })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["rsvp_deadline"].is_null());

    let (_, body) = app.get(&uri, &host).await;
    assert!(body["rsvp_deadline"].is_null());
    assert_eq!(body["name"], "Renamed");
}

#[tokio::test]
async fn test_status_transitions() {
    let app = TestApp::new().await;
    let host = app.token_for("host", &[RoleName::EventHost]).await;
    let id = app.create_event(&host, json!({})).await;
    let status_uri = format!("/api/events/{}/status", id);

    let (status, _) = app.post(&status_uri, &host, json!({ "status": "completed" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.post(&status_uri, &host, json!({ "status": "published" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "published");

    let (status, _) = app.post(&status_uri, &host, json!({ "status": "draft" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.post(&status_uri, &host, json!({ "status": "cancelled" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    // Terminal events are frozen.
    let (status, body) = app.put(&format!("/api/events/{}", id), &host, json!({ "name": "Renamed" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Cannot edit a cancelled event");
    let (status, _) = app.post(&status_uri, &host, json!({ "status": "published" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_event_visibility_and_ownership() {
    let app = TestApp::new().await;
    let owner = app.token_for("owner", &[RoleName::EventHost]).await;
    let other = app.token_for("other", &[RoleName::EventHost]).await;
    let manager = app.token_for("manager", &[RoleName::EventManager]).await;
    let door = app.token_for("door", &[RoleName::Hospitality]).await;
    let guest = app.token_for("visitor", &[RoleName::Guest]).await;

    let public_id = app.create_event(&owner, json!({ "name": "Open Day" })).await;
    let private_id = app.create_event(&owner, json!({ "name": "Secret Dinner", "is_private": true })).await;
    app.create_event(&other, json!({ "name": "Other Party" })).await;

    let event_names = |list: &serde_json::Value| -> Vec<String> {
        let mut names: Vec<String> = list.as_array().unwrap().iter().filter_map(|e| e["name"].as_str().map(str::to_string)).collect();
        names.sort();
        names
    };

    // Hosts only see what they created.
    let (_, list) = app.get("/api/events", &owner).await;
    assert_eq!(event_names(&list), vec!["Open Day", "Secret Dinner"]);
    let (_, list) = app.get("/api/events", &other).await;
    assert_eq!(event_names(&list), vec!["Other Party"]);

    let (_, list) = app.get("/api/events", &manager).await;
    assert_eq!(list.as_array().unwrap().len(), 3);

    // Front desk staff read every shared event.
    let (_, list) = app.get("/api/events", &door).await;
    assert_eq!(event_names(&list), vec!["Open Day", "Other Party"]);

    let (_, list) = app.get("/api/events", &guest).await;
    assert!(list.as_array().unwrap().is_empty());

    // Another host's events look missing, public or not.
    let (status, _) = app.get(&format!("/api/events/{}", public_id), &other).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get(&format!("/api/events/{}", private_id), &other).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.put(&format!("/api/events/{}", public_id), &other, json!({ "name": "Hijacked" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get(&format!("/api/events/{}", private_id), &manager).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&format!("/api/events/{}", private_id), &door).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Visible but not theirs to change.
    let (status, _) = app.get(&format!("/api/events/{}", public_id), &door).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.put(&format!("/api/events/{}", public_id), &door, json!({ "name": "Hijacked" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(&format!("/api/events/{}", public_id), &door).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.put(&format!("/api/events/{}", public_id), &manager, json!({ "name": "Open House" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Open House");
}

#[tokio::test]
async fn test_single_primary_venue() {
    let app = TestApp::new().await;
    let host = app.token_for("host", &[RoleName::EventHost]).await;
    let id = app.create_event(&host, json!({})).await;
    let venues_uri = format!("/api/events/{}/venues", id);

    let (status, hall) = app.post(&venues_uri, &host, json!({
        "name": "Main Hall",
        "city": "Berlin",
        "capacity": 120,
        "is_primary": true,
    })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(hall["is_primary"], true);

    let (status, garden) = app.post(&venues_uri, &host, json!({
        "name": "Garden",
        "capacity": 40,
        "is_primary": true,
    })).await;
    assert_eq!(status, StatusCode::CREATED);
    let garden_id = garden["id"].as_str().unwrap().to_string();

    let (_, venues) = app.get(&venues_uri, &host).await;
    let venues = venues.as_array().unwrap();
    assert_eq!(venues.len(), 2);
    let primaries: Vec<&str> = venues.iter()
        .filter(|v| v["is_primary"] == true)
        .filter_map(|v| v["name"].as_str())
        .collect();
    assert_eq!(primaries, vec!["Garden"]);

    for payload in [json!({ "name": "Moon", "latitude": 95.0 }), json!({ "name": "Tiny", "capacity": -5 }), json!({ "name": "" })] {
        let (status, _) = app.post(&venues_uri, &host, payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = app.delete(&format!("{}/{}", venues_uri, garden_id), &host).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.delete(&format!("{}/{}", venues_uri, garden_id), &host).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_event_cascades() {
    let app = TestApp::new().await;
    let host = app.token_for("host", &[RoleName::EventHost]).await;
    let id = app.create_event(&host, json!({})).await;
    let guest_id = app.create_guest(&host, "Ada", "Lovelace", Some("ada@example.com")).await;
    app.invite(&host, &id, &guest_id).await;
    let rsvp_token = app.rsvp_token(&id, &guest_id).await;

    let (status, _) = app.delete(&format!("/api/events/{}", id), &host).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.request(axum::http::Method::GET, &format!("/api/rsvp/{}", rsvp_token), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The guest record itself survives.
    let (status, _) = app.get(&format!("/api/guests/{}", guest_id), &host).await;
    assert_eq!(status, StatusCode::OK);
}
