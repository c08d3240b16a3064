mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use rsvp_backend::domain::models::role::RoleName;
use serde_json::json;

/// One event with three invited guests in different states.
async fn seeded_event(app: &TestApp, host: &str) -> String {
    let event_id = app.create_event(host, json!({ "allow_plus_ones": true, "max_plus_ones": 2 })).await;
    app.post(&format!("/api/events/{}/venues", event_id), host, json!({ "name": "Hall", "capacity": 10, "is_primary": true })).await;

    let (_, ada) = app.post("/api/guests", host, json!({
        "first_name": "Ada", "last_name": "Lovelace", "is_vip": true, "age_group": "adult",
    })).await;
    let (_, bea) = app.post("/api/guests", host, json!({
        "first_name": "Bea", "last_name": "Child", "age_group": "child",
    })).await;
    let (_, cal) = app.post("/api/guests", host, json!({ "first_name": "Cal", "last_name": "Quiet" })).await;
    let ids: Vec<String> = [ada, bea, cal].iter().map(|g| g["id"].as_str().unwrap().to_string()).collect();
    for id in &ids {
        app.invite(host, &event_id, id).await;
    }

    let ada_token = app.rsvp_token(&event_id, &ids[0]).await;
    let (status, _) = app.request(Method::POST, &format!("/api/rsvp/{}", ada_token), None, Some(json!({
        "status": "attending",
        "guests_count": 2,
        "dietary_requirements": "vegan",
        "plus_ones": [{ "first_name": "Charles" }],
    }))).await;
    assert_eq!(status, StatusCode::OK);

    let bea_token = app.rsvp_token(&event_id, &ids[1]).await;
    app.request(Method::POST, &format!("/api/rsvp/{}", bea_token), None, Some(json!({ "status": "not_attending" }))).await;

    let ada_uri = format!("/api/events/{}/guests/{}", event_id, ids[0]);
    app.post(&format!("{}/confirm", ada_uri), host, json!({})).await;
    app.post(&format!("{}/check-in", ada_uri), host, json!({})).await;

    let (_, group) = app.post(&format!("/api/events/{}/groups", event_id), host, json!({ "name": "Family" })).await;
    app.post(
        &format!("/api/events/{}/groups/{}/members", event_id, group["id"].as_str().unwrap()),
        host,
        json!({ "guest_id": ids[0] }),
    ).await;

    event_id
}

#[tokio::test]
async fn test_event_report() {
    let app = TestApp::new().await;
    let host = app.token_for("host", &[RoleName::EventHost]).await;
    let event_id = seeded_event(&app, &host).await;

    let (status, report) = app.get(&format!("/api/events/{}/report", event_id), &host).await;
    assert_eq!(status, StatusCode::OK, "{}", report);

    assert_eq!(report["invitations"], json!({
        "total_invited": 3,
        "invitations_sent": 0,
        "confirmed": 1,
        "checked_in": 1,
        "checked_out": 0,
        "vip_invited": 1,
    }));
    assert_eq!(report["rsvps"], json!({
        "pending": 1,
        "attending": 1,
        "not_attending": 1,
        "maybe": 0,
        "total": 3,
        "responded": 2,
    }));
    assert_eq!(report["response_rate"], 66.67);
    assert_eq!(report["attendance_rate"], 100.0);
    assert_eq!(report["confirmation_rate"], 33.33);
    assert_eq!(report["expected_headcount"], 3);
    assert_eq!(report["plus_ones"], 1);
    assert_eq!(report["vip_attending"], 1);
    assert_eq!(report["age_groups"], json!([
        { "label": "adult", "count": 1 },
        { "label": "child", "count": 1 },
        { "label": "unspecified", "count": 1 },
    ]));
    assert_eq!(report["dietary"], json!([{ "label": "vegan", "count": 1 }]));
    assert_eq!(report["groups"][0]["name"], "Family");
    assert_eq!(report["groups"][0]["members"], 1);
    assert_eq!(report["groups"][0]["attending"], 1);
    assert_eq!(report["venues"][0]["name"], "Hall");
    assert_eq!(report["venues"][0]["utilization"], 30.0);
}

#[tokio::test]
async fn test_empty_event_report_has_zero_rates() {
    let app = TestApp::new().await;
    let host = app.token_for("host", &[RoleName::EventHost]).await;
    let event_id = app.create_event(&host, json!({})).await;

    let (status, report) = app.get(&format!("/api/events/{}/report", event_id), &host).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["response_rate"], 0.0);
    assert_eq!(report["attendance_rate"], 0.0);
    assert_eq!(report["expected_headcount"], 0);
    assert!(report["venues"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_report_access() {
    let app = TestApp::new().await;
    let host = app.token_for("host", &[RoleName::EventHost]).await;
    let vendor = app.token_for("caterer", &[RoleName::Vendor]).await;
    let door = app.token_for("door", &[RoleName::Hospitality]).await;
    let event_id = app.create_event(&host, json!({})).await;
    let private_id = app.create_event(&host, json!({ "is_private": true })).await;

    let (status, _) = app.get(&format!("/api/events/{}/report", event_id), &vendor).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get(&format!("/api/events/{}/report", event_id), &door).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&format!("/api/events/{}/report", private_id), &door).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dashboard_is_scoped_to_owner() {
    let app = TestApp::new().await;
    let host = app.token_for("host", &[RoleName::EventHost]).await;
    let rival = app.token_for("rival", &[RoleName::EventHost]).await;
    let manager = app.token_for("manager", &[RoleName::EventManager]).await;

    let event_id = seeded_event(&app, &host).await;
    app.post(&format!("/api/events/{}/status", event_id), &host, json!({ "status": "published" })).await;
    app.create_event(&rival, json!({ "name": "Rival Draft" })).await;
    app.create_guest(&rival, "Uninvited", "Person", None).await;

    let (status, dashboard) = app.get("/api/dashboard", &host).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["events"], json!({ "draft": 0, "published": 1, "cancelled": 0, "completed": 0, "total": 1 }));
    assert_eq!(dashboard["total_guests"], 3);
    assert_eq!(dashboard["rsvps"]["attending"], 1);
    assert_eq!(dashboard["response_rate"], 66.67);
    let upcoming = dashboard["upcoming_events"].as_array().unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0]["id"], event_id.as_str());
    assert_eq!(upcoming[0]["attending"], 1);
    assert!(dashboard["deliveries"].as_array().unwrap().is_empty());

    let (_, dashboard) = app.get("/api/dashboard", &manager).await;
    assert_eq!(dashboard["events"]["total"], 2);
    assert_eq!(dashboard["events"]["draft"], 1);
    assert_eq!(dashboard["total_guests"], 4);

    let (_, dashboard) = app.get("/api/dashboard", &rival).await;
    assert_eq!(dashboard["events"]["total"], 1);
    assert_eq!(dashboard["total_guests"], 0);
    assert!(dashboard["upcoming_events"].as_array().unwrap().is_empty());
}
