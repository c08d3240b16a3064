mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::TestApp;
use rsvp_backend::background::{dispatch_due_notifications, recover_interrupted_dispatches};
use rsvp_backend::domain::models::role::RoleName;
use serde_json::{json, Value};

async fn template_id(app: &TestApp, token: &str, name: &str) -> String {
    let (_, templates) = app.get("/api/notification-templates", token).await;
    templates.as_array().unwrap()
        .iter()
        .find(|t| t["name"] == name)
        .and_then(|t| t["id"].as_str())
        .unwrap()
        .to_string()
}

async fn create_notification(app: &TestApp, token: &str, payload: Value) -> Value {
    let (status, body) = app.post("/api/notifications", token, payload).await;
    assert_eq!(status, StatusCode::CREATED, "create notification failed: {}", body);
    body
}

#[tokio::test]
async fn test_default_templates_are_seeded() {
    let app = TestApp::new().await;
    let host = app.token_for("host", &[RoleName::EventHost]).await;

    let (status, templates) = app.get("/api/notification-templates", &host).await;
    assert_eq!(status, StatusCode::OK);
    let mut names: Vec<&str> = templates.as_array().unwrap().iter().filter_map(|t| t["name"].as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["invitation", "reminder"]);
}

#[tokio::test]
async fn test_template_management() {
    let app = TestApp::new().await;
    let host = app.token_for("host", &[RoleName::EventHost]).await;
    let manager = app.token_for("manager", &[RoleName::EventManager]).await;

    let payload = json!({
        "name": "thank-you",
        "subject": "Thanks for coming to {{ event_name }}",
        "body": "<p>Dear {{ guest_first_name }}, thank you!</p>",
    });
    let (status, _) = app.post("/api/notification-templates", &host, payload.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = app.post("/api/notification-templates", &manager, payload).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["channel"], "email");
    let id = created["id"].as_str().unwrap().to_string();

    for body in ["{{ event_name", "{{ no_such_variable }}", "   "] {
        let (status, _) = app.put(&format!("/api/notification-templates/{}", id), &manager, json!({ "body": body })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {:?} should be rejected", body);
    }

    let (status, _) = app.post("/api/notification-templates", &manager, json!({
        "name": "thank-you",
        "subject": "Again",
        "body": "Again",
    })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app.delete(&format!("/api/notification-templates/{}", id), &manager).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_invitation_dispatch_sends_calendar_and_marks_invited() {
    let app = TestApp::new().await;
    let host = app.token_for("host", &[RoleName::EventHost]).await;
    let event_id = app.create_event(&host, json!({ "name": "Garden Party" })).await;
    let ada = app.create_guest(&host, "Ada", "Lovelace", Some("ada@example.com")).await;
    let no_mail = app.create_guest(&host, "Alan", "Turing", None).await;
    app.invite(&host, &event_id, &ada).await;
    app.invite(&host, &event_id, &no_mail).await;
    let rsvp_token = app.rsvp_token(&event_id, &ada).await;
    let invitation = template_id(&app, &host, "invitation").await;

    let created = create_notification(&app, &host, json!({
        "event_id": event_id,
        "template_id": invitation,
    })).await;
    assert_eq!(created["status"], "draft");
    assert_eq!(created["subject"], "Invitation: {{ event_name }}");
    // Guests without an email address are left out.
    let recipients = created["recipients"].as_array().unwrap();
    assert_eq!(recipients.len(), 1);
    assert_eq!(recipients[0]["address"], "ada@example.com");
    let id = created["id"].as_str().unwrap().to_string();

    // Drafts are not picked up.
    assert_eq!(dispatch_due_notifications(&app.state).await.unwrap(), 0);

    let (status, scheduled) = app.post(&format!("/api/notifications/{}/send", id), &host, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(scheduled["status"], "scheduled");

    assert_eq!(dispatch_due_notifications(&app.state).await.unwrap(), 1);

    let (_, detail) = app.get(&format!("/api/notifications/{}", id), &host).await;
    assert_eq!(detail["status"], "sent");
    assert!(detail["sent_at"].is_string());
    assert_eq!(detail["recipients"][0]["status"], "sent");

    let sent = app.mail.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ada@example.com");
    assert_eq!(sent[0].subject, "Invitation: Garden Party");
    assert!(sent[0].body.contains(&format!("http://frontend.test/rsvp/{}", rsvp_token)));
    assert_eq!(sent[0].attachment_name.as_deref(), Some("invite.ics"));
    let ics = String::from_utf8(sent[0].attachment.clone().unwrap()).unwrap();
    assert!(ics.contains("BEGIN:VCALENDAR"));
    assert!(ics.contains("Garden Party"));

    let (_, guests) = app.get(&format!("/api/events/{}/guests", event_id), &host).await;
    let ada_row = guests.as_array().unwrap().iter().find(|g| g["guest_id"] == ada.as_str()).unwrap();
    assert_eq!(ada_row["invitation_sent"], true);
    let alan_row = guests.as_array().unwrap().iter().find(|g| g["guest_id"] == no_mail.as_str()).unwrap();
    assert_eq!(alan_row["invitation_sent"], false);

    let (status, body) = app.post(&format!("/api/notifications/{}/send", id), &host, json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Notification was already sent");
}

#[tokio::test]
async fn test_unconfigured_channel_fails_recipients() {
    let app = TestApp::new().await;
    let host = app.token_for("host", &[RoleName::EventHost]).await;
    let (_, guest) = app.post("/api/guests", &host, json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "phone": "+49 30 1234567",
    })).await;
    let guest_id = guest["id"].as_str().unwrap();

    let created = create_notification(&app, &host, json!({
        "channel": "sms",
        "subject": "Hello",
        "body": "Hi {{ guest_first_name }}",
        "guest_ids": [guest_id],
    })).await;
    assert_eq!(created["recipients"][0]["address"], "+49 30 1234567");
    let id = created["id"].as_str().unwrap().to_string();

    app.post(&format!("/api/notifications/{}/send", id), &host, json!({})).await;
    dispatch_due_notifications(&app.state).await.unwrap();

    let (_, detail) = app.get(&format!("/api/notifications/{}", id), &host).await;
    assert_eq!(detail["status"], "failed");
    assert_eq!(detail["recipients"][0]["status"], "failed");
    assert_eq!(detail["recipients"][0]["error_message"], "sms channel not configured");
    assert!(app.mail.sent().is_empty());
}

#[tokio::test]
async fn test_failed_notification_can_be_retried() {
    let app = TestApp::new().await;
    let host = app.token_for("host", &[RoleName::EventHost]).await;
    let guest_id = app.create_guest(&host, "Ada", "Lovelace", Some("ada@example.com")).await;
    app.mail.reject.lock().unwrap().push("ada@example.com".to_string());

    let created = create_notification(&app, &host, json!({
        "subject": "Save the date",
        "body": "See you soon, {{ guest_name }}",
        "guest_ids": [guest_id],
    })).await;
    let id = created["id"].as_str().unwrap().to_string();
    let send_uri = format!("/api/notifications/{}/send", id);

    app.post(&send_uri, &host, json!({})).await;
    dispatch_due_notifications(&app.state).await.unwrap();
    let (_, detail) = app.get(&format!("/api/notifications/{}", id), &host).await;
    assert_eq!(detail["status"], "failed");
    assert!(detail["recipients"][0]["error_message"].as_str().unwrap().contains("unavailable"));

    app.mail.reject.lock().unwrap().clear();
    let (status, body) = app.post(&send_uri, &host, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "scheduled");
    dispatch_due_notifications(&app.state).await.unwrap();

    let (_, detail) = app.get(&format!("/api/notifications/{}", id), &host).await;
    assert_eq!(detail["status"], "sent");
    assert_eq!(detail["recipients"][0]["status"], "sent");
    assert!(detail["recipients"][0]["error_message"].is_null());

    let sent = app.mail.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body, "See you soon, Ada Lovelace");
}

#[tokio::test]
async fn test_scheduled_notification_waits() {
    let app = TestApp::new().await;
    let host = app.token_for("host", &[RoleName::EventHost]).await;
    let guest_id = app.create_guest(&host, "Ada", "Lovelace", Some("ada@example.com")).await;

    let created = create_notification(&app, &host, json!({
        "subject": "Later",
        "body": "Later",
        "guest_ids": [guest_id],
    })).await;
    let id = created["id"].as_str().unwrap().to_string();

    let at = (Utc::now() + Duration::days(1)).format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let (status, body) = app.post(&format!("/api/notifications/{}/send?scheduled_at={}", id, at), &host, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "scheduled");

    assert_eq!(dispatch_due_notifications(&app.state).await.unwrap(), 0);
    assert!(app.mail.sent().is_empty());

    // Still editable until it goes out.
    let (status, _) = app.delete(&format!("/api/notifications/{}", id), &host).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_recipient_delivery_receipts() {
    let app = TestApp::new().await;
    let host = app.token_for("host", &[RoleName::EventHost]).await;
    let guest_id = app.create_guest(&host, "Ada", "Lovelace", Some("ada@example.com")).await;

    let created = create_notification(&app, &host, json!({
        "subject": "Hi",
        "body": "Hi",
        "guest_ids": [guest_id],
    })).await;
    let id = created["id"].as_str().unwrap().to_string();
    let recipient_id = created["recipients"][0]["id"].as_str().unwrap().to_string();
    let status_uri = format!("/api/notifications/{}/recipients/{}/status", id, recipient_id);

    // Cannot skip ahead of the dispatcher.
    let (status, _) = app.post(&status_uri, &host, json!({ "status": "delivered" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.post(&format!("/api/notifications/{}/send", id), &host, json!({})).await;
    dispatch_due_notifications(&app.state).await.unwrap();

    let (status, body) = app.post(&status_uri, &host, json!({ "status": "delivered" })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["delivered_at"].is_string());

    let (status, body) = app.post(&status_uri, &host, json!({ "status": "read" })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["read_at"].is_string());

    let (status, _) = app.post(&status_uri, &host, json!({ "status": "sent" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post(&format!("/api/notifications/{}/recipients/unknown/status", id), &host, json!({ "status": "read" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_notification_creation_rules_and_visibility() {
    let app = TestApp::new().await;
    let owner = app.token_for("owner", &[RoleName::EventHost]).await;
    let other = app.token_for("other", &[RoleName::EventHost]).await;
    let manager = app.token_for("manager", &[RoleName::EventManager]).await;
    let door = app.token_for("door", &[RoleName::Hospitality]).await;
    let event_id = app.create_event(&owner, json!({})).await;
    let offline = app.create_guest(&owner, "Alan", "Turing", None).await;
    let ada = app.create_guest(&owner, "Ada", "Lovelace", Some("ada@example.com")).await;

    let (status, body) = app.post("/api/notifications", &owner, json!({
        "subject": "Hi",
        "body": "Hi",
        "guest_ids": [offline],
    })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No recipients with an address for the email channel");

    let (status, _) = app.post("/api/notifications", &owner, json!({ "subject": "Hi", "body": "Hi" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post("/api/notifications", &owner, json!({ "body": "No subject", "guest_ids": [ada] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post("/api/notifications", &door, json!({ "subject": "Hi", "body": "Hi", "guest_ids": [ada] })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Another host's event is out of reach.
    let (status, _) = app.post("/api/notifications", &other, json!({ "event_id": event_id, "subject": "Hi", "body": "Hi" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let created = create_notification(&app, &owner, json!({ "subject": "Hi", "body": "Hi", "guest_ids": [ada] })).await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _) = app.get(&format!("/api/notifications/{}", id), &other).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, list) = app.get("/api/notifications", &other).await;
    assert!(list.as_array().unwrap().is_empty());

    let (status, _) = app.get(&format!("/api/notifications/{}", id), &manager).await;
    assert_eq!(status, StatusCode::OK);
    let (_, list) = app.get("/api/notifications", &owner).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

fn recipient<'a>(detail: &'a Value, address: &str) -> &'a Value {
    detail["recipients"].as_array().unwrap()
        .iter()
        .find(|r| r["address"] == address)
        .unwrap()
}

#[tokio::test]
async fn test_interrupted_dispatch_is_requeued_on_start() {
    let app = TestApp::new().await;
    let host = app.token_for("host", &[RoleName::EventHost]).await;
    let ada = app.create_guest(&host, "Ada", "Lovelace", Some("ada@example.com")).await;
    let bob = app.create_guest(&host, "Bob", "Builder", Some("bob@example.com")).await;

    let created = create_notification(&app, &host, json!({
        "subject": "Hi",
        "body": "Hi {{ guest_first_name }}",
        "guest_ids": [ada, bob],
    })).await;
    let id = created["id"].as_str().unwrap().to_string();
    app.post(&format!("/api/notifications/{}/send", id), &host, json!({})).await;

    // The process stopped after claiming the notification and marking its recipients.
    sqlx::query("UPDATE notifications SET status = 'sending' WHERE id = ?").bind(&id).execute(&app.pool).await.unwrap();
    sqlx::query("UPDATE notification_recipients SET status = 'sending' WHERE notification_id = ?")
        .bind(&id).execute(&app.pool).await.unwrap();

    assert_eq!(dispatch_due_notifications(&app.state).await.unwrap(), 0);
    let (status, _) = app.post(&format!("/api/notifications/{}/send", id), &host, json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    assert_eq!(recover_interrupted_dispatches(&app.state).await.unwrap(), 1);
    let (_, detail) = app.get(&format!("/api/notifications/{}", id), &host).await;
    assert_eq!(detail["status"], "scheduled");
    assert_eq!(recipient(&detail, "ada@example.com")["status"], "pending");

    assert_eq!(dispatch_due_notifications(&app.state).await.unwrap(), 1);
    let (_, detail) = app.get(&format!("/api/notifications/{}", id), &host).await;
    assert_eq!(detail["status"], "sent");
    assert_eq!(recipient(&detail, "ada@example.com")["status"], "sent");
    assert_eq!(recipient(&detail, "bob@example.com")["status"], "sent");
    assert_eq!(app.mail.sent().len(), 2);

    // Nothing left to recover.
    assert_eq!(recover_interrupted_dispatches(&app.state).await.unwrap(), 0);
}

#[tokio::test]
async fn test_resend_retries_stuck_recipients_and_keeps_receipts() {
    let app = TestApp::new().await;
    let host = app.token_for("host", &[RoleName::EventHost]).await;
    let mut guests = Vec::new();
    for (first, email) in [("Ada", "ada@example.com"), ("Bob", "bob@example.com"), ("Cy", "cy@example.com")] {
        guests.push(app.create_guest(&host, first, "Guest", Some(email)).await);
        app.mail.reject.lock().unwrap().push(email.to_string());
    }

    let created = create_notification(&app, &host, json!({ "subject": "Hi", "body": "Hi", "guest_ids": guests })).await;
    let id = created["id"].as_str().unwrap().to_string();
    let send_uri = format!("/api/notifications/{}/send", id);
    app.post(&send_uri, &host, json!({})).await;
    dispatch_due_notifications(&app.state).await.unwrap();

    let (_, detail) = app.get(&format!("/api/notifications/{}", id), &host).await;
    assert_eq!(detail["status"], "failed");

    // Ada's receipt arrived late; Bob was cut off mid-delivery by an earlier run.
    sqlx::query("UPDATE notification_recipients SET status = 'delivered' WHERE address = 'ada@example.com'")
        .execute(&app.pool).await.unwrap();
    sqlx::query("UPDATE notification_recipients SET status = 'sending' WHERE address = 'bob@example.com'")
        .execute(&app.pool).await.unwrap();

    // Cy still bounces.
    app.mail.reject.lock().unwrap().retain(|r| r == "cy@example.com");
    let (status, _) = app.post(&send_uri, &host, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    dispatch_due_notifications(&app.state).await.unwrap();

    let (_, detail) = app.get(&format!("/api/notifications/{}", id), &host).await;
    assert_eq!(detail["status"], "sent");
    assert_eq!(recipient(&detail, "ada@example.com")["status"], "delivered");
    assert_eq!(recipient(&detail, "bob@example.com")["status"], "sent");
    assert_eq!(recipient(&detail, "cy@example.com")["status"], "failed");

    let sent = app.mail.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "bob@example.com");
}
