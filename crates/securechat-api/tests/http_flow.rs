//! End-to-end tests against the real router: OTP login, sending a sticker
//! message, revealing it and letting it expire.
//!
//! Each test gets an in-memory database and an empty sticker directory, so
//! every carrier is the synthesized fallback.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::TimeDelta;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use securechat_api::auth::AppStateInner;
use securechat_db::Database;
use securechat_stego::ContainerSelector;

/// Sticker directory removed when the test ends, along with the fallback
/// sticker persisted into it.
struct StickerDir(PathBuf);

impl Drop for StickerDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn app(auto_delete: TimeDelta) -> (Router, StickerDir) {
    let sticker_dir = std::env::temp_dir().join(format!(
        "securechat_http_{}",
        uuid::Uuid::new_v4()
    ));
    let state = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        jwt_secret: "test-secret".into(),
        stickers: ContainerSelector::new(sticker_dir.clone()),
        auto_delete,
        expose_otp: true,
    });
    (securechat_api::router(state), StickerDir(sticker_dir))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn call_json(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, bytes) = call(app, method, uri, token, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn login(app: &Router, phone: &str) -> String {
    let (status, sent) = call_json(
        app,
        Method::POST,
        "/auth/otp",
        None,
        Some(json!({ "phone_number": phone })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let otp = sent["otp"].as_str().unwrap().to_string();

    let (status, verified) = call_json(
        app,
        Method::POST,
        "/auth/verify",
        None,
        Some(json!({ "phone_number": phone, "otp": otp })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    verified["token"].as_str().unwrap().to_string()
}

async fn send_sealed(app: &Router, token: &str, to: &str, text: &str) -> (String, String) {
    let (status, sent) = call_json(
        app,
        Method::POST,
        "/messages",
        Some(token),
        Some(json!({ "receiver_phone": to, "message_text": text, "is_encrypted": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (
        sent["id"].as_str().unwrap().to_string(),
        sent["decrypt_code"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn reveal_with_wrong_then_right_code() {
    let (app, _stickers) = app(TimeDelta::seconds(15));
    let alice = login(&app, "1110001").await;
    let bob = login(&app, "2220002").await;

    let (id, code) = send_sealed(&app, &alice, "2220002", "meet at 9").await;
    assert_eq!(code.len(), 8);
    assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));

    let uri = format!("/messages/{}/reveal", id);
    let (status, body) = call_json(
        &app,
        Method::POST,
        &uri,
        Some(&bob),
        Some(json!({ "decrypt_code": "0000" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid decrypt code");

    let (status, body) = call_json(
        &app,
        Method::POST,
        &uri,
        Some(&bob),
        Some(json!({ "decrypt_code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "meet at 9");
    assert_eq!(body["show_auto_delete"], true);
}

#[tokio::test]
async fn code_is_shown_to_sender_only() {
    let (app, _stickers) = app(TimeDelta::seconds(15));
    let alice = login(&app, "1110001").await;
    let bob = login(&app, "2220002").await;
    let (_, code) = send_sealed(&app, &alice, "2220002", "secret").await;

    let (_, feed) = call_json(&app, Method::GET, "/messages", Some(&alice), None).await;
    assert_eq!(feed[0]["decrypt_code"], code.as_str());
    assert_eq!(feed[0]["is_encrypted"], true);

    let (_, feed) = call_json(&app, Method::GET, "/messages", Some(&bob), None).await;
    assert_eq!(feed.as_array().unwrap().len(), 1);
    assert!(feed[0]["decrypt_code"].is_null());
    assert_eq!(feed[0]["message"], "🎨 [Encrypted Sticker Message]");
    assert!(!feed.to_string().contains("secret"));
}

#[tokio::test]
async fn carrier_image_decodes_without_any_stickers() {
    let (app, _stickers) = app(TimeDelta::seconds(15));
    let alice = login(&app, "1110001").await;
    let bob = login(&app, "2220002").await;
    let (id, code) = send_sealed(&app, &alice, "2220002", "no stickers needed").await;

    let (status, png) = call(
        &app,
        Method::GET,
        &format!("/messages/{}/image", id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(image::load_from_memory(&png).is_ok());
    assert_eq!(
        securechat_stego::decode(&png, &code).as_deref(),
        Some("no stickers needed")
    );
}

#[tokio::test]
async fn armed_message_disappears_after_delay() {
    let (app, _stickers) = app(TimeDelta::milliseconds(300));
    let alice = login(&app, "1110001").await;
    let bob = login(&app, "2220002").await;
    let (id, code) = send_sealed(&app, &alice, "2220002", "burn after reading").await;

    let (status, _) = call_json(
        &app,
        Method::POST,
        &format!("/messages/{}/reveal", id),
        Some(&bob),
        Some(json!({ "decrypt_code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, armed) = call_json(
        &app,
        Method::POST,
        &format!("/messages/{}/auto-delete", id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(armed["delete_time"].is_string());

    let (_, feed) = call_json(&app, Method::GET, "/messages", Some(&bob), None).await;
    assert_eq!(feed.as_array().unwrap().len(), 1);
    assert!(feed[0]["auto_delete_time"].is_string());

    tokio::time::sleep(Duration::from_millis(450)).await;

    let (_, feed) = call_json(&app, Method::GET, "/messages", Some(&alice), None).await;
    assert!(feed.as_array().unwrap().is_empty());

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/messages/{}/image", id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn expired_message_stays_gone_without_a_list_fetch() {
    let (app, _stickers) = app(TimeDelta::milliseconds(300));
    let alice = login(&app, "1110001").await;
    let bob = login(&app, "2220002").await;
    let (id, code) = send_sealed(&app, &alice, "2220002", "one time only").await;

    let arm_uri = format!("/messages/{}/auto-delete", id);
    let (status, _) = call_json(&app, Method::POST, &arm_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(450)).await;

    // No GET /messages in between, so nothing has swept the row yet.
    let (status, _) = call_json(&app, Method::POST, &arm_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call_json(
        &app,
        Method::POST,
        &format!("/messages/{}/reveal", id),
        Some(&bob),
        Some(json!({ "decrypt_code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/messages/{}/image", id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, feed) = call_json(&app, Method::GET, "/messages", Some(&bob), None).await;
    assert!(feed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn outsiders_and_anonymous_callers_are_refused() {
    let (app, _stickers) = app(TimeDelta::seconds(15));
    let alice = login(&app, "1110001").await;
    let eve = login(&app, "9990009").await;
    let (id, code) = send_sealed(&app, &alice, "2220002", "not for eve").await;

    let (status, body) = call_json(
        &app,
        Method::POST,
        &format!("/messages/{}/reveal", id),
        Some(&eve),
        Some(json!({ "decrypt_code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = call(&app, Method::GET, "/messages", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, Method::GET, "/messages", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn plain_messages_have_no_code_or_image() {
    let (app, _stickers) = app(TimeDelta::seconds(15));
    let alice = login(&app, "1110001").await;
    let bob = login(&app, "2220002").await;

    let (status, sent) = call_json(
        &app,
        Method::POST,
        "/messages",
        Some(&alice),
        Some(json!({ "receiver_phone": "2220002", "message_text": "hi bob" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(sent.get("decrypt_code").is_none());
    let id = sent["id"].as_str().unwrap();

    let (_, feed) = call_json(&app, Method::GET, "/messages", Some(&bob), None).await;
    assert_eq!(feed[0]["message"], "hi bob");
    assert_eq!(feed[0]["is_encrypted"], false);

    let (status, body) = call_json(
        &app,
        Method::POST,
        &format!("/messages/{}/reveal", id),
        Some(&bob),
        Some(json!({ "decrypt_code": "whatever" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Message not found");
}

#[tokio::test]
async fn otp_is_single_use() {
    let (app, _stickers) = app(TimeDelta::seconds(15));

    let (_, sent) = call_json(
        &app,
        Method::POST,
        "/auth/otp",
        None,
        Some(json!({ "phone_number": "5550005" })),
    )
    .await;
    let otp = sent["otp"].as_str().unwrap().to_string();
    let wrong = if otp == "000000" { "111111" } else { "000000" };

    let verify = |code: String| json!({ "phone_number": "5550005", "otp": code });

    let (status, _) = call_json(&app, Method::POST, "/auth/verify", None, Some(verify(wrong.into()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call_json(&app, Method::POST, "/auth/verify", None, Some(verify(otp.clone()))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call_json(&app, Method::POST, "/auth/verify", None, Some(verify(otp))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn contacts_roundtrip() {
    let (app, _stickers) = app(TimeDelta::seconds(15));
    let alice = login(&app, "1110001").await;

    let (status, _) = call_json(
        &app,
        Method::POST,
        "/contacts",
        Some(&alice),
        Some(json!({ "contact_phone": "2220002", "contact_name": "Bob" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    call_json(
        &app,
        Method::POST,
        "/contacts",
        Some(&alice),
        Some(json!({ "contact_phone": "3330003" })),
    )
    .await;

    let (_, contacts) = call_json(&app, Method::GET, "/contacts", Some(&alice), None).await;
    assert_eq!(
        contacts,
        json!([
            { "phone": "2220002", "name": "Bob" },
            { "phone": "3330003", "name": "3330003" }
        ])
    );

    let (status, body) = call_json(
        &app,
        Method::POST,
        "/contacts",
        Some(&alice),
        Some(json!({ "contact_phone": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Contact phone required");
}
