//! Router-level tests: the HTTP surface against the in-process store.

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use rand::rngs::OsRng;
use regex::Regex;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use konto::account::password::PasswordHasher;
use konto::account::pin::PinGenerator;
use konto::account::store::MemoryStore;
use konto::account::AccountService;
use konto::konto::email::{Mail, Mailer};
use konto::konto::router;

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<Mail>>,
}

impl Outbox {
    fn last_pin(&self) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let re = Regex::new(r"\d{4}").unwrap();
        sent.last()
            .and_then(|mail| re.find(&mail.body).map(|m| m.as_str().to_string()))
    }
}

impl Mailer for Outbox {
    fn send(&self, mail: &Mail) -> Result<()> {
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

fn app(require_activation: bool) -> (Router, Arc<Outbox>) {
    let outbox = Arc::new(Outbox::default());
    let service = Arc::new(AccountService::new(
        Arc::new(MemoryStore::new()),
        outbox.clone(),
        PasswordHasher::new(OsRng),
        PinGenerator::new(OsRng),
        require_activation,
    ));
    (router(service), outbox)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn register_body(username: &str, email: &str, password: &str) -> serde_json::Value {
    serde_json::json!({
        "username": username,
        "email": email,
        "first_name": "Bob",
        "last_name": "B",
        "password": password,
    })
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn register_activate_login_over_http() {
    let (app, outbox) = app(true);

    let response = app
        .clone()
        .oneshot(post_json(
            "/user/register",
            register_body("bob", "bob@x.com", "Secret123"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["user"]["username"], "bob");
    assert_eq!(body["user"]["activated"], false);
    assert!(body["user"].get("password").is_none());

    // Pending accounts cannot log in while gating is on.
    let response = app
        .clone()
        .oneshot(post_json(
            "/user/login",
            serde_json::json!({ "username": "bob", "password": "Secret123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let pin = outbox.last_pin().expect("activation mail carries a PIN");
    let response = app
        .clone()
        .oneshot(post_json(
            "/user/activate",
            serde_json::json!({ "pincode": pin }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_json(
            "/user/login",
            serde_json::json!({ "username": "bob", "password": "Secret123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["activated"], true);

    // A consumed PIN misses on retry.
    let response = app
        .oneshot(post_json(
            "/user/activate",
            serde_json::json!({ "pincode": pin }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_registrations_get_conflict() {
    let (app, _outbox) = app(false);

    let response = app
        .clone()
        .oneshot(post_json(
            "/user/register",
            register_body("bob", "bob@x.com", "pw-one"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(post_json(
            "/user/register",
            register_body("bob", "other@x.com", "pw-two"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_text(response).await, "Username is already taken");

    let response = app
        .oneshot(post_json(
            "/user/register",
            register_body("other", "bob@x.com", "pw-two"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_text(response).await, "Email is already taken");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let (app, _outbox) = app(false);

    app.clone()
        .oneshot(post_json(
            "/user/register",
            register_body("alice", "alice@x.com", "correctpw"),
        ))
        .await
        .unwrap();

    let wrong_password = app
        .clone()
        .oneshot(post_json(
            "/user/login",
            serde_json::json!({ "username": "alice", "password": "wrongpw" }),
        ))
        .await
        .unwrap();
    let unknown_user = app
        .clone()
        .oneshot(post_json(
            "/user/login",
            serde_json::json!({ "username": "mallory", "password": "wrongpw" }),
        ))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_text(wrong_password).await,
        body_text(unknown_user).await
    );
}

#[tokio::test]
async fn invalid_register_input_is_bad_request() {
    let (app, _outbox) = app(false);

    let response = app
        .clone()
        .oneshot(post_json(
            "/user/register",
            register_body("bob", "bob@x.com", "   "),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(post_json(
            "/user/register",
            register_body("bob", "not-an-email", "pw"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_pin_is_rejected() {
    let (app, _outbox) = app(false);

    let response = app
        .oneshot(post_json(
            "/user/activate",
            serde_json::json!({ "pincode": "0000" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Invalid PIN");
}

#[tokio::test]
async fn health_reports_the_store() {
    let (app, _outbox) = app(false);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("X-App"));
    let body = body_json(response).await;
    assert_eq!(body["store"], "ok");
    assert_eq!(body["name"], "konto");
}
