//! End-to-end tests driving the real router against an in-memory store.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::util::ServiceExt;

use sebo_api::auth::{AppState, AppStateInner};
use sebo_db::Database;

fn app() -> Router {
    let db = Database::open_in_memory().unwrap();
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: "test-secret".into(),
    });
    sebo_api::router(state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (u16, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status().as_u16();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Registers a user and returns their bearer token.
async fn register(app: &Router, name: &str, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "name": name, "email": email, "password": "password123" })),
    )
    .await;
    assert_eq!(status, 201, "register failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

async fn create_listing(app: &Router, token: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/anuncios",
        Some(token),
        Some(json!({
            "title": "Duna",
            "author": "Frank Herbert",
            "isbn": "9788576574826",
            "publisher": "Aleph",
            "year": 2017,
            "genre": "science-fiction",
            "price": "89.90",
            "condition": "like-new",
            "kind": "sale"
        })),
    )
    .await;
    assert_eq!(status, 201, "create listing failed: {body}");
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn health_endpoint_is_public() {
    let app = app();
    let (status, body) = send(&app, "GET", "/", None, None).await;
    assert_eq!(status, 200);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn duplicate_registration_conflicts_without_a_second_write() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "name": "Ana", "email": "ana@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, 201);
    assert!(body["token"].is_string());
    assert!(body["user"].get("password").is_none());

    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "name": "Other", "email": "ana@example.com", "password": "password456" })),
    )
    .await;
    assert_eq!(status, 409);

    // The original registration still logs in: the conflict wrote nothing.
    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "ana@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn login_failures_are_non_distinguishing() {
    let app = app();
    register(&app, "Ana", "ana@example.com").await;

    let (wrong_pw_status, wrong_pw_body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "ana@example.com", "password": "wrong-password" })),
    )
    .await;
    let (unknown_status, unknown_body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "ghost@example.com", "password": "password123" })),
    )
    .await;

    assert_eq!(wrong_pw_status, 401);
    assert_eq!(unknown_status, 401);
    assert_eq!(wrong_pw_body, unknown_body);
}

#[tokio::test]
async fn listing_reads_are_public_and_include_owner_fields() {
    let app = app();
    let token = register(&app, "Ana", "ana@example.com").await;

    let (status, _) = send(&app, "GET", "/anuncios/999", None, None).await;
    assert_eq!(status, 404);

    let id = create_listing(&app, &token).await;

    let (status, body) = send(&app, "GET", &format!("/anuncios/{id}"), None, None).await;
    assert_eq!(status, 200);
    assert_eq!(body["title"], "Duna");
    assert_eq!(body["price"], json!(89.9));
    assert_eq!(body["owner"]["name"], "Ana");
    assert_eq!(body["owner"]["email"], "ana@example.com");

    let (status, body) = send(&app, "GET", "/anuncios", None, None).await;
    assert_eq!(status, 200);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn mutations_require_a_token() {
    let app = app();
    let (status, _) = send(
        &app,
        "PUT",
        "/anuncios/1",
        None,
        Some(json!({ "title": "x" })),
    )
    .await;
    assert_eq!(status, 401);

    let (status, _) = send(
        &app,
        "PUT",
        "/anuncios/1",
        Some("not-a-real-token"),
        Some(json!({ "title": "x" })),
    )
    .await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn ownership_gate_checks_existence_before_ownership() {
    let app = app();
    let owner = register(&app, "Ana", "ana@example.com").await;
    let other = register(&app, "Bia", "bia@example.com").await;
    let id = create_listing(&app, &owner).await;

    // Malformed id fails before any lookup.
    let (status, _) = send(
        &app,
        "PUT",
        "/anuncios/abc",
        Some(&other),
        Some(json!({ "title": "x" })),
    )
    .await;
    assert_eq!(status, 400);

    // Nonexistent resource is 404 even for a non-owner.
    let (status, _) = send(
        &app,
        "PUT",
        "/anuncios/999",
        Some(&other),
        Some(json!({ "title": "x" })),
    )
    .await;
    assert_eq!(status, 404);

    // Existing resource owned by someone else is 403, and unchanged.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/anuncios/{id}"),
        Some(&other),
        Some(json!({ "title": "hijacked" })),
    )
    .await;
    assert_eq!(status, 403);
    let (_, body) = send(&app, "GET", &format!("/anuncios/{id}"), None, None).await;
    assert_eq!(body["title"], "Duna");

    // Non-owner delete is also 403.
    let (status, _) = send(&app, "DELETE", &format!("/anuncios/{id}"), Some(&other), None).await;
    assert_eq!(status, 403);

    // The owner passes every gate.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/anuncios/{id}"),
        Some(&owner),
        Some(json!({ "title": "Duna (capa dura)" })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["title"], "Duna (capa dura)");
}

#[tokio::test]
async fn partial_patch_keeps_omitted_fields_and_clears_on_null() {
    let app = app();
    let owner = register(&app, "Ana", "ana@example.com").await;
    let id = create_listing(&app, &owner).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/anuncios/{id}"),
        Some(&owner),
        Some(json!({ "price": null, "kind": "trade" })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["price"], Value::Null);
    assert_eq!(body["kind"], "trade");
    // omitted fields kept their values
    assert_eq!(body["title"], "Duna");
    assert_eq!(body["year"], json!(2017));

    // null on a non-nullable field is a payload error
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/anuncios/{id}"),
        Some(&owner),
        Some(json!({ "title": null })),
    )
    .await;
    assert_eq!(status, 400);

    // unparseable numeric is a payload error too
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/anuncios/{id}"),
        Some(&owner),
        Some(json!({ "year": "MMXIX" })),
    )
    .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn rating_create_is_an_upsert() {
    let app = app();
    let owner = register(&app, "Ana", "ana@example.com").await;
    let rater = register(&app, "Bia", "bia@example.com").await;
    let listing_id = create_listing(&app, &owner).await;

    let (status, _) = send(
        &app,
        "POST",
        "/avaliacoes",
        Some(&rater),
        Some(json!({ "value": 5, "listing_id": listing_id })),
    )
    .await;
    assert_eq!(status, 201);

    let (status, _) = send(
        &app,
        "POST",
        "/avaliacoes",
        Some(&rater),
        Some(json!({ "value": 3, "listing_id": listing_id, "comment": "on reflection" })),
    )
    .await;
    assert_eq!(status, 201);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/avaliacoes/anuncio/{listing_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, 200);
    let ratings = body.as_array().unwrap();
    assert_eq!(ratings.len(), 1);
    assert_eq!(ratings[0]["value"], json!(3));
    assert_eq!(ratings[0]["comment"], "on reflection");
}

#[tokio::test]
async fn rating_value_is_bounded_and_listing_must_exist() {
    let app = app();
    let owner = register(&app, "Ana", "ana@example.com").await;
    let listing_id = create_listing(&app, &owner).await;

    let (status, _) = send(
        &app,
        "POST",
        "/avaliacoes",
        Some(&owner),
        Some(json!({ "value": 6, "listing_id": listing_id })),
    )
    .await;
    assert_eq!(status, 400);

    let (status, _) = send(
        &app,
        "POST",
        "/avaliacoes",
        Some(&owner),
        Some(json!({ "value": 4, "listing_id": 999 })),
    )
    .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn comments_are_owner_gated_and_listed_newest_first() {
    let app = app();
    let owner = register(&app, "Ana", "ana@example.com").await;
    let other = register(&app, "Bia", "bia@example.com").await;
    let listing_id = create_listing(&app, &owner).await;

    let (status, body) = send(
        &app,
        "POST",
        "/comentarios",
        Some(&other),
        Some(json!({ "text": "is it available?", "listing_id": listing_id })),
    )
    .await;
    assert_eq!(status, 201);
    let comment_id = body["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        "/comentarios",
        Some(&owner),
        Some(json!({ "text": "yes, it is", "listing_id": listing_id })),
    )
    .await;
    assert_eq!(status, 201);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/comentarios/anuncio/{listing_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, 200);
    let comments = body.as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["text"], "yes, it is");
    assert_eq!(comments[0]["user_name"], "Ana");

    // Only the author may edit or delete.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/comentarios/{comment_id}"),
        Some(&owner),
        Some(json!({ "text": "edited by someone else" })),
    )
    .await;
    assert_eq!(status, 403);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/comentarios/{comment_id}"),
        Some(&other),
        None,
    )
    .await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn profile_endpoints_cover_the_caller_only() {
    let app = app();
    let token = register(&app, "Ana", "ana@example.com").await;

    let (status, body) = send(&app, "GET", "/users/me", Some(&token), None).await;
    assert_eq!(status, 200);
    assert_eq!(body["name"], "Ana");
    assert!(body.get("password").is_none());

    let (status, body) = send(
        &app,
        "PUT",
        "/users/editMe",
        Some(&token),
        Some(json!({ "name": "Ana Maria" })),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["name"], "Ana Maria");
    assert_eq!(body["email"], "ana@example.com");

    let (status, _) = send(
        &app,
        "PUT",
        "/users/editMe",
        Some(&token),
        Some(json!({ "name": null })),
    )
    .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn deleting_an_account_cascades_to_everything_it_touched() {
    let app = app();
    let a = register(&app, "A", "a@example.com").await;
    let b = register(&app, "B", "b@example.com").await;

    // A owns a listing; B rates it twice (upsert) and comments on it.
    let listing_id = create_listing(&app, &a).await;
    for value in [5, 3] {
        let (status, _) = send(
            &app,
            "POST",
            "/avaliacoes",
            Some(&b),
            Some(json!({ "value": value, "listing_id": listing_id })),
        )
        .await;
        assert_eq!(status, 201);
    }
    send(
        &app,
        "POST",
        "/comentarios",
        Some(&b),
        Some(json!({ "text": "tempted", "listing_id": listing_id })),
    )
    .await;

    let (status, _) = send(&app, "DELETE", "/users/deleteMe", Some(&a), None).await;
    assert_eq!(status, 200);

    // The listing and everything referencing it are gone.
    let (status, _) = send(&app, "GET", &format!("/anuncios/{listing_id}"), None, None).await;
    assert_eq!(status, 404);
    let (_, ratings) = send(
        &app,
        "GET",
        &format!("/avaliacoes/anuncio/{listing_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(ratings.as_array().unwrap().len(), 0);
    let (_, comments) = send(
        &app,
        "GET",
        &format!("/comentarios/anuncio/{listing_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(comments.as_array().unwrap().len(), 0);

    // A's still-valid token now resolves to nothing; B is untouched.
    let (status, _) = send(&app, "GET", "/users/me", Some(&a), None).await;
    assert_eq!(status, 404);
    let (status, _) = send(&app, "GET", "/users/me", Some(&b), None).await;
    assert_eq!(status, 200);
}
