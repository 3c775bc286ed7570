#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use trello_mcp_connector::{create_app, AppState, Config};
use wiremock::MockServer;

pub const TEST_KEY: &str = "test_key";

pub fn get_test_config(api_base: &str) -> Config {
    let mut config = Config::new(TEST_KEY, "https://connector.example.com").unwrap();
    config.api_base = api_base.to_string();
    config.session_key = [7u8; 32];
    config
}

/// App whose Trello client points at the mock server, under `/1` like the real API
pub fn create_test_app(mock_server: &MockServer) -> Router {
    let config = get_test_config(&format!("{}/1", mock_server.uri()));
    create_app(AppState::new(config).unwrap())
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// POST with a raw body and optional content type
pub fn post_raw(uri: &str, cookie: Option<&str>, content_type: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// `name=value` part of the response's Set-Cookie header
pub fn session_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("response should set a session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

/// Link `token` through /callback and return the session cookie
pub async fn linked_session(app: &Router, token: &str) -> String {
    let response = send(app, get(&format!("/callback?token={}", token), None)).await;
    assert_eq!(response.status(), 200);
    session_cookie(&response)
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn response_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}
