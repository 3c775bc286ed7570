mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::*;
use serde_json::json;
use wiremock::matchers::{any, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// After /callback, the session's requests carry the captured token upstream
#[tokio::test]
async fn test_callback_token_forwarded_upstream() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1/members/me/boards"))
        .and(query_param("key", TEST_KEY))
        .and(query_param("token", "tok-linked"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "b1", "name": "Roadmap"},
            {"id": "b2", "name": "Ops"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let cookie = linked_session(&app, "tok-linked").await;

    let response = send(&app, get("/mcp/boards", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Bare array, no envelope
    let boards = response_json(response).await;
    assert_eq!(boards[0]["id"], "b1");
    assert_eq!(boards[1]["name"], "Ops");
}

/// Two browsers linking different tokens do not see each other's token
#[tokio::test]
async fn test_sessions_are_isolated() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1/boards/b1/lists"))
        .and(query_param("token", "tok-alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "alice-list"}])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1/boards/b1/lists"))
        .and(query_param("token", "tok-bob"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "bob-list"}])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let alice = linked_session(&app, "tok-alice").await;
    let bob = linked_session(&app, "tok-bob").await;
    assert_ne!(alice, bob);

    let lists = response_json(send(&app, get("/mcp/boards/b1/lists", Some(&alice))).await).await;
    assert_eq!(lists[0]["id"], "alice-list");

    let lists = response_json(send(&app, get("/mcp/boards/b1/lists", Some(&bob))).await).await;
    assert_eq!(lists[0]["id"], "bob-list");
}

#[tokio::test]
async fn test_board_cards_pass_through() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1/boards/b1/cards"))
        .and(query_param("token", "tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "c1", "idList": "l1", "labels": [{"name": "bug"}]}
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let cookie = linked_session(&app, "tok").await;

    let cards = response_json(send(&app, get("/mcp/boards/b1/cards", Some(&cookie))).await).await;
    assert_eq!(
        cards,
        json!([{"id": "c1", "idList": "l1", "labels": [{"name": "bug"}]}])
    );
}

#[tokio::test]
async fn test_create_card_forwards_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/1/cards"))
        .and(query_param("token", "tok"))
        .and(body_json(json!({"idList": "l1", "name": "Ship it", "desc": ""})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "c9", "name": "Ship it", "idList": "l1"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let cookie = linked_session(&app, "tok").await;

    let response = send(
        &app,
        post_json(
            "/mcp/boards/b1/lists/l1/cards",
            Some(&cookie),
            json!({"name": "Ship it"}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["id"], "c9");
}

/// A missing name is not validated locally; Trello's rejection is surfaced
#[tokio::test]
async fn test_create_card_without_name_left_to_trello() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/1/cards"))
        .and(body_json(json!({"idList": "l1", "desc": "notes"})))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid value for name"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let cookie = linked_session(&app, "tok").await;

    let response = send(
        &app,
        post_json(
            "/mcp/boards/b1/lists/l1/cards",
            Some(&cookie),
            json!({"desc": "notes"}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = response_json(response).await;
    assert_eq!(body["upstreamStatus"], 400);
    assert!(body["error"].as_str().unwrap().contains("invalid value for name"));
}

#[tokio::test]
async fn test_move_card_puts_new_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/1/cards/c1"))
        .and(query_param("token", "tok"))
        .and(body_json(json!({"idList": "l2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "c1", "idList": "l2"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let cookie = linked_session(&app, "tok").await;

    let response = send(
        &app,
        post_json("/mcp/cards/c1/move", Some(&cookie), json!({"listId": "l2"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["idList"], "l2");
}

#[tokio::test]
async fn test_assign_member_posts_value() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/1/cards/c1/idMembers"))
        .and(query_param("token", "tok"))
        .and(body_json(json!({"value": "m1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["m1"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let cookie = linked_session(&app, "tok").await;

    let response = send(
        &app,
        post_json("/mcp/cards/c1/assign", Some(&cookie), json!({"memberId": "m1"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await, json!(["m1"]));
}

#[tokio::test]
async fn test_summary_report() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1/boards/b1/lists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "L1", "name": "Doing"},
            {"id": "L2", "name": "Done"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1/boards/b1/cards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "c1", "idList": "L1", "closed": false},
            {"id": "c2", "idList": "L1", "closed": true},
            {"id": "c3", "idList": "L2", "closed": false}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let cookie = linked_session(&app, "tok").await;

    let response = send(&app, get("/mcp/boards/b1/summary", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_json(response).await,
        json!([
            {"listId": "L1", "listName": "Doing", "openCards": 1, "closedCards": 1},
            {"listId": "L2", "listName": "Done", "openCards": 1, "closedCards": 0}
        ])
    );
}

#[tokio::test]
async fn test_due_report() {
    let mock_server = MockServer::start().await;
    let now = Utc::now();

    Mock::given(method("GET"))
        .and(path("/1/boards/b1/cards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "past", "due": (now - Duration::days(1)).to_rfc3339()},
            {"id": "soon", "due": (now + Duration::days(3)).to_rfc3339()},
            {"id": "later", "due": (now + Duration::days(10)).to_rfc3339()},
            {"id": "none", "due": null}
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let cookie = linked_session(&app, "tok").await;

    let response = send(&app, get("/mcp/boards/b1/due", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let report = response_json(response).await;
    let ids = |key: &str| -> Vec<String> {
        report[key]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_str().unwrap().to_string())
            .collect()
    };
    assert_eq!(ids("overdue"), vec!["past"]);
    assert_eq!(ids("dueSoon"), vec!["soon"]);
}

#[tokio::test]
async fn test_assignments_report() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1/boards/b1/cards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "c1", "idMembers": ["A", "B"]},
            {"id": "c2", "idMembers": ["A"]},
            {"id": "c3", "idMembers": []}
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let cookie = linked_session(&app, "tok").await;

    let response = send(&app, get("/mcp/boards/b1/assignments", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await, json!({"A": 2, "B": 1}));
}

/// Upstream server errors become 502 with a JSON error body
#[tokio::test]
async fn test_upstream_failure_maps_to_bad_gateway() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1/boards/b1/cards"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let cookie = linked_session(&app, "tok").await;

    let response = send(&app, get("/mcp/boards/b1/cards", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = response_json(response).await;
    assert_eq!(body["upstreamStatus"], 500);
}

/// Trello rejecting the token is reported as 401 with re-link guidance
#[tokio::test]
async fn test_rejected_token_maps_to_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1/members/me/boards"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let cookie = linked_session(&app, "revoked").await;

    let response = send(&app, get("/mcp/boards", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("/auth"));
}

/// Summary fails as a whole when one of the two concurrent fetches fails
#[tokio::test]
async fn test_summary_fails_when_cards_fetch_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1/boards/b1/lists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "L1"}])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1/boards/b1/cards"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let cookie = linked_session(&app, "tok").await;

    let response = send(&app, get("/mcp/boards/b1/summary", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

/// A mistyped field is forwarded as sent and does not drop the other fields
#[tokio::test]
async fn test_create_card_forwards_mistyped_field() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/1/cards"))
        .and(body_json(json!({"idList": "l1", "name": "Ship it", "desc": 5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "c9", "name": "Ship it"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let cookie = linked_session(&app, "tok").await;

    let response = send(
        &app,
        post_json(
            "/mcp/boards/b1/lists/l1/cards",
            Some(&cookie),
            json!({"name": "Ship it", "desc": 5}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["name"], "Ship it");
}

/// Malformed JSON is rejected before anything is written to Trello
#[tokio::test]
async fn test_malformed_json_rejected_without_upstream_call() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .and(path("/1/cards/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "c1"})))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/1/cards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "c9"})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let cookie = linked_session(&app, "tok").await;

    let response = send(
        &app,
        post_raw(
            "/mcp/cards/c1/move",
            Some(&cookie),
            Some("application/json"),
            r#"{"listId": "l2""#,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response_json(response).await["error"].is_string());

    let response = send(
        &app,
        post_raw(
            "/mcp/boards/b1/lists/l1/cards",
            Some(&cookie),
            Some("application/json"),
            r#"{"name": "#,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Without a body the move is forwarded with no fields
#[tokio::test]
async fn test_move_card_without_body_sends_empty_object() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/1/cards/c1"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "c1", "idList": "l1"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let cookie = linked_session(&app, "tok").await;

    let response = send(&app, post_raw("/mcp/cards/c1/move", Some(&cookie), None, "")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["idList"], "l1");
}

/// A non-JSON content type behaves like an empty body
#[tokio::test]
async fn test_assign_member_with_text_body_sends_empty_object() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/1/cards/c1/idMembers"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid value for value"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let cookie = linked_session(&app, "tok").await;

    let response = send(
        &app,
        post_raw(
            "/mcp/cards/c1/assign",
            Some(&cookie),
            Some("text/plain"),
            r#"{"memberId": "m1"}"#,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(response_json(response).await["upstreamStatus"], 400);
}

/// An empty 2xx body from Trello is returned as JSON null
#[tokio::test]
async fn test_empty_upstream_body_returns_null() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/1/cards/c1"))
        .and(body_json(json!({"idList": "l2"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&mock_server);
    let cookie = linked_session(&app, "tok").await;

    let response = send(
        &app,
        post_json("/mcp/cards/c1/move", Some(&cookie), json!({"listId": "l2"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "null");
}
