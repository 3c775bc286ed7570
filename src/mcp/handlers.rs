//! `/mcp/*` route handlers.
//!
//! Every handler runs behind [`crate::auth::require_auth`] and receives the
//! session's Trello token as a [`LinkedToken`] extension. Upstream payloads are
//! returned bare, without a wrapping envelope.

use crate::auth::LinkedToken;
use crate::http_server::AppState;
use crate::reports::{self, DueReport, ListSummary};
use crate::trello::TrelloError;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Top-level fields of a JSON request body.
///
/// Fields are read one at a time and forwarded as sent, so a mistyped field
/// never hides its neighbours. Requests without a JSON content type, and JSON
/// values that are not objects, carry no fields. Malformed JSON is rejected.
#[derive(Debug, Default)]
pub struct BodyFields(Map<String, Value>);

impl BodyFields {
    pub fn from_body(body: Result<Json<Value>, JsonRejection>) -> Result<Self, ApiError> {
        match body {
            Ok(Json(Value::Object(fields))) => Ok(Self(fields)),
            Ok(Json(_)) => Ok(Self::default()),
            Err(JsonRejection::MissingJsonContentType(_)) => Ok(Self::default()),
            Err(rejection) => Err(ApiError::InvalidBody(rejection)),
        }
    }

    /// Remove and return a field, if the caller sent it
    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }
}

/// Errors surfaced by `/mcp/*` handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Trello request failed: {0}")]
    Upstream(#[from] TrelloError),

    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidBody(rejection) => {
                warn!(error = %rejection, error_type = "invalid_body", "Rejecting request body");
                (
                    rejection.status(),
                    Json(json!({ "error": rejection.body_text() })),
                )
                    .into_response()
            }
            ApiError::Upstream(TrelloError::Unauthorized) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "Trello rejected the linked token. Visit /auth to link Trello again."
                })),
            )
                .into_response(),
            ApiError::Upstream(e) => {
                warn!(error = %e, error_type = "upstream_failure", "Trello call failed");
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({
                        "error": e.to_string(),
                        "upstreamStatus": e.upstream_status(),
                    })),
                )
                    .into_response()
            }
        }
    }
}

/// GET /mcp/boards
pub async fn list_boards(
    State(state): State<AppState>,
    Extension(token): Extension<LinkedToken>,
) -> Result<Json<Value>, ApiError> {
    info!("Listing boards");
    let boards = state.trello.list_boards(token.as_str()).await?;
    Ok(Json(boards))
}

/// GET /mcp/boards/:boardId/lists
pub async fn board_lists(
    State(state): State<AppState>,
    Extension(token): Extension<LinkedToken>,
    Path(board_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    info!(board_id = %board_id, "Listing lists");
    let lists = state.trello.board_lists_raw(token.as_str(), &board_id).await?;
    Ok(Json(lists))
}

/// GET /mcp/boards/:boardId/cards
pub async fn board_cards(
    State(state): State<AppState>,
    Extension(token): Extension<LinkedToken>,
    Path(board_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    info!(board_id = %board_id, "Listing cards");
    let cards = state.trello.board_cards_raw(token.as_str(), &board_id).await?;
    Ok(Json(cards))
}

/// POST /mcp/boards/:boardId/lists/:listId/cards
///
/// `desc` defaults to `""` when absent; Trello decides whether the resulting
/// card is acceptable.
pub async fn create_card(
    State(state): State<AppState>,
    Extension(token): Extension<LinkedToken>,
    Path((board_id, list_id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let mut fields = BodyFields::from_body(body)?;
    let name = fields.take("name");
    let desc = fields
        .take("desc")
        .unwrap_or_else(|| Value::String(String::new()));

    info!(
        board_id = %board_id,
        list_id = %list_id,
        has_name = name.is_some(),
        "Creating card"
    );

    let card = state
        .trello
        .create_card(token.as_str(), &list_id, name, desc)
        .await?;
    Ok(Json(card))
}

/// POST /mcp/cards/:cardId/move
pub async fn move_card(
    State(state): State<AppState>,
    Extension(token): Extension<LinkedToken>,
    Path(card_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let list_id = BodyFields::from_body(body)?.take("listId");
    info!(card_id = %card_id, list_id = ?list_id, "Moving card");

    let card = state
        .trello
        .move_card(token.as_str(), &card_id, list_id)
        .await?;
    Ok(Json(card))
}

/// POST /mcp/cards/:cardId/assign
pub async fn assign_member(
    State(state): State<AppState>,
    Extension(token): Extension<LinkedToken>,
    Path(card_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let member_id = BodyFields::from_body(body)?.take("memberId");
    info!(card_id = %card_id, member_id = ?member_id, "Assigning member");

    let result = state
        .trello
        .add_member(token.as_str(), &card_id, member_id)
        .await?;
    Ok(Json(result))
}

/// GET /mcp/boards/:boardId/summary
pub async fn board_summary(
    State(state): State<AppState>,
    Extension(token): Extension<LinkedToken>,
    Path(board_id): Path<String>,
) -> Result<Json<Vec<ListSummary>>, ApiError> {
    let (lists, cards) = tokio::try_join!(
        state.trello.board_lists(token.as_str(), &board_id),
        state.trello.board_cards(token.as_str(), &board_id),
    )?;

    info!(
        board_id = %board_id,
        lists = lists.len(),
        cards = cards.len(),
        "Summarizing board"
    );

    Ok(Json(reports::summarize_lists(&lists, &cards)))
}

/// GET /mcp/boards/:boardId/due
pub async fn due_cards(
    State(state): State<AppState>,
    Extension(token): Extension<LinkedToken>,
    Path(board_id): Path<String>,
) -> Result<Json<DueReport>, ApiError> {
    let cards = state.trello.board_cards(token.as_str(), &board_id).await?;
    let report = reports::due_report(cards, Utc::now());

    info!(
        board_id = %board_id,
        due_soon = report.due_soon.len(),
        overdue = report.overdue.len(),
        "Computed due report"
    );

    Ok(Json(report))
}

/// GET /mcp/boards/:boardId/assignments
pub async fn member_assignments(
    State(state): State<AppState>,
    Extension(token): Extension<LinkedToken>,
    Path(board_id): Path<String>,
) -> Result<Json<BTreeMap<String, usize>>, ApiError> {
    let cards = state.trello.board_cards(token.as_str(), &board_id).await?;
    let workload = reports::member_workload(&cards);

    info!(board_id = %board_id, members = workload.len(), "Computed workload");

    Ok(Json(workload))
}
