use crate::trello::types::{AddMemberRequest, Card, CreateCardRequest, List, MoveCardRequest};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// Error types for Trello API operations
#[derive(Debug, thiserror::Error)]
pub enum TrelloError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Trello rejected the token")]
    Unauthorized,

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },
}

impl TrelloError {
    /// Upstream HTTP status, when Trello answered at all
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            TrelloError::Unauthorized => Some(401),
            TrelloError::ApiError { status, .. } => Some(*status),
            TrelloError::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Trello REST client.
///
/// Stateless apart from the API key: the user token is passed per call, so one
/// client serves every session.
pub struct TrelloClient {
    http_client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl TrelloClient {
    /// Create a new Trello API client
    pub fn new(api_key: impl Into<String>, api_base: impl Into<String>) -> Result<Self, TrelloError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("trello-mcp-connector/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let api_base = api_base.into();
        Url::parse(&api_base).map_err(|e| TrelloError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            http_client,
            api_base,
            api_key: api_key.into(),
        })
    }

    /// List boards of the token's owner
    pub async fn list_boards(&self, token: &str) -> Result<Value, TrelloError> {
        self.request(Method::GET, &["members", "me", "boards"], token, None)
            .await
    }

    /// Raw lists of a board, as Trello returns them
    pub async fn board_lists_raw(&self, token: &str, board_id: &str) -> Result<Value, TrelloError> {
        self.request(Method::GET, &["boards", board_id, "lists"], token, None)
            .await
    }

    /// Raw cards of a board, as Trello returns them
    pub async fn board_cards_raw(&self, token: &str, board_id: &str) -> Result<Value, TrelloError> {
        self.request(Method::GET, &["boards", board_id, "cards"], token, None)
            .await
    }

    /// Lists of a board
    pub async fn board_lists(&self, token: &str, board_id: &str) -> Result<Vec<List>, TrelloError> {
        let response = self.board_lists_raw(token, board_id).await?;
        Ok(serde_json::from_value(response)?)
    }

    /// Cards of a board
    pub async fn board_cards(&self, token: &str, board_id: &str) -> Result<Vec<Card>, TrelloError> {
        let response = self.board_cards_raw(token, board_id).await?;
        Ok(serde_json::from_value(response)?)
    }

    /// Create a card in a list
    pub async fn create_card(
        &self,
        token: &str,
        list_id: &str,
        name: Option<Value>,
        desc: Value,
    ) -> Result<Value, TrelloError> {
        let body = CreateCardRequest {
            id_list: list_id.to_string(),
            name,
            desc,
        };
        let json_body = serde_json::to_value(&body)?;
        self.request(Method::POST, &["cards"], token, Some(json_body))
            .await
    }

    /// Move a card to another list
    pub async fn move_card(
        &self,
        token: &str,
        card_id: &str,
        list_id: Option<Value>,
    ) -> Result<Value, TrelloError> {
        let json_body = serde_json::to_value(MoveCardRequest { id_list: list_id })?;
        self.request(Method::PUT, &["cards", card_id], token, Some(json_body))
            .await
    }

    /// Add a member to a card
    pub async fn add_member(
        &self,
        token: &str,
        card_id: &str,
        member_id: Option<Value>,
    ) -> Result<Value, TrelloError> {
        let json_body = serde_json::to_value(AddMemberRequest { value: member_id })?;
        self.request(
            Method::POST,
            &["cards", card_id, "idMembers"],
            token,
            Some(json_body),
        )
        .await
    }

    /// Build the upstream URL; each segment is percent-encoded on its own.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, TrelloError> {
        let mut url = Url::parse(&self.api_base).map_err(|e| TrelloError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| TrelloError::InvalidUrl(format!("{} cannot be a base", self.api_base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Make a single request to the Trello API.
    ///
    /// The API key and user token travel as query parameters. There is no retry:
    /// any transport error or non-2xx status is returned to the caller.
    pub async fn request(
        &self,
        method: Method,
        segments: &[&str],
        token: &str,
        body: Option<Value>,
    ) -> Result<Value, TrelloError> {
        let url = self.endpoint(segments)?;

        debug!(method = %method, path = %url.path(), "Calling Trello API");

        let mut request = self
            .http_client
            .request(method.clone(), url.clone())
            .query(&[("key", self.api_key.as_str()), ("token", token)]);

        if let Some(body_value) = body {
            request = request.json(&body_value);
        }

        let response = request.send().await.map_err(|e| {
            warn!(
                method = %method,
                path = %url.path(),
                error = %e,
                error_type = "http_request_failed",
                "Trello request failed"
            );
            TrelloError::HttpError(e)
        })?;

        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await?;
            if bytes.is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_slice(&bytes)?);
        }

        if status == StatusCode::UNAUTHORIZED {
            warn!(
                method = %method,
                path = %url.path(),
                error_type = "invalid_token",
                "Trello rejected the linked token"
            );
            return Err(TrelloError::Unauthorized);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        warn!(
            method = %method,
            path = %url.path(),
            status = %status,
            error_type = "api_error",
            "Trello returned non-2xx status"
        );

        Err(TrelloError::ApiError {
            status: status.as_u16(),
            message,
        })
    }
}
