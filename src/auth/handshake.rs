use crate::config::Config;
use crate::http_server::AppState;
use crate::session::Session;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Extension,
};
use serde::Deserialize;
use tracing::{error, info};
use url::Url;

/// Query parameters Trello (or the fragment relay page) sends to /callback
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("Invalid authorize URL: {0}")]
    InvalidAuthorizeUrl(#[from] url::ParseError),
}

impl IntoResponse for HandshakeError {
    fn into_response(self) -> Response {
        error!(error = %self, "Trello authorization handshake error");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// Trello authorization URL for the token flow.
///
/// Trello appends the token to `return_url` as a `#token=` fragment.
pub fn authorize_url(config: &Config) -> Result<Url, url::ParseError> {
    Url::parse_with_params(
        &config.authorize_url,
        &[
            ("expiration", "never"),
            ("name", config.app_name.as_str()),
            ("scope", "read,write"),
            ("response_type", "token"),
            ("key", config.api_key.as_str()),
            ("return_url", config.callback_url().as_str()),
            ("callback_method", "fragment"),
        ],
    )
}

/// Handle GET /auth - redirect the browser to Trello's authorization page
pub async fn auth_handler(State(state): State<AppState>) -> Result<Response, HandshakeError> {
    let url = authorize_url(&state.config)?;

    info!(
        return_url = %state.config.callback_url(),
        "Redirecting to Trello authorization page"
    );

    Ok((StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response())
}

/// Handle GET /callback - link the returned token to the session.
///
/// Without a `token` query parameter, serves a page that lifts the token out of
/// the URL fragment and calls back with it as a query parameter.
pub async fn callback_handler(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<CallbackParams>,
) -> Response {
    match params.token.filter(|t| !t.is_empty()) {
        Some(token) => {
            session.link(token);
            info!(session_id = %session.log_id(), "Trello account linked to session");
            Html(LINKED_PAGE).into_response()
        }
        None => {
            info!(session_id = %session.log_id(), "Callback without token, serving fragment relay");
            Html(fragment_relay_page(&state.config.callback_url())).into_response()
        }
    }
}

const LINKED_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Trello linked</title></head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; text-align: center; padding-top: 4rem;">
  <h1>&#9989; Trello linked.</h1>
  <p>You can close this tab.</p>
</body>
</html>
"#;

fn fragment_relay_page(callback_url: &str) -> String {
    let callback = serde_json::Value::String(callback_url.to_string()).to_string();
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Linking Trello</title></head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; text-align: center; padding-top: 4rem;">
  <h1 id="status">Linking Trello&hellip;</h1>
  <script>
    var params = new URLSearchParams(window.location.hash.slice(1));
    var token = params.get("token");
    if (token) {{
      window.location.replace({callback} + "?token=" + encodeURIComponent(token));
    }} else {{
      document.getElementById("status").textContent =
        "No token received from Trello. Visit /auth to try again.";
    }}
  </script>
</body>
</html>
"#
    )
}
