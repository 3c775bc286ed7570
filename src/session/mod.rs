//! Cookie-keyed server-side sessions.
//!
//! Each browser gets a random session id, carried in an encrypted cookie. The
//! linked Trello token never leaves the server.

pub mod cookie;
pub mod store;

pub use cookie::{CookieCipher, CookieError};
pub use store::{MemorySessionStore, SessionStore};

use crate::http_server::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

pub const SESSION_COOKIE_NAME: &str = "trello_mcp_sid";

/// Encrypted cookie payload
#[derive(Debug, Serialize, Deserialize)]
struct SessionCookie {
    sid: String,
}

/// The current request's session, inserted into request extensions by
/// [`session_middleware`]
#[derive(Clone)]
pub struct Session {
    id: String,
    store: Arc<dyn SessionStore>,
}

impl Session {
    pub fn new(id: String, store: Arc<dyn SessionStore>) -> Self {
        Self { id, store }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Id prefix safe to put in logs
    pub fn log_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }

    /// Linked Trello token; empty tokens count as unlinked
    pub fn linked_token(&self) -> Option<String> {
        self.store.token(&self.id).filter(|t| !t.is_empty())
    }

    /// Store a token for this session
    pub fn link(&self, token: String) {
        self.store.link(&self.id, token);
    }
}

/// Resolve the session from the request cookie, or start a new one.
///
/// Unreadable cookies (wrong key, tampered, truncated) start a new session. New
/// sessions get their cookie set on the response.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = cookie::extract_cookie(request.headers(), SESSION_COOKIE_NAME).and_then(
        |value| match state.cookies.decrypt::<SessionCookie>(&value) {
            Ok(cookie) => Some(cookie.sid),
            Err(e) => {
                debug!(error = %e, "Ignoring unreadable session cookie");
                None
            }
        },
    );

    let (session_id, is_new) = match existing {
        Some(id) => (id, false),
        None => (Uuid::new_v4().to_string(), true),
    };

    request
        .extensions_mut()
        .insert(Session::new(session_id.clone(), Arc::clone(&state.sessions)));

    let mut response = next.run(request).await;

    if is_new {
        match state.cookies.encrypt(&SessionCookie { sid: session_id }) {
            Ok(value) => {
                let secure = state.config.base_scheme() == "https";
                let cookie = cookie::session_cookie_header(SESSION_COOKIE_NAME, &value, secure);
                match HeaderValue::from_str(&cookie) {
                    Ok(header_value) => {
                        response.headers_mut().append(header::SET_COOKIE, header_value);
                    }
                    Err(e) => error!(error = %e, "Session cookie is not a valid header value"),
                }
            }
            Err(e) => error!(error = %e, "Failed to encrypt session cookie"),
        }
    }

    response
}
