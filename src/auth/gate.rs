use crate::session::Session;
use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

pub const UNAUTHENTICATED_MESSAGE: &str = "Not authenticated. Visit /auth to link Trello.";

/// Trello token of a linked session, available to handlers behind [`require_auth`]
#[derive(Debug, Clone)]
pub struct LinkedToken(String);

impl LinkedToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reject requests whose session has no linked token.
///
/// On success the token is added to request extensions as [`LinkedToken`] and
/// the request is passed on untouched.
pub async fn require_auth(mut request: Request, next: Next) -> Response {
    let session = request.extensions().get::<Session>().cloned();
    let token = session.as_ref().and_then(Session::linked_token);

    match (session, token) {
        (Some(session), Some(token)) => {
            debug!(session_id = %session.log_id(), path = %request.uri().path(), "Session linked");
            request.extensions_mut().insert(LinkedToken(token));
            next.run(request).await
        }
        _ => {
            warn!(
                path = %request.uri().path(),
                error_type = "unauthenticated",
                "Rejecting request from unlinked session"
            );
            (StatusCode::UNAUTHORIZED, UNAUTHENTICATED_MESSAGE).into_response()
        }
    }
}
