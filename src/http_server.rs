use crate::auth::{auth_handler, callback_handler, require_auth};
use crate::config::Config;
use crate::mcp::{discovery, handlers};
use crate::session::{session_middleware, CookieCipher, MemorySessionStore, SessionStore};
use crate::trello::{TrelloClient, TrelloError};
use anyhow::Context;
use axum::{
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub trello: Arc<TrelloClient>,
    pub sessions: Arc<dyn SessionStore>,
    pub cookies: Arc<CookieCipher>,
}

impl AppState {
    /// State with an in-memory session store sized from the configuration
    pub fn new(config: Config) -> Result<Self, TrelloError> {
        let sessions = Arc::new(MemorySessionStore::new(config.session_capacity));
        Self::with_session_store(config, sessions)
    }

    /// State backed by the given session store
    pub fn with_session_store(
        config: Config,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, TrelloError> {
        let trello = TrelloClient::new(config.api_key.clone(), config.api_base.clone())?;
        let cookies = CookieCipher::new(&config.session_key);

        Ok(Self {
            config: Arc::new(config),
            trello: Arc::new(trello),
            sessions,
            cookies: Arc::new(cookies),
        })
    }
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Build the router.
///
/// `/mcp/*` routes sit behind the auth gate; handshake, discovery and health
/// routes are public. Every route runs inside the session middleware.
pub fn create_app(state: AppState) -> Router {
    let mcp_routes = Router::new()
        .route("/mcp/boards", get(handlers::list_boards))
        .route("/mcp/boards/:boardId/lists", get(handlers::board_lists))
        .route("/mcp/boards/:boardId/cards", get(handlers::board_cards))
        .route(
            "/mcp/boards/:boardId/lists/:listId/cards",
            post(handlers::create_card),
        )
        .route("/mcp/cards/:cardId/move", post(handlers::move_card))
        .route("/mcp/cards/:cardId/assign", post(handlers::assign_member))
        .route("/mcp/boards/:boardId/summary", get(handlers::board_summary))
        .route("/mcp/boards/:boardId/due", get(handlers::due_cards))
        .route(
            "/mcp/boards/:boardId/assignments",
            get(handlers::member_assignments),
        )
        .route_layer(middleware::from_fn(require_auth));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth", get(auth_handler))
        .route("/callback", get(callback_handler))
        .route("/openapi.yaml", get(discovery::openapi_document))
        .route("/tools/list", get(discovery::tools_list))
        .route("/tools/trello", get(discovery::tool_trello))
        .merge(mcp_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the HTTP server until Ctrl-C
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let port = config.port;
    let base_url = config.base_url.clone();

    let state = AppState::new(config).context("Failed to create Trello client")?;
    let app = create_app(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Trello connector listening on {}", addr);
    info!("Link a Trello account at {}/auth", base_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down HTTP server");
        })
        .await?;

    Ok(())
}
