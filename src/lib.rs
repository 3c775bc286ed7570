pub mod auth;
pub mod config;
pub mod http_server;
pub mod mcp;
pub mod reports;
pub mod session;
pub mod trello;

pub use auth::{LinkedToken, UNAUTHENTICATED_MESSAGE};
pub use config::{Config, ConfigError};
pub use http_server::{create_app, run_server, AppState};
pub use mcp::{ApiError, ToolDescriptor};
pub use session::{MemorySessionStore, Session, SessionStore};
pub use trello::{TrelloClient, TrelloError};
