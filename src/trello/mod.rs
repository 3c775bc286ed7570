pub mod client;
pub mod types;

pub use client::{TrelloClient, TrelloError};
pub use types::{Card, List};
