pub mod gate;
pub mod handshake;

pub use gate::{require_auth, LinkedToken, UNAUTHENTICATED_MESSAGE};
pub use handshake::{auth_handler, authorize_url, callback_handler, HandshakeError};
