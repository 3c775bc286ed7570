pub mod discovery;
pub mod handlers;

pub use discovery::{request_origin, ToolDescriptor};
pub use handlers::ApiError;
