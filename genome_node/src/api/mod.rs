//! HTTP API for the genome node

pub mod errors;
pub mod handlers;
pub mod server;
pub mod validation;

pub use errors::{ApiError, ApiResult};
pub use server::{create_router, start_api_server, AppState};
