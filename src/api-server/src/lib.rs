//! HTTP surface for the vehicle claims provider

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

pub use error::{ApiError, Result};
pub use routes::create_router;
pub use state::AppState;
