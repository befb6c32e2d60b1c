//! HTTP server: JSON API, CSV export and the league page.

pub mod auth;
pub mod handlers;
pub mod pages;
pub mod routes;

pub use auth::{AdminUser, AuthUser, SessionKeys};
pub use handlers::AppState;
pub use routes::create_router;
