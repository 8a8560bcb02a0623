//! HTTP API — handlers and route assembly

pub mod auth_handlers;
pub mod handlers;
pub mod placemark_handlers;
pub mod routes;
pub mod user_handlers;

pub use routes::create_router;
