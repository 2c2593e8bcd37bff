// HTTP server setup (Axum)
pub mod app;
pub mod extract;
pub mod middleware;
pub mod routes;

pub use app::*;
