//! Inbound HTTP surface: `POST /db/sync` and `GET /health`.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use router::build_router;
