//! db-config-sync — moves the config of one database alias to another.
//!
//! For a project and a source `dbAlias`, the service reads the connection
//! config, collection schemas, collection rules and prepared queries from the
//! config gateway, re-targets each of them at the new alias, and submits them
//! back through the same gateway.

pub mod apply;
pub mod config;
pub mod credential;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod model;
pub mod path;
pub mod rewrite;
pub mod server;
pub mod sync;
pub mod telemetry;

pub use error::{Result, SyncError};
pub use sync::DatabaseSync;
