//! inspo-core library.
//!
//! Project items with media attachments and threaded comments, stored over a
//! pluggable document backend.

pub mod activity;
pub mod config;
pub mod error;
pub mod ids;
pub mod lock;
pub mod media;
pub mod model;
pub mod store;
pub mod view;

/// # Conventions
///
/// - **Errors**: module errors are `thiserror` enums that map to an
///   [`error::ErrorCode`]; config loading uses `anyhow::Result`.
/// - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
pub fn init() {
    tracing::debug!("inspo-core initialized");
}
