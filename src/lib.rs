//! Form-submission notification rendering engine.
//!
//! Takes a schema-less, dynamically-typed form submission plus
//! operator-authored notification templates and produces addressed,
//! formatted, attachment-bearing emails — isolating every template
//! failure from its siblings.

pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod render;

pub use error::{NotifyError, Result};

/// Initialize tracing from `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}
