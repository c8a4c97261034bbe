//! Tracing and logging setup shared by every process that hosts the domain.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use tracing::{LogFormat, TracingSettings, init, init_default};
