//! Logging, metrics and audit output for the Dartsia explorer.

pub mod metrics;
pub mod logging;
pub mod audit;

pub use metrics::Metrics;
pub use logging::{init_logging, LogFormat};
