//! admit: bounded-concurrency admission gate.
//!
//! Caps the number of in-flight operations, rejects new admissions once
//! canceled, and lets a coordinator wait for admitted work to drain.

pub mod config;
pub mod error;
pub mod gate;
pub mod progress;
pub mod shutdown;
pub mod telemetry;

pub use config::GateConfig;
pub use error::{ConfigError, GateError};
pub use gate::{Gate, GatePermit, GateSnapshot};
pub use progress::ProgressReporter;
pub use shutdown::{ShutdownReason, cancel_on, cancel_on_signal};
pub use telemetry::init_tracing;
