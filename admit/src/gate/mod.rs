//! Bounded-concurrency admission gate.
//!
//! A [`Gate`] composes three facilities:
//! - a fixed-capacity slot pool (`tokio::sync::Semaphore`)
//! - a one-shot cancellation broadcast (`CancellationToken`)
//! - a live-work counter doubling as a drain barrier for [`Gate::wait`]
//!
//! Admission hands out a [`GatePermit`]. Exit happens when the permit is
//! dropped (or explicitly via [`GatePermit::exit`]), so an Exit without a
//! matching Enter can not be written.
//!
//! State machine: `Open` → `Canceled` (terminal). Cancellation rejects new and
//! pending admissions but never revokes permits already handed out.

mod admission;
mod permit;

pub use admission::{Gate, GateSnapshot};
pub use permit::GatePermit;
