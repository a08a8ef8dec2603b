//! # AS4 Correlation
//!
//! Bridges asynchronous acknowledgements back to the task that sent the
//! message they acknowledge.
//!
//! ```text
//!   sender task                          inbound callback
//!   ───────────                          ────────────────
//!   obtain(M1, timeout) ──┐        ┌── fulfil(M1, ack)
//!                         ▼        ▼
//!                   ┌─────────────────────┐
//!                   │  CorrelationTable   │  key → WaiterCell
//!                   └─────────────────────┘
//!                             ▲
//!                     sweep_task (periodic)
//! ```
//!
//! The table is an explicitly owned value: construct one and share it
//! through `Arc` with every producer and consumer.

pub mod error;
pub mod sweep;
pub mod table;

pub use error::CorrelationError;
pub use sweep::{sweep_task, SweepPolicy, SweepReport, DEFAULT_EXPIRY, DEFAULT_SWEEP_PERIOD};
pub use table::{CorrelationStats, CorrelationTable};
