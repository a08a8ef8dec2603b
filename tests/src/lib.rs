//! # AS4 Exchange Test Suite
//!
//! Unified test crate exercising the crates together through the
//! in-process loopback gateway.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── mod.rs             # Shared fixtures
//!     ├── exchange_flows.rs  # Outbound send, both acknowledgement hops
//!     └── inbound_flows.rs   # Inbound delivery and containment
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p as4-tests
//!
//! # By flow
//! cargo test -p as4-tests integration::exchange_flows::
//! cargo test -p as4-tests integration::inbound_flows::
//! ```

#![allow(dead_code)]

pub mod integration;
