//! Adapters implementing the ports.

pub mod loopback;

pub use loopback::{GatewayScript, HopOutcome, LoopbackGateway, Transmission};
