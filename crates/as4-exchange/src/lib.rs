//! AS4 Exchange - sends business messages and waits for both acknowledgement hops.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        ExchangeService                           │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │  caller ── send() ──▶ ExchangeCoordinator ── transmit() ──▶ Transport
//! │                          │        ▲                              │
//! │                   obtain(M1/M2)   │ value                        │
//! │                          ▼        │                              │
//! │                   ┌────────────────────────┐                     │
//! │                   │   CorrelationTable     │ ◀── sweep_task      │
//! │                   └────────────────────────┘                     │
//! │                               ▲ fulfil(key)                      │
//! │                               │                                  │
//! │  inbound ── on_receive() ──▶ InboundDispatcher ──▶ MessageHandlers
//! │                                                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Two hops
//!
//! 1. The local gateway acknowledges the submission of `M1`. A positive
//!    acknowledgement carries the id `M2` under which the relay result
//!    will arrive.
//! 2. The remote gateway's receipt (or error) comes back as a relay
//!    acknowledgement keyed by `M2`. `EBMS:0301` means the receipt is
//!    missing and is reported separately from every other relay error.
//!
//! # Usage
//!
//! ```ignore
//! use as4_exchange::{ExchangeConfig, ExchangeService};
//!
//! let config = ExchangeConfig::from_file("as4.toml")?;
//! let service = ExchangeService::new(config, transport)?;
//! service.start()?;
//! let receipt = service.coordinator().send(&routing, &message, None).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{GatewayScript, HopOutcome, LoopbackGateway, Transmission};
pub use domain::{
    outcomes, ConfigError, ExchangeConfig, ExchangeError, ExchangeReceipt, ExchangeState,
    PartyConfig, SweepConfig, TimeoutConfig,
};
pub use ports::{MessageHandler, Transport, TransportError};
pub use service::{
    DispatchOutcome, ExchangeCoordinator, ExchangeService, InboundDispatcher, ServiceError,
};
