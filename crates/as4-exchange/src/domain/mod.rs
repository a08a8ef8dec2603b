//! Domain layer: configuration, errors and the exchange lifecycle.

pub mod config;
pub mod error;
pub mod state;

pub use config::{ConfigError, ExchangeConfig, PartyConfig, SweepConfig, TimeoutConfig};
pub use error::{outcomes, ExchangeError};
pub use state::{ExchangeReceipt, ExchangeState};
