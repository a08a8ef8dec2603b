//! Exchange configuration with validation.
//!
//! ```toml
//! message_id_domain = "ap.example.org"
//!
//! [local_party]
//! party_id = "sender-01"
//! role = "http://docs.oasis-open.org/ebxml-msg/ebms/v3.0/ns/core/200704/initiator"
//!
//! [gateway_party]
//! party_id = "gateway-01"
//! party_id_type = "urn:oasis:names:tc:ebcore:partyid-type:unregistered"
//! role = "http://docs.oasis-open.org/ebxml-msg/ebms/v3.0/ns/core/200704/responder"
//!
//! [timeouts]
//! wait_ms = 20000
//!
//! [sweep]
//! period_ms = 300000
//! expiry_ms = 300000
//! abandoned_expiry_ms = 3600000
//! ```

use as4_codec::constants::{INITIATOR_ROLE, RESPONDER_ROLE};
use as4_codec::{CodecConfig, DEFAULT_MESSAGE_ID_DOMAIN};
use as4_correlation::SweepPolicy;
use serde::{Deserialize, Serialize};
use shared_types::Party;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding [`TimeoutConfig::wait_ms`].
pub const ENV_WAIT_TIMEOUT_MS: &str = "AS4_WAIT_TIMEOUT_MS";

/// Environment variable overriding [`ExchangeConfig::message_id_domain`].
pub const ENV_MESSAGE_ID_DOMAIN: &str = "AS4_MESSAGE_ID_DOMAIN";

/// Main exchange configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// `From` party of outbound envelopes
    pub local_party: PartyConfig,
    /// `To` party of outbound envelopes (the local gateway)
    pub gateway_party: PartyConfig,
    /// Acknowledgement wait configuration
    pub timeouts: TimeoutConfig,
    /// Correlation table sweep configuration
    pub sweep: SweepConfig,
    /// Suffix of generated message ids
    pub message_id_domain: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            local_party: PartyConfig {
                party_id: "as4-sender".to_string(),
                party_id_type: None,
                role: INITIATOR_ROLE.to_string(),
            },
            gateway_party: PartyConfig {
                party_id: "as4-gateway".to_string(),
                party_id_type: None,
                role: RESPONDER_ROLE.to_string(),
            },
            timeouts: TimeoutConfig::default(),
            sweep: SweepConfig::default(),
            message_id_domain: DEFAULT_MESSAGE_ID_DOMAIN.to_string(),
        }
    }
}

impl ExchangeConfig {
    /// Parse configuration from a TOML string. Missing keys take defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_toml_str(&content)
    }

    /// Apply `AS4_WAIT_TIMEOUT_MS` and `AS4_MESSAGE_ID_DOMAIN` if set.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_WAIT_TIMEOUT_MS) {
            self.timeouts.wait_ms =
                value.trim().parse().map_err(|_| ConfigError::InvalidEnvironment {
                    name: ENV_WAIT_TIMEOUT_MS,
                    value: value.clone(),
                })?;
        }
        if let Some(value) = lookup(ENV_MESSAGE_ID_DOMAIN) {
            self.message_id_domain = value;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.local_party.validate("local_party")?;
        self.gateway_party.validate("gateway_party")?;

        if self.sweep.period_ms == 0 {
            return Err(ConfigError::InvalidSweep("period_ms cannot be 0".into()));
        }

        if self.sweep.expiry_ms == 0 {
            return Err(ConfigError::InvalidSweep("expiry_ms cannot be 0".into()));
        }

        if self.sweep.abandoned_expiry_ms == Some(0) {
            return Err(ConfigError::InvalidSweep("abandoned_expiry_ms cannot be 0".into()));
        }

        if self.message_id_domain.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "message_id_domain cannot be empty".into(),
            ));
        }

        Ok(())
    }

    /// Codec settings derived from this configuration.
    pub fn codec_config(&self) -> CodecConfig {
        CodecConfig {
            local_party: self.local_party.to_party(),
            gateway_party: self.gateway_party.to_party(),
            message_id_domain: self.message_id_domain.clone(),
        }
    }
}

/// One ebMS3 party: id, optional id type and role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyConfig {
    pub party_id: String,
    #[serde(default)]
    pub party_id_type: Option<String>,
    pub role: String,
}

impl PartyConfig {
    fn validate(&self, section: &str) -> Result<(), ConfigError> {
        if self.party_id.trim().is_empty() {
            return Err(ConfigError::InvalidParty(format!(
                "{section}.party_id cannot be empty"
            )));
        }
        if self.role.trim().is_empty() {
            return Err(ConfigError::InvalidParty(format!(
                "{section}.role cannot be empty"
            )));
        }
        Ok(())
    }

    pub fn to_party(&self) -> Party {
        Party {
            party_id: self.party_id.clone(),
            party_id_type: self.party_id_type.clone(),
            role: self.role.clone(),
        }
    }
}

/// Acknowledgement wait configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-hop wait for an acknowledgement; 0 waits indefinitely
    pub wait_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { wait_ms: 20_000 }
    }
}

impl TimeoutConfig {
    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }
}

/// Correlation table sweep configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Interval between sweeps
    pub period_ms: u64,
    /// Age after which an unclaimed acknowledgement is dropped
    pub expiry_ms: u64,
    /// Age after which an empty cell nobody waits on is dropped (off when unset)
    pub abandoned_expiry_ms: Option<u64>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            period_ms: 300_000,
            expiry_ms: 300_000,
            abandoned_expiry_ms: None,
        }
    }
}

impl SweepConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn policy(&self) -> SweepPolicy {
        SweepPolicy {
            expiry: Duration::from_millis(self.expiry_ms),
            abandoned_expiry: self.abandoned_expiry_ms.map(Duration::from_millis),
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("cannot read {path}: {error}")]
    Io { path: String, error: String },
    /// Configuration file is not valid TOML for this schema
    #[error("cannot parse configuration: {0}")]
    Parse(String),
    /// Environment override holds an unusable value
    #[error("environment variable {name} has invalid value '{value}'")]
    InvalidEnvironment { name: &'static str, value: String },
    /// Party section incomplete
    #[error("invalid party: {0}")]
    InvalidParty(String),
    /// Sweep timings unusable
    #[error("invalid sweep: {0}")]
    InvalidSweep(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
