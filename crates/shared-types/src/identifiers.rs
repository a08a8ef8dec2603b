//! # Identifiers
//!
//! Participant, document-type and process identifiers share one shape: a
//! scheme plus a value. They are compared by value, never by reference.
//!
//! The URI-encoded form is `scheme::value`. Only the first separator splits,
//! since document-type values routinely contain `::` themselves.

use crate::errors::IdentifierError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between scheme and value in the URI-encoded form.
pub const SCHEME_SEPARATOR: &str = "::";

/// A scheme-qualified identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier {
    scheme: String,
    value: String,
}

impl Identifier {
    /// Create an identifier, rejecting empty parts.
    pub fn new(
        scheme: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, IdentifierError> {
        let scheme = scheme.into();
        let value = value.into();

        if scheme.trim().is_empty() {
            return Err(IdentifierError::EmptyScheme { value });
        }
        if value.trim().is_empty() {
            return Err(IdentifierError::EmptyValue { scheme });
        }

        Ok(Self { scheme, value })
    }

    /// Parse the URI-encoded `scheme::value` form.
    pub fn parse_uri_encoded(encoded: &str) -> Result<Self, IdentifierError> {
        match encoded.split_once(SCHEME_SEPARATOR) {
            Some((scheme, value)) => Self::new(scheme, value),
            None => Err(IdentifierError::MissingSeparator(encoded.to_string())),
        }
    }

    /// The identifier scheme.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The identifier value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The URI-encoded `scheme::value` form.
    #[must_use]
    pub fn uri_encoded(&self) -> String {
        format!("{}{}{}", self.scheme, SCHEME_SEPARATOR, self.value)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.scheme, SCHEME_SEPARATOR, self.value)
    }
}
