//! Two-path identifier resolution.
//!
//! Current senders put the identifier value in the property and the scheme
//! in its `type` attribute. Older senders omit the attribute and put the
//! whole `scheme::value` form in the value. Both are accepted, but the
//! second is recorded as degraded so it stays visible in logs and results.

use crate::error::DecodeError;
use shared_types::{Identifier, PropertyBag};

/// Which path resolved an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPath {
    /// Scheme taken from the `type` attribute.
    Typed,
    /// Scheme parsed out of a `scheme::value` value.
    Parsed,
}

/// An identifier together with the path that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentifier {
    pub identifier: Identifier,
    pub path: ResolutionPath,
}

/// Resolve the identifier held by property `name`.
pub fn resolve_identifier(
    properties: &PropertyBag,
    name: &'static str,
) -> Result<ResolvedIdentifier, DecodeError> {
    let property = properties
        .get(name)
        .ok_or(DecodeError::MissingProperty { name })?;

    let (identifier, path) = match property.property_type.as_deref() {
        Some(scheme) if !scheme.is_empty() => (
            Identifier::new(scheme, property.value.as_str()),
            ResolutionPath::Typed,
        ),
        _ => (
            Identifier::parse_uri_encoded(&property.value),
            ResolutionPath::Parsed,
        ),
    };

    let identifier = identifier.map_err(|source| DecodeError::InvalidIdentifier { name, source })?;
    Ok(ResolvedIdentifier { identifier, path })
}
