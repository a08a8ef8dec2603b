//! # Shared Types Crate
//!
//! The model shared by the wire codec, the correlation table and the
//! exchange coordinator.
//!
//! ## Design Principles
//!
//! - **Value identity**: identifiers compare by scheme and value.
//! - **Validated construction**: a `BusinessMessage` can only be obtained
//!   through its builder, which rejects incomplete messages.
//! - **Envelope without payload**: payload bytes travel as attachments
//!   referenced from the envelope by content id.

pub mod entities;
pub mod envelope;
pub mod errors;
pub mod identifiers;
pub mod notification;
pub mod routing;

pub use entities::{BusinessMessage, BusinessMessageBuilder, Payload};
pub use envelope::{
    Attachment, CollaborationInfo, ErrorRecord, MessageInfo, PartInfo, Party, PartyInfo, Property,
    PropertyBag, Service, WireEnvelope,
};
pub use errors::*;
pub use identifiers::Identifier;
pub use notification::{AckResult, ErrorDetail, Notification, NotificationKind};
pub use routing::{DeliveryTarget, RoutingInformation};
