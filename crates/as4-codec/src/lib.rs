//! # AS4 Wire Codec
//!
//! Lossless mapping between business messages and ebMS3/AS4-style wire
//! envelopes, and the reverse mapping for inbound traffic.
//!
//! ## Architecture
//!
//! ```text
//! BusinessMessage + RoutingInformation
//!            │ encode_outbound
//!            ▼
//!   WireEnvelope + Vec<Attachment> ──to_wire──► header bytes
//!            │                                      │
//!            │                           mime::package (SwA)
//!            ▼                                      ▼
//!      decode_inbound ◄──────── mime::unpackage ◄── multipart/related body
//!            │
//!            ├── Inbound::Message(DecodedMessage)
//!            └── Inbound::Notification(Notification)
//! ```
//!
//! ## Identifier resolution
//!
//! Participant, document type and process identifiers are read from the
//! property bag. A property carrying a `type` attribute is resolved directly;
//! one without it is parsed from its `scheme::value` form and the message is
//! flagged as degraded (see [`resolve`]).
//!
//! ## Usage
//!
//! ```ignore
//! use as4_codec::{Inbound, WireCodec};
//!
//! let codec = WireCodec::default();
//! let encoded = codec.encode_outbound(&routing, &message)?;
//! let raw = codec.to_wire(&encoded.envelope)?;
//! match codec.decode_inbound(&raw, encoded.attachments)? {
//!     Inbound::Message(decoded) => { /* deliver */ }
//!     Inbound::Notification(ack) => { /* fulfil */ }
//! }
//! ```

pub mod codec;
pub mod constants;
pub mod error;
pub mod inbound;
pub mod message_id;
pub mod mime;
pub mod outbound;
pub mod resolve;

pub use codec::{CodecConfig, WireCodec};
pub use error::{DecodeError, EncodeError, MimeError};
pub use inbound::{DecodedMessage, Inbound};
pub use message_id::{MessageIdGenerator, DEFAULT_MESSAGE_ID_DOMAIN};
pub use mime::MimeBody;
pub use outbound::EncodedMessage;
pub use resolve::{ResolutionPath, ResolvedIdentifier};
