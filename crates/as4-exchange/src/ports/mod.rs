//! Ports: the transport the coordinator sends through and the handlers
//! the dispatcher delivers to.

pub mod inbound;
pub mod outbound;

pub use inbound::MessageHandler;
pub use outbound::{Transport, TransportError};
