//! Inbound port: application handlers for received business messages.

use shared_types::BusinessMessage;

/// Receives decoded business messages.
///
/// Returning an error (or panicking) is logged and counted by the
/// dispatcher; it never stops delivery to the remaining handlers.
pub trait MessageHandler: Send + Sync {
    fn on_message(&self, message: &BusinessMessage) -> anyhow::Result<()>;
}

impl<F> MessageHandler for F
where
    F: Fn(&BusinessMessage) -> anyhow::Result<()> + Send + Sync,
{
    fn on_message(&self, message: &BusinessMessage) -> anyhow::Result<()> {
        self(message)
    }
}
