use crate::{Address, Message, MessageId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The message isn't (or no longer) stored on the node. Callers
    /// removing a message treat this as success.
    #[error("Message ({id}) not found on node {host}")]
    NotFound { host: Address, id: MessageId },

    #[error("Node {host} is unknown to the transport")]
    UnknownHost { host: Address },
}

/// The host simulator's message transport
///
/// The resource management application doesn't move messages itself. It
/// creates them and evicts them; actually carrying them between nodes is
/// the host's job.
pub trait Transport {
    /// hand a freshly created message to `host` for delivery
    fn send(&mut self, host: Address, message: Message);

    /// drop a message from `host`'s store
    ///
    /// # Errors
    ///
    /// [`TransportError::NotFound`] if `host` doesn't hold the message
    /// (it may already have been delivered or dropped).
    fn delete(&mut self, host: Address, id: &MessageId) -> Result<(), TransportError>;
}
