use crate::{Address, Message, MessageId, Transport, TransportError};
use std::collections::BTreeMap;

/// In memory transport keeping track of everything the application asks
/// of it.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    pub stored: BTreeMap<Address, Vec<Message>>,
    pub sent: Vec<(Address, Message)>,
    pub deleted: Vec<(Address, MessageId)>,
    pub not_found: Vec<(Address, MessageId)>,
}

impl MockTransport {
    pub fn store(&mut self, host: Address, message: Message) {
        self.stored.entry(host).or_default().push(message);
    }
}

impl Transport for MockTransport {
    fn send(&mut self, host: Address, message: Message) {
        self.store(host, message.clone());
        self.sent.push((host, message));
    }

    fn delete(&mut self, host: Address, id: &MessageId) -> Result<(), TransportError> {
        let messages = self.stored.entry(host).or_default();
        match messages.iter().position(|message| message.id() == id) {
            Some(index) => {
                messages.remove(index);
                self.deleted.push((host, id.clone()));
                Ok(())
            }
            None => {
                self.not_found.push((host, id.clone()));
                Err(TransportError::NotFound {
                    host,
                    id: id.clone(),
                })
            }
        }
    }
}
