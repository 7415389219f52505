use crate::{Address, SimTime};
use std::{fmt, sync::Arc};

/// Tag attached to every message produced by the resource management
/// application. Messages of other applications don't carry it.
pub const APP_ID: &str = "dtn.resman";

/// The protocol level type of a [`Message`]
///
/// Requests are only ever sent to servers. Anything sent to a non
/// server node is [`MessageKind::Unidirectional`]. Resource hogs use the
/// `*ResHog` variants so their traffic can be accounted separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageKind {
    Request,
    RequestResHog,
    Response,
    ResponseResHog,
    Unidirectional,
}

impl MessageKind {
    pub const ALL: [Self; 5] = [
        Self::Request,
        Self::RequestResHog,
        Self::Response,
        Self::ResponseResHog,
        Self::Unidirectional,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::RequestResHog => "request_reshog",
            Self::Response => "response",
            Self::ResponseResHog => "response_reshog",
            Self::Unidirectional => "unidirectional",
        }
    }

    pub fn is_response(self) -> bool {
        matches!(self, Self::Response | Self::ResponseResHog)
    }

    /// the kind of the response answering this request, `None` for
    /// anything that isn't a request
    pub fn response(self) -> Option<Self> {
        match self {
            Self::Request => Some(Self::Response),
            Self::RequestResHog => Some(Self::ResponseResHog),
            _ => None,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # [`Message`] Identifier
///
/// Identifiers are human readable: `<kind><time>-<source>-<destination>`
/// so a message can be traced in logs without a lookup table. Cloning is
/// cheap, the text is shared.
///
/// A node can create several messages of the same kind for the same
/// destination within one instant (two requests from one client
/// answered on the same tick). The [`Application`] numbers the repeats
/// with a `.<n>` suffix so identifiers stay unique per node:
/// `response7-2-0`, `response7-2-0.1`...
///
/// [`Application`]: crate::Application
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(Arc<str>);

impl MessageId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub(crate) fn generate(
        kind: MessageKind,
        time: SimTime,
        from: Address,
        to: Address,
        repeat: u32,
    ) -> Self {
        if repeat == 0 {
            Self::new(format!("{kind}{time}-{from}-{to}"))
        } else {
            Self::new(format!("{kind}{time}-{from}-{to}.{repeat}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// # A simulated DTN message
///
/// Messages are never mutated once built. The only thing that changes
/// as a message travels is the time it was received at the current
/// node, see [`Message::received_at`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    from: Address,
    to: Address,
    size: u64,
    created: SimTime,
    received: SimTime,
    kind: Option<MessageKind>,
    app_id: Option<&'static str>,
}

pub struct MessageBuilder {
    id: Option<MessageId>,
    from: Address,
    to: Address,
    size: u64,
    created: SimTime,
    kind: Option<MessageKind>,
    app_id: Option<&'static str>,
}

impl MessageBuilder {
    pub fn new(from: Address, to: Address) -> Self {
        Self {
            id: None,
            from,
            to,
            size: 0,
            created: SimTime::ZERO,
            kind: None,
            app_id: None,
        }
    }

    pub fn id(mut self, id: impl Into<MessageId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn created(mut self, created: SimTime) -> Self {
        self.created = created;
        self
    }

    /// set the protocol type and tag the message as ours
    pub fn kind(mut self, kind: MessageKind) -> Self {
        self.kind = Some(kind);
        self.app_id = Some(APP_ID);
        self
    }

    /// Without an explicit [`MessageBuilder::id`] the identifier is
    /// derived from the kind, creation time, source and destination.
    pub fn build(self) -> Message {
        let id = self.id.unwrap_or_else(|| match self.kind {
            Some(kind) => MessageId::generate(kind, self.created, self.from, self.to, 0),
            None => MessageId::new(format!("M{}-{}-{}", self.created, self.from, self.to)),
        });

        Message {
            id,
            from: self.from,
            to: self.to,
            size: self.size,
            created: self.created,
            received: self.created,
            kind: self.kind,
            app_id: self.app_id,
        }
    }
}

impl Message {
    pub fn builder(from: Address, to: Address) -> MessageBuilder {
        MessageBuilder::new(from, to)
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn from(&self) -> Address {
        self.from
    }

    pub fn to(&self) -> Address {
        self.to
    }

    /// size of the message in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn created(&self) -> SimTime {
        self.created
    }

    pub fn received(&self) -> SimTime {
        self.received
    }

    /// `None` if the message doesn't belong to this protocol
    pub fn kind(&self) -> Option<MessageKind> {
        self.kind
    }

    pub fn app_id(&self) -> Option<&'static str> {
        self.app_id
    }

    /// copy of the message as it was received at `time`
    #[must_use = "function does not modify the current value"]
    pub fn received_at(&self, time: SimTime) -> Self {
        Self {
            received: time,
            ..self.clone()
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}B {} -> {})", self.id, self.size, self.from, self.to)
    }
}
