use crate::{Address, MessageKind};
use std::fmt;

/// Events fired by the application on the event bus
///
/// They are the only counters the protocol exposes: a reporter
/// subscribes to them to compute delivery statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Event {
    SentRequest,
    GotRequest,
    SentResponse,
    GotResponse,
    SentRequestResHog,
    GotRequestResHog,
    SentResponseResHog,
    GotResponseResHog,
    SentUnidirectional,
    GotUnidirectional,
}

impl Event {
    pub const ALL: [Self; 10] = [
        Self::SentRequest,
        Self::GotRequest,
        Self::SentResponse,
        Self::GotResponse,
        Self::SentRequestResHog,
        Self::GotRequestResHog,
        Self::SentResponseResHog,
        Self::GotResponseResHog,
        Self::SentUnidirectional,
        Self::GotUnidirectional,
    ];

    /// the event fired when a message of the given kind is sent
    pub fn sent(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Request => Self::SentRequest,
            MessageKind::RequestResHog => Self::SentRequestResHog,
            MessageKind::Response => Self::SentResponse,
            MessageKind::ResponseResHog => Self::SentResponseResHog,
            MessageKind::Unidirectional => Self::SentUnidirectional,
        }
    }

    /// the event fired when a message of the given kind reaches its
    /// destination
    pub fn got(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Request => Self::GotRequest,
            MessageKind::RequestResHog => Self::GotRequestResHog,
            MessageKind::Response => Self::GotResponse,
            MessageKind::ResponseResHog => Self::GotResponseResHog,
            MessageKind::Unidirectional => Self::GotUnidirectional,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::SentRequest => "SentRequest",
            Self::GotRequest => "GotRequest",
            Self::SentResponse => "SentResponse",
            Self::GotResponse => "GotResponse",
            Self::SentRequestResHog => "SentRequestResHog",
            Self::GotRequestResHog => "GotRequestResHog",
            Self::SentResponseResHog => "SentResponseResHog",
            Self::GotResponseResHog => "GotResponseResHog",
            Self::SentUnidirectional => "SentUnidirectional",
            Self::GotUnidirectional => "GotUnidirectional",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Subscriber of the application [`Event`]s
///
/// `host` is the node on which the event happened.
///
/// Closures, `Vec<(Address, Event)>` (records everything) and `()`
/// (discards everything) are listeners.
pub trait EventListener {
    fn on_event(&mut self, host: Address, event: Event);
}

impl<F> EventListener for F
where
    F: FnMut(Address, Event),
{
    fn on_event(&mut self, host: Address, event: Event) {
        self(host, event)
    }
}

impl EventListener for Vec<(Address, Event)> {
    fn on_event(&mut self, host: Address, event: Event) {
        self.push((host, event))
    }
}

impl EventListener for () {
    fn on_event(&mut self, _host: Address, _event: Event) {}
}
