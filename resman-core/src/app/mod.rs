mod generator;
mod reception;

use crate::{
    Address, Message, MessageId, MessageKind, PartitionedBuffer, SimRng, SimTime,
    config::Config,
    roles::{Role, Roles},
};
use std::{collections::BTreeMap, sync::Arc};

/// The resource management application running on one node
///
/// The host simulator drives it with two callbacks:
///
/// * [`Application::tick`] on every step of the logical clock, which
///   may generate a new message (the traffic generator);
/// * [`Application::handle`] for every message the node receives, which
///   buffers transit traffic and answers requests addressed to this node.
///
/// When the host drops a message from the node for its own reasons
/// (delivered, forwarded, expired) it must call [`Application::remove`]
/// so the partitioned buffer stays in sync.
///
/// Applications are created by a [`Scenario`].
///
/// [`Scenario`]: crate::Scenario
#[derive(Debug, Clone)]
pub struct Application {
    address: Address,
    role: Role,

    config: Arc<Config>,
    roles: Arc<Roles>,

    buffer: PartitionedBuffer,
    rng: SimRng,
    clock: SendClock,
    issued: IssuedIds,
}

/// time of the last generated message, one per send interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SendClock {
    normal: SimTime,
    res_hog: SimTime,
}

/// identifiers already handed out at `time`, per kind and destination
#[derive(Debug, Clone, PartialEq, Eq)]
struct IssuedIds {
    time: SimTime,
    repeats: BTreeMap<(MessageKind, Address), u32>,
}

impl Application {
    pub(crate) fn new(
        address: Address,
        capacity: u64,
        config: Arc<Config>,
        roles: Arc<Roles>,
    ) -> Self {
        let clock = SendClock {
            normal: SimTime::new(config.offset),
            res_hog: SimTime::ZERO,
        };

        Self {
            address,
            role: roles.role_of(address),
            rng: SimRng::for_node(config.seed, address),
            buffer: PartitionedBuffer::new(address, capacity),
            config,
            roles,
            clock,
            issued: IssuedIds {
                time: SimTime::ZERO,
                repeats: BTreeMap::new(),
            },
        }
    }

    #[inline]
    pub fn address(&self) -> Address {
        self.address
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn buffer(&self) -> &PartitionedBuffer {
        &self.buffer
    }

    /// last time a message was generated on this node's interval
    pub fn last_sent(&self) -> SimTime {
        match self.role {
            Role::ResourceHog => self.clock.res_hog,
            Role::Server | Role::PlainClient => self.clock.normal,
        }
    }

    /// Forget a message the host no longer holds. Unknown identifiers are
    /// ignored.
    pub fn remove(&mut self, id: &MessageId) -> Option<Message> {
        self.buffer.remove(id)
    }

    /// identifier of a message this node creates at `now`
    ///
    /// The first message of a kind for `to` at a given time gets the
    /// plain identifier, the following ones are numbered.
    fn next_id(&mut self, kind: MessageKind, now: SimTime, to: Address) -> MessageId {
        if self.issued.time != now {
            self.issued.time = now;
            self.issued.repeats.clear();
        }

        let repeat = self.issued.repeats.entry((kind, to)).or_default();
        let id = MessageId::generate(kind, now, self.address, to, *repeat);
        *repeat += 1;
        id
    }

    /// partition a response is buffered under
    ///
    /// With proxy signatures the node can attribute the response to its
    /// destination, otherwise only to its source.
    fn response_partition(&self, response: &Message) -> Address {
        if self.config.simulate_proxy_signatures {
            response.to()
        } else {
            response.from()
        }
    }
}
