use super::Application;
use crate::{
    Address, Event, EventListener, Message, MessageId, MessageKind, SimTime, Transport,
    config::SizeRange, roles::Role,
};
use log::{debug, trace};

impl Application {
    /// Traffic generator, called by the host on every clock step.
    ///
    /// Once the node's interval (the resource hog interval for resource
    /// hogs) has elapsed since its last message, a new message is
    /// generated:
    ///
    /// * with `probabilityToSendRequest`% chance it's a request to a
    ///   random server, otherwise a unidirectional message to a random
    ///   non server node;
    /// * it is handed to the transport, buffered in the node's own
    ///   partition and announced with a `Sent*` [`Event`].
    ///
    /// Returns the identifier of the generated message, if any. Passive
    /// nodes never generate anything.
    pub fn tick<T, L>(
        &mut self,
        now: SimTime,
        transport: &mut T,
        listener: &mut L,
    ) -> Option<MessageId>
    where
        T: Transport + ?Sized,
        L: EventListener + ?Sized,
    {
        if self.config.passive {
            return None;
        }

        let res_hog = self.role == Role::ResourceHog;
        let (last, interval) = if res_hog {
            (self.clock.res_hog, self.config.interval_res_hogs)
        } else {
            (self.clock.normal, self.config.interval)
        };
        if now < last || now.saturating_since(last) < interval {
            return None;
        }

        let to = self.pick_destination();
        let kind = match (self.roles.is_server(to), res_hog) {
            (true, true) => MessageKind::RequestResHog,
            (true, false) => MessageKind::Request,
            (false, _) => MessageKind::Unidirectional,
        };
        let size = self.draw_size(kind);
        let id = self.next_id(kind, now, to);

        let message = Message::builder(self.address, to)
            .id(id)
            .kind(kind)
            .created(now)
            .size(size)
            .build();
        let id = message.id().clone();

        debug!("node {}: generated {message}", self.address);

        transport.send(self.address, message.clone());
        self.buffer.admit(self.address, message, transport);
        listener.on_event(self.address, Event::sent(kind));

        trace!("node {}: buffer {}", self.address, self.buffer);

        if res_hog {
            self.clock.res_hog = now;
        } else {
            self.clock.normal = now;
        }

        Some(id)
    }

    fn pick_destination(&mut self) -> Address {
        let server = if self.rng.percent(self.config.probability_to_send_request) {
            self.roles.random_server(&mut self.rng)
        } else {
            None
        };

        match server {
            Some(server) => server,
            None => self.roles.random_non_server(&mut self.rng),
        }
    }

    pub(super) fn draw_size(&mut self, kind: MessageKind) -> u64 {
        let SizeRange { min, max } = match kind {
            MessageKind::Request | MessageKind::RequestResHog => self.config.request_size,
            MessageKind::Response | MessageKind::ResponseResHog => self.config.response_size,
            MessageKind::Unidirectional => self.config.unidirectional_size,
        };
        self.rng.range(min, max)
    }
}
