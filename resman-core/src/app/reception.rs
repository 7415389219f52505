use super::Application;
use crate::{Event, EventListener, Message, MessageKind, SimTime, Transport};
use log::{debug, trace};

impl Application {
    /// Reception handler, called by the host for every message arriving
    /// at this node.
    ///
    /// Returns the message to keep relaying, or `None` if this node
    /// consumed it.
    ///
    /// | message | action |
    /// |---|---|
    /// | no resource management tag | returned untouched |
    /// | transit request or unidirectional | buffered under its source |
    /// | transit response | buffered under its destination in proxy mode, its source otherwise |
    /// | request for this node | answered with a response, consumed |
    /// | response or unidirectional for this node | consumed |
    pub fn handle<T, L>(
        &mut self,
        now: SimTime,
        message: Message,
        transport: &mut T,
        listener: &mut L,
    ) -> Option<Message>
    where
        T: Transport + ?Sized,
        L: EventListener + ?Sized,
    {
        let Some(kind) = message.kind() else {
            trace!("node {}: ignoring untagged {message}", self.address);
            return Some(message);
        };

        if message.to() != self.address {
            self.buffer_transit(now, kind, &message, transport);
            return Some(message);
        }

        debug!("node {}: received {message}", self.address);
        listener.on_event(self.address, Event::got(kind));

        if let Some(response) = kind.response() {
            self.respond(now, response, &message, transport, listener);
        }

        None
    }

    fn buffer_transit<T>(
        &mut self,
        now: SimTime,
        kind: MessageKind,
        message: &Message,
        transport: &mut T,
    ) where
        T: Transport + ?Sized,
    {
        let partition = if kind.is_response() {
            self.response_partition(message)
        } else {
            message.from()
        };

        self.buffer.admit(partition, message.received_at(now), transport);
    }

    fn respond<T, L>(
        &mut self,
        now: SimTime,
        kind: MessageKind,
        request: &Message,
        transport: &mut T,
        listener: &mut L,
    ) where
        T: Transport + ?Sized,
        L: EventListener + ?Sized,
    {
        let size = self.draw_size(kind);
        let id = self.next_id(kind, now, request.from());
        let response = Message::builder(self.address, request.from())
            .id(id)
            .kind(kind)
            .created(now)
            .size(size)
            .build();

        debug!(
            "node {}: answering {} with {response}",
            self.address,
            request.id()
        );

        let partition = self.response_partition(&response);
        self.buffer.admit(partition, response.clone(), transport);
        transport.send(self.address, response);
        listener.on_event(self.address, Event::sent(kind));
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        Address, Event, Message, MessageId, MessageKind, Scenario, SimTime, Transport,
        TransportError,
        app::tests::{config, first_client},
        config::Config,
        testing::MockTransport,
    };

    fn request(scenario: &Scenario, from: Address, kind: MessageKind) -> (Address, Message) {
        let server = scenario.roles().servers()[0];
        let message = Message::builder(from, server)
            .kind(kind)
            .created(SimTime::from_secs(5))
            .size(15)
            .build();
        (server, message)
    }

    #[test]
    fn request_produces_exactly_one_response() {
        let scenario = Scenario::new(config()).unwrap();
        let client = first_client(&scenario);
        let (server, request) = request(&scenario, client, MessageKind::Request);
        let mut app = scenario.application(server);
        let mut transport = MockTransport::default();
        let mut events: Vec<(Address, Event)> = Vec::new();

        let relayed = app.handle(SimTime::from_secs(7), request, &mut transport, &mut events);

        assert!(relayed.is_none());
        assert_eq!(events, [(server, Event::GotRequest), (server, Event::SentResponse)]);
        assert_eq!(transport.sent.len(), 1);

        let (host, response) = &transport.sent[0];
        assert_eq!(*host, server);
        assert_eq!(response.kind(), Some(MessageKind::Response));
        assert_eq!(response.from(), server);
        assert_eq!(response.to(), client);
        assert_eq!(response.created(), SimTime::from_secs(7));
        assert!((100..200).contains(&response.size()));
        assert_eq!(response.id().as_str(), format!("response7-{server}-{client}"));
    }

    #[test]
    fn res_hog_request_gets_res_hog_response() {
        let scenario = Scenario::new(config()).unwrap();
        let hog = scenario.roles().res_hogs()[0];
        let (server, request) = request(&scenario, hog, MessageKind::RequestResHog);
        let mut app = scenario.application(server);
        let mut transport = MockTransport::default();
        let mut events: Vec<(Address, Event)> = Vec::new();

        app.handle(SimTime::from_secs(7), request, &mut transport, &mut events);

        assert_eq!(
            events,
            [
                (server, Event::GotRequestResHog),
                (server, Event::SentResponseResHog),
            ]
        );
        assert_eq!(transport.sent[0].1.kind(), Some(MessageKind::ResponseResHog));
    }

    #[test]
    fn same_tick_responses_get_distinct_ids() {
        let scenario = Scenario::new(config()).unwrap();
        let client = first_client(&scenario);
        let (server, first) = request(&scenario, client, MessageKind::Request);
        let second = Message::builder(client, server)
            .id("second request")
            .kind(MessageKind::Request)
            .created(SimTime::from_secs(6))
            .size(15)
            .build();
        let mut app = scenario.application(server);
        let mut transport = MockTransport::default();

        app.handle(SimTime::from_secs(7), first, &mut transport, &mut ());
        app.handle(SimTime::from_secs(7), second, &mut transport, &mut ());

        let ids: Vec<MessageId> = transport.sent.iter().map(|(_, m)| m.id().clone()).collect();
        assert_eq!(
            ids,
            [
                MessageId::new(format!("response7-{server}-{client}")),
                MessageId::new(format!("response7-{server}-{client}.1")),
            ]
        );
        assert!(ids.iter().all(|id| app.buffer().contains(id)));

        // removing one keeps the other accounted
        let removed = app.remove(&ids[0]).unwrap();
        assert_eq!(app.buffer().total_usage(), transport.sent[1].1.size());
        assert_eq!(removed.id(), &ids[0]);
        assert!(app.buffer().contains(&ids[1]));

        // the numbering starts over on the next tick
        let third = Message::builder(client, server)
            .kind(MessageKind::Request)
            .created(SimTime::from_secs(8))
            .size(15)
            .build();
        app.handle(SimTime::from_secs(8), third, &mut transport, &mut ());
        assert_eq!(transport.sent[2].1.id().as_str(), format!("response8-{server}-{client}"));
    }

    /// transport recording the order of the calls it receives
    #[derive(Default)]
    struct CallOrder {
        calls: Vec<&'static str>,
        inner: MockTransport,
    }

    impl Transport for CallOrder {
        fn send(&mut self, host: Address, message: Message) {
            self.calls.push("send");
            self.inner.send(host, message)
        }

        fn delete(&mut self, host: Address, id: &MessageId) -> Result<(), TransportError> {
            self.calls.push("delete");
            self.inner.delete(host, id)
        }
    }

    #[test]
    fn response_is_buffered_before_being_sent() {
        let scenario = Scenario::new(Config {
            server_buffer_size: 150,
            ..config()
        })
        .unwrap();
        let mut clients = scenario.roles().plain_clients();
        let (a, b) = (clients.next().unwrap(), clients.next().unwrap());
        let (server, request) = request(&scenario, a, MessageKind::Request);
        let mut app = scenario.application(server);
        let mut transport = CallOrder::default();

        let transit = Message::builder(a, b)
            .kind(MessageKind::Unidirectional)
            .size(100)
            .build();
        transport.inner.store(server, transit.clone());
        app.handle(SimTime::from_secs(6), transit.clone(), &mut transport, &mut ());

        // the response (at least 100 bytes) pushes the transit message out
        app.handle(SimTime::from_secs(7), request, &mut transport, &mut ());

        assert_eq!(transport.calls, ["delete", "send"]);
        assert_eq!(transport.inner.deleted, [(server, transit.id().clone())]);
        assert!(!app.buffer().contains(transit.id()));
    }

    #[test]
    fn response_is_buffered_under_source_without_proxy() {
        let scenario = Scenario::new(config()).unwrap();
        let client = first_client(&scenario);
        let (server, request) = request(&scenario, client, MessageKind::Request);
        let mut app = scenario.application(server);
        let mut transport = MockTransport::default();

        app.handle(SimTime::from_secs(7), request, &mut transport, &mut ());

        let response = &transport.sent[0].1;
        assert!(app.buffer().contains(response.id()));
        assert_eq!(
            app.buffer().partitions().collect::<Vec<_>>(),
            [(server, response.size())]
        );
    }

    #[test]
    fn response_is_buffered_under_destination_with_proxy() {
        let scenario = Scenario::new(Config {
            simulate_proxy_signatures: true,
            ..config()
        })
        .unwrap();
        let client = first_client(&scenario);
        let (server, request) = request(&scenario, client, MessageKind::Request);
        let mut app = scenario.application(server);
        let mut transport = MockTransport::default();

        app.handle(SimTime::from_secs(7), request, &mut transport, &mut ());

        assert_eq!(
            app.buffer().partitions().map(|(p, _)| p).collect::<Vec<_>>(),
            [client]
        );
    }

    #[test]
    fn transit_messages_are_buffered_and_relayed() {
        let scenario = Scenario::new(config()).unwrap();
        let mut clients = scenario.roles().plain_clients();
        let (a, b, relay) = (
            clients.next().unwrap(),
            clients.next().unwrap(),
            clients.next().unwrap(),
        );
        let mut app = scenario.application(relay);
        let mut transport = MockTransport::default();
        let mut events: Vec<(Address, Event)> = Vec::new();

        for (kind, from, to) in [
            (MessageKind::Unidirectional, a, b),
            (MessageKind::Request, a, b),
            (MessageKind::Response, b, a),
        ] {
            let message = Message::builder(from, to)
                .kind(kind)
                .created(SimTime::from_secs(1))
                .size(10)
                .build();
            let relayed = app
                .handle(SimTime::from_secs(3), message.clone(), &mut transport, &mut events)
                .unwrap();

            assert_eq!(relayed, message);
            let buffered = app
                .buffer()
                .messages(from)
                .find(|m| m.id() == message.id())
                .unwrap();
            assert_eq!(buffered.received(), SimTime::from_secs(3));
        }

        assert!(events.is_empty());
        assert!(transport.sent.is_empty());
        assert_eq!(app.buffer().usage(a), 20);
        assert_eq!(app.buffer().usage(b), 10);
    }

    #[test]
    fn transit_response_with_proxy_goes_to_destination_partition() {
        let scenario = Scenario::new(Config {
            simulate_proxy_signatures: true,
            ..config()
        })
        .unwrap();
        let mut clients = scenario.roles().plain_clients();
        let (a, b, relay) = (
            clients.next().unwrap(),
            clients.next().unwrap(),
            clients.next().unwrap(),
        );
        let mut app = scenario.application(relay);
        let mut transport = MockTransport::default();

        let response = Message::builder(b, a)
            .kind(MessageKind::ResponseResHog)
            .size(10)
            .build();
        let request = Message::builder(b, a)
            .kind(MessageKind::RequestResHog)
            .size(5)
            .build();
        app.handle(SimTime::from_secs(3), response, &mut transport, &mut ());
        app.handle(SimTime::from_secs(3), request, &mut transport, &mut ());

        assert_eq!(app.buffer().usage(a), 10);
        assert_eq!(app.buffer().usage(b), 5);
    }

    #[test]
    fn terminating_messages_are_consumed() {
        let scenario = Scenario::new(config()).unwrap();
        let mut clients = scenario.roles().plain_clients();
        let (a, b) = (clients.next().unwrap(), clients.next().unwrap());
        let mut app = scenario.application(b);
        let mut transport = MockTransport::default();
        let mut events: Vec<(Address, Event)> = Vec::new();

        for kind in [
            MessageKind::Response,
            MessageKind::ResponseResHog,
            MessageKind::Unidirectional,
        ] {
            let message = Message::builder(a, b).kind(kind).size(10).build();
            let relayed = app.handle(SimTime::from_secs(3), message, &mut transport, &mut events);
            assert!(relayed.is_none());
        }

        assert_eq!(
            events,
            [
                (b, Event::GotResponse),
                (b, Event::GotResponseResHog),
                (b, Event::GotUnidirectional),
            ]
        );
        assert!(app.buffer().is_empty());
        assert!(transport.sent.is_empty());
    }

    #[test]
    fn untagged_messages_pass_through() {
        let scenario = Scenario::new(config()).unwrap();
        let client = first_client(&scenario);
        let server = scenario.roles().servers()[0];
        let mut app = scenario.application(server);
        let mut transport = MockTransport::default();
        let mut events: Vec<(Address, Event)> = Vec::new();

        for to in [server, client] {
            let message = Message::builder(client, to).size(10).build();
            let relayed = app
                .handle(SimTime::from_secs(3), message.clone(), &mut transport, &mut events)
                .unwrap();
            assert_eq!(relayed, message);
        }

        assert!(events.is_empty());
        assert!(app.buffer().is_empty());
        assert!(transport.sent.is_empty());
    }

    #[test]
    fn host_removal_keeps_buffer_in_sync() {
        let scenario = Scenario::new(config()).unwrap();
        let mut clients = scenario.roles().plain_clients();
        let (a, b, relay) = (
            clients.next().unwrap(),
            clients.next().unwrap(),
            clients.next().unwrap(),
        );
        let mut app = scenario.application(relay);
        let mut transport = MockTransport::default();

        let message = Message::builder(a, b)
            .kind(MessageKind::Unidirectional)
            .size(10)
            .build();
        app.handle(SimTime::from_secs(3), message.clone(), &mut transport, &mut ());
        assert!(app.buffer().contains(message.id()));

        assert!(app.remove(message.id()).is_some());
        assert!(app.remove(message.id()).is_none());
        assert!(app.buffer().is_empty());
    }

    #[test]
    fn responses_evict_when_buffer_is_full() {
        let scenario = Scenario::new(Config {
            server_buffer_size: 250,
            ..config()
        })
        .unwrap();
        let client = first_client(&scenario);
        let server = scenario.roles().servers()[0];
        let mut app = scenario.application(server);
        let mut transport = MockTransport::default();

        for t in 0..10 {
            let message = Message::builder(client, server)
                .kind(MessageKind::Request)
                .created(SimTime::from_secs(t))
                .size(15)
                .build();
            app.handle(SimTime::from_secs(t), message, &mut transport, &mut ());
            assert!(app.buffer().total_usage() <= 250);
        }

        assert_eq!(transport.sent.len(), 10);
        assert!(!transport.deleted.is_empty());
    }
}
