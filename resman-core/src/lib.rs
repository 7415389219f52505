/*!
# DTN resource management

Per node application of a delay tolerant network simulation in which
clients exchange requests and responses with servers while "resource
hogs" flood the network on a shorter interval.

Every node keeps a [`PartitionedBuffer`]: the bytes it carries on behalf
of other nodes are accounted per partition (the node a message is
attributed to) and when the buffer goes over its capacity the oldest
message of the largest partition is evicted. A single node can't push
everyone else's traffic out of a relay.

The host simulator stays in charge of the network: it moves messages
around through a [`Transport`] and calls the [`Application`] of each
node on every clock tick and for every message received. Counters are
reported as [`Event`]s.

```
use resman_core::{
    Address, Event, Message, MessageId, Scenario, SimTime, Transport, TransportError,
    config::{Config, DestinationRange},
};

/// a host that never delivers anything
#[derive(Default)]
struct Outbox(Vec<Message>);

impl Transport for Outbox {
    fn send(&mut self, _host: Address, message: Message) {
        self.0.push(message);
    }

    fn delete(&mut self, host: Address, id: &MessageId) -> Result<(), TransportError> {
        let index = self
            .0
            .iter()
            .position(|message| message.id() == id)
            .ok_or_else(|| TransportError::NotFound { host, id: id.clone() })?;
        self.0.remove(index);
        Ok(())
    }
}

let scenario = Scenario::new(Config {
    destination_range: DestinationRange::new(0, 20),
    percentage_of_servers: 10,
    client_buffer_size: 100,
    server_buffer_size: 100,
    ..Config::default()
})
.unwrap();

let mut app = scenario.application(Address::new(4));
let mut outbox = Outbox::default();
let mut events: Vec<(Address, Event)> = Vec::new();
for secs in 0..=1_000 {
    app.tick(SimTime::from_secs(secs), &mut outbox, &mut events);
}
// one message every 500s
assert_eq!(outbox.0.len(), 2);
assert_eq!(events.len(), 2);
```
*/

mod address;
mod app;
mod buffer;
pub mod config;
pub mod defaults;
mod event;
mod message;
mod rng;
pub mod roles;
pub mod scenario;
pub mod time;
mod transport;

#[cfg(test)]
mod testing;

pub use self::{
    address::Address,
    app::Application,
    buffer::PartitionedBuffer,
    event::{Event, EventListener},
    message::{APP_ID, Message, MessageBuilder, MessageId, MessageKind},
    rng::SimRng,
    roles::{Role, Roles},
    scenario::Scenario,
    time::SimTime,
    transport::{Transport, TransportError},
};
