/*!
# Resource management simulation

A minimal, deterministic host for the [`resman_core`] applications: the
nodes of the destination range sit on a ring, messages hop from one node
to the next until they reach their destination, and the [`Reporter`]
counts what was sent and what arrived.

*/

mod report;
mod world;

// convenient re-export of `resman_core` core objects
pub use resman_core::{
    Address, Application, Event, EventListener, Message, MessageId, MessageKind,
    PartitionedBuffer, Role, Scenario, SimTime, Transport, TransportError, config, time,
};

pub use self::{
    report::Reporter,
    world::{World, WorldError},
};
