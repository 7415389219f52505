use log::{debug, trace, warn};
use resman_core::{
    Address, Application, EventListener, Message, MessageId, Scenario, SimTime, Transport,
    TransportError,
    config::{Config, ConfigError, DestinationRange},
};
use std::{collections::BTreeMap, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("Invalid scenario: {0}")]
    Config(#[from] ConfigError),

    #[error("The step duration must be greater than zero")]
    ZeroStep,

    #[error("Node {host} is not part of the world {range}")]
    UnknownHost {
        host: Address,
        range: DestinationRange,
    },

    #[error("Message ({id}) is addressed to {to}, outside of the world {range}")]
    Unreachable {
        id: MessageId,
        to: Address,
        range: DestinationRange,
    },
}

/// Messages stored on every node of the world
///
/// This is what the applications see through the [`Transport`] trait:
/// sending stores the message on the sending node, deleting removes it.
#[derive(Debug)]
struct Stores {
    hosts: BTreeMap<Address, Vec<Message>>,
}

impl Stores {
    fn new(range: DestinationRange) -> Self {
        Self {
            hosts: range.addresses().map(|host| (host, Vec::new())).collect(),
        }
    }

    fn take(&mut self, host: Address, id: &MessageId) -> Option<Message> {
        let messages = self.hosts.get_mut(&host)?;
        let index = messages.iter().position(|message| message.id() == id)?;
        Some(messages.remove(index))
    }

    fn put(&mut self, host: Address, message: Message) {
        if let Some(messages) = self.hosts.get_mut(&host) {
            messages.push(message)
        } else {
            warn!("node {host} is unknown, dropping {message}");
        }
    }

    /// every stored message as `(host, id)`, by host then arrival order
    fn snapshot(&self) -> Vec<(Address, MessageId)> {
        self.hosts
            .iter()
            .flat_map(|(host, messages)| {
                messages
                    .iter()
                    .map(move |message| (*host, message.id().clone()))
            })
            .collect()
    }
}

impl Transport for Stores {
    fn send(&mut self, host: Address, message: Message) {
        trace!("node {host}: storing {message}");
        self.put(host, message)
    }

    fn delete(&mut self, host: Address, id: &MessageId) -> Result<(), TransportError> {
        if !self.hosts.contains_key(&host) {
            return Err(TransportError::UnknownHost { host });
        }

        self.take(host, id)
            .map(|_| ())
            .ok_or_else(|| TransportError::NotFound {
                host,
                id: id.clone(),
            })
    }
}

/// A deterministic host for the resource management applications
///
/// Every address of the destination range runs an [`Application`]. The
/// nodes are laid out on a ring: on every step each stored message moves
/// one hop forward, toward its destination, where it is handed to the
/// receiving node's [`Application::handle`]. There is no mobility, no
/// contact schedule and no link capacity; the only thing limiting the
/// traffic is the nodes' buffers.
///
/// A step is:
///
/// 1. advance the clock by the step duration;
/// 2. tick every application, by ascending address;
/// 3. move every message stored before the relay one hop forward.
///
/// ```
/// use resman::{Reporter, World, config::{Config, DestinationRange}};
/// use std::time::Duration;
///
/// let mut world = World::new(
///     Config {
///         destination_range: DestinationRange::new(0, 10),
///         interval: Duration::from_secs(10),
///         percentage_of_servers: 20,
///         client_buffer_size: 1_000,
///         server_buffer_size: 1_000,
///         ..Config::default()
///     },
///     Duration::from_secs(1),
/// )
/// .unwrap();
///
/// let mut reporter = Reporter::default();
/// world.run_until(Duration::from_secs(100), &mut reporter);
///
/// assert!(reporter.requests_sent > 0);
/// ```
#[derive(Debug)]
pub struct World {
    scenario: Scenario,
    step: Duration,
    now: SimTime,

    apps: BTreeMap<Address, Application>,
    stores: Stores,
}

impl World {
    /// create the world of `config`, advancing by `step` at a time
    ///
    /// # Errors
    ///
    /// if the configuration is invalid or `step` is zero
    pub fn new(config: Config, step: Duration) -> Result<Self, WorldError> {
        Self::with_scenario(Scenario::new(config)?, step)
    }

    pub fn with_scenario(scenario: Scenario, step: Duration) -> Result<Self, WorldError> {
        if step.is_zero() {
            return Err(WorldError::ZeroStep);
        }

        let range = scenario.config().destination_range;
        let apps = scenario
            .applications()
            .map(|app| (app.address(), app))
            .collect();

        Ok(Self {
            step,
            now: SimTime::ZERO,
            apps,
            stores: Stores::new(range),
            scenario,
        })
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn application(&self, host: Address) -> Option<&Application> {
        self.apps.get(&host)
    }

    pub fn applications(&self) -> impl Iterator<Item = &Application> + '_ {
        self.apps.values()
    }

    /// messages currently stored on `host`, in arrival order
    pub fn stored(&self, host: Address) -> impl Iterator<Item = &Message> + '_ {
        self.stores.hosts.get(&host).into_iter().flatten()
    }

    /// number of messages stored in the whole world
    pub fn in_flight(&self) -> usize {
        self.stores.hosts.values().map(Vec::len).sum()
    }

    /// Store a message on `host` as if it had been created there.
    ///
    /// The applications are not involved: this is how traffic from
    /// other protocols enters the world.
    ///
    /// # Errors
    ///
    /// if `host` or the message's destination are outside the world
    pub fn inject(&mut self, host: Address, message: Message) -> Result<(), WorldError> {
        let range = self.scenario.config().destination_range;
        if !range.contains(host) {
            return Err(WorldError::UnknownHost { host, range });
        }
        if !range.contains(message.to()) {
            return Err(WorldError::Unreachable {
                id: message.id().clone(),
                to: message.to(),
                range,
            });
        }

        self.stores.put(host, message);
        Ok(())
    }

    /// run steps until the clock reaches `until`
    pub fn run_until<L>(&mut self, until: Duration, listener: &mut L)
    where
        L: EventListener + ?Sized,
    {
        let until = SimTime::new(until);
        while self.now < until {
            self.advance(listener);
        }
    }

    /// execute one step
    pub fn advance<L>(&mut self, listener: &mut L)
    where
        L: EventListener + ?Sized,
    {
        self.now += self.step;
        let now = self.now;

        for app in self.apps.values_mut() {
            app.tick(now, &mut self.stores, listener);
        }

        for (host, id) in self.stores.snapshot() {
            // evicted since the snapshot
            let Some(message) = self.stores.take(host, &id) else {
                continue;
            };
            if let Some(app) = self.apps.get_mut(&host) {
                app.remove(&id);
            }

            let next = self.next_hop(host, message.to());
            let Some(app) = self.apps.get_mut(&next) else {
                warn!("node {next} is unknown, dropping {message}");
                continue;
            };

            match app.handle(now, message, &mut self.stores, listener) {
                Some(message) if message.to() == next => {
                    debug!("node {next}: delivered {message}")
                }
                Some(message) => self.stores.put(next, message),
                None => (),
            }
        }
    }

    /// one hop forward on the ring, or stay if already there
    fn next_hop(&self, host: Address, to: Address) -> Address {
        if host == to {
            return host;
        }

        let range = self.scenario.config().destination_range;
        let next = host.get() + 1;
        if next >= range.max.get() {
            range.min
        } else {
            Address::new(next)
        }
    }
}
