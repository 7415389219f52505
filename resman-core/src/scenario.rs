use crate::{
    Address, Application,
    config::{Config, ConfigError},
    roles::{Role, Roles},
};
use std::sync::Arc;

/// A validated scenario: the configuration and the role of every node
///
/// This is the factory of the per node [`Application`]s. The roles are
/// drawn once, when the scenario is created, and shared (read only) by
/// all the applications it produces. Each application owns its buffer,
/// its send clocks and its random stream.
///
/// ```
/// use resman_core::{Address, Scenario, config::{Config, DestinationRange}};
///
/// let scenario = Scenario::new(Config {
///     destination_range: DestinationRange::new(0, 10),
///     percentage_of_servers: 20,
///     percentage_of_res_hogs: 20,
///     client_buffer_size: 100,
///     server_buffer_size: 1_000,
///     ..Config::default()
/// })
/// .unwrap();
///
/// let apps: Vec<_> = scenario.applications().collect();
/// assert_eq!(apps.len(), 10);
///
/// let server = scenario.roles().servers()[0];
/// assert_eq!(scenario.buffer_capacity(server), 1_000);
/// ```
#[derive(Debug, Clone)]
pub struct Scenario {
    config: Arc<Config>,
    roles: Arc<Roles>,
}

impl Scenario {
    /// # Errors
    ///
    /// see [`Config::validate`]
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let roles = Roles::assign(&config)?;
        Ok(Self {
            config: Arc::new(config),
            roles: Arc::new(roles),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn roles(&self) -> &Roles {
        &self.roles
    }

    /// servers get `serverBufferSize`, everyone else `clientBufferSize`
    pub fn buffer_capacity(&self, address: Address) -> u64 {
        match self.roles.role_of(address) {
            Role::Server => self.config.server_buffer_size,
            Role::ResourceHog | Role::PlainClient => self.config.client_buffer_size,
        }
    }

    /// a fresh, independent application for the node `address`
    pub fn application(&self, address: Address) -> Application {
        Application::new(
            address,
            self.buffer_capacity(address),
            Arc::clone(&self.config),
            Arc::clone(&self.roles),
        )
    }

    /// one application per address of the destination range
    pub fn applications(&self) -> impl Iterator<Item = Application> + '_ {
        self.config
            .destination_range
            .addresses()
            .map(|address| self.application(address))
    }
}
