use crate::{
    Address, SimRng,
    config::{Config, ConfigError, DestinationRange},
};
use log::info;
use std::{collections::BTreeSet, fmt};

/// The part a node plays in the scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// answers requests, gets the server buffer size
    Server,
    /// sends on the (usually shorter) resource hog interval
    ResourceHog,
    PlainClient,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server => f.pad("server"),
            Self::ResourceHog => f.pad("resource hog"),
            Self::PlainClient => f.pad("client"),
        }
    }
}

/// Assignment of a [`Role`] to every address of the destination range
///
/// Servers and resource hogs are drawn uniformly from the range by
/// rejection sampling: draws hitting an address that already has a role
/// are discarded. Every address that wasn't drawn is a plain client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roles {
    range: DestinationRange,
    /// in selection order
    servers: Vec<Address>,
    res_hogs: Vec<Address>,
    server_set: BTreeSet<Address>,
    res_hog_set: BTreeSet<Address>,
}

impl Roles {
    /// Draw the servers and resource hogs of `config`.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid, in particular if there
    /// are not enough addresses for the requested roles (the sampling
    /// would otherwise never end).
    pub fn assign(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let range = config.destination_range;
        let mut rng = SimRng::seed_from_u64(config.seed);

        let mut roles = Self {
            range,
            servers: Vec::new(),
            res_hogs: Vec::new(),
            server_set: BTreeSet::new(),
            res_hog_set: BTreeSet::new(),
        };

        for _ in 0..config.number_of_servers() {
            let address = roles.draw_free_address(&mut rng);
            roles.servers.push(address);
            roles.server_set.insert(address);
        }
        info!("Randomly chosen server nodes: {:?}", roles.servers);

        for _ in 0..config.number_of_res_hogs() {
            let address = roles.draw_free_address(&mut rng);
            roles.res_hogs.push(address);
            roles.res_hog_set.insert(address);
        }
        info!("Randomly chosen resource hogs: {:?}", roles.res_hogs);

        Ok(roles)
    }

    fn draw_free_address(&self, rng: &mut SimRng) -> Address {
        loop {
            let address = random_address(rng, self.range);
            if !self.server_set.contains(&address) && !self.res_hog_set.contains(&address) {
                return address;
            }
        }
    }

    pub fn range(&self) -> DestinationRange {
        self.range
    }

    pub fn role_of(&self, address: Address) -> Role {
        if self.is_server(address) {
            Role::Server
        } else if self.is_res_hog(address) {
            Role::ResourceHog
        } else {
            Role::PlainClient
        }
    }

    pub fn is_server(&self, address: Address) -> bool {
        self.server_set.contains(&address)
    }

    pub fn is_res_hog(&self, address: Address) -> bool {
        self.res_hog_set.contains(&address)
    }

    /// the servers, in the order they were drawn
    pub fn servers(&self) -> &[Address] {
        &self.servers
    }

    /// the resource hogs, in the order they were drawn
    pub fn res_hogs(&self) -> &[Address] {
        &self.res_hogs
    }

    /// the plain clients, by ascending address
    pub fn plain_clients(&self) -> impl Iterator<Item = Address> + '_ {
        self.range
            .addresses()
            .filter(|address| self.role_of(*address) == Role::PlainClient)
    }

    /// uniformly drawn server, `None` if there are no servers
    pub fn random_server(&self, rng: &mut SimRng) -> Option<Address> {
        if self.servers.is_empty() {
            return None;
        }
        let index = rng.below(self.servers.len() as u64) as usize;
        self.servers.get(index).copied()
    }

    /// uniformly drawn address that isn't a server
    ///
    /// Terminates because a valid configuration always leaves at least
    /// one plain client.
    pub fn random_non_server(&self, rng: &mut SimRng) -> Address {
        loop {
            let address = random_address(rng, self.range);
            if !self.is_server(address) {
                return address;
            }
        }
    }
}

/// uniformly drawn address of the range
pub(crate) fn random_address(rng: &mut SimRng, range: DestinationRange) -> Address {
    Address::new(range.min.get() + rng.below(u64::from(range.len())) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(range: (u32, u32), servers: u8, hogs: u8, seed: u64) -> Config {
        Config {
            destination_range: DestinationRange::new(range.0, range.1),
            percentage_of_servers: servers,
            percentage_of_res_hogs: hogs,
            seed,
            ..Config::default()
        }
    }

    #[test]
    fn ten_nodes() {
        let roles = Roles::assign(&config((0, 10), 20, 20, 1)).unwrap();

        assert_eq!(roles.servers().len(), 2);
        assert_eq!(roles.res_hogs().len(), 2);
        assert_eq!(roles.plain_clients().count(), 6);

        for hog in roles.res_hogs() {
            assert!(!roles.is_server(*hog));
            assert_eq!(roles.role_of(*hog), Role::ResourceHog);
        }
        for server in roles.servers() {
            assert!(roles.range().contains(*server));
            assert_eq!(roles.role_of(*server), Role::Server);
        }
    }

    #[test]
    fn disjoint_for_many_seeds() {
        for seed in 0..100 {
            let roles = Roles::assign(&config((3, 40), 30, 40, seed)).unwrap();

            // floor(40 * 30 / 100) and floor(40 * 40 / 100)
            assert_eq!(roles.servers().len(), 12);
            assert_eq!(roles.res_hogs().len(), 16);
            assert!(roles.server_set.is_disjoint(&roles.res_hog_set));
            assert_eq!(roles.server_set.len(), 12, "duplicated server");
            assert_eq!(roles.res_hog_set.len(), 16, "duplicated resource hog");
            assert!(roles.servers().iter().all(|a| a.get() >= 3 && a.get() < 40));
        }
    }

    #[test]
    fn deterministic() {
        let a = Roles::assign(&config((0, 100), 10, 10, 42)).unwrap();
        let b = Roles::assign(&config((0, 100), 10, 10, 42)).unwrap();
        assert_eq!(a, b);

        let c = Roles::assign(&config((0, 100), 10, 10, 43)).unwrap();
        assert_ne!(a.servers(), c.servers());
    }

    #[test]
    fn rejects_impossible_assignment() {
        assert!(matches!(
            Roles::assign(&config((0, 10), 50, 50, 0)),
            Err(ConfigError::TooManyRoles { .. })
        ));
    }

    #[test]
    fn random_server_and_non_server() {
        let roles = Roles::assign(&config((0, 10), 20, 20, 7)).unwrap();
        let mut rng = SimRng::seed_from_u64(0);

        for _ in 0..100 {
            let server = roles.random_server(&mut rng).unwrap();
            assert!(roles.is_server(server));

            let other = roles.random_non_server(&mut rng);
            assert!(!roles.is_server(other));
        }
    }

    #[test]
    fn no_server() {
        let roles = Roles::assign(&config((0, 10), 0, 20, 7)).unwrap();
        let mut rng = SimRng::seed_from_u64(0);

        assert!(roles.servers().is_empty());
        assert_eq!(roles.random_server(&mut rng), None);
    }
}
