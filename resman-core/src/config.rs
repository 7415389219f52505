//! Scenario configuration
//!
//! A [`Config`] is built once, validated, and handed to a
//! [`Scenario`] which then produces every node's application from it.
//! It can be written by hand (all fields are public) or parsed from the
//! `key = value` settings format:
//!
//! ```
//! use resman_core::config::Config;
//!
//! // 10 nodes, 2 servers, 2 resource hogs
//! let config: Config = "
//!     destinationRange = 0,10
//!     percentageOfServers = 20
//!     percentageOfResHogs = 20
//!     interval = 30s
//!     intervalResHogs = 5s
//!     clientBufferSize = 100
//! "
//! .parse()
//! .unwrap();
//!
//! assert_eq!(config.number_of_servers(), 2);
//! assert_eq!(config.number_of_res_hogs(), 2);
//! ```
//!
//! [`Scenario`]: crate::scenario::Scenario

use crate::{Address, defaults::*, time::parse_duration};
use anyhow::{anyhow, ensure};
use std::{fmt, ops::Range, str::FromStr, time::Duration};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown option `{option}'")]
    UnknownOption { option: String },

    #[error("Invalid value `{value}' for option `{option}': {reason}")]
    InvalidValue {
        option: &'static str,
        value: String,
        reason: String,
    },

    #[error("Expecting `key = value', got `{line}'")]
    MalformedLine { line: String },

    #[error("Destination range {range} is empty")]
    EmptyDestinationRange { range: DestinationRange },

    #[error("Option `{option}' is a percentage, {value} is over 100")]
    InvalidPercentage { option: &'static str, value: u8 },

    #[error("Size range `{option}' has its minimum ({min}) above its maximum ({max})")]
    InvalidSizeRange {
        option: &'static str,
        min: u64,
        max: u64,
    },

    #[error("Option `{option}' must be a non zero number of bytes")]
    ZeroBufferSize { option: &'static str },

    /// Role sampling would never terminate: there must be at least one
    /// plain client left once servers and resource hogs are drawn.
    #[error(
        "{servers} servers and {res_hogs} resource hogs don't fit in the {addresses} addresses of the destination range"
    )]
    TooManyRoles {
        servers: u32,
        res_hogs: u32,
        addresses: u32,
    },
}

/// Range of node addresses, lower bound inclusive, upper bound exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DestinationRange {
    pub min: Address,
    pub max: Address,
}

impl DestinationRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self {
            min: Address::new(min),
            max: Address::new(max),
        }
    }

    /// number of addresses in the range
    pub fn len(&self) -> u32 {
        self.max.get().saturating_sub(self.min.get())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, address: Address) -> bool {
        self.min <= address && address < self.max
    }

    pub fn addresses(&self) -> impl Iterator<Item = Address> + use<> {
        self.as_range().map(Address::new)
    }

    fn as_range(&self) -> Range<u32> {
        self.min.get()..self.max.get()
    }
}

impl fmt::Display for DestinationRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.min, self.max)
    }
}

impl FromStr for DestinationRange {
    type Err = anyhow::Error;

    /// `min,max` as found in the settings files
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (min, max) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("Expecting `min,max'"))?;
        let min: Address = min.parse()?;
        let max: Address = max.parse()?;
        ensure!(max.get() > 0, "the upper bound is exclusive, it can't be 0");

        Ok(Self { min, max })
    }
}

/// Size range of a message kind, in bytes
///
/// The lower bound is inclusive and the upper bound exclusive. A range
/// where both bounds are equal always yields that size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SizeRange {
    pub min: u64,
    pub max: u64,
}

impl SizeRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub const fn fixed(size: u64) -> Self {
        Self::new(size, size)
    }
}

impl Default for SizeRange {
    fn default() -> Self {
        Self::fixed(DEFAULT_SIZE)
    }
}

/// All the recognized options of a resource management scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// don't generate messages, only answer requests
    pub passive: bool,
    /// message generation interval of normal nodes
    pub interval: Duration,
    /// message generation interval of resource hogs
    pub interval_res_hogs: Duration,
    /// initial value of the normal nodes' send clock
    pub offset: Duration,
    pub destination_range: DestinationRange,
    pub seed: u64,
    pub request_size: SizeRange,
    pub response_size: SizeRange,
    pub unidirectional_size: SizeRange,
    /// buffer capacity of non-server nodes, in bytes
    pub client_buffer_size: u64,
    /// buffer capacity of servers, in bytes
    pub server_buffer_size: u64,
    pub percentage_of_servers: u8,
    pub percentage_of_res_hogs: u8,
    pub probability_to_send_request: u8,
    /// buffer responses under their destination rather than their source
    pub simulate_proxy_signatures: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            passive: false,
            interval: DEFAULT_INTERVAL,
            interval_res_hogs: DEFAULT_INTERVAL_RES_HOGS,
            offset: Duration::ZERO,
            destination_range: DestinationRange::new(0, 1),
            seed: 0,
            request_size: SizeRange::default(),
            response_size: SizeRange::default(),
            unidirectional_size: SizeRange::default(),
            client_buffer_size: DEFAULT_SIZE,
            server_buffer_size: DEFAULT_SIZE,
            percentage_of_servers: DEFAULT_PERCENTAGE_OF_SERVERS,
            percentage_of_res_hogs: DEFAULT_PERCENTAGE_OF_RES_HOGS,
            probability_to_send_request: DEFAULT_PROBABILITY_TO_SEND_REQUEST,
            simulate_proxy_signatures: false,
        }
    }
}

impl Config {
    /// `floor(destMax * percentageOfServers / 100)`
    ///
    /// Computed against the upper bound of the range, not its length.
    pub fn number_of_servers(&self) -> u32 {
        percentage_of(self.destination_range.max, self.percentage_of_servers)
    }

    /// `floor(destMax * percentageOfResHogs / 100)`
    pub fn number_of_res_hogs(&self) -> u32 {
        percentage_of(self.destination_range.max, self.percentage_of_res_hogs)
    }

    /// Check the configuration can run.
    ///
    /// In particular this rejects configurations where the role sampling
    /// would loop forever looking for a free address.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.destination_range.is_empty() {
            return Err(ConfigError::EmptyDestinationRange {
                range: self.destination_range,
            });
        }

        for (option, value) in [
            ("percentageOfServers", self.percentage_of_servers),
            ("percentageOfResHogs", self.percentage_of_res_hogs),
            ("probabilityToSendRequest", self.probability_to_send_request),
        ] {
            if value > 100 {
                return Err(ConfigError::InvalidPercentage { option, value });
            }
        }

        for (option, range) in [
            ("request", self.request_size),
            ("response", self.response_size),
            ("unidirectional", self.unidirectional_size),
        ] {
            if range.min > range.max {
                return Err(ConfigError::InvalidSizeRange {
                    option,
                    min: range.min,
                    max: range.max,
                });
            }
        }

        for (option, size) in [
            ("clientBufferSize", self.client_buffer_size),
            ("serverBufferSize", self.server_buffer_size),
        ] {
            if size == 0 {
                return Err(ConfigError::ZeroBufferSize { option });
            }
        }

        let servers = self.number_of_servers();
        let res_hogs = self.number_of_res_hogs();
        let addresses = self.destination_range.len();
        if u64::from(servers) + u64::from(res_hogs) >= u64::from(addresses) {
            return Err(ConfigError::TooManyRoles {
                servers,
                res_hogs,
                addresses,
            });
        }

        Ok(())
    }

    /// Set a single option from its textual representation.
    ///
    /// Option names are the ones of the settings files
    /// (`percentageOfServers`, `intervalResHogs`...).
    pub fn set(&mut self, option: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match option.trim() {
            "passive" => self.passive = parse_value("passive", value, parse_bool)?,
            "interval" => self.interval = parse_value("interval", value, parse_duration)?,
            "intervalResHogs" => {
                self.interval_res_hogs = parse_value("intervalResHogs", value, parse_duration)?
            }
            "offset" => self.offset = parse_value("offset", value, parse_duration)?,
            "destinationRange" => {
                self.destination_range =
                    parse_value("destinationRange", value, str::parse::<DestinationRange>)?
            }
            "seed" => self.seed = parse_value("seed", value, parse_int)?,
            "requestMinSize" => {
                self.request_size.min = parse_value("requestMinSize", value, parse_int)?
            }
            "requestMaxSize" => {
                self.request_size.max = parse_value("requestMaxSize", value, parse_int)?
            }
            "responseMinSize" => {
                self.response_size.min = parse_value("responseMinSize", value, parse_int)?
            }
            "responseMaxSize" => {
                self.response_size.max = parse_value("responseMaxSize", value, parse_int)?
            }
            "unidirectionalMinSize" => {
                self.unidirectional_size.min =
                    parse_value("unidirectionalMinSize", value, parse_int)?
            }
            "unidirectionalMaxSize" => {
                self.unidirectional_size.max =
                    parse_value("unidirectionalMaxSize", value, parse_int)?
            }
            "clientBufferSize" => {
                self.client_buffer_size = parse_value("clientBufferSize", value, parse_int)?
            }
            "serverBufferSize" => {
                self.server_buffer_size = parse_value("serverBufferSize", value, parse_int)?
            }
            "percentageOfServers" => {
                self.percentage_of_servers = parse_value("percentageOfServers", value, parse_int)?
            }
            "percentageOfResHogs" => {
                self.percentage_of_res_hogs = parse_value("percentageOfResHogs", value, parse_int)?
            }
            "probabilityToSendRequest" => {
                self.probability_to_send_request =
                    parse_value("probabilityToSendRequest", value, parse_int)?
            }
            "simulateProxySignatures" => {
                self.simulate_proxy_signatures =
                    parse_value("simulateProxySignatures", value, parse_bool)?
            }
            option => {
                return Err(ConfigError::UnknownOption {
                    option: option.to_owned(),
                });
            }
        }
        Ok(())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    /// Parse `key = value` lines on top of the [`Default`] configuration.
    /// Blank lines and `#` comments are ignored. The result is validated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut config = Self::default();

        for line in s.lines() {
            let line = match line.split_once('#') {
                Some((content, _comment)) => content,
                None => line,
            }
            .trim();
            if line.is_empty() {
                continue;
            }

            let Some((option, value)) = line.split_once('=') else {
                return Err(ConfigError::MalformedLine {
                    line: line.to_owned(),
                });
            };
            config.set(option, value)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn percentage_of(max: Address, percentage: u8) -> u32 {
    let count = u64::from(max.get()) * u64::from(percentage) / 100;
    u32::try_from(count).unwrap_or(u32::MAX)
}

fn parse_value<T, E, F>(option: &'static str, value: &str, parse: F) -> Result<T, ConfigError>
where
    F: FnOnce(&str) -> Result<T, E>,
    E: fmt::Display,
{
    parse(value).map_err(|error| ConfigError::InvalidValue {
        option,
        value: value.to_owned(),
        reason: error.to_string(),
    })
}

fn parse_int<T: FromStr>(value: &str) -> Result<T, T::Err> {
    value.parse()
}

fn parse_bool(value: &str) -> Result<bool, String> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err("expecting `true' or `false'".to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ten_nodes() -> Config {
        Config {
            destination_range: DestinationRange::new(0, 10),
            percentage_of_servers: 20,
            percentage_of_res_hogs: 20,
            ..Config::default()
        }
    }

    #[test]
    fn default_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn role_counts() {
        let config = ten_nodes();
        assert_eq!(config.number_of_servers(), 2);
        assert_eq!(config.number_of_res_hogs(), 2);

        let config = Config {
            destination_range: DestinationRange::new(0, 19),
            percentage_of_servers: 10,
            ..Config::default()
        };
        assert_eq!(config.number_of_servers(), 1);
    }

    #[test]
    fn too_many_roles() {
        let config = Config {
            percentage_of_servers: 50,
            percentage_of_res_hogs: 50,
            ..ten_nodes()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooManyRoles {
                servers: 5,
                res_hogs: 5,
                addresses: 10
            })
        );
    }

    #[test]
    fn roles_must_leave_a_client() {
        let config = Config {
            percentage_of_servers: 60,
            percentage_of_res_hogs: 30,
            ..ten_nodes()
        };
        assert!(config.validate().is_ok());

        let config = Config {
            destination_range: DestinationRange::new(5, 10),
            percentage_of_servers: 30,
            percentage_of_res_hogs: 20,
            ..Config::default()
        };
        // 3 + 2 >= 5 addresses
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooManyRoles { .. })
        ));
    }

    #[test]
    fn invalid_values() {
        let config = Config {
            request_size: SizeRange::new(10, 5),
            ..ten_nodes()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidSizeRange {
                option: "request",
                min: 10,
                max: 5
            })
        );

        let config = Config {
            probability_to_send_request: 101,
            ..ten_nodes()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPercentage { .. })
        ));

        let config = Config {
            server_buffer_size: 0,
            ..ten_nodes()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroBufferSize {
                option: "serverBufferSize"
            })
        );

        let config = Config {
            destination_range: DestinationRange::new(4, 4),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyDestinationRange { .. })
        ));
    }

    #[test]
    fn parse_settings() {
        let config: Config = "
            passive = false
            interval = 25
            intervalResHogs = 1.5   # seconds
            offset = 10s
            destinationRange = 0, 10
            seed = 1234
            requestMinSize = 10
            requestMaxSize = 20
            responseMinSize = 30
            responseMaxSize = 40
            unidirectionalMinSize = 50
            unidirectionalMaxSize = 60
            clientBufferSize = 100
            serverBufferSize = 1000
            percentageOfServers = 20
            percentageOfResHogs = 20
            probabilityToSendRequest = 50
            simulateProxySignatures = TRUE
        "
        .parse()
        .unwrap();

        assert_eq!(
            config,
            Config {
                passive: false,
                interval: Duration::from_secs(25),
                interval_res_hogs: Duration::from_millis(1_500),
                offset: Duration::from_secs(10),
                destination_range: DestinationRange::new(0, 10),
                seed: 1234,
                request_size: SizeRange::new(10, 20),
                response_size: SizeRange::new(30, 40),
                unidirectional_size: SizeRange::new(50, 60),
                client_buffer_size: 100,
                server_buffer_size: 1000,
                percentage_of_servers: 20,
                percentage_of_res_hogs: 20,
                probability_to_send_request: 50,
                simulate_proxy_signatures: true,
            }
        );
    }

    #[test]
    fn comment_lines_are_skipped() {
        let config: Config = "
            # 10 nodes, 2 servers, 2 resource hogs
            destinationRange = 0,10
            percentageOfServers = 20
            percentageOfResHogs = 20
            #clientBufferSize = 0
            clientBufferSize = 100
        "
        .parse()
        .unwrap();

        assert_eq!(config.destination_range, DestinationRange::new(0, 10));
        assert_eq!(config.client_buffer_size, 100);
        assert_eq!(config.number_of_servers(), 2);
        assert_eq!(config.number_of_res_hogs(), 2);
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            "color = blue".parse::<Config>(),
            Err(ConfigError::UnknownOption {
                option: "color".to_owned()
            })
        );
        assert_eq!(
            "passive".parse::<Config>(),
            Err(ConfigError::MalformedLine {
                line: "passive".to_owned()
            })
        );
        assert!(matches!(
            "seed = -3".parse::<Config>(),
            Err(ConfigError::InvalidValue { option: "seed", .. })
        ));
        assert!(matches!(
            "passive = yes".parse::<Config>(),
            Err(ConfigError::InvalidValue {
                option: "passive",
                ..
            })
        ));
        assert!(matches!(
            "destinationRange = 10".parse::<Config>(),
            Err(ConfigError::InvalidValue {
                option: "destinationRange",
                ..
            })
        ));
        // parsed fine but fails validation
        assert!(matches!(
            "destinationRange = 0,2\npercentageOfServers = 100".parse::<Config>(),
            Err(ConfigError::TooManyRoles { .. })
        ));
    }

    #[test]
    fn destination_range() {
        let range: DestinationRange = "3,7".parse().unwrap();
        assert_eq!(range, DestinationRange::new(3, 7));
        assert_eq!(range.len(), 4);
        assert!(range.contains(Address::new(3)));
        assert!(!range.contains(Address::new(7)));
        assert_eq!(range.to_string(), "[3, 7)");
        assert_eq!(
            range.addresses().collect::<Vec<_>>(),
            [3, 4, 5, 6].map(Address::new)
        );
    }
}
