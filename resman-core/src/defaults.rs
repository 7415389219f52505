//! Default values of the [`Config`] options.
//!
//! [`Config`]: crate::config::Config

use std::time::Duration;

/// Default message generation interval of normal nodes
///
/// ```
/// # use resman_core::{config::Config, defaults::*};
/// assert_eq!(Config::default().interval, DEFAULT_INTERVAL);
/// assert_eq!(DEFAULT_INTERVAL.as_secs(), 500);
/// ```
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(500);

/// Default message generation interval of resource hogs
///
/// Equal to [`DEFAULT_INTERVAL`] so a scenario that doesn't configure
/// hogs explicitly has them behave like any other node.
pub const DEFAULT_INTERVAL_RES_HOGS: Duration = DEFAULT_INTERVAL;

/// Default percentage of the destination range acting as servers
pub const DEFAULT_PERCENTAGE_OF_SERVERS: u8 = 5;

/// Default percentage of the destination range acting as resource hogs
pub const DEFAULT_PERCENTAGE_OF_RES_HOGS: u8 = 5;

/// Default probability (in percent) that a generated message is a
/// request to a server rather than a unidirectional message to a client
pub const DEFAULT_PROBABILITY_TO_SEND_REQUEST: u8 = 80;

/// Default size, in bytes, of every message kind and of both buffer
/// kinds.
///
/// Realistic scenarios set their own sizes.
pub const DEFAULT_SIZE: u64 = 1;
