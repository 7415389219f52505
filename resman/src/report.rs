//! Delivery statistics of the resource management protocol.
//!
//! The [`Reporter`] subscribes to the [`Event`]s fired by the
//! applications and derives, at any point of the simulation, how many of
//! the requests and responses made it to their destination.

use resman_core::{Address, Event, EventListener};
use std::fmt;

/// Counters of every [`Event`] fired in the world
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reporter {
    pub requests_sent: u64,
    pub requests_received: u64,
    pub responses_sent: u64,
    pub responses_received: u64,

    pub requests_sent_res_hog: u64,
    pub requests_received_res_hog: u64,
    pub responses_sent_res_hog: u64,
    pub responses_received_res_hog: u64,

    pub unidirectional_sent: u64,
    pub unidirectional_received: u64,
}

impl Reporter {
    pub fn record(&mut self, event: Event) {
        let counter = match event {
            Event::SentRequest => &mut self.requests_sent,
            Event::GotRequest => &mut self.requests_received,
            Event::SentResponse => &mut self.responses_sent,
            Event::GotResponse => &mut self.responses_received,
            Event::SentRequestResHog => &mut self.requests_sent_res_hog,
            Event::GotRequestResHog => &mut self.requests_received_res_hog,
            Event::SentResponseResHog => &mut self.responses_sent_res_hog,
            Event::GotResponseResHog => &mut self.responses_received_res_hog,
            Event::SentUnidirectional => &mut self.unidirectional_sent,
            Event::GotUnidirectional => &mut self.unidirectional_received,
        };
        *counter += 1;
    }

    /// share of the requests sent that reached their server
    pub fn request_delivery_probability(&self) -> f64 {
        ratio(self.requests_received, self.requests_sent)
    }

    /// share of the responses sent that reached their client
    pub fn response_delivery_probability(&self) -> f64 {
        ratio(self.responses_received, self.responses_sent)
    }

    /// share of the requests sent that were answered
    pub fn success_probability(&self) -> f64 {
        ratio(self.responses_received, self.requests_sent)
    }

    pub fn request_delivery_probability_res_hog(&self) -> f64 {
        ratio(self.requests_received_res_hog, self.requests_sent_res_hog)
    }

    pub fn response_delivery_probability_res_hog(&self) -> f64 {
        ratio(self.responses_received_res_hog, self.responses_sent_res_hog)
    }

    pub fn success_probability_res_hog(&self) -> f64 {
        ratio(self.responses_received_res_hog, self.requests_sent_res_hog)
    }
}

/// `0` when nothing was sent
fn ratio(received: u64, sent: u64) -> f64 {
    if sent == 0 {
        0.0
    } else {
        received as f64 / sent as f64
    }
}

impl EventListener for Reporter {
    fn on_event(&mut self, _host: Address, event: Event) {
        self.record(event)
    }
}

impl fmt::Display for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "requests sent: {}", self.requests_sent)?;
        writeln!(f, "requests received: {}", self.requests_received)?;
        writeln!(f, "responses sent: {}", self.responses_sent)?;
        writeln!(f, "responses received: {}", self.responses_received)?;
        writeln!(f, "requests reshog sent: {}", self.requests_sent_res_hog)?;
        writeln!(
            f,
            "requests reshog received: {}",
            self.requests_received_res_hog
        )?;
        writeln!(f, "responses reshog sent: {}", self.responses_sent_res_hog)?;
        writeln!(
            f,
            "responses reshog received: {}",
            self.responses_received_res_hog
        )?;
        writeln!(f, "unidirectional sent: {}", self.unidirectional_sent)?;
        writeln!(f, "unidirectional received: {}", self.unidirectional_received)?;
        writeln!(
            f,
            "request delivery prob: {:.4}",
            self.request_delivery_probability()
        )?;
        writeln!(
            f,
            "response delivery prob: {:.4}",
            self.response_delivery_probability()
        )?;
        writeln!(
            f,
            "request/response success prob: {:.4}",
            self.success_probability()
        )?;
        writeln!(
            f,
            "request reshog delivery prob: {:.4}",
            self.request_delivery_probability_res_hog()
        )?;
        writeln!(
            f,
            "response reshog delivery prob: {:.4}",
            self.response_delivery_probability_res_hog()
        )?;
        write!(
            f,
            "request/response reshog success prob: {:.4}",
            self.success_probability_res_hog()
        )
    }
}
