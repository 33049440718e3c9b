//! Canned stats responses keyed by endpoint and command.

use std::collections::HashMap;

use crate::collector::memcached::{Endpoint, RawResponse, StatsCommand};
use crate::collector::traits::StatsTransport;

/// Transport serving fixed replies.
///
/// Keys are the endpoint's connect target (`host:port` or socket path), so
/// aliases do not matter. Unknown endpoints behave like a refused
/// connection and return an empty response.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    responses: HashMap<(String, StatsCommand), RawResponse>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the reply for `command` against `endpoint`.
    ///
    /// `endpoint` is a `hosts` entry; its alias part, if any, is dropped.
    pub fn add_response(&mut self, endpoint: &str, command: StatsCommand, reply: &str) {
        let target = Endpoint::parse(endpoint)
            .map(|ep| ep.to_string())
            .unwrap_or_else(|_| endpoint.to_string());
        self.responses.insert((target, command), RawResponse::from(reply));
    }
}

impl StatsTransport for MockTransport {
    fn fetch(&self, endpoint: &Endpoint, command: StatsCommand) -> RawResponse {
        self.responses
            .get(&(endpoint.to_string(), command))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_transport_by_target() {
        let mut transport = MockTransport::new();
        transport.add_response("app@localhost:11211", StatsCommand::Stats, "STAT threads 4\n");

        let ep = Endpoint::parse("other-alias@localhost:11211").unwrap();
        assert_eq!(transport.fetch(&ep, StatsCommand::Stats).text(), "STAT threads 4\n");
        assert!(transport.fetch(&ep, StatsCommand::Slabs).is_empty());

        let missing = Endpoint::parse("localhost:11212").unwrap();
        assert!(transport.fetch(&missing, StatsCommand::Stats).is_empty());
    }
}
