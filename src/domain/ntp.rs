use chrono::{DateTime, Local, Utc};
use std::fmt;
use std::net::Ipv6Addr;
use std::num::NonZeroU16;
use std::str::FromStr;

use crate::error::NtpTimeError;

/// Port used when an address does not name one.
pub const DEFAULT_PORT: u16 = 123;

/// Server queried when nothing else is configured.
pub const DEFAULT_HOST: &str = "pool.ntp.org";

fn parse_port(s: &str) -> Result<u16, NtpTimeError> {
    s.parse::<NonZeroU16>()
        .map(NonZeroU16::get)
        .map_err(|_| NtpTimeError::Config(format!("invalid port '{s}', expected 1..65535")))
}

/// Host and port of a time server.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServerAddress {
    host: String,
    port: u16,
    ipv6_literal: bool,
}

impl ServerAddress {
    /// Build an address from a bare host name (or IP literal) and a port.
    ///
    /// The host must not carry its own port.
    pub fn with_port(host: &str, port: u16) -> Result<Self, NtpTimeError> {
        let (mut addr, named_port) = Self::split(host)?;
        if named_port {
            return Err(NtpTimeError::Config(format!(
                "hostname '{host}' must not include a port, use --port instead"
            )));
        }
        if port == 0 {
            return Err(NtpTimeError::Config("port out of range [1..65535]: 0".into()));
        }
        addr.port = port;
        Ok(addr)
    }

    /// Parse `host`, `host:port`, `[v6]`, `[v6]:port` or a bare IPv6 literal.
    ///
    /// Returns the address with [`DEFAULT_PORT`] filled in and whether the
    /// input named a port itself.
    fn split(input: &str) -> Result<(Self, bool), NtpTimeError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(NtpTimeError::Config("empty server address".into()));
        }

        if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(|| {
                NtpTimeError::Config(format!("missing closing ']' in '{s}'"))
            })?;
            if host.is_empty() {
                return Err(NtpTimeError::Config(format!("empty IPv6 literal in '{s}'")));
            }
            let port = match tail {
                "" => None,
                _ => match tail.strip_prefix(':') {
                    Some(p) => Some(parse_port(p)?),
                    None => {
                        return Err(NtpTimeError::Config(format!(
                            "unexpected trailing characters in '{s}'"
                        )));
                    }
                },
            };
            return Ok((Self::new(host, port, true), port.is_some()));
        }

        if s.parse::<Ipv6Addr>().is_ok() {
            return Ok((Self::new(s, None, true), false));
        }

        match s.rsplit_once(':') {
            None => Ok((Self::new(s, None, false), false)),
            Some((host, _)) if host.is_empty() => Err(NtpTimeError::Config(format!(
                "missing host before port in '{s}'"
            ))),
            Some((host, _)) if host.contains(':') => Err(NtpTimeError::Config(format!(
                "IPv6 address with a port must be bracketed: '{s}'"
            ))),
            Some((host, port)) => Ok((Self::new(host, Some(parse_port(port)?), false), true)),
        }
    }

    fn new(host: &str, port: Option<u16>, ipv6_literal: bool) -> Self {
        Self {
            host: host.to_string(),
            port: port.unwrap_or(DEFAULT_PORT),
            ipv6_literal,
        }
    }

    /// Pick the primary server from the mutually exclusive address and
    /// hostname/port options.
    ///
    /// `address` cannot be combined with `hostname` or `port`. With neither,
    /// [`DEFAULT_HOST`] on [`DEFAULT_PORT`] is used.
    pub fn from_options(
        address: Option<&str>,
        hostname: Option<&str>,
        port: Option<u16>,
    ) -> Result<Self, NtpTimeError> {
        match (address, hostname, port) {
            (Some(addr), None, None) => addr.parse(),
            (Some(_), _, _) => Err(NtpTimeError::Config(
                "you can either specify an address or a hostname and port, but not both".into(),
            )),
            (None, host, port) => Self::with_port(
                host.unwrap_or(DEFAULT_HOST),
                port.unwrap_or(DEFAULT_PORT),
            ),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_ipv6_literal(&self) -> bool {
        self.ipv6_literal
    }
}

impl FromStr for ServerAddress {
    type Err = NtpTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::split(s).map(|(addr, _)| addr)
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ipv6_literal {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// How the servers of one invocation are queried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Ask one server.
    Single(ServerAddress),
    /// Ask every server at once, keep the first answer.
    Parallel(ServerAddress, Vec<ServerAddress>),
    /// Ask the servers one after the other until one answers.
    Fallback(ServerAddress, Vec<ServerAddress>),
}

impl Strategy {
    /// Combine the primary server with the optional peer lists.
    ///
    /// Supplying both parallel and fallback peers is a configuration error.
    pub fn new(
        primary: ServerAddress,
        parallel: Vec<ServerAddress>,
        fallback: Vec<ServerAddress>,
    ) -> Result<Self, NtpTimeError> {
        match (parallel.is_empty(), fallback.is_empty()) {
            (true, true) => Ok(Strategy::Single(primary)),
            (false, true) => Ok(Strategy::Parallel(primary, parallel)),
            (true, false) => Ok(Strategy::Fallback(primary, fallback)),
            (false, false) => Err(NtpTimeError::Config(
                "parallel and fallback servers cannot be used together".into(),
            )),
        }
    }

    pub fn primary(&self) -> &ServerAddress {
        match self {
            Strategy::Single(p) | Strategy::Parallel(p, _) | Strategy::Fallback(p, _) => p,
        }
    }

    /// Every server this strategy may contact, primary first.
    pub fn servers(&self) -> Vec<ServerAddress> {
        match self {
            Strategy::Single(p) => vec![p.clone()],
            Strategy::Parallel(p, peers) | Strategy::Fallback(p, peers) => {
                std::iter::once(p).chain(peers).cloned().collect()
            }
        }
    }
}

/// Time reported by the server that won.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub server: ServerAddress,
    pub utc: DateTime<Utc>,
}

impl Outcome {
    pub fn local(&self) -> DateTime<Local> {
        DateTime::from(self.utc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> ServerAddress {
        s.parse().unwrap()
    }

    #[test]
    fn parses_host_with_default_port() {
        let a = addr("time.google.com");
        assert_eq!(a.host(), "time.google.com");
        assert_eq!(a.port(), 123);
        assert_eq!(a.to_string(), "time.google.com:123");
    }

    #[test]
    fn parses_ipv4_with_port() {
        let a = addr("192.168.1.23:1123");
        assert_eq!(a.host(), "192.168.1.23");
        assert_eq!(a.port(), 1123);
        assert!(!a.is_ipv6_literal());
    }

    #[test]
    fn parses_ipv6_forms() {
        let bracketed = addr("[2001:db8::1]:4123");
        assert_eq!(bracketed.host(), "2001:db8::1");
        assert_eq!(bracketed.port(), 4123);
        assert_eq!(bracketed.to_string(), "[2001:db8::1]:4123");

        let bare = addr("2001:db8::1");
        assert_eq!(bare.port(), 123);
        assert!(bare.is_ipv6_literal());
        assert_eq!(bare.to_string(), "[2001:db8::1]:123");
    }

    #[test]
    fn rejects_bad_addresses() {
        for bad in [
            "",
            ":123",
            "host:0",
            "host:70000",
            "host:abc",
            "[::1",
            "[::1]x",
            "[]:123",
            "2001:db8::1:zz",
        ] {
            assert!(
                matches!(bad.parse::<ServerAddress>(), Err(NtpTimeError::Config(_))),
                "expected config error for {bad:?}"
            );
        }
    }

    #[test]
    fn address_conflicts_with_hostname_and_port() {
        let both = ServerAddress::from_options(Some("a:123"), Some("b"), None);
        assert!(matches!(both, Err(NtpTimeError::Config(_))));
        let with_port = ServerAddress::from_options(Some("a:123"), None, Some(124));
        assert!(matches!(with_port, Err(NtpTimeError::Config(_))));
    }

    #[test]
    fn primary_defaults_to_pool() {
        let a = ServerAddress::from_options(None, None, None).unwrap();
        assert_eq!(a.to_string(), "pool.ntp.org:123");
        let b = ServerAddress::from_options(None, Some("ntp.example"), Some(10123)).unwrap();
        assert_eq!(b.to_string(), "ntp.example:10123");
        let c = ServerAddress::from_options(None, None, Some(1123)).unwrap();
        assert_eq!(c.to_string(), "pool.ntp.org:1123");
    }

    #[test]
    fn hostname_must_not_carry_port() {
        let res = ServerAddress::from_options(None, Some("ntp.example:123"), None);
        assert!(matches!(res, Err(NtpTimeError::Config(_))));
    }

    #[test]
    fn strategy_variants_are_exclusive() {
        let p = addr("a");
        assert_eq!(
            Strategy::new(p.clone(), vec![], vec![]).unwrap(),
            Strategy::Single(p.clone())
        );
        assert!(matches!(
            Strategy::new(p.clone(), vec![addr("b")], vec![]).unwrap(),
            Strategy::Parallel(_, _)
        ));
        assert!(matches!(
            Strategy::new(p.clone(), vec![], vec![addr("c")]).unwrap(),
            Strategy::Fallback(_, _)
        ));
        assert!(matches!(
            Strategy::new(p, vec![addr("b")], vec![addr("c")]),
            Err(NtpTimeError::Config(_))
        ));
    }

    #[test]
    fn servers_lists_primary_first() {
        let s = Strategy::new(addr("a"), vec![], vec![addr("b"), addr("c")]).unwrap();
        let names: Vec<String> = s.servers().iter().map(|a| a.host().to_string()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(s.primary().host(), "a");
    }
}
