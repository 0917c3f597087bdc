use std::{
    fmt::Display,
    net::{IpAddr, SocketAddr},
    str::FromStr,
};

use actix_web::HttpRequest;
use log::{debug, trace};
use regex::Regex;
use thiserror::Error;

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in
/// decreasing order of preference:
/// 1. The `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the configuration.
/// 2. The `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
///
/// Only the first hop of a multi-hop `X-Forwarded-For` chain is considered.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(parse_ip);
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        let re = Regex::new(r#"for=(?P<ip>[^;,\s]+)"#).unwrap();
        result = req
            .headers()
            .get("Forwarded")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| re.captures(v))
            .and_then(|caps| caps.name("ip"))
            .map(|m| m.as_str().trim_matches('"'))
            .and_then(parse_ip);
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.connection_info().peer_addr().map(|a| a.to_string());
        trace!("Using Peer address for remote address: {:?}", peer_addr);
        peer_addr.as_deref().and_then(parse_ip)
    })
}

/// Proxies are inconsistent about whether they hand us "ip" or "ip:port".
fn parse_ip(s: &str) -> Option<IpAddr> {
    let s = s.trim();
    IpAddr::from_str(s).ok().or_else(|| SocketAddr::from_str(s).ok().map(|sa| sa.ip()))
}

//-------------------------------------------------   IpRange   -------------------------------------------------------
#[derive(Debug, Clone, Error)]
#[error("Invalid CIDR range: {0}")]
pub struct InvalidIpRange(String);

/// A CIDR block. Containment is the usual mask test: `addr & mask == base & mask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpRange {
    base: IpAddr,
    prefix: u8,
}

impl IpRange {
    pub fn new(base: IpAddr, prefix: u8) -> Result<Self, InvalidIpRange> {
        let max = match base {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if prefix > max {
            return Err(InvalidIpRange(format!("{base}/{prefix}")));
        }
        Ok(Self { base, prefix })
    }

    pub fn contains(&self, addr: IpAddr) -> bool {
        match (self.base, addr) {
            (IpAddr::V4(base), IpAddr::V4(addr)) => {
                if self.prefix == 0 {
                    return true;
                }
                let mask = u32::MAX << (32 - u32::from(self.prefix));
                (u32::from(base) & mask) == (u32::from(addr) & mask)
            },
            (IpAddr::V6(base), IpAddr::V6(addr)) => {
                if self.prefix == 0 {
                    return true;
                }
                let mask = u128::MAX << (128 - u32::from(self.prefix));
                (u128::from(base) & mask) == (u128::from(addr) & mask)
            },
            // A v4 range says nothing about a v6 caller, and vice versa.
            _ => false,
        }
    }
}

impl FromStr for IpRange {
    type Err = InvalidIpRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = match s.split_once('/') {
            Some((addr, prefix)) => {
                let prefix = prefix.parse::<u8>().map_err(|_| InvalidIpRange(s.to_string()))?;
                (addr, Some(prefix))
            },
            None => (s, None),
        };
        let base = IpAddr::from_str(addr.trim()).map_err(|_| InvalidIpRange(s.to_string()))?;
        let prefix = prefix.unwrap_or(match base {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        });
        IpRange::new(base, prefix)
    }
}

impl Display for IpRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base, self.prefix)
    }
}
