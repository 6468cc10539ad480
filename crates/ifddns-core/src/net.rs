//! IPv4 networks and the martian-address filter
//!
//! The notifier only publishes addresses that make sense in public DNS.
//! Loopback, RFC 1918 private space and the carrier-grade NAT block are
//! rejected; the first surviving IPv4 address in interface order wins.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

/// An IPv4 network in prefix form
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Net {
    address: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Net {
    /// Create a network from an address and a prefix length
    ///
    /// Prefix lengths above 32 are clamped to 32.
    pub const fn new(address: Ipv4Addr, prefix: u8) -> Self {
        let prefix = if prefix > 32 { 32 } else { prefix };
        Self { address, prefix }
    }

    /// The network address as given
    pub const fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// The prefix length
    pub const fn prefix(&self) -> u8 {
        self.prefix
    }

    const fn mask(&self) -> u32 {
        match self.prefix {
            0 => 0,
            p => u32::MAX << (32 - p as u32),
        }
    }

    /// Whether `addr` falls inside this network
    pub const fn contains(&self, addr: Ipv4Addr) -> bool {
        let mask = self.mask();
        u32::from_be_bytes(self.address.octets()) & mask
            == u32::from_be_bytes(addr.octets()) & mask
    }
}

impl fmt::Debug for Ipv4Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix)
    }
}

impl fmt::Display for Ipv4Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for Ipv4Net {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s
            .split_once('/')
            .ok_or_else(|| format!("{s}: missing prefix length"))?;

        let address = addr
            .parse::<Ipv4Addr>()
            .map_err(|e| format!("{s}: {e}"))?;

        match prefix.parse::<u8>() {
            Ok(p) if p <= 32 => Ok(Self::new(address, p)),
            _ => Err(format!("{s}: invalid prefix length")),
        }
    }
}

/// Address ranges that must never be published
pub const MARTIANS: [Ipv4Net; 5] = [
    // loopback
    Ipv4Net::new(Ipv4Addr::new(127, 0, 0, 0), 8),
    Ipv4Net::new(Ipv4Addr::new(192, 168, 0, 0), 16),
    Ipv4Net::new(Ipv4Addr::new(172, 16, 0, 0), 12),
    Ipv4Net::new(Ipv4Addr::new(10, 0, 0, 0), 8),
    // carrier-grade NAT
    Ipv4Net::new(Ipv4Addr::new(100, 64, 0, 0), 10),
];

/// Whether `ip` is acceptable as a DDNS target, i.e. not inside any martian range
pub fn is_acceptable(ip: Ipv4Addr, martians: &[Ipv4Net]) -> bool {
    !martians.iter().any(|net| net.contains(ip))
}

/// The IPv4 view of an interface address
///
/// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) count as IPv4.
pub fn as_ipv4(addr: IpAddr) -> Option<Ipv4Addr> {
    match addr {
        IpAddr::V4(v4) => Some(v4),
        IpAddr::V6(v6) => v6.to_ipv4_mapped(),
    }
}

/// The IPv4 view of `addr`, if it passes the martian filter
pub fn acceptable_ipv4(addr: IpAddr, martians: &[Ipv4Net]) -> Option<Ipv4Addr> {
    as_ipv4(addr).filter(|ip| is_acceptable(*ip, martians))
}
