// # Interface Address Resolver
//
// Reads the addresses bound to a named network interface and picks the
// first routable IPv4 address among them.
//
// ## Selection
//
// 1. The interface must exist (`InterfaceNotFound` otherwise)
// 2. Addresses are scanned in enumeration order, stopping at the first
//    acceptable one
// 3. Each scanned address must carry a well-formed netmask
//    (`InterfaceMisconfigured` otherwise)
// 4. IPv6 addresses are skipped unless they are IPv4-mapped
// 5. Addresses inside any martian range are skipped
//
// `NoUsableAddress` if the scan runs out.
//
// The interface is enumerated afresh on every call; nothing is cached.
//
// ## Platform Support
//
// Enumeration uses `getifaddrs(3)` and is available on Unix systems only.

use std::net::{IpAddr, Ipv4Addr};

use async_trait::async_trait;
use ifddns_core::net::{Ipv4Net, MARTIANS, acceptable_ipv4};
use ifddns_core::traits::AddressResolver;
use ifddns_core::{Error, Result};
use tracing::trace;

/// One address as reported by the operating system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceAddress {
    /// The bound address
    pub ip: IpAddr,
    /// The netmask, if the OS reported one
    pub netmask: Option<IpAddr>,
}

impl InterfaceAddress {
    /// Prefix length of the netmask
    ///
    /// A missing netmask is read as a host route. A netmask whose ones are
    /// not contiguous has no CIDR form and is rejected.
    pub fn prefix(&self) -> std::result::Result<u8, String> {
        let (ones, bits) = match (self.ip, self.netmask) {
            (IpAddr::V4(_), None) => return Ok(32),
            (IpAddr::V6(_), None) => return Ok(128),
            (IpAddr::V4(_), Some(IpAddr::V4(mask))) => {
                let mask = u32::from(mask);
                if mask.leading_ones() + mask.trailing_zeros() != 32 {
                    return Err(format!("{}: non-canonical netmask {}", self.ip, Ipv4Addr::from(mask)));
                }
                (mask.leading_ones(), 32)
            }
            (IpAddr::V6(_), Some(IpAddr::V6(mask))) => {
                let raw = u128::from(mask);
                if raw.leading_ones() + raw.trailing_zeros() != 128 {
                    return Err(format!("{}: non-canonical netmask {}", self.ip, mask));
                }
                (raw.leading_ones(), 128)
            }
            (_, Some(mask)) => {
                return Err(format!("{}: netmask {} of the wrong family", self.ip, mask));
            }
        };

        debug_assert!(ones <= bits);
        Ok(ones as u8)
    }
}

/// Resolves the usable IPv4 address of one network interface
#[derive(Debug, Clone)]
pub struct InterfaceResolver {
    interface: String,
    martians: Vec<Ipv4Net>,
}

impl InterfaceResolver {
    /// Watch `interface`, excluding the standard martian ranges
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            martians: MARTIANS.to_vec(),
        }
    }

    /// Replace the excluded ranges
    pub fn with_martians(mut self, martians: impl Into<Vec<Ipv4Net>>) -> Self {
        self.martians = martians.into();
        self
    }

    /// The interface name
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Enumerate the interface and pick an address
    pub fn current_address(&self) -> Result<Ipv4Addr> {
        let addrs = os::interface_addresses(&self.interface)?;
        self.first_usable(addrs)
    }

    /// Scan `addrs` in order and return the first acceptable IPv4 address
    ///
    /// Entries after the chosen one are not looked at.
    pub fn first_usable(
        &self,
        addrs: impl IntoIterator<Item = InterfaceAddress>,
    ) -> Result<Ipv4Addr> {
        for addr in addrs {
            let prefix = addr
                .prefix()
                .map_err(|message| Error::misconfigured(&self.interface, message))?;
            trace!("{}: found {}/{}", self.interface, addr.ip, prefix);

            if let Some(ip) = acceptable_ipv4(addr.ip, &self.martians) {
                return Ok(ip);
            }
        }

        Err(Error::no_usable_address(&self.interface))
    }
}

#[async_trait]
impl AddressResolver for InterfaceResolver {
    async fn resolve(&self) -> Result<Ipv4Addr> {
        self.current_address()
    }

    fn describe(&self) -> &str {
        &self.interface
    }
}

#[cfg(unix)]
mod os {
    use std::ffi::{CStr, CString};
    use std::io;
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
    use std::ptr;

    use ifddns_core::{Error, Result};

    use super::InterfaceAddress;

    /// Owns the list returned by getifaddrs()
    struct IfAddrs(*mut libc::ifaddrs);

    impl Drop for IfAddrs {
        fn drop(&mut self) {
            // SAFETY: the pointer came from a successful getifaddrs() and is
            // freed exactly once.
            unsafe { libc::freeifaddrs(self.0) };
        }
    }

    fn interface_exists(iface: &str) -> bool {
        let Ok(name) = CString::new(iface) else {
            return false;
        };

        // SAFETY: name is a valid NUL-terminated string for the duration of the call.
        unsafe { libc::if_nametoindex(name.as_ptr()) != 0 }
    }

    /// Convert a socket address to an IpAddr, if it is INET or INET6
    ///
    /// # Safety
    ///
    /// `sa` must be null or point to a valid sockaddr whose actual type
    /// matches its `sa_family`.
    unsafe fn sockaddr_ip(sa: *const libc::sockaddr) -> Option<IpAddr> {
        if sa.is_null() {
            return None;
        }

        // SAFETY: non-null and valid per the function contract.
        let family = i32::from(unsafe { (*sa).sa_family });

        if family == libc::AF_INET {
            // SAFETY: the type of the pointer is given by sa_family
            let sin = unsafe { &*(sa as *const libc::sockaddr_in) };
            Some(IpAddr::V4(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr))))
        } else if family == libc::AF_INET6 {
            // SAFETY: the type of the pointer is given by sa_family
            let sin6 = unsafe { &*(sa as *const libc::sockaddr_in6) };
            Some(IpAddr::V6(Ipv6Addr::from(sin6.sin6_addr.s6_addr)))
        } else {
            None
        }
    }

    pub(super) fn interface_addresses(iface: &str) -> Result<Vec<InterfaceAddress>> {
        if !interface_exists(iface) {
            return Err(Error::InterfaceNotFound(iface.to_string()));
        }

        let mut head: *mut libc::ifaddrs = ptr::null_mut();

        // SAFETY: head is a valid out-pointer; on success it receives a list
        // we own until freeifaddrs().
        if unsafe { libc::getifaddrs(&mut head) } != 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }
        let list = IfAddrs(head);

        let mut addrs = Vec::new();
        let mut current = list.0 as *const libc::ifaddrs;

        while !current.is_null() {
            // SAFETY: nullness is checked above and the list outlives this loop.
            let ifaddr = unsafe { &*current };
            current = ifaddr.ifa_next;

            if ifaddr.ifa_name.is_null() {
                continue;
            }

            // SAFETY: the OS hands out NUL-terminated interface names.
            let name = unsafe { CStr::from_ptr(ifaddr.ifa_name) };
            if name.to_bytes() != iface.as_bytes() {
                continue;
            }

            // SAFETY: entries from getifaddrs() carry sockaddrs matching their family.
            let Some(ip) = (unsafe { sockaddr_ip(ifaddr.ifa_addr) }) else {
                continue;
            };
            // SAFETY: as above.
            let netmask = unsafe { sockaddr_ip(ifaddr.ifa_netmask) };

            addrs.push(InterfaceAddress { ip, netmask });
        }

        Ok(addrs)
    }
}

#[cfg(not(unix))]
mod os {
    use ifddns_core::{Error, Result};

    use super::InterfaceAddress;

    pub(super) fn interface_addresses(_iface: &str) -> Result<Vec<InterfaceAddress>> {
        Err(Error::config(
            "interface address lookup is only supported on Unix",
        ))
    }
}
