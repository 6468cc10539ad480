// # Address Resolver Trait
//
// Defines the interface for reading the address to publish.
//
// ## Implementations
//
// - Interface-based: `ifddns-ip-interface` crate
//
// ## Usage
//
// ```rust,ignore
// use ifddns_core::AddressResolver;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let resolver = /* AddressResolver implementation */;
//
//     let ip = resolver.resolve().await?;
//     println!("{} has {}", resolver.describe(), ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for address resolver implementations
///
/// A resolver is an **observer**: it reports the current address and
/// nothing else. Comparing against the last-known address, deciding
/// whether to update and retrying are owned by `DdnsEngine`.
///
/// Resolvers must not cache results between calls; every poll tick asks
/// the operating system afresh.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// Get the current acceptable IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The first acceptable address
    /// - `Err(Error::InterfaceNotFound)`: The interface does not exist
    /// - `Err(Error::NoUsableAddress)`: No address passed the filters
    async fn resolve(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Human-readable source name for logs (e.g., the interface name)
    fn describe(&self) -> &str;
}
