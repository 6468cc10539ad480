// # DNS Updater Trait
//
// Defines the interface for pushing an address to a dynamic-DNS provider.
//
// ## Implementations
//
// - Namecheap: `ifddns-provider-namecheap` crate
//
// ## Usage
//
// ```rust,ignore
// use ifddns_core::DnsUpdater;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let updater = /* DnsUpdater implementation */;
//
//     updater.update(std::net::Ipv4Addr::new(198, 51, 100, 7)).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

use crate::config::UpdaterOptions;
use crate::credentials::Credential;

/// Trait for DNS updater implementations
///
/// An updater is bound to one domain and one secret at construction and
/// holds no other state across calls.
///
/// ## Allowed
/// - Perform one HTTP/HTTPS request to the provider endpoint per call
/// - Parse the provider's response
/// - Return success or failure
///
/// ## Forbidden
/// - Retry or back off (the engine retries on the next tick)
/// - Decide whether an update is needed (owned by `DdnsEngine`)
/// - Log or return the secret
///
/// If the update fails, return an error. The engine keeps the previous
/// last-known address so the next tick tries again.
#[async_trait]
pub trait DnsUpdater: Send + Sync {
    /// Point the bound domain at `ip`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The provider acknowledged the update (or dry-run)
    /// - `Err(Error::Transport)`: The request or body read failed
    /// - `Err(Error::Protocol)`: The response could not be decoded
    /// - `Err(Error::ProviderRejected)`: The provider refused the update
    async fn update(&self, ip: Ipv4Addr) -> Result<(), crate::Error>;

    /// The domain this updater keeps in sync
    fn fqdn(&self) -> &str;

    /// Get the provider name (for logging/debugging)
    ///
    /// # Returns
    ///
    /// A static string identifying the provider (e.g., "namecheap")
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing updaters from keyfile credentials
pub trait DnsUpdaterFactory: Send + Sync {
    /// Create a DnsUpdater instance for `credential`
    ///
    /// # Parameters
    ///
    /// - `credential`: The keyfile row for the domain
    /// - `options`: Dry-run and similar switches
    ///
    /// # Returns
    ///
    /// A boxed DnsUpdater trait object
    fn create(
        &self,
        credential: &Credential,
        options: UpdaterOptions,
    ) -> Result<Box<dyn DnsUpdater>, crate::Error>;
}
