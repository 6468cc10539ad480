// # Namecheap Dynamic DNS Updater
//
// This crate provides the Namecheap updater for the ifddns notifier.
//
// ## Protocol
//
// One HTTPS GET per update:
//
// ```text
// GET https://dynamicdns.park-your-domain.com/update?domain=example.com&host=www&ip=198.51.100.7&password=SECRET
// ```
//
// The FQDN is split at its first dot into `host` and `domain`. The answer is
// an XML `<interface-response>` document (see [`response`]); `ErrCount > 0`
// means the provider refused the update.
//
// ## Responsibilities
//
// The updater performs exactly one request per call. It does not retry,
// back off or decide whether an update is needed; `DdnsEngine` owns all of
// that and retries on the next tick.
//
// ## Security Requirements
//
// - The dynamic-DNS password NEVER appears in logs, `Debug` output or errors
// - Dry-run logs the request URL with the password masked

pub mod response;

use async_trait::async_trait;
use ifddns_core::traits::{DnsUpdater, DnsUpdaterFactory};
use ifddns_core::{Credential, Error, Result, Secret, UpdaterOptions, UpdaterRegistry};
use reqwest::Url;
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, info, warn};

pub use response::{InterfaceResponse, decode_body};

/// Registry and log name of this provider
pub const PROVIDER_NAME: &str = "namecheap";

/// Namecheap dynamic DNS update endpoint
pub const DEFAULT_ENDPOINT: &str = "https://dynamicdns.park-your-domain.com/update";

/// Stand-in for the password in logged URLs
const MASKED_PASSWORD: &str = "xxxxxxxxxxxxxx";

/// TCP connect plus TLS handshake budget
const CONNECT_TIMEOUT: Duration = Duration::from_secs(11);

/// TCP keep-alive interval
const TCP_KEEPALIVE: Duration = Duration::from_secs(60);

/// How long idle pooled connections are kept
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Idle connections kept per host
const POOL_MAX_IDLE_PER_HOST: usize = 100;

/// Upper bound for a whole exchange
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Split an FQDN at its first dot into (host, domain)
///
/// ```
/// let (host, domain) = ifddns_provider_namecheap::split_fqdn("www.example.com").unwrap();
/// assert_eq!((host, domain), ("www", "example.com"));
/// ```
pub fn split_fqdn(fqdn: &str) -> Result<(&str, &str)> {
    fqdn.split_once('.')
        .ok_or_else(|| Error::InvalidDomain(fqdn.to_string()))
}

/// Namecheap dynamic DNS updater
///
/// Bound to one FQDN and one password at construction.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, `update()` logs the request URL with the password
/// masked and returns success without any network I/O.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the password.
pub struct NamecheapUpdater {
    fqdn: String,

    /// Label before the first dot
    host: String,

    /// Everything after the first dot
    domain: String,

    /// Dynamic DNS password
    /// ⚠️ NEVER log this value
    password: Secret,

    endpoint: Url,

    client: reqwest::Client,

    dry_run: bool,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for NamecheapUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamecheapUpdater")
            .field("fqdn", &self.fqdn)
            .field("host", &self.host)
            .field("domain", &self.domain)
            .field("password", &self.password)
            .field("endpoint", &self.endpoint.as_str())
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl NamecheapUpdater {
    /// Create an updater for `fqdn`
    ///
    /// # Errors
    ///
    /// - `Error::InvalidDomain` if `fqdn` contains no dot
    /// - `Error::Config` if the HTTP client cannot be built
    pub fn new(fqdn: impl Into<String>, password: Secret, options: UpdaterOptions) -> Result<Self> {
        let fqdn = fqdn.into();
        let (host, domain) = split_fqdn(&fqdn)?;
        let (host, domain) = (host.to_string(), domain.to_string());

        let endpoint = Url::parse(DEFAULT_ENDPOINT)
            .map_err(|e| Error::config(format!("{}: bad endpoint: {}", PROVIDER_NAME, e)))?;

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .tcp_keepalive(TCP_KEEPALIVE)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("{}: can't build HTTP client: {}", PROVIDER_NAME, e)))?;

        info!("Using {} as DDNS for {}", PROVIDER_NAME, fqdn);
        if options.dry_run {
            warn!("{}: running in DRY-RUN mode - no updates will be sent", PROVIDER_NAME);
        }

        Ok(Self {
            fqdn,
            host,
            domain,
            password,
            endpoint,
            client,
            dry_run: options.dry_run,
        })
    }

    /// Send requests to `endpoint` instead of the public service
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        self.endpoint = Url::parse(endpoint)
            .map_err(|e| Error::config(format!("{}: bad endpoint {}: {}", PROVIDER_NAME, endpoint, e)))?;
        Ok(self)
    }

    /// Whether this updater only logs
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// The update URL for `ip`
    ///
    /// With `mask_password` set the password is replaced, which makes the
    /// result safe to log.
    pub fn request_url(&self, ip: Ipv4Addr, mask_password: bool) -> Url {
        let password = if mask_password {
            MASKED_PASSWORD
        } else {
            self.password.expose()
        };

        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("domain", &self.domain)
            .append_pair("host", &self.host)
            .append_pair("ip", &ip.to_string())
            .append_pair("password", password);
        url
    }

    /// Interpret a response body
    fn check_response(&self, status: reqwest::StatusCode, body: &[u8]) -> Result<()> {
        let text = decode_body(body);

        let response = match InterfaceResponse::parse(&text) {
            Ok(response) => response,
            Err(e) if !status.is_success() => {
                debug!("{}: undecodable {} response: {}", PROVIDER_NAME, status, e);
                return Err(Error::transport(
                    PROVIDER_NAME,
                    format!("unexpected HTTP status {}", status),
                ));
            }
            Err(e) => return Err(Error::protocol(PROVIDER_NAME, e)),
        };

        if response.is_error() {
            return Err(Error::rejected(PROVIDER_NAME, response.error_message()));
        }

        if let Some(recorded) = response.ip.as_deref() {
            debug!("{}: provider recorded {}", PROVIDER_NAME, recorded);
        }

        Ok(())
    }
}

#[async_trait]
impl DnsUpdater for NamecheapUpdater {
    async fn update(&self, ip: Ipv4Addr) -> Result<()> {
        debug!("{}: beginning DDNS update {}={}", PROVIDER_NAME, self.fqdn, ip);

        if self.dry_run {
            info!("{}: [DRY-RUN] {}", PROVIDER_NAME, self.request_url(ip, true));
            return Ok(());
        }

        // reqwest errors carry the URL; strip it so the password stays out of logs
        let response = self
            .client
            .get(self.request_url(ip, false))
            .send()
            .await
            .map_err(|e| Error::transport(PROVIDER_NAME, e.without_url()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::transport(PROVIDER_NAME, e.without_url()))?;

        self.check_response(status, &body)?;

        info!("{}: {} {} DDNS complete", PROVIDER_NAME, ip, self.fqdn);
        Ok(())
    }

    fn fqdn(&self) -> &str {
        &self.fqdn
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating Namecheap updaters
pub struct NamecheapFactory;

impl DnsUpdaterFactory for NamecheapFactory {
    fn create(
        &self,
        credential: &Credential,
        options: UpdaterOptions,
    ) -> Result<Box<dyn DnsUpdater>> {
        if credential.secret.expose().is_empty() {
            return Err(Error::config(format!(
                "{}: empty password for {}",
                PROVIDER_NAME, credential.fqdn
            )));
        }

        Ok(Box::new(NamecheapUpdater::new(
            credential.fqdn.clone(),
            credential.secret.clone(),
            options,
        )?))
    }
}

/// Register the Namecheap updater with a registry
///
/// # Example
///
/// ```rust
/// use ifddns_core::UpdaterRegistry;
///
/// let registry = UpdaterRegistry::new();
/// ifddns_provider_namecheap::register(&registry);
/// assert!(registry.has_updater("namecheap"));
/// ```
pub fn register(registry: &UpdaterRegistry) {
    registry.register_updater(PROVIDER_NAME, Box::new(NamecheapFactory));
}
