//! Command-line interface

use clap::Parser;
use ifddns_core::config::{DEFAULT_PROVIDER, DdnsConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Monitor a network interface and keep a DNS name pointed at its address.
#[derive(Parser, Debug)]
#[command(name = "ifddnsd")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Network interface to watch (e.g. eth0)
    pub interface: String,

    /// Fully-qualified domain name to keep updated
    pub fqdn: String,

    /// Keyfile with `FQDN PROVIDER SECRET` lines
    pub keyfile: PathBuf,

    /// Sleep this long between checks (e.g. 90s, 5m)
    #[arg(short, long, value_name = "N", default_value = "60s", value_parser = parse_sleep)]
    pub sleep: Duration,

    /// Do the update once and don't sleep/poll
    #[arg(long)]
    pub oneshot: bool,

    /// Log the update request instead of sending it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Run in debug mode
    #[arg(short, long)]
    pub debug: bool,
}

impl Args {
    /// Turn the arguments into a notifier configuration
    ///
    /// The keyfile path is not touched here; see [`absolute_keyfile`].
    pub fn into_config(self) -> DdnsConfig {
        DdnsConfig {
            interface: self.interface,
            fqdn: self.fqdn,
            keyfile: self.keyfile,
            provider: DEFAULT_PROVIDER.to_string(),
            poll_interval: self.sleep,
            oneshot: self.oneshot,
            dry_run: self.dry_run,
        }
    }
}

/// Parse a poll interval; a bare number means seconds
fn parse_sleep(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    humantime::parse_duration(s).map_err(|e| format!("invalid duration '{s}': {e}"))
}

/// Resolve the keyfile against the current directory
pub fn absolute_keyfile(config: &mut DdnsConfig) -> std::io::Result<()> {
    config.keyfile = std::path::absolute(&config.keyfile)?;
    Ok(())
}
