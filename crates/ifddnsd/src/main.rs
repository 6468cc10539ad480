// # ifddnsd - Interface DDNS Daemon
//
// Keeps one FQDN pointed at the routable IPv4 address of one interface.
//
// This binary is a THIN integration layer:
// - Parse the command line into a `DdnsConfig`
// - Initialize logging
// - Load the credential from the keyfile
// - Register updaters and build the resolver + updater
// - Run the engine once (`--oneshot`) or until a termination signal
//
// Change detection, retry and shutdown semantics live in `ifddns-core`.
//
// ## Usage
//
// ```bash
// ifddnsd [OPTIONS] INTERFACE FQDN KEYFILE
//
// # poll eth0 every 5 minutes
// ifddnsd -s 5m eth0 home.example.com /etc/ifddns/keys
//
// # see what would be sent, once
// ifddnsd --oneshot --dry-run -d eth0 home.example.com ~/.ifddns.keys
// ```
//
// ## Environment
//
// - `IFDDNS_LOG_LEVEL`: trace, debug, info, warn or error (ignored with `--debug`)

mod cli;
mod triggers;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use ifddns_core::{DdnsConfig, DdnsEngine, DnsUpdater, KeyFile, UpdaterRegistry};
use ifddns_ip_interface::InterfaceResolver;
use std::env;
use std::process::ExitCode;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// Environment variable selecting the log level
const LOG_LEVEL_ENV: &str = "IFDDNS_LOG_LEVEL";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (failed one-shot update, runtime construction)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // clap exits on its own for --help, --version and usage errors
    let args = cli::Args::parse();
    let debug_mode = args.debug;
    let mut config = args.into_config();

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let level = match init_tracing(debug_mode) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    #[cfg(unix)]
    ignore_signals();

    info!(
        "{} - {} on {} (logging at {})...",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.interface,
        level
    );

    let (resolver, updater) = match build_components(&mut config) {
        Ok(components) => components,
        Err(e) => {
            error!("{:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(&config, resolver, updater)).into()
}

/// Pick the log level and install the global subscriber
fn init_tracing(debug_mode: bool) -> Result<Level> {
    let level = if debug_mode {
        Level::DEBUG
    } else {
        match env::var(LOG_LEVEL_ENV) {
            Ok(value) => parse_log_level(&value)?,
            Err(env::VarError::NotPresent) => Level::INFO,
            Err(e) => bail!("{}: {}", LOG_LEVEL_ENV, e),
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_file(debug_mode)
        .with_line_number(debug_mode)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(level)
}

fn parse_log_level(value: &str) -> Result<Level> {
    match value.trim().to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => bail!(
            "{} '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            LOG_LEVEL_ENV,
            value
        ),
    }
}

/// Broken pipes and FP exceptions must not kill the daemon
#[cfg(unix)]
fn ignore_signals() {
    for sig in [libc::SIGPIPE, libc::SIGFPE] {
        // SAFETY: SIG_IGN installs no handler code.
        unsafe {
            libc::signal(sig, libc::SIG_IGN);
        }
    }
}

#[cfg_attr(not(feature = "namecheap"), allow(unused_variables))]
fn register_updaters(registry: &UpdaterRegistry) {
    #[cfg(feature = "namecheap")]
    {
        debug!("Registering Namecheap updater");
        ifddns_provider_namecheap::register(registry);
    }
}

/// Load the credential and build the resolver and updater
fn build_components(
    config: &mut DdnsConfig,
) -> Result<(InterfaceResolver, Box<dyn DnsUpdater>)> {
    cli::absolute_keyfile(config).with_context(|| {
        format!("can't get absolute path for {}", config.keyfile.display())
    })?;

    let keyfile = KeyFile::load(&config.keyfile)?;
    let credential = keyfile
        .lookup(&config.fqdn, &config.provider)
        .ok_or_else(|| {
            anyhow!(
                "can't find {} for {} in {}",
                config.fqdn,
                config.provider,
                config.keyfile.display()
            )
        })?;

    let registry = UpdaterRegistry::new();
    register_updaters(&registry);

    let updater =
        registry.create_updater(&config.provider, credential, config.updater_options())?;
    let resolver = InterfaceResolver::new(&config.interface);

    Ok((resolver, updater))
}

/// Run the engine
async fn run_daemon(
    config: &DdnsConfig,
    resolver: InterfaceResolver,
    updater: Box<dyn DnsUpdater>,
) -> DdnsExitCode {
    let (mut engine, events) = DdnsEngine::new(Box::new(resolver), updater);
    // Nothing in the daemon consumes engine events
    drop(events);

    if config.oneshot {
        return match engine.run_once().await {
            Ok(ip) => {
                debug!("{}: updated to {}", config.fqdn, ip);
                DdnsExitCode::CleanShutdown
            }
            Err(e) => {
                error!("{}", e);
                DdnsExitCode::RuntimeError
            }
        };
    }

    let triggers = match triggers::triggers(config.poll_interval) {
        Ok(triggers) => triggers,
        Err(e) => {
            error!("Failed to set up signal handlers: {}", e);
            return DdnsExitCode::RuntimeError;
        }
    };

    debug!(
        "Polling {} every {}",
        config.interface,
        humantime::format_duration(config.poll_interval)
    );

    let reason = engine.run(triggers).await;
    info!("Shutting down ({})", reason);

    DdnsExitCode::CleanShutdown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(DdnsExitCode::CleanShutdown as u8, 0);
        assert_eq!(DdnsExitCode::ConfigError as u8, 1);
        assert_eq!(DdnsExitCode::RuntimeError as u8, 2);
    }

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_log_level("DEBUG").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level(" warn ").unwrap(), Level::WARN);
        assert!(parse_log_level("verbose").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_ignored_signals_do_not_kill() {
        ignore_signals();

        for sig in [libc::SIGPIPE, libc::SIGFPE] {
            // SAFETY: raise() only delivers a signal to this process, and
            // both signals are ignored above.
            assert_eq!(unsafe { libc::raise(sig) }, 0);
        }

        // SAFETY: a null new-action only reads the current disposition.
        let handler = unsafe {
            let mut current: libc::sigaction = std::mem::zeroed();
            libc::sigaction(libc::SIGFPE, std::ptr::null(), &mut current);
            current.sa_sigaction
        };
        assert_eq!(handler, libc::SIG_IGN);
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_credential_is_config_error() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ddns.keys");
        fs::write(&path, "other.example.com namecheap secret123\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();

        let mut config = DdnsConfig::new("eth0", "host.example.com", &path);
        let err = build_components(&mut config).err().unwrap();

        let message = format!("{err:#}");
        assert!(message.contains("host.example.com"));
        assert!(message.contains("namecheap"));
        assert!(!message.contains("secret123"));
    }

    #[cfg(all(unix, feature = "namecheap"))]
    #[test]
    fn test_build_components() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ddns.keys");
        fs::write(&path, "host.example.com namecheap secret123\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();

        let mut config = DdnsConfig::new("eth0", "host.example.com", &path);
        let (resolver, updater) = build_components(&mut config).unwrap();

        assert_eq!(resolver.interface(), "eth0");
        assert_eq!(updater.fqdn(), "host.example.com");
        assert_eq!(updater.provider_name(), "namecheap");
    }
}
