//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Resolving the interface address on every trigger
//! - Comparing it with the last-known address
//! - Updating DNS via DnsUpdater only when the address changed
//! - Stopping cleanly on a shutdown trigger
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ Trigger stream   │── Tick | Shutdown ──┐
//! └──────────────────┘                     │
//!                                          ▼
//!                                 ┌──────────────┐
//!                                 │  DdnsEngine  │
//!                                 └──────────────┘
//!                                          │
//!         ┌────────────────────────────────┼───────────────────────┐
//!         ▼                                ▼                       ▼
//! ┌─────────────────┐            ┌──────────────┐          ┌─────────────┐
//! │ AddressResolver │            │  DnsUpdater  │          │   Events    │
//! │ (resolve)       │            │  (update)    │          │  (notify)   │
//! └─────────────────┘            └──────────────┘          └─────────────┘
//! ```
//!
//! ## State Machine
//!
//! The engine is either waiting on the trigger stream or running one poll.
//! Polls never overlap: the next trigger is only read once the current
//! poll (including its HTTP request) has finished.

use crate::error::Result;
use crate::traits::{AddressResolver, DnsUpdater};
use std::fmt;
use std::net::Ipv4Addr;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

/// Capacity of the engine event channel
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 64;

/// Something the engine waits for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Poll interval elapsed
    Tick,
    /// Termination requested
    Shutdown(ShutdownSignal),
}

/// Termination requests that stop the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShutdownSignal {
    /// SIGINT
    Interrupt,
    /// SIGTERM
    Terminate,
    /// SIGHUP
    Hangup,
}

impl ShutdownSignal {
    /// Every signal that stops the engine
    pub const ALL: [ShutdownSignal; 3] = [Self::Interrupt, Self::Terminate, Self::Hangup];

    /// Conventional signal name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
            Self::Hangup => "SIGHUP",
        }
    }
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why the engine stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A shutdown trigger arrived
    Signal(ShutdownSignal),
    /// The trigger stream ended
    TriggersClosed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(signal) => write!(f, "caught {signal}"),
            Self::TriggersClosed => f.write_str("trigger source closed"),
        }
    }
}

/// Result of a single poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The address changed and the provider accepted it
    Updated(Ipv4Addr),
    /// The address equals the last-known address
    Unchanged(Ipv4Addr),
    /// The address changed but the update failed; retried next tick
    UpdateFailed(Ipv4Addr),
    /// The interface could not be read; last-known address kept
    ResolveFailed,
}

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        source: String,
        fqdn: String,
        provider: &'static str,
    },

    /// Resolved address matched the last-known address
    UpdateSkipped { address: Ipv4Addr },

    /// DNS update succeeded
    UpdateSucceeded {
        address: Ipv4Addr,
        previous: Option<Ipv4Addr>,
    },

    /// DNS update failed
    UpdateFailed { address: Ipv4Addr, error: String },

    /// The resolver reported an error
    ResolveFailed { error: String },

    /// Engine stopped
    Stopped { reason: StopReason },
}

/// Core DDNS engine
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Either [`DdnsEngine::run_once()`] for one-shot mode, or
///    [`DdnsEngine::run()`] with a trigger stream for polling mode
/// 3. `run()` returns when a shutdown trigger arrives
///
/// ## Last-Known Address
///
/// The last-known address only advances when the provider accepted the
/// update. A rejected or failed update is therefore retried on every tick
/// until it succeeds or the address changes again.
pub struct DdnsEngine {
    /// Resolver for the current address
    resolver: Box<dyn AddressResolver>,

    /// Updater for the provider
    updater: Box<dyn DnsUpdater>,

    /// Address the provider last accepted
    last_known: Option<Ipv4Addr>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events.
    /// The receiver may be dropped if nobody is interested.
    pub fn new(
        resolver: Box<dyn AddressResolver>,
        updater: Box<dyn DnsUpdater>,
    ) -> (Self, mpsc::Receiver<EngineEvent>) {
        Self::with_event_capacity(resolver, updater, DEFAULT_EVENT_CHANNEL_CAPACITY)
    }

    /// Create a new DDNS engine with a custom event channel capacity
    pub fn with_event_capacity(
        resolver: Box<dyn AddressResolver>,
        updater: Box<dyn DnsUpdater>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));

        let engine = Self {
            resolver,
            updater,
            last_known: None,
            event_tx: tx,
        };

        (engine, rx)
    }

    /// Seed the last-known address
    pub fn with_last_known(mut self, ip: Ipv4Addr) -> Self {
        self.last_known = Some(ip);
        self
    }

    /// The address the provider last accepted
    pub fn last_known(&self) -> Option<Ipv4Addr> {
        self.last_known
    }

    /// Run the polling loop
    ///
    /// Polls once immediately, then once per [`Trigger::Tick`], until a
    /// [`Trigger::Shutdown`] arrives or the stream ends. An update in
    /// flight is never interrupted; shutdown is seen at the next trigger.
    pub async fn run<S>(&mut self, triggers: S) -> StopReason
    where
        S: Stream<Item = Trigger>,
    {
        let mut triggers = std::pin::pin!(triggers);

        self.emit_event(EngineEvent::Started {
            source: self.resolver.describe().to_string(),
            fqdn: self.updater.fqdn().to_string(),
            provider: self.updater.provider_name(),
        });

        info!(
            "Watching {} for {} via {}",
            self.resolver.describe(),
            self.updater.fqdn(),
            self.updater.provider_name()
        );

        // we start by first updating the address
        self.poll().await;

        let reason = loop {
            match triggers.next().await {
                Some(Trigger::Tick) => {
                    self.poll().await;
                }
                Some(Trigger::Shutdown(signal)) => {
                    info!("Caught {}; terminating", signal);
                    break StopReason::Signal(signal);
                }
                None => {
                    info!("Trigger source closed; terminating");
                    break StopReason::TriggersClosed;
                }
            }
        };

        self.emit_event(EngineEvent::Stopped { reason });
        reason
    }

    /// Perform one resolve + compare + update step
    ///
    /// Errors are logged and reported through the outcome; they never stop
    /// the loop.
    pub async fn poll(&mut self) -> PollOutcome {
        let ip = match self.resolver.resolve().await {
            Ok(ip) => ip,
            Err(e) => {
                warn!("{}", e);
                self.emit_event(EngineEvent::ResolveFailed {
                    error: e.to_string(),
                });
                return PollOutcome::ResolveFailed;
            }
        };

        if self.last_known == Some(ip) {
            debug!("{}: address {} unchanged", self.resolver.describe(), ip);
            self.emit_event(EngineEvent::UpdateSkipped { address: ip });
            return PollOutcome::Unchanged(ip);
        }

        debug!("{}: new address {}", self.resolver.describe(), ip);

        match self.updater.update(ip).await {
            Ok(()) => {
                let previous = self.last_known.replace(ip);
                self.emit_event(EngineEvent::UpdateSucceeded {
                    address: ip,
                    previous,
                });
                PollOutcome::Updated(ip)
            }
            Err(e) => {
                warn!("Update of {} to {} failed: {}", self.updater.fqdn(), ip, e);
                self.emit_event(EngineEvent::UpdateFailed {
                    address: ip,
                    error: e.to_string(),
                });
                PollOutcome::UpdateFailed(ip)
            }
        }
    }

    /// One-shot mode: resolve and update once, propagating any error
    ///
    /// The update is sent even if the address equals the last-known one.
    pub async fn run_once(&mut self) -> Result<Ipv4Addr> {
        let ip = self.resolver.resolve().await?;
        debug!("{}: address {}", self.resolver.describe(), ip);

        self.updater.update(ip).await?;

        let previous = self.last_known.replace(ip);
        self.emit_event(EngineEvent::UpdateSucceeded {
            address: ip,
            previous,
        });
        Ok(ip)
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!("Event channel full, dropping event {:?}", event);
            }
            // Nobody is listening; that's fine.
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_names() {
        assert_eq!(ShutdownSignal::Terminate.to_string(), "SIGTERM");
        assert_eq!(ShutdownSignal::Interrupt.to_string(), "SIGINT");
        assert_eq!(ShutdownSignal::Hangup.to_string(), "SIGHUP");
        assert_eq!(ShutdownSignal::ALL.len(), 3);
    }

    #[test]
    fn test_stop_reason_display() {
        assert_eq!(
            StopReason::Signal(ShutdownSignal::Hangup).to_string(),
            "caught SIGHUP"
        );
        assert_eq!(StopReason::TriggersClosed.to_string(), "trigger source closed");
    }
}
