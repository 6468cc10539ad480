// # ifddns-core
//
// Core library for the interface-driven DDNS notifier.
//
// ## Architecture Overview
//
// The notifier keeps one fully-qualified domain name pointed at the
// routable IPv4 address of one network interface:
// - **AddressResolver**: Trait for reading the interface's usable IPv4 address
// - **DnsUpdater**: Trait for pushing an address to a DDNS provider
// - **DdnsEngine**: Poll loop that resolves on every trigger and updates on change
// - **UpdaterRegistry**: Provider name -> updater factory lookup
// - **KeyFile**: Credential source holding `FQDN PROVIDER SECRET` rows
//
// ## Control Flow
//
// ```text
// Trigger (tick | shutdown) -> resolve -> compare with last-known -> update -> log
// ```
//
// Only one poll iteration runs at a time. Retrying a failed update is the
// engine's job (next tick), never the updater's.

pub mod config;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod net;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use config::{DdnsConfig, UpdaterOptions};
pub use credentials::{Credential, KeyFile, Secret};
pub use engine::{DdnsEngine, EngineEvent, PollOutcome, ShutdownSignal, StopReason, Trigger};
pub use error::{Error, Result};
pub use registry::UpdaterRegistry;
pub use traits::{AddressResolver, DnsUpdater, DnsUpdaterFactory};
