//! Core traits for the DDNS notifier
//!
//! This module defines the capability interfaces the engine is built on.
//!
//! - [`AddressResolver`]: Read the current usable IPv4 address
//! - [`DnsUpdater`]: Push an address to a DDNS provider
//! - [`DnsUpdaterFactory`]: Build an updater from a keyfile credential

pub mod address_resolver;
pub mod dns_updater;

pub use address_resolver::AddressResolver;
pub use dns_updater::{DnsUpdater, DnsUpdaterFactory};
