//! Error types for the DDNS notifier
//!
//! This module defines all error types used throughout the workspace.
//!
//! The variants follow the notifier's failure taxonomy:
//! - configuration problems (`Config`, `InvalidDomain`) are fatal at startup
//! - interface problems (`InterfaceNotFound`, `NoUsableAddress`,
//!   `InterfaceMisconfigured`) are warnings while polling
//! - provider problems (`Transport`, `Protocol`, `ProviderRejected`) are
//!   warnings while polling and retried on the next tick

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed underlying cause carried by transport and protocol errors
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Core error type for the DDNS notifier
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (bad arguments, missing credential, unsafe keyfile)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The named network interface does not exist
    #[error("Interface not found: {0}")]
    InterfaceNotFound(String),

    /// The interface exists but carries no acceptable IPv4 address
    #[error("{interface}: no usable IPv4 address")]
    NoUsableAddress {
        /// Interface name
        interface: String,
    },

    /// The interface reported an address that cannot be interpreted
    #[error("{interface}: {message}")]
    InterfaceMisconfigured {
        /// Interface name
        interface: String,
        /// What was wrong with the address
        message: String,
    },

    /// The domain cannot be split into host and zone
    #[error("{0} is not a fully-qualified domain name")]
    InvalidDomain(String),

    /// The HTTP exchange with the provider failed
    #[error("{provider}: transport error: {source}")]
    Transport {
        /// Provider name
        provider: &'static str,
        /// Underlying cause
        source: BoxError,
    },

    /// The provider answered with something we could not decode
    #[error("{provider}: protocol error: {source}")]
    Protocol {
        /// Provider name
        provider: &'static str,
        /// Underlying cause
        source: BoxError,
    },

    /// The provider understood the request and refused it
    #[error("{provider}: update rejected: {message}")]
    ProviderRejected {
        /// Provider name
        provider: &'static str,
        /// Provider message, verbatim
        message: String,
    },

    /// I/O errors (keyfile access, interface enumeration)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a "no usable address" error
    pub fn no_usable_address(interface: impl Into<String>) -> Self {
        Self::NoUsableAddress {
            interface: interface.into(),
        }
    }

    /// Create an interface misconfiguration error
    pub fn misconfigured(interface: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InterfaceMisconfigured {
            interface: interface.into(),
            message: message.into(),
        }
    }

    /// Create a transport error wrapping its cause
    pub fn transport(provider: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            provider,
            source: source.into(),
        }
    }

    /// Create a protocol error wrapping its cause
    pub fn protocol(provider: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Protocol {
            provider,
            source: source.into(),
        }
    }

    /// Create a provider rejection error
    pub fn rejected(provider: &'static str, message: impl Into<String>) -> Self {
        Self::ProviderRejected {
            provider,
            message: message.into(),
        }
    }

    /// Whether this error comes from reading the interface
    pub fn is_interface_error(&self) -> bool {
        matches!(
            self,
            Self::InterfaceNotFound(_)
                | Self::NoUsableAddress { .. }
                | Self::InterfaceMisconfigured { .. }
        )
    }
}
