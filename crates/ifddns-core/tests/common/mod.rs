//! Test doubles and common utilities for engine contract tests
//!
//! These doubles record what the engine asked of them without touching the
//! network or the operating system.

#![allow(dead_code)]

use ifddns_core::Error;
use ifddns_core::error::Result;
use ifddns_core::traits::{AddressResolver, DnsUpdater};
use ifddns_core::{ShutdownSignal, Trigger};
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

pub const IP_A: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 10);
pub const IP_B: Ipv4Addr = Ipv4Addr::new(198, 51, 100, 20);
pub const FQDN: &str = "host.example.com";

/// One scripted answer of a [`ScriptedResolver`]
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// Report this address
    Addr(Ipv4Addr),
    /// Report that the interface has no usable address
    NoAddress,
    /// Report that the interface is gone
    Missing,
}

/// An AddressResolver that replays a script
///
/// The last step repeats forever once the script is exhausted.
#[derive(Clone)]
pub struct ScriptedResolver {
    steps: Arc<Mutex<VecDeque<Step>>>,
    resolve_call_count: Arc<AtomicUsize>,
}

impl ScriptedResolver {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into_iter().collect())),
            resolve_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A resolver that always reports `ip`
    pub fn fixed(ip: Ipv4Addr) -> Self {
        Self::new([Step::Addr(ip)])
    }

    /// Get the number of times resolve() was called
    pub fn resolve_call_count(&self) -> usize {
        self.resolve_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AddressResolver for ScriptedResolver {
    async fn resolve(&self) -> Result<Ipv4Addr> {
        self.resolve_call_count.fetch_add(1, Ordering::SeqCst);

        let step = {
            let mut steps = self.steps.lock().unwrap();
            if steps.len() > 1 {
                steps.pop_front()
            } else {
                steps.front().copied()
            }
        };

        match step.unwrap_or(Step::NoAddress) {
            Step::Addr(ip) => Ok(ip),
            Step::NoAddress => Err(Error::no_usable_address("test0")),
            Step::Missing => Err(Error::InterfaceNotFound("test0".to_string())),
        }
    }

    fn describe(&self) -> &str {
        "test0"
    }
}

/// A DnsUpdater that records every attempt
///
/// Clones share their counters, so a test can keep one handle and give the
/// engine another.
#[derive(Clone)]
pub struct MockUpdater {
    /// Addresses passed to update(), in order
    attempts: Arc<Mutex<Vec<Ipv4Addr>>>,
    /// Number of upcoming calls that should fail
    failures_left: Arc<AtomicUsize>,
}

impl MockUpdater {
    pub fn new() -> Self {
        Self {
            attempts: Arc::new(Mutex::new(Vec::new())),
            failures_left: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make the next `n` calls to update() fail
    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    /// Get the number of times update() was called
    pub fn update_call_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    /// Get the addresses update() was called with
    pub fn attempts(&self) -> Vec<Ipv4Addr> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsUpdater for MockUpdater {
    async fn update(&self, ip: Ipv4Addr) -> Result<()> {
        self.attempts.lock().unwrap().push(ip);

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        if failing {
            Err(Error::rejected("mock", "simulated failure"))
        } else {
            Ok(())
        }
    }

    fn fqdn(&self) -> &str {
        FQDN
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A fixed trigger sequence
pub fn triggers(items: impl IntoIterator<Item = Trigger>) -> tokio_stream::Iter<std::vec::IntoIter<Trigger>> {
    tokio_stream::iter(items.into_iter().collect::<Vec<_>>())
}

/// `n` ticks followed by SIGTERM
pub fn ticks_then_sigterm(n: usize) -> tokio_stream::Iter<std::vec::IntoIter<Trigger>> {
    triggers(
        std::iter::repeat_n(Trigger::Tick, n)
            .chain(std::iter::once(Trigger::Shutdown(ShutdownSignal::Terminate))),
    )
}

/// A trigger stream the test feeds by hand
pub fn trigger_channel() -> (mpsc::UnboundedSender<Trigger>, UnboundedReceiverStream<Trigger>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, UnboundedReceiverStream::new(rx))
}
