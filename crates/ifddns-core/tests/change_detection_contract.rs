//! Contract Test: Change Detection
//!
//! The engine calls the updater only when the resolved address differs
//! from the address the provider last accepted.
//!
//! Constraints verified:
//! - The first poll always updates
//! - An unchanged address never reaches the updater
//! - A change produces exactly one update carrying the new address
//! - A seeded last-known address suppresses the first update

mod common;

use common::*;
use ifddns_core::{DdnsEngine, EngineEvent, PollOutcome, StopReason};

#[tokio::test]
async fn first_poll_updates() {
    let resolver = ScriptedResolver::fixed(IP_A);
    let updater = MockUpdater::new();

    let (mut engine, _event_rx) = DdnsEngine::new(Box::new(resolver), Box::new(updater.clone()));

    assert_eq!(engine.poll().await, PollOutcome::Updated(IP_A));
    assert_eq!(engine.last_known(), Some(IP_A));
    assert_eq!(updater.attempts(), vec![IP_A]);
}

#[tokio::test]
async fn unchanged_address_is_not_sent_again() {
    let resolver = ScriptedResolver::fixed(IP_A);
    let updater = MockUpdater::new();

    let (mut engine, _event_rx) =
        DdnsEngine::new(Box::new(resolver.clone()), Box::new(updater.clone()));

    let reason = engine.run(ticks_then_sigterm(5)).await;

    assert!(matches!(reason, StopReason::Signal(_)));
    // initial poll + 5 ticks
    assert_eq!(resolver.resolve_call_count(), 6);
    assert_eq!(
        updater.update_call_count(),
        1,
        "identical addresses must not trigger repeated updates"
    );
}

#[tokio::test]
async fn change_triggers_exactly_one_update() {
    let resolver = ScriptedResolver::new([Step::Addr(IP_A), Step::Addr(IP_A), Step::Addr(IP_B)]);
    let updater = MockUpdater::new();

    let (mut engine, _event_rx) = DdnsEngine::new(Box::new(resolver), Box::new(updater.clone()));

    engine.run(ticks_then_sigterm(4)).await;

    assert_eq!(updater.attempts(), vec![IP_A, IP_B]);
    assert_eq!(engine.last_known(), Some(IP_B));
}

#[tokio::test]
async fn seeded_address_suppresses_first_update() {
    let resolver = ScriptedResolver::new([Step::Addr(IP_A), Step::Addr(IP_B)]);
    let updater = MockUpdater::new();

    let (engine, _event_rx) = DdnsEngine::new(Box::new(resolver), Box::new(updater.clone()));
    let mut engine = engine.with_last_known(IP_A);

    assert_eq!(engine.poll().await, PollOutcome::Unchanged(IP_A));
    assert_eq!(updater.update_call_count(), 0);

    assert_eq!(engine.poll().await, PollOutcome::Updated(IP_B));
    assert_eq!(updater.attempts(), vec![IP_B]);
}

#[tokio::test]
async fn events_describe_each_poll() {
    let resolver = ScriptedResolver::new([Step::Addr(IP_A), Step::Addr(IP_A), Step::Addr(IP_B)]);
    let updater = MockUpdater::new();

    let (mut engine, mut event_rx) = DdnsEngine::new(Box::new(resolver), Box::new(updater));

    let reason = engine.run(triggers([ifddns_core::Trigger::Tick, ifddns_core::Trigger::Tick])).await;
    assert_eq!(reason, StopReason::TriggersClosed);

    let mut events = Vec::new();
    while let Ok(event) = event_rx.try_recv() {
        events.push(event);
    }

    assert_eq!(
        events,
        vec![
            EngineEvent::Started {
                source: "test0".to_string(),
                fqdn: FQDN.to_string(),
                provider: "mock",
            },
            EngineEvent::UpdateSucceeded {
                address: IP_A,
                previous: None,
            },
            EngineEvent::UpdateSkipped { address: IP_A },
            EngineEvent::UpdateSucceeded {
                address: IP_B,
                previous: Some(IP_A),
            },
            EngineEvent::Stopped {
                reason: StopReason::TriggersClosed,
            },
        ]
    );
}
