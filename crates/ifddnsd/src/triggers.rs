//! Timer and signal plumbing for the poll loop
//!
//! Produces the single `Trigger` stream the engine consumes: one `Tick` per
//! poll interval, plus one `Shutdown` per termination signal.

use ifddns_core::{ShutdownSignal, Trigger};
use std::io;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::{Stream, StreamExt};

/// Ticks every `period`, starting one period from now
///
/// The engine polls once on its own at startup, so the first tick is
/// deferred. A slow update delays the following ticks instead of bunching
/// them up.
pub fn ticks(period: Duration) -> impl Stream<Item = Trigger> {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    IntervalStream::new(interval).map(|_| Trigger::Tick)
}

/// Shutdown triggers for SIGINT, SIGTERM and SIGHUP
///
/// Must be called from within the runtime.
#[cfg(unix)]
pub fn shutdown_signals() -> io::Result<impl Stream<Item = Trigger>> {
    use tokio::signal::unix::{SignalKind, signal};
    use tokio_stream::wrappers::SignalStream;

    let on = |kind: SignalKind, sig: ShutdownSignal| -> io::Result<_> {
        Ok(SignalStream::new(signal(kind)?).map(move |()| Trigger::Shutdown(sig)))
    };

    let interrupt = on(SignalKind::interrupt(), ShutdownSignal::Interrupt)?;
    let terminate = on(SignalKind::terminate(), ShutdownSignal::Terminate)?;
    let hangup = on(SignalKind::hangup(), ShutdownSignal::Hangup)?;

    Ok(interrupt.merge(terminate).merge(hangup))
}

/// Shutdown triggers for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
pub fn shutdown_signals() -> io::Result<impl Stream<Item = Trigger>> {
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::ReceiverStream;

    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(Trigger::Shutdown(ShutdownSignal::Interrupt)).await;
        }
    });

    Ok(ReceiverStream::new(rx))
}

/// Everything the poll loop waits on
pub fn triggers(period: Duration) -> io::Result<impl Stream<Item = Trigger>> {
    Ok(ticks(period).merge(shutdown_signals()?))
}
