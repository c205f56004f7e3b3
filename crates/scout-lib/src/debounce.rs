//! Debounced re-filtering
//!
//! This module provides:
//! - `DebounceTimer`, a single-slot arm/cancel/fire-once timer driven by an
//!   explicit clock so it can be stepped deterministically
//! - `Debouncer`, a tokio worker that drives a `DebounceTimer` and runs a
//!   sink with the latest value once input has been quiet for the window

use std::future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, trace};

/// Reference quiescence window for slider input
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(250);

/// Single-slot timer: at most one pending value, replaced on every arm
#[derive(Debug)]
pub struct DebounceTimer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> DebounceTimer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Store `value` and re-arm the deadline at `now + window`.
    /// Returns the value it replaced, if one was pending.
    pub fn arm(&mut self, value: T, now: Instant) -> Option<T> {
        self.pending
            .replace((value, now + self.window))
            .map(|(replaced, _)| replaced)
    }

    /// Drop the pending value without firing
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Release the pending value if its deadline has passed
    pub fn fire(&mut self, now: Instant) -> Option<T> {
        match self.deadline() {
            Some(deadline) if deadline <= now => self.cancel(),
            _ => None,
        }
    }

    /// Release the pending value immediately, ignoring the deadline
    pub fn take(&mut self) -> Option<T> {
        self.cancel()
    }
}

enum Command<T> {
    Schedule(T),
    Flush,
    Cancel,
}

/// Coalesces a stream of values into at most one sink call per quiet window.
///
/// The worker task stops when the `Debouncer` is dropped; a value still
/// pending at that point is discarded.
pub struct Debouncer<T> {
    commands: mpsc::UnboundedSender<Command<T>>,
    worker: JoinHandle<()>,
    window: Duration,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawn the worker. Must be called from within a tokio runtime.
    pub fn new<F>(window: Duration, sink: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let (commands, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(DebounceTimer::new(window), rx, sink));

        Self {
            commands,
            worker,
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Replace any pending value with `value` and restart the window
    pub fn schedule(&self, value: T) {
        self.send(Command::Schedule(value));
    }

    /// Run the sink now with the pending value, if any
    pub fn flush(&self) {
        self.send(Command::Flush);
    }

    /// Discard the pending value
    pub fn cancel(&self) {
        self.send(Command::Cancel);
    }

    /// Stop the worker; a pending value never fires
    pub fn shutdown(self) {
        drop(self);
    }

    fn send(&self, command: Command<T>) {
        if self.commands.send(command).is_err() {
            debug!("Debounce worker has stopped, dropping command");
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run_worker<T, F>(
    mut timer: DebounceTimer<T>,
    mut commands: mpsc::UnboundedReceiver<Command<T>>,
    mut sink: F,
) where
    F: FnMut(T),
{
    loop {
        let deadline = timer.deadline();

        tokio::select! {
            biased;

            command = commands.recv() => match command {
                Some(Command::Schedule(value)) => {
                    if timer.arm(value, Instant::now()).is_some() {
                        trace!("Coalesced pending value");
                    }
                }
                Some(Command::Flush) => {
                    if let Some(value) = timer.take() {
                        sink(value);
                    }
                }
                Some(Command::Cancel) => {
                    timer.cancel();
                }
                None => break,
            },
            _ = sleep_until_deadline(deadline) => {
                if let Some(value) = timer.fire(Instant::now()) {
                    sink(value);
                }
            }
        }
    }

    debug!("Debounce worker stopped");
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => future::pending().await,
    }
}
