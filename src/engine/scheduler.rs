//! Single-shot timers for beat and animation ticks.
//!
//! The state machine asks a [`Scheduler`] for one timer at a time and
//! reschedules from its own tick handler, so a tempo change only affects the
//! next interval. Two implementations are provided:
//! - [`TokioScheduler`]: real timers on the tokio runtime, delivered through an mpsc channel
//! - [`ManualScheduler`]: a virtual clock advanced explicitly by tests

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Timer event delivered back to the state machine.
///
/// The generation identifies which schedule request produced the event, so
/// handlers can drop events that were superseded while in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerEvent {
    Beat { generation: u64 },
    Animation { generation: u64 },
}

impl TimerEvent {
    pub fn generation(&self) -> u64 {
        match self {
            TimerEvent::Beat { generation } | TimerEvent::Animation { generation } => *generation,
        }
    }

    pub fn is_beat(&self) -> bool {
        matches!(self, TimerEvent::Beat { .. })
    }
}

/// Trait implemented by timer sources driving the metronome.
pub trait Scheduler {
    /// Deliver `event` once, `delay` from now.
    fn schedule_once(&mut self, delay: Duration, event: TimerEvent);

    /// Drop every timer that has not fired yet.
    fn cancel_all(&mut self);
}

/// Scheduler backed by `tokio::time::sleep`.
///
/// Each timer is a spawned task that sends its event when the sleep
/// completes. Must be used from within a tokio runtime.
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<TimerEvent>,
    pending: Vec<JoinHandle<()>>,
}

impl TokioScheduler {
    /// Create a scheduler and the receiver its events arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                pending: Vec::new(),
            },
            rx,
        )
    }

    /// Timers spawned and not yet finished
    pub fn pending(&self) -> usize {
        self.pending.iter().filter(|h| !h.is_finished()).count()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_once(&mut self, delay: Duration, event: TimerEvent) {
        self.pending.retain(|handle| !handle.is_finished());

        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the event loop has exited
            let _ = tx.send(event);
        });
        self.pending.push(handle);
    }

    fn cancel_all(&mut self) {
        for handle in self.pending.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[derive(Debug, Clone, Copy)]
struct ScheduledTimer {
    due: Duration,
    seq: u64,
    event: TimerEvent,
}

/// Deterministic scheduler driven by a virtual clock.
///
/// Nothing fires until the owner pops due events; timers with equal due
/// times fire in the order they were scheduled.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_seq: u64,
    queue: Vec<ScheduledTimer>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of timers that have not fired
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of beat timers that have not fired, stale ones included
    pub fn pending_beats(&self) -> usize {
        self.queue.iter().filter(|t| t.event.is_beat()).count()
    }

    /// Due time of the earliest pending timer
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.iter().map(|t| t.due).min()
    }

    /// Remove and return the earliest timer due at or before `until`,
    /// moving the clock to its due time.
    pub fn pop_due(&mut self, until: Duration) -> Option<(Duration, TimerEvent)> {
        let index = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= until)
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(i, _)| i)?;

        let timer = self.queue.remove(index);
        self.now = self.now.max(timer.due);
        Some((timer.due, timer.event))
    }

    /// Move the clock forward without firing anything.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_once(&mut self, delay: Duration, event: TimerEvent) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(ScheduledTimer {
            due: self.now + delay,
            seq,
            event,
        });
    }

    fn cancel_all(&mut self) {
        self.queue.clear();
    }
}
