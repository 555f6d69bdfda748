//! Append-only event sink for scheduler and memory transitions.
//!
//! Core components take `&mut EventLog` and record human-readable events;
//! a display layer keeps the last sequence number it saw and reads newer
//! entries with [`EventLog::since`]. Every event is mirrored to the `log`
//! facade as well.

use std::collections::VecDeque;
use std::fmt;

use log::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Created,
    Admitted,
    Dispatched,
    Executed,
    PageRequest,
    PageHit,
    PageFault,
    Evicted,
    WriteBack,
    Dirty,
    Blocked,
    Unblocked,
    Demoted,
    Finished,
    Released,
    Terminated,
    NotFound,
    Idle,
}

impl EventKind {
    fn level(self) -> Level {
        match self {
            EventKind::NotFound => Level::Warn,
            EventKind::Created
            | EventKind::Finished
            | EventKind::Terminated
            | EventKind::Evicted
            | EventKind::WriteBack => Level::Info,
            _ => Level::Debug,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub seq: u64,
    pub tick: u64,
    pub kind: EventKind,
    pub message: String,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[t{:>4}] {}", self.tick, self.message)
    }
}

/// Bounded ring buffer of events; the oldest entries are dropped when full
#[derive(Debug)]
pub struct EventLog {
    events: VecDeque<Event>,
    capacity: usize,
    next_seq: u64,
    tick: u64,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        EventLog {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
            next_seq: 0,
            tick: 0,
        }
    }

    /// Stamp subsequent events with `tick`
    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    pub fn record(&mut self, kind: EventKind, message: impl Into<String>) {
        let message = message.into();
        log::log!(kind.level(), "{}", message);

        if self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(Event {
            seq: self.next_seq,
            tick: self.tick,
            kind,
            message,
        });
        self.next_seq += 1;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Events with a sequence number >= `seq` that are still buffered
    pub fn since(&self, seq: u64) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |event| event.seq >= seq)
    }

    /// Sequence number the next recorded event will receive
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.back()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of recorded events of `kind` still in the buffer
    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|event| event.kind == kind).count()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(crate::constants::EVENT_LOG_CAPACITY)
    }
}
