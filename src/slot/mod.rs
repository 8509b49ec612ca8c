//! Per-artifact request tracking.
//!
//! A slot is idle, in flight, or done. While in flight a second `begin` is
//! ignored, and only the ticket that started the request may complete it. The
//! same state drives the loading indicator.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

/// Proof that the holder started the request a slot is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Ticket {
    fn next() -> Ticket {
        Ticket(NEXT_TICKET.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    InFlight,
    Done,
}

#[derive(Debug, Clone)]
enum State<T> {
    Idle,
    /// The previous value stays readable while a refresh runs.
    InFlight { ticket: Ticket, previous: Option<T> },
    Done(T),
}

#[derive(Debug, Clone)]
pub struct RequestSlot<T> {
    state: State<T>,
}

impl<T> Default for RequestSlot<T> {
    fn default() -> Self {
        Self { state: State::Idle }
    }
}

impl<T> RequestSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot. Returns `None` if a request is already outstanding.
    pub fn begin(&mut self) -> Option<Ticket> {
        let previous = match std::mem::replace(&mut self.state, State::Idle) {
            State::InFlight { ticket, previous } => {
                self.state = State::InFlight { ticket, previous };
                debug!(?ticket, "slot busy, request ignored");
                return None;
            }
            State::Idle => None,
            State::Done(v) => Some(v),
        };
        let ticket = Ticket::next();
        self.state = State::InFlight { ticket, previous };
        Some(ticket)
    }

    /// Stores `value` if `ticket` owns the in-flight request. Stale tickets are dropped.
    pub fn complete(&mut self, ticket: Ticket, value: T) -> bool {
        let owns = matches!(&self.state, State::InFlight { ticket: current, .. } if *current == ticket);
        if owns {
            self.state = State::Done(value);
        } else {
            debug!(?ticket, "stale completion dropped");
        }
        owns
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::Idle => Phase::Idle,
            State::InFlight { .. } => Phase::InFlight,
            State::Done(_) => Phase::Done,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase() == Phase::InFlight
    }

    /// Latest completed value, including the one being refreshed.
    pub fn value(&self) -> Option<&T> {
        match &self.state {
            State::Idle => None,
            State::InFlight { previous, .. } => previous.as_ref(),
            State::Done(v) => Some(v),
        }
    }

    pub fn value_mut(&mut self) -> Option<&mut T> {
        match &mut self.state {
            State::Idle => None,
            State::InFlight { previous, .. } => previous.as_mut(),
            State::Done(v) => Some(v),
        }
    }
}
