//! Request slots: one value per view, refreshed by fetches that may finish
//! out of order. Only the most recently issued request may write the slot.

use std::fmt;
use std::sync::mpsc::{channel, Receiver, Sender};

use crate::error::Error;

/// Identity of one issued request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

pub struct RequestSlot<T, E = Error> {
    value: Option<T>,
    error: Option<E>,
    issued: u64,
    resolved: u64,
}

impl<T, E> Default for RequestSlot<T, E> {
    fn default() -> Self {
        Self {
            value: None,
            error: None,
            issued: 0,
            resolved: 0,
        }
    }
}

impl<T, E: fmt::Display> RequestSlot<T, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request, superseding every earlier one.
    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    /// Applies a finished request. Results for any ticket but the latest are
    /// dropped and `false` is returned. A failure keeps the previous value.
    pub fn resolve(&mut self, ticket: Ticket, result: Result<T, E>) -> bool {
        if ticket.0 != self.issued {
            log::debug!(
                "discarding stale result of request {} (latest is {})",
                ticket.0,
                self.issued
            );
            return false;
        }
        self.resolved = ticket.0;
        match result {
            Ok(value) => {
                self.value = Some(value);
                self.error = None;
            }
            Err(err) => {
                log::error!("request {} failed: {err}", ticket.0);
                self.error = Some(err);
            }
        }
        true
    }

    pub fn ready(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn ready_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    pub fn error(&self) -> Option<&E> {
        self.error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.issued > self.resolved
    }

    pub fn generation(&self) -> u64 {
        self.issued
    }
}

impl<T, E> fmt::Debug for RequestSlot<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match (&self.value, self.issued > self.resolved) {
            (None, false) => "Undefined",
            (None, true) => "Init",
            (Some(_), false) => "Ready",
            (Some(_), true) => "Stale",
        };
        f.debug_struct("RequestSlot")
            .field("state", &state)
            .field("generation", &self.issued)
            .field("failed", &self.error.is_some())
            .finish()
    }
}

type Delivery<T, E> = (Ticket, Result<T, E>);

/// A [`RequestSlot`] whose requests run on worker threads. Results are
/// picked up by [`BackgroundSlot::poll`] on the owning thread.
pub struct BackgroundSlot<T, E = Error> {
    slot: RequestSlot<T, E>,
    tx: Sender<Delivery<T, E>>,
    rx: Receiver<Delivery<T, E>>,
}

impl<T, E> Default for BackgroundSlot<T, E> {
    fn default() -> Self {
        let (tx, rx) = channel();
        Self {
            slot: RequestSlot::default(),
            tx,
            rx,
        }
    }
}

impl<T, E> BackgroundSlot<T, E>
where
    T: Send + 'static,
    E: fmt::Display + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&mut self, job: F) -> Ticket
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        let ticket = self.slot.issue();
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            // The slot may be gone by the time the job finishes.
            let _ = tx.send((ticket, job()));
        });
        ticket
    }

    /// Drains finished jobs. Returns whether the slot changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok((ticket, result)) = self.rx.try_recv() {
            changed |= self.slot.resolve(ticket, result);
        }
        changed
    }

    pub fn slot(&self) -> &RequestSlot<T, E> {
        &self.slot
    }

    pub fn ready(&self) -> Option<&T> {
        self.slot.ready()
    }

    pub fn ready_mut(&mut self) -> Option<&mut T> {
        self.slot.ready_mut()
    }

    pub fn error(&self) -> Option<&E> {
        self.slot.error()
    }

    pub fn is_loading(&self) -> bool {
        self.slot.is_loading()
    }
}

impl<T, E> fmt::Debug for BackgroundSlot<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.slot.fmt(f)
    }
}
