use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation handle captured by a fetch when it is issued.
///
/// The request itself is never aborted; the flag is checked before its
/// response is allowed to reach the visible state.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    id: u64,
    generation: u64,
    cancelled: Arc<AtomicBool>,
}

impl FetchTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

/// The single logical fetch slot of a match list.
///
/// Issuing a ticket cancels the one before it, so the last issued request
/// wins regardless of the order responses arrive in.
#[derive(Debug, Default)]
pub struct FetchSlot {
    next_id: u64,
    generation: u64,
    current: Option<FetchTicket>,
}

impl FetchSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for a new request, superseding any in-flight one
    pub fn issue(&mut self) -> FetchTicket {
        if let Some(previous) = self.current.take() {
            previous.cancel();
            tracing::debug!("Fetch {} superseded", previous.id);
        }

        self.next_id += 1;
        let ticket = FetchTicket {
            id: self.next_id,
            generation: self.generation,
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        self.current = Some(ticket.clone());
        ticket
    }

    /// Bump the refresh generation, invalidating whatever is in flight
    pub fn bump_generation(&mut self) -> u64 {
        self.generation += 1;
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Settle `ticket`. Returns `true` if its response may be committed.
    pub fn complete(&mut self, ticket: &FetchTicket) -> bool {
        if ticket.is_cancelled() {
            return false;
        }
        match &self.current {
            Some(current) if current.id == ticket.id => {
                self.current = None;
                true
            }
            _ => false,
        }
    }
}
