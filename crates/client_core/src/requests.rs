use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchAll,
    Create,
    UpdateAmount,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FetchAll => "fetch_all",
            Self::Create => "create",
            Self::UpdateAmount => "update_amount",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

#[derive(Debug, Default)]
struct TrackerState {
    next_id: u64,
    in_flight: HashMap<RequestId, Operation>,
}

/// In-flight gateway requests, keyed per call so overlapping operations
/// can finish in any order without clearing each other's loading state.
///
/// Clones share the same set. Each [`PendingRequest`] releases its entry
/// when finished or dropped, so a cancelled operation never leaves the view
/// loading.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    state: Arc<Mutex<TrackerState>>,
}

impl RequestTracker {
    fn state(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn begin(&self, operation: Operation) -> PendingRequest {
        let mut state = self.state();
        state.next_id += 1;
        let id = RequestId(state.next_id);
        state.in_flight.insert(id, operation);
        PendingRequest {
            id,
            tracker: self.clone(),
        }
    }

    fn release(&self, id: RequestId) -> Option<Operation> {
        self.state().in_flight.remove(&id)
    }

    pub fn is_idle(&self) -> bool {
        self.state().in_flight.is_empty()
    }

    pub fn pending(&self, operation: Operation) -> usize {
        self.state()
            .in_flight
            .values()
            .filter(|op| **op == operation)
            .count()
    }

    pub fn len(&self) -> usize {
        self.state().in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_idle()
    }
}

/// Registration of one in-flight request.
#[must_use = "dropping the request releases it immediately"]
#[derive(Debug)]
pub struct PendingRequest {
    id: RequestId,
    tracker: RequestTracker,
}

impl PendingRequest {
    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn finish(self) -> Option<Operation> {
        self.tracker.release(self.id)
    }
}

impl Drop for PendingRequest {
    fn drop(&mut self) {
        self.tracker.release(self.id);
    }
}
