//! Outstanding list request tracking

use std::collections::HashMap;
use std::fmt;

use chrono::DateTime;
use chrono::Utc;

use crate::model::SkelType;

/// Handle of a dispatched list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    /// Returns the raw id.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One outstanding fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    /// Key of the parent whose children are requested.
    pub parent: String,
    /// Requested kind.
    pub kind: SkelType,
    /// Continuation cursor, absent for the first page.
    pub cursor: Option<String>,
    /// When the request was dispatched.
    pub issued_at: DateTime<Utc>,
}

/// Tracks outstanding list requests so late replies can be recognised.
///
/// Ids are never reused, so a reply for an invalidated request can never
/// be mistaken for a current one.
///
/// # Example
///
/// ```
/// use hierarchy_lib::model::SkelType;
/// use hierarchy_lib::tracker::RequestTracker;
///
/// let mut tracker = RequestTracker::new();
/// let id = tracker.dispatch("root", SkelType::Node, None);
/// tracker.invalidate_all();
///
/// assert!(tracker.resolve(id).is_none());
/// ```
#[derive(Debug, Default)]
pub struct RequestTracker {
    next_id: u64,
    pending: HashMap<RequestId, PendingRequest>,
}

impl RequestTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a request and returns its handle.
    pub fn dispatch(&mut self, parent: impl Into<String>, kind: SkelType, cursor: Option<String>) -> RequestId {
        self.next_id += 1;
        let id = RequestId(self.next_id);
        let request = PendingRequest {
            parent: parent.into(),
            kind,
            cursor,
            issued_at: Utc::now(),
        };
        log::debug!(
            "[RequestTracker::dispatch] {} {} parent={} cursor={:?}",
            id,
            request.kind,
            request.parent,
            request.cursor
        );
        self.pending.insert(id, request);
        id
    }

    /// Removes a request, returning it if it was still tracked.
    ///
    /// `None` means the reply is stale and must be ignored.
    pub fn resolve(&mut self, id: RequestId) -> Option<PendingRequest> {
        self.pending.remove(&id)
    }

    /// Forgets every outstanding request.
    pub fn invalidate_all(&mut self) {
        if !self.pending.is_empty() {
            log::debug!("[RequestTracker::invalidate_all] dropping {} request(s)", self.pending.len());
        }
        self.pending.clear();
    }

    /// Returns `true` if `id` is still tracked.
    pub fn is_tracked(&self, id: RequestId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Returns `true` if a request for `(parent, kind)` is outstanding.
    pub fn is_loading(&self, parent: &str, kind: SkelType) -> bool {
        self.pending
            .values()
            .any(|r| r.parent == parent && r.kind == kind)
    }

    /// Number of outstanding requests.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if nothing is outstanding.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Returns the tracked request for `id`.
    pub fn get(&self, id: RequestId) -> Option<&PendingRequest> {
        self.pending.get(&id)
    }
}
