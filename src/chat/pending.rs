//! Outstanding reply tracking.
//!
//! Every submission registers its own [`RequestId`]. The pending indicator is
//! shown while at least one request is outstanding, so an early reply can no
//! longer hide the indicator for a later, still-running one.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a single reply pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Set of requests still awaiting a reply.
#[derive(Debug, Clone, Default)]
pub struct PendingReplies {
    outstanding: HashSet<RequestId>,
}

impl PendingReplies {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request. Returns `true` when this made the indicator visible.
    pub fn begin(&mut self, id: RequestId) -> bool {
        let was_idle = self.outstanding.is_empty();
        self.outstanding.insert(id);
        was_idle
    }

    /// Resolve a request. Returns `true` when this hid the indicator.
    ///
    /// Resolving an unknown id is a no-op.
    pub fn finish(&mut self, id: RequestId) -> bool {
        self.outstanding.remove(&id) && self.outstanding.is_empty()
    }

    /// Whether the pending indicator should be visible.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.outstanding.is_empty()
    }

    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }
}
