//! Order creation state machine.

use serde::{Deserialize, Serialize};

/// Progress of a single order creation.
///
/// State transitions:
/// ```text
/// Received ──► ReferencesValidating ──┬──► ReferencesOk ──► Persisting ──┬──► Persisted
///    │                                └──► ReferencesInvalid           └──► PersistFailed
///    └──► Rejected
/// ```
///
/// `Rejected` covers malformed input, which is refused before any remote
/// call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WorkflowState {
    #[default]
    Received,
    Rejected,
    ReferencesValidating,
    ReferencesOk,
    ReferencesInvalid,
    Persisting,
    Persisted,
    PersistFailed,
}

impl WorkflowState {
    /// Returns true if `next` directly follows this state.
    pub fn can_advance_to(&self, next: WorkflowState) -> bool {
        use WorkflowState::*;
        matches!(
            (self, next),
            (Received, Rejected)
                | (Received, ReferencesValidating)
                | (ReferencesValidating, ReferencesOk)
                | (ReferencesValidating, ReferencesInvalid)
                | (ReferencesOk, Persisting)
                | (Persisting, Persisted)
                | (Persisting, PersistFailed)
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowState::Rejected
                | WorkflowState::ReferencesInvalid
                | WorkflowState::Persisted
                | WorkflowState::PersistFailed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Received => "Received",
            WorkflowState::Rejected => "Rejected",
            WorkflowState::ReferencesValidating => "ReferencesValidating",
            WorkflowState::ReferencesOk => "ReferencesOk",
            WorkflowState::ReferencesInvalid => "ReferencesInvalid",
            WorkflowState::Persisting => "Persisting",
            WorkflowState::Persisted => "Persisted",
            WorkflowState::PersistFailed => "PersistFailed",
        }
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
