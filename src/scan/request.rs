//! Scan request lifecycle
//!
//! Explicit state machine for one scan request:
//! RECEIVED → SKIPPED
//! RECEIVED → SIZED → TREE_TOOL_RUN → ASSEMBLED
//! any non-terminal state → DEAD
//!
//! There is no retry state. Terminal states accept no further transitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};
use uuid::Uuid;

use super::document::ScanDocument;

/// One filesystem-rooted piece of content submitted for analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanUnit {
    /// Request identifier
    pub id: Uuid,
    /// Type tag used to route the request to a processor
    #[serde(rename = "type")]
    pub kind: String,
    /// Location of the content on disk
    pub location: PathBuf,
}

impl ScanUnit {
    /// Create a scan unit with a fresh identifier
    pub fn new(kind: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: kind.into(),
            location: location.into(),
        }
    }
}

impl std::fmt::Display for ScanUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{} ({})", self.kind, self.location.display(), self.id)
    }
}

/// Lifecycle state of a scan request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanState {
    Received,
    Sized,
    TreeToolRun,
    Assembled,
    Skipped,
    Dead,
}

impl ScanState {
    /// Check if state is terminal (no further transitions)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Assembled | Self::Skipped | Self::Dead)
    }

    /// Whether `next` is a legal successor of this state
    pub fn can_advance_to(&self, next: ScanState) -> bool {
        match (self, next) {
            (Self::Received, Self::Sized | Self::Skipped | Self::Dead) => true,
            (Self::Sized, Self::TreeToolRun | Self::Dead) => true,
            (Self::TreeToolRun, Self::Assembled | Self::Dead) => true,
            _ => false,
        }
    }

    /// Get display name for this state
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Received => "RECEIVED",
            Self::Sized => "SIZED",
            Self::TreeToolRun => "TREE_TOOL_RUN",
            Self::Assembled => "ASSEMBLED",
            Self::Skipped => "SKIPPED",
            Self::Dead => "DEAD",
        }
    }
}

/// Final result of handling a request
#[derive(Debug)]
pub enum ScanOutcome {
    /// The document was produced (possibly without some per-file tools)
    Assembled(Box<ScanDocument>),
    /// The request was not attempted; not a statement about the input
    Skipped { reason: String },
    /// The request failed terminally
    Dead { category: String, reason: String },
}

impl ScanOutcome {
    /// Reason string for skipped and dead outcomes
    pub fn reason(&self) -> Option<&str> {
        match self {
            ScanOutcome::Assembled(_) => None,
            ScanOutcome::Skipped { reason } | ScanOutcome::Dead { reason, .. } => Some(reason.as_str()),
        }
    }

    /// The document, if one was assembled
    pub fn document(&self) -> Option<&ScanDocument> {
        match self {
            ScanOutcome::Assembled(document) => Some(document.as_ref()),
            _ => None,
        }
    }
}

/// A scan unit moving through the lifecycle
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub unit: ScanUnit,
    state: ScanState,
    history: Vec<ScanState>,
}

impl ScanRequest {
    /// Create a request in the RECEIVED state
    pub fn new(unit: ScanUnit) -> Self {
        Self {
            unit,
            state: ScanState::Received,
            history: vec![ScanState::Received],
        }
    }

    /// Current state
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Every state the request has been in, oldest first
    pub fn history(&self) -> &[ScanState] {
        &self.history
    }

    /// Move to `next` if the transition is legal
    ///
    /// Illegal transitions leave the request untouched and return false.
    pub fn advance(&mut self, next: ScanState) -> bool {
        if !self.state.can_advance_to(next) {
            warn!(
                "Refusing transition {} -> {} for {}",
                self.state.display_name(),
                next.display_name(),
                self.unit
            );
            return false;
        }
        debug!(
            "{}: {} -> {}",
            self.unit,
            self.state.display_name(),
            next.display_name()
        );
        self.state = next;
        self.history.push(next);
        true
    }

    /// Mark the request skipped
    pub fn mark_skip(&mut self, reason: impl Into<String>) -> ScanOutcome {
        self.advance(ScanState::Skipped);
        ScanOutcome::Skipped {
            reason: reason.into(),
        }
    }

    /// Mark the request dead
    pub fn mark_dead(&mut self, category: impl Into<String>, reason: impl Into<String>) -> ScanOutcome {
        self.advance(ScanState::Dead);
        ScanOutcome::Dead {
            category: category.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ScanRequest {
        ScanRequest::new(ScanUnit::new("fossology", "/scan/unit"))
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut request = request();
        assert!(request.advance(ScanState::Sized));
        assert!(request.advance(ScanState::TreeToolRun));
        assert!(request.advance(ScanState::Assembled));
        assert!(request.state().is_terminal());
        assert_eq!(
            request.history(),
            &[
                ScanState::Received,
                ScanState::Sized,
                ScanState::TreeToolRun,
                ScanState::Assembled
            ]
        );
    }

    #[test]
    fn test_skip_only_from_received() {
        let mut request = request();
        request.advance(ScanState::Sized);
        assert!(!request.advance(ScanState::Skipped));
        assert_eq!(request.state(), ScanState::Sized);
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut request = request();
        let outcome = request.mark_dead("ToolExec", "nomos failed");
        assert_eq!(outcome.reason(), Some("nomos failed"));
        assert_eq!(request.state(), ScanState::Dead);

        assert!(!request.advance(ScanState::Sized));
        assert!(!request.advance(ScanState::Assembled));
        assert_eq!(request.state(), ScanState::Dead);
    }

    #[test]
    fn test_no_skipping_ahead() {
        let mut request = request();
        assert!(!request.advance(ScanState::TreeToolRun));
        assert!(!request.advance(ScanState::Assembled));
        assert_eq!(request.state(), ScanState::Received);
    }

    #[test]
    fn test_skip_outcome() {
        let mut request = request();
        let outcome = request.mark_skip("suite unavailable");
        assert!(matches!(outcome, ScanOutcome::Skipped { .. }));
        assert!(outcome.document().is_none());
        assert_eq!(request.state(), ScanState::Skipped);
    }
}
