use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::TransferError;

/// Lifecycle of a single upload attempt.
///
/// `Created → Running → Completing → Completed`, with `Canceled` and
/// `Failed` reachable from `Running` or `Completing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadState {
    Created,
    Running,
    Completing,
    Completed,
    Canceled,
    Failed,
}

impl UploadState {
    /// Returns `true` once no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            UploadState::Completed | UploadState::Canceled | UploadState::Failed
        )
    }

    /// Returns `true` while chunks may still be transmitted or completion issued.
    pub fn is_active(self) -> bool {
        matches!(self, UploadState::Running | UploadState::Completing)
    }

    /// Returns `true` if moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: UploadState) -> bool {
        use UploadState::*;
        matches!(
            (self, next),
            (Created, Running)
                | (Running, Completing)
                | (Running, Canceled)
                | (Running, Failed)
                | (Completing, Completed)
                | (Completing, Canceled)
                | (Completing, Failed)
        )
    }
}

/// Shared, thread-safe holder of an [`UploadState`].
///
/// Read by upload handles while the driver task advances it.
#[derive(Debug)]
pub struct StateCell {
    inner: Mutex<UploadState>,
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

impl StateCell {
    /// Creates a cell in the `Created` state.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(UploadState::Created),
        }
    }

    /// Returns the current state.
    pub fn get(&self) -> UploadState {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves to `next`, rejecting transitions that are not monotonic.
    pub fn advance(&self, next: UploadState) -> Result<(), TransferError> {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.can_transition_to(next) {
            return Err(TransferError::InvalidTransition {
                from: *state,
                to: next,
            });
        }
        *state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions() {
        let cell = StateCell::new();
        assert_eq!(cell.get(), UploadState::Created);
        cell.advance(UploadState::Running).unwrap();
        assert!(cell.get().is_active());
        cell.advance(UploadState::Completing).unwrap();
        assert!(cell.get().is_active());
        cell.advance(UploadState::Completed).unwrap();
        assert!(cell.get().is_terminal());
    }

    #[test]
    fn terminal_states_are_final() {
        for terminal in [
            UploadState::Completed,
            UploadState::Canceled,
            UploadState::Failed,
        ] {
            for next in [
                UploadState::Created,
                UploadState::Running,
                UploadState::Completing,
                UploadState::Completed,
                UploadState::Canceled,
                UploadState::Failed,
            ] {
                assert!(!terminal.can_transition_to(next), "{terminal:?} -> {next:?}");
            }
        }
    }

    #[test]
    fn cancel_and_fail_from_active_states() {
        assert!(UploadState::Running.can_transition_to(UploadState::Canceled));
        assert!(UploadState::Running.can_transition_to(UploadState::Failed));
        assert!(UploadState::Completing.can_transition_to(UploadState::Canceled));
        assert!(UploadState::Completing.can_transition_to(UploadState::Failed));
        assert!(!UploadState::Created.can_transition_to(UploadState::Canceled));
    }

    #[test]
    fn illegal_transition_is_rejected_and_state_kept() {
        let cell = StateCell::new();
        let err = cell.advance(UploadState::Completed).unwrap_err();
        assert!(matches!(
            err,
            TransferError::InvalidTransition {
                from: UploadState::Created,
                to: UploadState::Completed
            }
        ));
        assert_eq!(cell.get(), UploadState::Created);
    }

    #[test]
    fn no_skipping_completing() {
        assert!(!UploadState::Running.can_transition_to(UploadState::Completed));
    }

    #[test]
    fn state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&UploadState::Completing).unwrap(),
            "\"completing\""
        );
    }
}
