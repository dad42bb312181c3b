//! # Lifecycle State
//!
//! States of one checkout attempt and the transitions allowed between them.
//!
//! ```text
//! Idle ─► ScriptLoading ─► ScriptReady ─► AwaitingMount ─► Mounted ─► Succeeded
//!               │               │               │             │
//!               └───────────────┴───────┬───────┴─────────────┴─────► Failed
//!                                       │
//!                any state ─────────────┴─────────────────────────► Torndown
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the controller's current attempt
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Nothing started
    #[default]
    Idle,
    /// Processor script injected, waiting for load/error
    ScriptLoading,
    /// Script available, about to read the global factory
    ScriptReady,
    /// Polling for the mount node
    AwaitingMount,
    /// Widget constructed, rendered and listening
    Mounted,
    /// Processor reported success
    Succeeded,
    /// Attempt failed at some step
    Failed,
    /// Attempt torn down by the host
    Torndown,
}

impl LifecycleState {
    /// Terminal states only leave through teardown
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LifecycleState::Succeeded | LifecycleState::Failed | LifecycleState::Torndown
        )
    }

    /// True while an attempt is still working towards an outcome
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            LifecycleState::ScriptLoading
                | LifecycleState::ScriptReady
                | LifecycleState::AwaitingMount
                | LifecycleState::Mounted
        )
    }

    /// Whether `self -> next` is a legal transition.
    ///
    /// `ScriptReady` can be entered directly from `Idle` when the processor
    /// script is already on the page.
    pub fn can_transition_to(&self, next: LifecycleState) -> bool {
        use LifecycleState::*;

        match (self, next) {
            (_, Torndown) => true,
            (Idle | Torndown, ScriptLoading | ScriptReady) => true,
            (ScriptLoading, ScriptReady) => true,
            (ScriptReady, AwaitingMount) => true,
            (AwaitingMount, Mounted) => true,
            (Mounted, Succeeded) => true,
            (from, Failed) => from.is_in_progress(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Idle => "idle",
            LifecycleState::ScriptLoading => "script_loading",
            LifecycleState::ScriptReady => "script_ready",
            LifecycleState::AwaitingMount => "awaiting_mount",
            LifecycleState::Mounted => "mounted",
            LifecycleState::Succeeded => "succeeded",
            LifecycleState::Failed => "failed",
            LifecycleState::Torndown => "torndown",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LifecycleState::*;

    #[test]
    fn test_happy_path_transitions() {
        let path = [Idle, ScriptLoading, ScriptReady, AwaitingMount, Mounted, Succeeded];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
        assert!(Idle.can_transition_to(ScriptReady));
    }

    #[test]
    fn test_terminal_states_only_tear_down() {
        for terminal in [Succeeded, Failed] {
            assert!(terminal.is_terminal());
            assert!(terminal.can_transition_to(Torndown));
            for next in [ScriptLoading, AwaitingMount, Mounted, Succeeded, Failed] {
                assert!(!terminal.can_transition_to(next), "{} -> {}", terminal, next);
            }
        }
    }

    #[test]
    fn test_failed_only_from_in_progress() {
        assert!(!Idle.can_transition_to(Failed));
        assert!(ScriptLoading.can_transition_to(Failed));
        assert!(AwaitingMount.can_transition_to(Failed));
        assert!(Mounted.can_transition_to(Failed));
        assert!(!Torndown.can_transition_to(Failed));
    }

    #[test]
    fn test_no_skipping_steps() {
        assert!(!ScriptLoading.can_transition_to(Mounted));
        assert!(!ScriptReady.can_transition_to(Mounted));
        assert!(!AwaitingMount.can_transition_to(Succeeded));
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&AwaitingMount).unwrap(),
            "\"awaiting_mount\""
        );
        assert_eq!(AwaitingMount.to_string(), "awaiting_mount");
    }

    #[test]
    fn test_default_is_idle() {
        assert_eq!(LifecycleState::default(), Idle);
    }
}
