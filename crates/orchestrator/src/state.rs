//! Run states and the transition guard. The runner only ever moves through
//! transitions listed here; an illegal transition is a bug, surfaced as an
//! internal error rather than silently tolerated.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tracing::debug;

use outreach_core::types::CampaignStatus;
use outreach_core::OutreachResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Authenticating,
    QuotaCheck,
    TargetAcquisition,
    ActionExecution,
    Recording,
    Completed,
    Aborted,
    Failed,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Authenticating => "authenticating",
            RunState::QuotaCheck => "quota_check",
            RunState::TargetAcquisition => "target_acquisition",
            RunState::ActionExecution => "action_execution",
            RunState::Recording => "recording",
            RunState::Completed => "completed",
            RunState::Aborted => "aborted",
            RunState::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Aborted | RunState::Failed)
    }
}

/// Whether `from -> to` is a legal transition.
pub fn transition_allowed(from: RunState, to: RunState) -> bool {
    use RunState::*;
    matches!(
        (from, to),
        (Idle, Authenticating)
            | (Authenticating, QuotaCheck)
            | (Authenticating, Failed)
            | (Authenticating, Aborted)
            | (QuotaCheck, TargetAcquisition)
            | (QuotaCheck, Aborted)
            | (TargetAcquisition, ActionExecution)
            | (TargetAcquisition, Completed)
            | (ActionExecution, Recording)
            | (Recording, QuotaCheck)
            | (Recording, Completed)
            | (Recording, Failed)
            | (Recording, Aborted)
    )
}

/// Tracks the current state of one campaign run and enforces legality.
#[derive(Debug)]
pub struct RunStateMachine {
    state: RunState,
}

impl RunStateMachine {
    pub fn new() -> Self {
        Self {
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn transition(&mut self, to: RunState) -> OutreachResult<()> {
        if !transition_allowed(self.state, to) {
            return Err(anyhow!(
                "illegal run-state transition {} -> {}",
                self.state.as_str(),
                to.as_str()
            )
            .into());
        }
        debug!(from = self.state.as_str(), to = to.as_str(), "run state transition");
        self.state = to;
        Ok(())
    }
}

impl Default for RunStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminal result of one campaign run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every target processed.
    Completed,
    /// Paused cleanly (quota exhausted or cancelled); resumable once
    /// counters reset externally.
    Aborted,
    Failed,
}

impl RunOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            RunOutcome::Completed => "completed",
            RunOutcome::Aborted => "aborted",
            RunOutcome::Failed => "failed",
        }
    }

    /// Campaign status persisted for this outcome.
    pub fn campaign_status(self) -> CampaignStatus {
        match self {
            RunOutcome::Completed => CampaignStatus::Completed,
            RunOutcome::Aborted => CampaignStatus::Paused,
            RunOutcome::Failed => CampaignStatus::Failed,
        }
    }

    /// Process exit code: pausing is a normal exit, failure is not.
    pub fn exit_code(self) -> u8 {
        match self {
            RunOutcome::Completed | RunOutcome::Aborted => 0,
            RunOutcome::Failed => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut machine = RunStateMachine::new();
        for state in [
            RunState::Authenticating,
            RunState::QuotaCheck,
            RunState::TargetAcquisition,
            RunState::ActionExecution,
            RunState::Recording,
            RunState::QuotaCheck,
            RunState::TargetAcquisition,
            RunState::Completed,
        ] {
            machine.transition(state).unwrap();
        }
        assert!(machine.state().is_terminal());
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut machine = RunStateMachine::new();
        assert!(machine.transition(RunState::QuotaCheck).is_err());

        machine.transition(RunState::Authenticating).unwrap();
        assert!(machine.transition(RunState::ActionExecution).is_err());
        // A failed login never re-enters the loop.
        machine.transition(RunState::Failed).unwrap();
        assert!(machine.transition(RunState::QuotaCheck).is_err());
    }

    #[test]
    fn test_outcome_mappings() {
        assert_eq!(RunOutcome::Completed.campaign_status(), CampaignStatus::Completed);
        assert_eq!(RunOutcome::Aborted.campaign_status(), CampaignStatus::Paused);
        assert_eq!(RunOutcome::Failed.campaign_status(), CampaignStatus::Failed);
        assert_eq!(RunOutcome::Aborted.exit_code(), 0);
        assert_eq!(RunOutcome::Failed.exit_code(), 1);
    }
}
