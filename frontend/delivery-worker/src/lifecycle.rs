use crate::errors::{Result, WorkerError};
use serde::{Deserialize, Serialize};

/// Worker lifecycle, driven by platform events only
///
/// `Installing -> Installed -> Activating -> Activated`. There is no rollback:
/// a failed install leaves the previous worker version in charge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    #[default]
    Installing,
    Installed,
    Activating,
    Activated,
}

impl WorkerState {
    pub fn next(&self) -> Option<WorkerState> {
        match self {
            WorkerState::Installing => Some(WorkerState::Installed),
            WorkerState::Installed => Some(WorkerState::Activating),
            WorkerState::Activating => Some(WorkerState::Activated),
            WorkerState::Activated => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Lifecycle {
    state: WorkerState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == WorkerState::Activated
    }

    /// Move to `to`; only the single forward step is allowed
    pub fn transition(&mut self, to: WorkerState) -> Result<()> {
        if self.state.next() != Some(to) {
            return Err(WorkerError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        tracing::debug!(from = ?self.state, ?to, "Worker lifecycle transition");
        self.state = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_path() {
        let mut lifecycle = Lifecycle::new();
        for state in [
            WorkerState::Installed,
            WorkerState::Activating,
            WorkerState::Activated,
        ] {
            lifecycle.transition(state).unwrap();
        }
        assert!(lifecycle.is_active());
    }

    #[test]
    fn test_rejects_skips_and_rollbacks() {
        let mut lifecycle = Lifecycle::new();
        assert_eq!(
            lifecycle.transition(WorkerState::Activated),
            Err(WorkerError::InvalidTransition {
                from: WorkerState::Installing,
                to: WorkerState::Activated
            })
        );

        lifecycle.transition(WorkerState::Installed).unwrap();
        assert!(lifecycle.transition(WorkerState::Installing).is_err());
        assert_eq!(lifecycle.state(), WorkerState::Installed);
    }
}
