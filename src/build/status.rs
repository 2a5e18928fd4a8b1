use std::fmt;

/// Classified build state.
///
/// Classification is fail-closed: only `IN_PROGRESS`, `SUCCEEDED` and
/// `STOPPED` escape `Failed`. A stopped build is a benign termination,
/// so it is neither failed nor succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildOutcome {
    InProgress,
    Succeeded,
    Stopped,
    Failed,
}

impl BuildOutcome {
    pub fn classify(status: &str) -> Self {
        match status {
            "IN_PROGRESS" => BuildOutcome::InProgress,
            "SUCCEEDED" => BuildOutcome::Succeeded,
            "STOPPED" => BuildOutcome::Stopped,
            _ => BuildOutcome::Failed,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, BuildOutcome::Failed)
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, BuildOutcome::InProgress)
    }
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildOutcome::InProgress => "in-progress",
            BuildOutcome::Succeeded => "succeeded",
            BuildOutcome::Stopped => "stopped",
            BuildOutcome::Failed => "failed",
        };
        f.write_str(name)
    }
}
