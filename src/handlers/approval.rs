use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::build::BuildOutcome;
use crate::error::{PrBuilderError, Result};
use crate::events::BuildStateChangeEvent;
use crate::services::{ApprovalDecision, VersionControl};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApprovalOutcome {
    Applied {
        pull_request_id: String,
        revision_id: String,
        decision: ApprovalDecision,
    },
    /// No explicit succeeded/failed signal; approval left untouched.
    Skipped { outcome: String },
}

/// Approves or revokes the pull request's current revision.
pub struct ApprovalGate {
    version_control: Arc<dyn VersionControl>,
}

impl ApprovalGate {
    pub fn new(version_control: Arc<dyn VersionControl>) -> Self {
        Self { version_control }
    }

    /// Only succeeded and failed builds carry a decision.
    pub fn decision_for(outcome: BuildOutcome) -> Option<ApprovalDecision> {
        match outcome {
            BuildOutcome::Succeeded => Some(ApprovalDecision::Approve),
            BuildOutcome::Failed => Some(ApprovalDecision::Revoke),
            BuildOutcome::InProgress | BuildOutcome::Stopped => None,
        }
    }

    pub async fn enforce(&self, event: &BuildStateChangeEvent) -> Result<ApprovalOutcome> {
        let context = event.pull_request_context()?;
        let outcome = event.outcome();

        let decision = match Self::decision_for(outcome) {
            Some(decision) => decision,
            None => {
                info!(
                    "Leaving approval of pull request {} untouched for {} build",
                    context.pull_request_id, outcome
                );
                return Ok(ApprovalOutcome::Skipped {
                    outcome: outcome.to_string(),
                });
            }
        };

        // The revision moves with every push, so it is fetched per event.
        let pull_request = self
            .version_control
            .get_pull_request(&context.pull_request_id)
            .await?;
        let revision_id = pull_request.revision_id.ok_or_else(|| {
            PrBuilderError::upstream(
                "codecommit",
                format!("pull request {} has no revision id", context.pull_request_id),
            )
        })?;

        self.version_control
            .update_approval_state(&context.pull_request_id, &revision_id, decision)
            .await?;

        info!(
            "Applied {} to pull request {} at revision {}",
            decision, context.pull_request_id, revision_id
        );

        Ok(ApprovalOutcome::Applied {
            pull_request_id: context.pull_request_id,
            revision_id,
            decision,
        })
    }
}
