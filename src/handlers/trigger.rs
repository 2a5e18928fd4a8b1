use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::build::{vars, EnvironmentVariable};
use crate::error::Result;
use crate::events::PullRequestEvent;
use crate::services::{BuildService, StartBuildRequest};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TriggerOutcome {
    Started {
        pull_request_id: String,
        build_id: Option<String>,
    },
    Skipped { pull_request_status: String },
}

/// Starts a build for a newly opened pull request.
pub struct BuildTrigger {
    builds: Arc<dyn BuildService>,
    project_name: String,
}

impl BuildTrigger {
    pub fn new(builds: Arc<dyn BuildService>, project_name: String) -> Self {
        Self {
            builds,
            project_name,
        }
    }

    /// The pull request identity rides along as plain build variables, so
    /// later build events can recover it from the build alone.
    pub fn build_request(&self, event: &PullRequestEvent) -> Result<StartBuildRequest> {
        let repository_name = event.repository_name()?;

        Ok(StartBuildRequest {
            project_name: self.project_name.clone(),
            source_version: event.source_commit.clone(),
            environment_variables_override: vec![
                EnvironmentVariable::plaintext(vars::REPOSITORY_NAME, repository_name),
                EnvironmentVariable::plaintext(vars::PULL_REQUEST_ID, &event.pull_request_id),
                EnvironmentVariable::plaintext(vars::SOURCE_COMMIT_ID, &event.source_commit),
                EnvironmentVariable::plaintext(
                    vars::DESTINATION_COMMIT_ID,
                    &event.destination_commit,
                ),
            ],
        })
    }

    /// Fire-and-forget: the build's own lifecycle events take over.
    pub async fn start(&self, event: &PullRequestEvent) -> Result<TriggerOutcome> {
        if !event.is_open() {
            let status = event.pull_request_status.clone().unwrap_or_default();
            info!(
                "Pull request {} is {}, not starting a build",
                event.pull_request_id, status
            );
            return Ok(TriggerOutcome::Skipped {
                pull_request_status: status,
            });
        }

        let request = self.build_request(event)?;
        let started = self.builds.start_build(&request).await?;

        info!(
            "Started build {:?} of {} for pull request {}",
            started.build_id, self.project_name, event.pull_request_id
        );

        Ok(TriggerOutcome::Started {
            pull_request_id: event.pull_request_id.clone(),
            build_id: started.build_id,
        })
    }
}
