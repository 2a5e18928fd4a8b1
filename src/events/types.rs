use serde::{Deserialize, Serialize};

use crate::build::{BuildEnvironment, BuildOutcome, EnvironmentVariable, PullRequestContext};
use crate::error::{PrBuilderError, Result};

/// Detail of a pull request state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestEvent {
    pub repository_names: Vec<String>,
    pub pull_request_id: String,
    pub source_commit: String,
    pub destination_commit: String,
    #[serde(default)]
    pub pull_request_status: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
}

impl PullRequestEvent {
    pub fn repository_name(&self) -> Result<&str> {
        self.repository_names
            .first()
            .map(String::as_str)
            .ok_or_else(|| PrBuilderError::InvalidEvent("repositoryNames is empty".to_string()))
    }

    /// Events without a status are treated as open.
    pub fn is_open(&self) -> bool {
        self.pull_request_status
            .as_deref()
            .map_or(true, |status| status == "Open")
    }
}

/// Detail of a build state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildStateChangeEvent {
    pub build_status: String,
    pub build_id: String,
    #[serde(default)]
    pub project_name: Option<String>,
    pub additional_information: AdditionalInformation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdditionalInformation {
    pub environment: BuildEnvironmentInfo,
    #[serde(default)]
    pub logs: Option<LogInfo>,
    #[serde(default)]
    pub artifact: Option<ArtifactInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildEnvironmentInfo {
    #[serde(default)]
    pub environment_variables: Vec<EnvironmentVariable>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LogInfo {
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub stream_name: Option<String>,
    #[serde(default)]
    pub deep_link: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactInfo {
    #[serde(default)]
    pub location: Option<String>,
}

impl BuildStateChangeEvent {
    pub fn outcome(&self) -> BuildOutcome {
        BuildOutcome::classify(&self.build_status)
    }

    pub fn environment(&self) -> BuildEnvironment {
        BuildEnvironment::from_variables(&self.additional_information.environment.environment_variables)
    }

    pub fn pull_request_context(&self) -> Result<PullRequestContext> {
        PullRequestContext::resolve(&self.environment())
    }

    /// Group and stream names, only when both are known.
    pub fn log_locator(&self) -> Option<(&str, &str)> {
        let logs = self.additional_information.logs.as_ref()?;
        match (logs.group_name.as_deref(), logs.stream_name.as_deref()) {
            (Some(group), Some(stream)) => Some((group, stream)),
            _ => None,
        }
    }

    pub fn artifact_location(&self) -> Option<&str> {
        self.additional_information
            .artifact
            .as_ref()
            .and_then(|a| a.location.as_deref())
    }
}
