use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{BuildStateChangeEvent, PullRequestEvent};
use crate::error::{PrBuilderError, Result};

pub const PULL_REQUEST_STATE_CHANGE: &str = "CodeCommit Pull Request State Change";
pub const BUILD_STATE_CHANGE: &str = "CodeBuild Build State Change";

/// Outer event shape as delivered by the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "detail-type")]
    pub detail_type: String,
    #[serde(default)]
    pub source: Option<String>,
    pub detail: Value,
}

/// A recognized event, validated at the boundary.
#[derive(Debug, Clone)]
pub enum Event {
    PullRequestStateChange(PullRequestEvent),
    BuildStateChange(BuildStateChangeEvent),
}

impl EventEnvelope {
    pub fn from_value(payload: Value) -> Result<Self> {
        Ok(serde_json::from_value(payload)?)
    }

    pub fn into_event(self) -> Result<Event> {
        match self.detail_type.as_str() {
            PULL_REQUEST_STATE_CHANGE => Ok(Event::PullRequestStateChange(
                serde_json::from_value(self.detail)?,
            )),
            BUILD_STATE_CHANGE => Ok(Event::BuildStateChange(serde_json::from_value(
                self.detail,
            )?)),
            other => Err(PrBuilderError::InvalidEvent(format!(
                "unrecognized detail-type: {}",
                other
            ))),
        }
    }

    pub fn into_pull_request_event(self) -> Result<PullRequestEvent> {
        match self.into_event()? {
            Event::PullRequestStateChange(event) => Ok(event),
            Event::BuildStateChange(_) => Err(PrBuilderError::InvalidEvent(
                "expected a pull request state change".to_string(),
            )),
        }
    }

    pub fn into_build_event(self) -> Result<BuildStateChangeEvent> {
        match self.into_event()? {
            Event::BuildStateChange(event) => Ok(event),
            Event::PullRequestStateChange(_) => Err(PrBuilderError::InvalidEvent(
                "expected a build state change".to_string(),
            )),
        }
    }
}
