use super::environment::BuildEnvironment;
use super::vars;
use crate::error::{PrBuilderError, Result};

/// Pull request identity recovered from a build's own environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestContext {
    pub pull_request_id: String,
    pub source_commit_id: String,
    pub destination_commit_id: String,
    pub repository_name: String,
}

impl PullRequestContext {
    /// Fails with `NotAPullRequestBuild` when the build carries no pull
    /// request id. Callers must short-circuit before any external call.
    pub fn resolve(env: &BuildEnvironment) -> Result<Self> {
        let pull_request_id = match env.get(vars::PULL_REQUEST_ID) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(PrBuilderError::NotAPullRequestBuild),
        };

        let field = |name: &str| env.get(name).unwrap_or_default().to_string();

        Ok(Self {
            pull_request_id,
            source_commit_id: field(vars::SOURCE_COMMIT_ID),
            destination_commit_id: field(vars::DESTINATION_COMMIT_ID),
            repository_name: field(vars::REPOSITORY_NAME),
        })
    }
}
