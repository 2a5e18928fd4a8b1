//! Shared leaf logic used by every build-side handler
//!
//! Recovers the pull request identity a build was started with, and
//! classifies the build's status into the outcome the handlers act on.

pub mod context;
pub mod environment;
pub mod status;

pub use context::PullRequestContext;
pub use environment::{BuildEnvironment, EnvironmentVariable};
pub use status::BuildOutcome;

/// Build environment variable names threaded through every build.
pub mod vars {
    pub const PULL_REQUEST_ID: &str = "CODECOMMIT_PULL_REQUEST_ID";
    pub const SOURCE_COMMIT_ID: &str = "CODECOMMIT_SOURCE_COMMIT_ID";
    pub const DESTINATION_COMMIT_ID: &str = "CODECOMMIT_DESTINATION_COMMIT_ID";
    pub const REPOSITORY_NAME: &str = "CODECOMMIT_REPOSITORY_NAME";
    pub const PROJECT_NAME: &str = "CODEBUILD_PROJECT_NAME";
}

/// Console link for a build, given its id or full ARN.
pub fn build_job_url(build_id: &str, region: &str) -> String {
    let id = build_id.rsplit('/').next().unwrap_or(build_id);
    format!(
        "https://console.aws.amazon.com/codebuild/home?region={}#/builds/{}/view/new",
        region, id
    )
}
