//! Narrow query/mutate seams onto the external services
//!
//! Handlers only ever talk to these traits. Timeouts and retries are left
//! to the implementations' transport defaults; nothing here loops.

pub mod http;
pub mod types;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::ServiceEndpoints;
use crate::error::Result;
pub use types::*;

/// Every external collaborator a handler may call.
#[derive(Clone)]
pub struct Services {
    pub version_control: Arc<dyn VersionControl>,
    pub logs: Arc<dyn LogStore>,
    pub mailer: Arc<dyn Mailer>,
    pub builds: Arc<dyn BuildService>,
    pub parameters: Arc<dyn ParameterStore>,
}

impl Services {
    /// HTTP-backed clients sharing one connection pool.
    pub fn http(endpoints: &ServiceEndpoints) -> Self {
        let http_client = reqwest::Client::new();
        Self {
            version_control: Arc::new(http::CodeCommitClient::new(
                http_client.clone(),
                endpoints.codecommit.clone(),
            )),
            logs: Arc::new(http::CloudWatchLogsClient::new(
                http_client.clone(),
                endpoints.logs.clone(),
            )),
            mailer: Arc::new(http::SesClient::new(http_client.clone(), endpoints.ses.clone())),
            builds: Arc::new(http::CodeBuildClient::new(
                http_client.clone(),
                endpoints.codebuild.clone(),
            )),
            parameters: Arc::new(http::SsmClient::new(http_client, endpoints.ssm.clone())),
        }
    }
}

/// Version-control side: pull requests, approvals, comments, commits.
#[async_trait]
pub trait VersionControl: Send + Sync {
    async fn get_pull_request(&self, pull_request_id: &str) -> Result<PullRequestInfo>;

    async fn update_approval_state(
        &self,
        pull_request_id: &str,
        revision_id: &str,
        decision: ApprovalDecision,
    ) -> Result<()>;

    /// Redelivery with the same `client_request_token` must not create a
    /// second comment.
    async fn post_comment(&self, request: &CommentRequest) -> Result<PostedComment>;

    async fn get_commit(&self, repository_name: &str, commit_id: &str) -> Result<CommitInfo>;
}

#[async_trait]
pub trait LogStore: Send + Sync {
    async fn get_log_events(&self, query: &LogQuery) -> Result<Vec<LogEvent>>;
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(&self, email: &Email) -> Result<SentEmail>;
}

#[async_trait]
pub trait BuildService: Send + Sync {
    async fn start_build(&self, request: &StartBuildRequest) -> Result<StartedBuild>;
}

#[async_trait]
pub trait ParameterStore: Send + Sync {
    async fn get_parameters(&self, names: &[String], with_decryption: bool) -> Result<Vec<Parameter>>;
}
