use serde::{Deserialize, Serialize};
use std::fmt;

use crate::build::EnvironmentVariable;

/// Approval state applied to a pull request revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApprovalDecision {
    Approve,
    Revoke,
}

impl ApprovalDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalDecision::Approve => "APPROVE",
            ApprovalDecision::Revoke => "REVOKE",
        }
    }
}

impl fmt::Display for ApprovalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestInfo {
    pub pull_request_id: String,
    pub revision_id: Option<String>,
    pub title: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRequest {
    pub pull_request_id: String,
    pub repository_name: String,
    pub before_commit_id: String,
    pub after_commit_id: String,
    pub content: String,
    pub client_request_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostedComment {
    pub comment_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub commit_id: String,
    pub message: String,
    pub author: Option<UserInfo>,
    pub committer: Option<UserInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub group_name: String,
    pub stream_name: String,
    pub limit: usize,
    pub start_from_head: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub timestamp: Option<i64>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub source: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentEmail {
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartBuildRequest {
    pub project_name: String,
    pub source_version: String,
    pub environment_variables_override: Vec<EnvironmentVariable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartedBuild {
    pub build_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}
