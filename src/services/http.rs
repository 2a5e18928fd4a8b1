//! HTTP implementations of the service seams
//!
//! CodeCommit, CodeBuild, CloudWatch Logs and SSM are spoken to with the
//! JSON 1.1 protocol (`X-Amz-Target` operation header, JSON body). SES uses
//! the v2 REST route for outbound email. Requests are sent unsigned: the
//! configured endpoints are expected to be credential-signing gateways.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{
    ApprovalDecision, BuildService, CommentRequest, CommitInfo, Email, LogEvent, LogQuery,
    LogStore, Mailer, Parameter, ParameterStore, PostedComment, PullRequestInfo, SentEmail,
    StartBuildRequest, StartedBuild, UserInfo, VersionControl,
};
use crate::error::{PrBuilderError, Result};

const JSON_1_1: &str = "application/x-amz-json-1.1";

/// One JSON 1.1 service endpoint.
#[derive(Debug, Clone)]
struct JsonProtocol {
    http_client: Client,
    endpoint: String,
    target_prefix: &'static str,
    service: &'static str,
}

impl JsonProtocol {
    fn new(
        http_client: Client,
        endpoint: String,
        target_prefix: &'static str,
        service: &'static str,
    ) -> Self {
        Self {
            http_client,
            endpoint,
            target_prefix,
            service,
        }
    }

    async fn call<T: DeserializeOwned>(&self, operation: &str, input: Value) -> Result<T> {
        debug!("{} {} -> {}", self.service, operation, self.endpoint);

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("Content-Type", JSON_1_1)
            .header("X-Amz-Target", format!("{}.{}", self.target_prefix, operation))
            .body(input.to_string())
            .send()
            .await
            .map_err(|e| PrBuilderError::upstream(self.service, e.to_string()))?;

        read_response(self.service, operation, response).await
    }
}

async fn read_response<T: DeserializeOwned>(
    service: &str,
    operation: &str,
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PrBuilderError::upstream(
            service,
            format!("{} returned {}: {}", operation, status, error_summary(&body)),
        ));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| PrBuilderError::upstream(service, format!("{} response: {}", operation, e)))
}

/// `__type: message` from a service error body, or the raw body.
fn error_summary(body: &str) -> String {
    let parsed: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return body.to_string(),
    };

    let kind = parsed
        .get("__type")
        .and_then(|t| t.as_str())
        .map(|t| t.rsplit('#').next().unwrap_or(t));
    let message = parsed
        .get("message")
        .or_else(|| parsed.get("Message"))
        .and_then(|m| m.as_str());

    match (kind, message) {
        (Some(kind), Some(message)) => format!("{}: {}", kind, message),
        (Some(kind), None) => kind.to_string(),
        (None, Some(message)) => message.to_string(),
        (None, None) => body.to_string(),
    }
}

pub struct CodeCommitClient {
    protocol: JsonProtocol,
}

impl CodeCommitClient {
    pub fn new(http_client: Client, endpoint: String) -> Self {
        Self {
            protocol: JsonProtocol::new(http_client, endpoint, "CodeCommit_20150413", "codecommit"),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetPullRequestOutput {
    pull_request: PullRequestShape,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestShape {
    pull_request_id: Option<String>,
    revision_id: Option<String>,
    title: Option<String>,
    pull_request_status: Option<String>,
}

#[derive(Deserialize)]
struct PostCommentOutput {
    comment: Option<CommentShape>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentShape {
    comment_id: Option<String>,
}

#[derive(Deserialize)]
struct GetCommitOutput {
    commit: CommitShape,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitShape {
    commit_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
    author: Option<UserShape>,
    committer: Option<UserShape>,
}

#[derive(Deserialize)]
struct UserShape {
    name: Option<String>,
    email: Option<String>,
}

impl UserShape {
    fn into_user(self) -> Option<UserInfo> {
        match (self.name, self.email) {
            (name, Some(email)) if !email.is_empty() => Some(UserInfo {
                name: name.unwrap_or_default(),
                email,
            }),
            _ => None,
        }
    }
}

#[async_trait]
impl VersionControl for CodeCommitClient {
    async fn get_pull_request(&self, pull_request_id: &str) -> Result<PullRequestInfo> {
        let output: GetPullRequestOutput = self
            .protocol
            .call("GetPullRequest", json!({ "pullRequestId": pull_request_id }))
            .await?;

        let pr = output.pull_request;
        Ok(PullRequestInfo {
            pull_request_id: pr.pull_request_id.unwrap_or_else(|| pull_request_id.to_string()),
            revision_id: pr.revision_id,
            title: pr.title,
            status: pr.pull_request_status,
        })
    }

    async fn update_approval_state(
        &self,
        pull_request_id: &str,
        revision_id: &str,
        decision: ApprovalDecision,
    ) -> Result<()> {
        let _: Value = self
            .protocol
            .call(
                "UpdatePullRequestApprovalState",
                json!({
                    "pullRequestId": pull_request_id,
                    "revisionId": revision_id,
                    "approvalState": decision.as_str(),
                }),
            )
            .await?;
        Ok(())
    }

    async fn post_comment(&self, request: &CommentRequest) -> Result<PostedComment> {
        let output: PostCommentOutput = self
            .protocol
            .call(
                "PostCommentForPullRequest",
                json!({
                    "pullRequestId": request.pull_request_id,
                    "repositoryName": request.repository_name,
                    "beforeCommitId": request.before_commit_id,
                    "afterCommitId": request.after_commit_id,
                    "content": request.content,
                    "clientRequestToken": request.client_request_token,
                }),
            )
            .await?;

        Ok(PostedComment {
            comment_id: output.comment.and_then(|c| c.comment_id),
        })
    }

    async fn get_commit(&self, repository_name: &str, commit_id: &str) -> Result<CommitInfo> {
        let output: GetCommitOutput = self
            .protocol
            .call(
                "GetCommit",
                json!({ "repositoryName": repository_name, "commitId": commit_id }),
            )
            .await?;

        let commit = output.commit;
        Ok(CommitInfo {
            commit_id: commit.commit_id.unwrap_or_else(|| commit_id.to_string()),
            message: commit.message.unwrap_or_default(),
            author: commit.author.and_then(UserShape::into_user),
            committer: commit.committer.and_then(UserShape::into_user),
        })
    }
}

pub struct CloudWatchLogsClient {
    protocol: JsonProtocol,
}

impl CloudWatchLogsClient {
    pub fn new(http_client: Client, endpoint: String) -> Self {
        Self {
            protocol: JsonProtocol::new(http_client, endpoint, "Logs_20140328", "logs"),
        }
    }
}

#[derive(Deserialize)]
struct GetLogEventsOutput {
    #[serde(default)]
    events: Vec<LogEventShape>,
}

#[derive(Deserialize)]
struct LogEventShape {
    timestamp: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

#[async_trait]
impl LogStore for CloudWatchLogsClient {
    async fn get_log_events(&self, query: &LogQuery) -> Result<Vec<LogEvent>> {
        let output: GetLogEventsOutput = self
            .protocol
            .call(
                "GetLogEvents",
                json!({
                    "logGroupName": query.group_name,
                    "logStreamName": query.stream_name,
                    "limit": query.limit,
                    "startFromHead": query.start_from_head,
                }),
            )
            .await?;

        Ok(output
            .events
            .into_iter()
            .map(|e| LogEvent {
                timestamp: e.timestamp,
                message: e.message.unwrap_or_default(),
            })
            .collect())
    }
}

pub struct CodeBuildClient {
    protocol: JsonProtocol,
}

impl CodeBuildClient {
    pub fn new(http_client: Client, endpoint: String) -> Self {
        Self {
            protocol: JsonProtocol::new(http_client, endpoint, "CodeBuild_20161006", "codebuild"),
        }
    }
}

#[derive(Deserialize)]
struct StartBuildOutput {
    build: Option<BuildShape>,
}

#[derive(Deserialize)]
struct BuildShape {
    id: Option<String>,
}

#[async_trait]
impl BuildService for CodeBuildClient {
    async fn start_build(&self, request: &StartBuildRequest) -> Result<StartedBuild> {
        let overrides: Vec<Value> = request
            .environment_variables_override
            .iter()
            .map(|v| {
                json!({
                    "name": v.name,
                    "value": v.value,
                    "type": v.kind.as_deref().unwrap_or("PLAINTEXT"),
                })
            })
            .collect();

        let output: StartBuildOutput = self
            .protocol
            .call(
                "StartBuild",
                json!({
                    "projectName": request.project_name,
                    "sourceVersion": request.source_version,
                    "environmentVariablesOverride": overrides,
                }),
            )
            .await?;

        Ok(StartedBuild {
            build_id: output.build.and_then(|b| b.id),
        })
    }
}

pub struct SsmClient {
    protocol: JsonProtocol,
}

impl SsmClient {
    pub fn new(http_client: Client, endpoint: String) -> Self {
        Self {
            protocol: JsonProtocol::new(http_client, endpoint, "AmazonSSM", "ssm"),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetParametersOutput {
    #[serde(default)]
    parameters: Vec<ParameterShape>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParameterShape {
    name: String,
    value: Option<String>,
}

#[async_trait]
impl ParameterStore for SsmClient {
    async fn get_parameters(&self, names: &[String], with_decryption: bool) -> Result<Vec<Parameter>> {
        let output: GetParametersOutput = self
            .protocol
            .call(
                "GetParameters",
                json!({ "Names": names, "WithDecryption": with_decryption }),
            )
            .await?;

        Ok(output
            .parameters
            .into_iter()
            .filter_map(|p| p.value.map(|value| Parameter { name: p.name, value }))
            .collect())
    }
}

pub struct SesClient {
    http_client: Client,
    endpoint: String,
}

impl SesClient {
    pub fn new(http_client: Client, endpoint: String) -> Self {
        Self {
            http_client,
            endpoint,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailOutput {
    message_id: Option<String>,
}

#[async_trait]
impl Mailer for SesClient {
    async fn send_email(&self, email: &Email) -> Result<SentEmail> {
        let url = format!("{}/v2/email/outbound-emails", self.endpoint.trim_end_matches('/'));
        let body = json!({
            "FromEmailAddress": email.source,
            "Destination": {
                "ToAddresses": email.to,
                "CcAddresses": email.cc,
            },
            "Content": {
                "Simple": {
                    "Subject": { "Data": email.subject },
                    "Body": { "Text": { "Data": email.body } },
                }
            }
        });

        debug!("ses SendEmail -> {}", url);
        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PrBuilderError::upstream("ses", e.to_string()))?;

        let output: SendEmailOutput = read_response("ses", "SendEmail", response).await?;
        Ok(SentEmail {
            message_id: output.message_id,
        })
    }
}
