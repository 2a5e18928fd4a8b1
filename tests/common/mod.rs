#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use pr_builder::config::AppConfig;
use pr_builder::error::{PrBuilderError, Result};
use pr_builder::events::{BuildStateChangeEvent, EventEnvelope, PullRequestEvent};
use pr_builder::handlers::{NotifierConfig, Orchestrator};
use pr_builder::services::{
    ApprovalDecision, BuildService, CommentRequest, CommitInfo, Email, LogEvent, LogQuery,
    LogStore, Mailer, Parameter, ParameterStore, PostedComment, PullRequestInfo, SentEmail,
    Services, StartBuildRequest, StartedBuild, UserInfo, VersionControl,
};

pub const REGION: &str = "us-east-1";
pub const BUILD_ARN: &str = "arn:aws:codebuild:us-east-1:123456789012:build/myproject:3f1c";

/// Version-control fake that honours client request tokens.
pub struct FakeVersionControl {
    pub revision_id: Mutex<Option<String>>,
    pub commit: Mutex<CommitInfo>,
    pub comments: Mutex<Vec<CommentRequest>>,
    pub comment_attempts: Mutex<Vec<CommentRequest>>,
    pub approvals: Mutex<Vec<(String, String, ApprovalDecision)>>,
    pub pull_request_fetches: Mutex<usize>,
    pub commit_fetches: Mutex<usize>,
    pub fail_approval: Mutex<bool>,
}

impl FakeVersionControl {
    pub fn new() -> Self {
        Self {
            revision_id: Mutex::new(Some("rev-1".to_string())),
            commit: Mutex::new(CommitInfo {
                commit_id: "srcA".to_string(),
                message: "Add widget support".to_string(),
                author: Some(UserInfo {
                    name: "Alice".to_string(),
                    email: "alice@example.com".to_string(),
                }),
                committer: None,
            }),
            comments: Mutex::new(Vec::new()),
            comment_attempts: Mutex::new(Vec::new()),
            approvals: Mutex::new(Vec::new()),
            pull_request_fetches: Mutex::new(0),
            commit_fetches: Mutex::new(0),
            fail_approval: Mutex::new(false),
        }
    }

    pub fn set_revision(&self, revision_id: &str) {
        *self.revision_id.lock().unwrap() = Some(revision_id.to_string());
    }

    pub fn call_count(&self) -> usize {
        self.comment_attempts.lock().unwrap().len()
            + self.approvals.lock().unwrap().len()
            + *self.pull_request_fetches.lock().unwrap()
            + *self.commit_fetches.lock().unwrap()
    }
}

#[async_trait]
impl VersionControl for FakeVersionControl {
    async fn get_pull_request(&self, pull_request_id: &str) -> Result<PullRequestInfo> {
        *self.pull_request_fetches.lock().unwrap() += 1;
        Ok(PullRequestInfo {
            pull_request_id: pull_request_id.to_string(),
            revision_id: self.revision_id.lock().unwrap().clone(),
            title: Some("Add widgets".to_string()),
            status: Some("OPEN".to_string()),
        })
    }

    async fn update_approval_state(
        &self,
        pull_request_id: &str,
        revision_id: &str,
        decision: ApprovalDecision,
    ) -> Result<()> {
        if *self.fail_approval.lock().unwrap() {
            return Err(PrBuilderError::upstream("codecommit", "ThrottlingException"));
        }
        self.approvals.lock().unwrap().push((
            pull_request_id.to_string(),
            revision_id.to_string(),
            decision,
        ));
        Ok(())
    }

    async fn post_comment(&self, request: &CommentRequest) -> Result<PostedComment> {
        self.comment_attempts.lock().unwrap().push(request.clone());

        let mut comments = self.comments.lock().unwrap();
        let existing = comments
            .iter()
            .position(|c| c.client_request_token == request.client_request_token);
        let index = match existing {
            Some(index) => index,
            None => {
                comments.push(request.clone());
                comments.len() - 1
            }
        };
        Ok(PostedComment {
            comment_id: Some(format!("comment-{}", index)),
        })
    }

    async fn get_commit(&self, _repository_name: &str, _commit_id: &str) -> Result<CommitInfo> {
        *self.commit_fetches.lock().unwrap() += 1;
        Ok(self.commit.lock().unwrap().clone())
    }
}

pub struct FakeLogStore {
    pub events: Mutex<Vec<LogEvent>>,
    pub failure: Mutex<Option<String>>,
    pub queries: Mutex<Vec<LogQuery>>,
}

impl FakeLogStore {
    pub fn with_lines(lines: &[&str]) -> Self {
        Self {
            events: Mutex::new(
                lines
                    .iter()
                    .enumerate()
                    .map(|(i, line)| LogEvent {
                        timestamp: Some(i as i64),
                        message: line.to_string(),
                    })
                    .collect(),
            ),
            failure: Mutex::new(None),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        let store = Self::with_lines(&[]);
        *store.failure.lock().unwrap() = Some(message.to_string());
        store
    }
}

#[async_trait]
impl LogStore for FakeLogStore {
    async fn get_log_events(&self, query: &LogQuery) -> Result<Vec<LogEvent>> {
        self.queries.lock().unwrap().push(query.clone());
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(PrBuilderError::upstream("logs", message));
        }
        Ok(self.events.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct FakeMailer {
    pub sent: Mutex<Vec<Email>>,
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send_email(&self, email: &Email) -> Result<SentEmail> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(SentEmail {
            message_id: Some("msg-1".to_string()),
        })
    }
}

#[derive(Default)]
pub struct FakeBuilds {
    pub started: Mutex<Vec<StartBuildRequest>>,
}

#[async_trait]
impl BuildService for FakeBuilds {
    async fn start_build(&self, request: &StartBuildRequest) -> Result<StartedBuild> {
        self.started.lock().unwrap().push(request.clone());
        Ok(StartedBuild {
            build_id: Some("myproject:3f1c".to_string()),
        })
    }
}

#[derive(Default)]
pub struct FakeParameters {
    pub values: HashMap<String, String>,
    pub requests: Mutex<Vec<(Vec<String>, bool)>>,
}

impl FakeParameters {
    pub fn with(pairs: &[(&str, &str)]) -> Self {
        Self {
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ParameterStore for FakeParameters {
    async fn get_parameters(&self, names: &[String], with_decryption: bool) -> Result<Vec<Parameter>> {
        self.requests
            .lock()
            .unwrap()
            .push((names.to_vec(), with_decryption));
        Ok(names
            .iter()
            .filter_map(|name| {
                self.values.get(name).map(|value| Parameter {
                    name: name.clone(),
                    value: value.clone(),
                })
            })
            .collect())
    }
}

/// All fakes, shared with the `Services` handed to the handlers.
pub struct Fakes {
    pub version_control: Arc<FakeVersionControl>,
    pub logs: Arc<FakeLogStore>,
    pub mailer: Arc<FakeMailer>,
    pub builds: Arc<FakeBuilds>,
    pub parameters: Arc<FakeParameters>,
}

impl Fakes {
    pub fn new() -> Self {
        Self::with_logs(FakeLogStore::with_lines(&[
            "[Container] Running command cargo test\n",
            "test widgets::parse ... FAILED\n",
        ]))
    }

    pub fn with_logs(logs: FakeLogStore) -> Self {
        Self {
            version_control: Arc::new(FakeVersionControl::new()),
            logs: Arc::new(logs),
            mailer: Arc::new(FakeMailer::default()),
            builds: Arc::new(FakeBuilds::default()),
            parameters: Arc::new(FakeParameters::with(&[
                ("/prb/source-email", "builds@example.com"),
                ("/prb/cc-email", "team@example.com"),
            ])),
        }
    }

    pub fn services(&self) -> Services {
        Services {
            version_control: self.version_control.clone(),
            logs: self.logs.clone(),
            mailer: self.mailer.clone(),
            builds: self.builds.clone(),
            parameters: self.parameters.clone(),
        }
    }

    /// Calls made to any external service.
    pub fn external_calls(&self) -> usize {
        self.version_control.call_count()
            + self.logs.queries.lock().unwrap().len()
            + self.mailer.sent.lock().unwrap().len()
            + self.builds.started.lock().unwrap().len()
    }

    pub fn orchestrator(&self) -> Orchestrator {
        let notifier = NotifierConfig {
            source_email: "builds@example.com".to_string(),
            cc_email: Some("team@example.com".to_string()),
        };
        Orchestrator::new(&test_config(), self.services(), Some(notifier))
    }
}

pub fn test_config() -> AppConfig {
    let vars: HashMap<&str, &str> = [
        ("CODEBUILD_PROJECT_NAME", "myproject"),
        ("AWS_REGION", REGION),
        ("SOURCE_EMAIL_ADDR_PARAM", "/prb/source-email"),
        ("CC_EMAIL_ADDR_PARAM", "/prb/cc-email"),
        ("SERVICE_GATEWAY_ENDPOINT", "http://gateway.invalid"),
    ]
    .into_iter()
    .collect();
    AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

pub fn pr_env() -> Vec<(&'static str, &'static str)> {
    vec![
        ("CODECOMMIT_REPOSITORY_NAME", "myrepo"),
        ("CODECOMMIT_PULL_REQUEST_ID", "pr-42"),
        ("CODECOMMIT_SOURCE_COMMIT_ID", "srcA"),
        ("CODECOMMIT_DESTINATION_COMMIT_ID", "dstB"),
    ]
}

/// Build state change detail in wire form.
pub fn build_detail(
    status: &str,
    env: &[(&str, &str)],
    with_logs: bool,
    artifact: Option<&str>,
) -> Value {
    let variables: Vec<Value> = env
        .iter()
        .map(|(name, value)| json!({"name": name, "value": value, "type": "PLAINTEXT"}))
        .collect();

    let mut info = json!({ "environment": { "environment-variables": variables } });
    if with_logs {
        info["logs"] = json!({
            "group-name": "/aws/codebuild/myproject",
            "stream-name": "3f1c",
            "deep-link": "https://console.aws.amazon.com/cloudwatch/home"
        });
    }
    if let Some(location) = artifact {
        info["artifact"] = json!({ "location": location });
    }

    json!({
        "build-status": status,
        "build-id": BUILD_ARN,
        "project-name": "myproject",
        "additional-information": info
    })
}

pub fn build_envelope(detail: Value) -> Value {
    json!({
        "detail-type": "CodeBuild Build State Change",
        "source": "aws.codebuild",
        "detail": detail
    })
}

pub fn build_event(
    status: &str,
    env: &[(&str, &str)],
    with_logs: bool,
    artifact: Option<&str>,
) -> BuildStateChangeEvent {
    EventEnvelope::from_value(build_envelope(build_detail(status, env, with_logs, artifact)))
        .and_then(EventEnvelope::into_build_event)
        .unwrap()
}

pub fn pull_request_envelope() -> Value {
    json!({
        "detail-type": "CodeCommit Pull Request State Change",
        "source": "aws.codecommit",
        "detail": {
            "event": "pullRequestCreated",
            "pullRequestStatus": "Open",
            "repositoryNames": ["myrepo"],
            "pullRequestId": "pr-42",
            "sourceCommit": "srcA",
            "destinationCommit": "dstB"
        }
    })
}

pub fn pull_request_event() -> PullRequestEvent {
    EventEnvelope::from_value(pull_request_envelope())
        .and_then(EventEnvelope::into_pull_request_event)
        .unwrap()
}
