//! Event handlers and the fan-out that routes events to them
//!
//! Every handler is stateless and independently idempotent. Build-side
//! handlers for one event run concurrently and their results are kept
//! separate: a failed approval does not undo a posted comment.

pub mod approval;
pub mod comment;
pub mod notify;
pub mod trigger;

pub use approval::{ApprovalGate, ApprovalOutcome};
pub use comment::{CommentPublisher, IdempotencyToken, PublishedReport};
pub use notify::{CommitterNotifier, NotificationOutcome, NotifierConfig};
pub use trigger::{BuildTrigger, TriggerOutcome};

use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::build::BuildOutcome;
use crate::config::AppConfig;
use crate::error::{PrBuilderError, Result};
use crate::events::{BuildStateChangeEvent, Event, PullRequestEvent};
use crate::report::{LogFetcher, ReportComposer};
use crate::services::Services;

pub const START_BUILD: &str = "start-build";
pub const POST_COMMENT: &str = "post-comment";
pub const ENFORCE_APPROVAL: &str = "enforce-approval";
pub const NOTIFY_COMMITTER: &str = "notify-committer";

/// Result of one handler for one event.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerReport {
    pub handler: &'static str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub retriable: bool,
}

impl HandlerReport {
    pub fn from_result<T: Serialize>(handler: &'static str, result: Result<T>) -> Self {
        match result {
            Ok(value) => Self {
                handler,
                status: "completed",
                result: serde_json::to_value(value).ok(),
                error: None,
                retriable: false,
            },
            Err(PrBuilderError::NotAPullRequestBuild) => {
                warn!("{}: not a pull request build, nothing to do", handler);
                Self {
                    handler,
                    status: "not_a_pull_request_build",
                    result: None,
                    error: None,
                    retriable: false,
                }
            }
            Err(e) => {
                error!("{} failed: {}", handler, e);
                Self {
                    handler,
                    status: "failed",
                    result: None,
                    retriable: e.is_retriable(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchReport {
    pub handlers: Vec<HandlerReport>,
}

impl DispatchReport {
    /// Handlers that hit an upstream failure and are worth running again.
    pub fn retriable_handlers(&self) -> Vec<&'static str> {
        self.handlers
            .iter()
            .filter(|h| h.retriable)
            .map(|h| h.handler)
            .collect()
    }

    pub fn handler(&self, name: &str) -> Option<&HandlerReport> {
        self.handlers.iter().find(|h| h.handler == name)
    }
}

pub struct Orchestrator {
    pub trigger: BuildTrigger,
    pub comments: CommentPublisher,
    pub approval: Option<ApprovalGate>,
    pub notifier: Option<CommitterNotifier>,
}

impl Orchestrator {
    /// Wires the handlers. The notifier runs only with a resolved config.
    pub fn new(config: &AppConfig, services: Services, notifier: Option<NotifierConfig>) -> Self {
        let composer = ReportComposer::new(
            LogFetcher::new(services.logs.clone()),
            config.region.clone(),
        );

        Self {
            trigger: BuildTrigger::new(services.builds.clone(), config.codebuild_project_name.clone()),
            comments: CommentPublisher::new(services.version_control.clone(), composer),
            approval: config
                .enforce_approval
                .then(|| ApprovalGate::new(services.version_control.clone())),
            notifier: notifier.map(|notifier_config| {
                CommitterNotifier::new(
                    services.version_control.clone(),
                    services.mailer.clone(),
                    notifier_config,
                    config.region.clone(),
                )
            }),
        }
    }

    pub async fn dispatch(&self, event: Event) -> DispatchReport {
        match event {
            Event::PullRequestStateChange(event) => self.on_pull_request(&event).await,
            Event::BuildStateChange(event) => self.on_build_state_change(&event).await,
        }
    }

    async fn on_pull_request(&self, event: &PullRequestEvent) -> DispatchReport {
        let report = HandlerReport::from_result(START_BUILD, self.trigger.start(event).await);
        DispatchReport {
            handlers: vec![report],
        }
    }

    async fn on_build_state_change(&self, event: &BuildStateChangeEvent) -> DispatchReport {
        let outcome = event.outcome();

        let comment = async {
            HandlerReport::from_result(POST_COMMENT, self.comments.publish(event).await)
        };

        let approval = async {
            match &self.approval {
                Some(gate) if matches!(outcome, BuildOutcome::Succeeded | BuildOutcome::Failed) => {
                    Some(HandlerReport::from_result(ENFORCE_APPROVAL, gate.enforce(event).await))
                }
                _ => None,
            }
        };

        let notify = async {
            match &self.notifier {
                Some(notifier) if outcome.is_failed() => {
                    Some(HandlerReport::from_result(NOTIFY_COMMITTER, notifier.notify(event).await))
                }
                _ => None,
            }
        };

        let (comment, approval, notify) = tokio::join!(comment, approval, notify);

        let mut handlers = vec![comment];
        handlers.extend(approval);
        handlers.extend(notify);
        DispatchReport { handlers }
    }
}
