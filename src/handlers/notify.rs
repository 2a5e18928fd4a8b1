use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::build::build_job_url;
use crate::error::{PrBuilderError, Result};
use crate::events::BuildStateChangeEvent;
use crate::services::{CommitInfo, Email, Mailer, ParameterStore, UserInfo, VersionControl};

/// Sender and optional CC address, resolved once before serving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierConfig {
    pub source_email: String,
    pub cc_email: Option<String>,
}

impl NotifierConfig {
    /// Fails with `ConfigError` when the source address cannot be
    /// resolved; the notifier must not run half-configured.
    pub async fn resolve(
        store: &dyn ParameterStore,
        source_param: &str,
        cc_param: Option<&str>,
    ) -> Result<Self> {
        info!(
            "Resolving notifier addresses (source: {}, cc: {:?})",
            source_param, cc_param
        );

        let mut names = vec![source_param.to_string()];
        if let Some(cc) = cc_param {
            names.push(cc.to_string());
        }

        let parameters = store.get_parameters(&names, true).await.map_err(|e| {
            PrBuilderError::ConfigError(format!("Could not fetch email parameters: {}", e))
        })?;

        let value_of = |name: &str| {
            parameters
                .iter()
                .find(|p| p.name == name)
                .map(|p| p.value.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let source_email = value_of(source_param).ok_or_else(|| {
            PrBuilderError::ConfigError(format!(
                "Could not retrieve source email address from {}",
                source_param
            ))
        })?;
        let cc_email = cc_param.and_then(value_of);

        Ok(Self {
            source_email,
            cc_email,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationOutcome {
    Sent {
        pull_request_id: String,
        recipient: String,
        message_id: Option<String>,
    },
    Skipped { outcome: String },
}

/// Emails the source commit's author when a pull request build fails.
pub struct CommitterNotifier {
    version_control: Arc<dyn VersionControl>,
    mailer: Arc<dyn Mailer>,
    config: NotifierConfig,
    region: String,
}

impl CommitterNotifier {
    pub fn new(
        version_control: Arc<dyn VersionControl>,
        mailer: Arc<dyn Mailer>,
        config: NotifierConfig,
        region: String,
    ) -> Self {
        Self {
            version_control,
            mailer,
            config,
            region,
        }
    }

    pub async fn notify(&self, event: &BuildStateChangeEvent) -> Result<NotificationOutcome> {
        let context = event.pull_request_context()?;
        let outcome = event.outcome();
        if !outcome.is_failed() {
            return Ok(NotificationOutcome::Skipped {
                outcome: outcome.to_string(),
            });
        }

        info!(
            "Processing failure notification for pull request {} on {}",
            context.pull_request_id, context.source_commit_id
        );

        let commit = self
            .version_control
            .get_commit(&context.repository_name, &context.source_commit_id)
            .await?;
        let recipient = commit_recipient(&commit)?.clone();
        info!("Notifying {} at {}", recipient.name, recipient.email);

        let email = Email {
            source: self.config.source_email.clone(),
            to: vec![recipient.email.clone()],
            cc: self.config.cc_email.iter().cloned().collect(),
            subject: format!("Build failed on pull request {}", context.pull_request_id),
            body: failure_message(
                &recipient.name,
                &context.repository_name,
                &commit,
                &build_job_url(&event.build_id, &self.region),
            ),
        };

        let sent = self.mailer.send_email(&email).await?;

        Ok(NotificationOutcome::Sent {
            pull_request_id: context.pull_request_id,
            recipient: recipient.email,
            message_id: sent.message_id,
        })
    }
}

/// Author first, committer when the commit has no author identity.
fn commit_recipient(commit: &CommitInfo) -> Result<&UserInfo> {
    commit
        .author
        .as_ref()
        .or(commit.committer.as_ref())
        .ok_or_else(|| {
            PrBuilderError::upstream(
                "codecommit",
                format!("commit {} has no author or committer email", commit.commit_id),
            )
        })
}

fn failure_message(user_name: &str, repository: &str, commit: &CommitInfo, job_url: &str) -> String {
    format!(
        "Hey {},\n\nBad news! A build for {} has failed!\n\nSource Commit: {}\n\n{}\n\n{}\n",
        user_name,
        repository,
        commit.commit_id,
        commit.message.trim_end(),
        job_url
    )
}
