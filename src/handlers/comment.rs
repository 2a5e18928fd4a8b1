use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::error::Result;
use crate::events::BuildStateChangeEvent;
use crate::report::ReportComposer;
use crate::services::{CommentRequest, VersionControl};

/// Deterministic client token for one (build id, build status) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IdempotencyToken(String);

impl IdempotencyToken {
    pub fn new(build_id: &str, build_status: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(build_id.as_bytes());
        hasher.update(b"\n");
        hasher.update(build_status.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishedReport {
    pub pull_request_id: String,
    pub client_request_token: IdempotencyToken,
    pub comment_id: Option<String>,
}

/// Posts the build report onto the pull request, once per build state.
pub struct CommentPublisher {
    version_control: Arc<dyn VersionControl>,
    composer: ReportComposer,
}

impl CommentPublisher {
    pub fn new(version_control: Arc<dyn VersionControl>, composer: ReportComposer) -> Self {
        Self {
            version_control,
            composer,
        }
    }

    pub async fn publish(&self, event: &BuildStateChangeEvent) -> Result<PublishedReport> {
        let context = event.pull_request_context()?;
        let token = IdempotencyToken::new(&event.build_id, &event.build_status);

        info!(
            "Publishing {} report for pull request {} on {}",
            event.build_status, context.pull_request_id, context.source_commit_id
        );

        let content = self.composer.compose(event, &context).await;
        let request = CommentRequest {
            pull_request_id: context.pull_request_id.clone(),
            repository_name: context.repository_name.clone(),
            before_commit_id: context.source_commit_id.clone(),
            after_commit_id: context.destination_commit_id.clone(),
            content,
            client_request_token: token.as_str().to_string(),
        };

        let posted = self.version_control.post_comment(&request).await?;
        info!("Report posted to pull request {}", context.pull_request_id);

        Ok(PublishedReport {
            pull_request_id: context.pull_request_id,
            client_request_token: token,
            comment_id: posted.comment_id,
        })
    }
}
