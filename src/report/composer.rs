//! Pull request status report
//!
//! The base report is always produced. Log and artifact sections are
//! best-effort enrichments: each one that fails is replaced by an inline
//! diagnostic and the remaining steps still run.

use tracing::warn;

use super::artifact::ArtifactRef;
use super::logs::LogFetcher;
use crate::build::{build_job_url, PullRequestContext};
use crate::error::Result;
use crate::events::BuildStateChangeEvent;

pub const REPORT_TITLE: &str = "# Pull Request Builder";
pub const REMEDIATION_NOTE: &str = "You must resolve the issue before the branch can be merged.";
const EMPTY_LOG_PLACEHOLDER: &str = "(no log events available yet)";

pub struct ReportComposer {
    logs: LogFetcher,
    region: String,
}

impl ReportComposer {
    pub fn new(logs: LogFetcher, region: String) -> Self {
        Self { logs, region }
    }

    pub async fn compose(&self, event: &BuildStateChangeEvent, context: &PullRequestContext) -> String {
        let outcome = event.outcome();
        let mut report = self.base_report(event, context);

        if outcome.is_failed() {
            if let Some((group, stream)) = event.log_locator() {
                report.push_str(&format!("\n\n{}\n\n", REMEDIATION_NOTE));
                let section = self.log_section(group, stream).await;
                append_enrichment(&mut report, "logs", section);
            }
        }

        if !outcome.is_in_progress() {
            if let Some(artifact) = ArtifactRef::browsable(event.artifact_location()) {
                let section = self.results_section(&artifact);
                append_enrichment(&mut report, "artifact", section);
            }
        }

        report
    }

    pub fn base_report(&self, event: &BuildStateChangeEvent, context: &PullRequestContext) -> String {
        format!(
            "{}\n\n**{}**\n\n{}\n\nSource Commit: {}",
            REPORT_TITLE,
            event.build_status,
            build_job_url(&event.build_id, &self.region),
            context.source_commit_id
        )
    }

    async fn log_section(&self, group: &str, stream: &str) -> Result<String> {
        let window = self.logs.fetch(group, stream).await?;
        let body = if window.is_empty() {
            format!("{}\n", EMPTY_LOG_PLACEHOLDER)
        } else {
            window.render()
        };
        Ok(format!("\n```\n{}\n```\n", body))
    }

    fn results_section(&self, artifact: &ArtifactRef<'_>) -> Result<String> {
        let url = artifact.browse_url(&self.region)?;
        Ok(format!("\n\n## Results\n\nArtifact: {}", url))
    }
}

/// Appends a successful section, or a diagnostic in its place.
fn append_enrichment(report: &mut String, step: &str, section: Result<String>) {
    match section {
        Ok(text) => report.push_str(&text),
        Err(e) => {
            warn!("Report enrichment step '{}' failed: {}", step, e);
            report.push_str(&format!("\n\nError creating comment text: {}", e));
        }
    }
}
