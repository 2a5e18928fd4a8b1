use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::services::{LogQuery, LogStore};

/// Most log lines included in a single report.
pub const MAX_LOG_LINES: usize = 30;

/// Tail of a build log, in the order the store returned it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogWindow {
    lines: Vec<String>,
}

impl LogWindow {
    /// Keeps only the last `MAX_LOG_LINES` entries.
    pub fn new(mut lines: Vec<String>) -> Self {
        if lines.len() > MAX_LOG_LINES {
            lines.drain(..lines.len() - MAX_LOG_LINES);
        }
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Messages carry their own line endings, so they are joined as-is.
    pub fn render(&self) -> String {
        self.lines.concat()
    }
}

pub struct LogFetcher {
    store: Arc<dyn LogStore>,
}

impl LogFetcher {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }

    /// One bounded, tail-first fetch. No pagination.
    pub async fn fetch(&self, group_name: &str, stream_name: &str) -> Result<LogWindow> {
        let query = LogQuery {
            group_name: group_name.to_string(),
            stream_name: stream_name.to_string(),
            limit: MAX_LOG_LINES,
            start_from_head: false,
        };

        let events = self.store.get_log_events(&query).await?;
        debug!(
            "Fetched {} log events from {}/{}",
            events.len(),
            group_name,
            stream_name
        );

        Ok(LogWindow::new(events.into_iter().map(|e| e.message).collect()))
    }
}
