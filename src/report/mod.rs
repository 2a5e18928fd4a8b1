pub mod artifact;
pub mod composer;
pub mod logs;

pub use artifact::ArtifactRef;
pub use composer::ReportComposer;
pub use logs::{LogFetcher, LogWindow, MAX_LOG_LINES};
