pub mod envelope;
pub mod types;

pub use envelope::{Event, EventEnvelope};
pub use types::{
    AdditionalInformation, ArtifactInfo, BuildEnvironmentInfo, BuildStateChangeEvent, LogInfo,
    PullRequestEvent,
};
