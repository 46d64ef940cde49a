mod error;
mod progress;
mod traits;
mod types;

pub use error::{NetworkStage, ServiceError};
pub use progress::{LogProgress, ProgressSink};
pub use traits::{Downloader, HeadResponse, ReleaseService};
pub use types::{
    ArtifactFile, ArtifactKind, InstalledVersion, Release, VERSION_PREFIX, canonical_version,
};
