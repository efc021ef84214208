//! Video acquisition and delivery

pub mod acquire;
pub mod error;
pub mod job;
pub mod lookup;
pub mod pipeline;
pub mod transcode;

// Re-exports for convenience
pub use acquire::VideoAcquirer;
pub use error::VideoError;
pub use job::{spawn_job_sweeper, sweep_stale_jobs, DownloadJob};
pub use lookup::{LookupClient, RemoteVideoMetadata};
pub use pipeline::{Delivery, VideoPipeline};
pub use transcode::VideoTranscoder;
