//! Mock implementations for testing

pub mod mock_runner;

#[allow(unused_imports)]
pub use mock_runner::{Behavior, MockRunner, MockRunnerConfig, COMPRESSED_MARKER, DOWNLOADER, ENCODER};
