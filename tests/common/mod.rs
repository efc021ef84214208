//! Common test utilities
//!
//! This module is shared across all integration tests

pub mod helpers;
pub mod http;
pub mod recorder;

#[allow(unused_imports)]
pub use helpers::{TestEnvironment, DOWNLOAD_BASE, UNREACHABLE_API};
#[allow(unused_imports)]
pub use http::received_user_agents;
#[allow(unused_imports)]
pub use recorder::{RecordingSink, SinkCall};
