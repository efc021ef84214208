//! Core utilities, configuration, and common functionality

pub mod config;
pub mod error;
pub mod joke;
pub mod logging;
pub mod process;
pub mod retry;
pub mod utils;

// Re-exports for convenience
pub use config::PipelineSettings;
pub use error::{AppError, AppResult};
pub use logging::{init_logger, log_pipeline_configuration, parse_level};
pub use process::{ProcessResult, ProcessRunner, SystemProcessRunner};
