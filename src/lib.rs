//! Mauloader - Telegram bot that fetches short videos and sends them back
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging, process execution and retries
//! - `download`: Lookup API client, per-job directories, download and compression pipelines
//! - `telegram`: Routing, status messages, the chat sink and the dispatcher schema

pub mod cli;
pub mod core;
pub mod download;
pub mod telegram;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult, PipelineSettings};
pub use download::{VideoError, VideoPipeline};
pub use telegram::{handle_incoming, HandlerDeps};
