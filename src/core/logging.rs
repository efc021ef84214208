//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - A summary of the pipeline settings at startup

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config::PipelineSettings;

/// Parses a `RUST_LOG`-style level. Unknown values fall back to `Info`.
///
/// Only a bare level is understood; per-module directives are ignored.
pub fn parse_level(value: &str) -> LevelFilter {
    value.trim().parse().unwrap_or(LevelFilter::Info)
}

/// Initialize logger for both console and file output
///
/// HTTP client internals are filtered out below `Warn` so a `debug` run shows
/// the pipeline rather than connection pool chatter.
///
/// # Arguments
/// * `log_file_path` - Path to the log file
/// * `level` - Maximum level written to both outputs
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to create the file or a logger was already installed
pub fn init_logger(log_file_path: &str, level: LevelFilter) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    let config = ConfigBuilder::new()
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .add_filter_ignore_str("rustls")
        .build();

    CombinedLogger::init(vec![
        TermLogger::new(level, config.clone(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(level, config, log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    log::info!("Logging at {} to {}", level, log_file_path);
    Ok(())
}

/// Logs the effective pipeline settings and flags obvious misconfiguration.
pub fn log_pipeline_configuration(settings: &PipelineSettings) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("🎬 Pipeline Configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("Downloader: {}", settings.downloader_bin);
    log::info!("Encoder: {}", settings.encoder_bin);
    log::info!(
        "Compression: {}",
        if settings.compress_video { "enabled" } else { "disabled" }
    );
    log::info!("Job root: {}", settings.work_root.display());

    if settings.photo_path.exists() {
        log::info!("✅ /mau photo: {}", settings.photo_path.display());
    } else {
        log::warn!(
            "⚠️  /mau photo not found at {} - the command will reply with an error",
            settings.photo_path.display()
        );
    }
}
