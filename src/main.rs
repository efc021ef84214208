use anyhow::Result;
use dotenvy::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tokio::signal;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use mauloader::cli::{Cli, Commands};
use mauloader::core::joke::JokeClient;
use mauloader::core::{config, init_logger, log_pipeline_configuration, parse_level, PipelineSettings, SystemProcessRunner};
use mauloader::download::{spawn_job_sweeper, DownloadJob, LookupClient, VideoPipeline};
use mauloader::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps, PollingErrorHandler};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, bot creation, HTTP clients).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Log panics in request tasks instead of losing them to stderr
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // .env must be loaded before any config static is read
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH, parse_level(&config::LOG_LEVEL))?;

    match cli.command {
        Some(Commands::Run) => run_bot().await,
        Some(Commands::Lookup { url, json }) => run_cli_lookup(url, json).await,
        Some(Commands::Fetch { url, output, compress }) => run_cli_fetch(url, output, compress).await,
        None => {
            log::info!("No command specified, running bot in default mode");
            run_bot().await
        }
    }
}

/// Cancels `token` on Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            log::info!("Ctrl-C received, cancelling in-flight requests");
            token.cancel();
        }
    });
}

async fn exponential_backoff(retry_count: u32) {
    let delay = Duration::from_secs(config::retry::EXPONENTIAL_BACKOFF_BASE.pow(retry_count));
    log::info!("Waiting {}s before reconnecting", delay.as_secs());
    sleep(delay).await;
}

async fn run_bot() -> Result<()> {
    let settings = Arc::new(PipelineSettings::from_env());
    log_pipeline_configuration(&settings);
    fs_err::tokio::create_dir_all(&settings.work_root).await?;

    let shutdown = CancellationToken::new();
    cancel_on_ctrl_c(shutdown.clone());
    let sweeper = spawn_job_sweeper(
        settings.work_root.clone(),
        config::jobs::sweep_interval(),
        config::jobs::max_age(),
        shutdown.clone(),
    );

    let bot = create_bot()?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to register bot commands: {}", e);
    }

    let pipeline = Arc::new(VideoPipeline::new(
        Arc::clone(&settings),
        LookupClient::from_env()?,
        Arc::new(SystemProcessRunner::default()),
    ));
    let handler = schema(HandlerDeps::new(pipeline, JokeClient::from_env()?, shutdown.clone()));

    log::info!("Starting bot in long polling mode");

    let mut retry_count = 0;
    loop {
        let bot_clone = bot.clone();
        let handler_clone = handler.clone();

        // Separate task so a panic inside the dispatcher can be caught and retried
        let handle = tokio::spawn(async move {
            use teloxide::update_listeners::Polling;

            let listener = Polling::builder(bot_clone.clone()).drop_pending_updates().build();

            Dispatcher::builder(bot_clone, handler_clone)
                // Every update runs concurrently, even within one chat
                .distribution_function(|_| None::<std::convert::Infallible>)
                .enable_ctrlc_handler()
                .build()
                .dispatch_with_listener(listener, PollingErrorHandler::new())
                .await
        });

        match handle.await {
            Ok(()) => {
                log::info!("Dispatcher shutdown gracefully");
                break;
            }
            Err(join_err) if join_err.is_panic() => {
                log::error!("Dispatcher panicked: {}", join_err);
                if retry_count >= config::retry::MAX_DISPATCHER_RETRIES {
                    log::error!("Max retries reached after panic. Exiting...");
                    break;
                }
                retry_count += 1;
                log::info!(
                    "Retrying dispatcher connection after panic (attempt {}/{})...",
                    retry_count,
                    config::retry::MAX_DISPATCHER_RETRIES
                );
                exponential_backoff(retry_count).await;
            }
            Err(join_err) => {
                log::warn!("Dispatcher task was cancelled: {}", join_err);
                break;
            }
        }
    }

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        log::warn!("Job sweeper task failed: {}", e);
    }
    Ok(())
}

async fn run_cli_lookup(url: String, json: bool) -> Result<()> {
    let client = LookupClient::from_env()?;
    let metadata = client.lookup(&url, &CancellationToken::new()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
    } else {
        println!("{}", metadata.caption());
        println!();
        println!("{}", metadata.download_link);
    }
    Ok(())
}

async fn run_cli_fetch(url: String, output: PathBuf, compress: bool) -> Result<()> {
    let settings = Arc::new(PipelineSettings::from_env().compress(compress));
    let pipeline = VideoPipeline::new(
        Arc::clone(&settings),
        LookupClient::from_env()?,
        Arc::new(SystemProcessRunner::default()),
    );

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let job = DownloadJob::create(&settings.work_root, "cli", &url).await?;
    let (path, delivery) = pipeline.acquire_and_compress(&job, None, &cancel).await?;

    fs_err::tokio::create_dir_all(&output).await?;
    let target = output.join(format!("{}.mp4", job.id()));
    fs_err::tokio::copy(&path, &target).await?;
    job.cleanup().await;

    log::info!("Saved {} ({:?})", target.display(), delivery);
    println!("{}", target.display());
    Ok(())
}
