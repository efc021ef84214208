//! Video delivery pipelines.
//!
//! Two entry points, one per source:
//! - [`VideoPipeline::deliver_lookup`]: lookup API → send by URL, single reply
//! - [`VideoPipeline::deliver_download`]: job dir → download → optional
//!   compress → upload, narrated by a [`StatusMessenger`]
//!
//! Both return a [`VideoError`] instead of replying on failure; the caller owns
//! the user-facing message.

use std::path::PathBuf;
use std::sync::Arc;
use teloxide::types::ChatId;
use tokio_util::sync::CancellationToken;

use crate::core::config::PipelineSettings;
use crate::core::error::AppError;
use crate::core::process::ProcessRunner;
use crate::core::utils::cancellable;
use crate::download::acquire::VideoAcquirer;
use crate::download::error::VideoError;
use crate::download::job::DownloadJob;
use crate::download::lookup::LookupClient;
use crate::download::transcode::VideoTranscoder;
use crate::telegram::sink::ChatSink;
use crate::telegram::status::{Stage, StatusMessenger};
use crate::telegram::types::IncomingMessage;

/// What was actually sent for a successful request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Sent by URL, the platform fetched it
    Linked,
    /// Uploaded as downloaded
    Original,
    /// Uploaded after re-encoding
    Compressed,
    /// Compression failed, the original was uploaded instead
    Degraded,
}

#[derive(Clone)]
pub struct VideoPipeline {
    settings: Arc<PipelineSettings>,
    lookup: LookupClient,
    acquirer: VideoAcquirer,
    transcoder: VideoTranscoder,
}

fn delivery_error(err: AppError) -> VideoError {
    match err {
        AppError::Cancelled => VideoError::Cancelled,
        other => VideoError::DeliveryFailed(other.to_string()),
    }
}

impl VideoPipeline {
    pub fn new(settings: Arc<PipelineSettings>, lookup: LookupClient, runner: Arc<dyn ProcessRunner>) -> Self {
        let acquirer = VideoAcquirer::new(Arc::clone(&runner), settings.downloader_bin.clone());
        let transcoder = VideoTranscoder::new(runner, settings.encoder_bin.clone());
        Self {
            settings,
            lookup,
            acquirer,
            transcoder,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Resolves a short link through the lookup API and sends the video by URL.
    pub async fn deliver_lookup(
        &self,
        sink: &dyn ChatSink,
        chat: ChatId,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Delivery, VideoError> {
        let metadata = self.lookup.lookup(url, cancel).await?;
        cancellable(cancel, sink.send_video_url(chat, &metadata.download_link, &metadata.caption()))
            .await
            .map_err(delivery_error)?;
        log::info!("Sent {} to chat {} by link", metadata.id, chat);
        Ok(Delivery::Linked)
    }

    /// Downloads `url` into a private job directory and uploads the result.
    ///
    /// The status message and the job directory are cleaned up on every exit
    /// path before this returns.
    pub async fn deliver_download(
        &self,
        sink: Arc<dyn ChatSink>,
        request: &IncomingMessage,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Delivery, VideoError> {
        let job = DownloadJob::create(&self.settings.work_root, &request.tag(), url)
            .await
            .map_err(|e| VideoError::AcquisitionFailed(format!("cannot create job directory: {}", e)))?;
        let mut status = StatusMessenger::new(Arc::clone(&sink), request.chat_id).with_cancel(cancel.clone());

        let result = self.run_job(&job, sink.as_ref(), &mut status, request.chat_id, cancel).await;

        status.finish().await;
        match &result {
            Ok(delivery) => log::info!("Job {} delivered ({:?})", job.id(), delivery),
            Err(e) => log::warn!("Job {} failed [{}]: {}", job.id(), e.subcategory(), e),
        }
        job.cleanup().await;
        result
    }

    async fn run_job(
        &self,
        job: &DownloadJob,
        sink: &dyn ChatSink,
        status: &mut StatusMessenger,
        chat: ChatId,
        cancel: &CancellationToken,
    ) -> Result<Delivery, VideoError> {
        status.advance(Stage::Downloading).await;
        let (path, delivery) = self.acquire_and_compress(job, Some(&mut *status), cancel).await?;

        status.advance(Stage::Uploading).await;
        cancellable(cancel, sink.send_video_file(chat, &path, None))
            .await
            .map_err(delivery_error)?;
        Ok(delivery)
    }

    /// Downloads the job's video and compresses it when enabled.
    ///
    /// A failed compression falls back to the original file.
    pub async fn acquire_and_compress(
        &self,
        job: &DownloadJob,
        mut status: Option<&mut StatusMessenger>,
        cancel: &CancellationToken,
    ) -> Result<(PathBuf, Delivery), VideoError> {
        let path = self.acquirer.acquire(job, cancel).await?;
        if !self.settings.compress_video {
            return Ok((path, Delivery::Original));
        }

        if let Some(status) = status.as_deref_mut() {
            status.advance(Stage::Compressing).await;
        }
        match self.transcoder.transcode(&path, &job.transcode_temp(), cancel).await {
            Ok(compressed) => Ok((compressed, Delivery::Compressed)),
            Err(VideoError::Cancelled) => Err(VideoError::Cancelled),
            Err(e) => {
                log::warn!("Job {}: {}, sending the original file", job.id(), e);
                Ok((path, Delivery::Degraded))
            }
        }
    }
}
