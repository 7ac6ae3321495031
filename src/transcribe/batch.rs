use futures_util::StreamExt;
use serde::Serialize;

use super::{FetchedTranscript, TranscriptPipeline};
use crate::transport::HttpTransport;
use crate::utils;
use crate::TranscriptError;

/// A video that could not be fetched, reported in place when batching continues on error
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedVideo {
    pub video_id: String,
    pub error: String,
}

/// One line of batch output, in input order
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Fetched(FetchedTranscript),
    Failed(FailedVideo),
}

impl BatchEntry {
    pub fn is_failed(&self) -> bool {
        matches!(self, BatchEntry::Failed(_))
    }
}

/// The item that stopped a batch
#[derive(thiserror::Error, Debug)]
#[error("Failed to fetch transcript for {video}")]
pub struct BatchError {
    pub video: String,
    #[source]
    pub source: TranscriptError,
}

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Videos fetched concurrently
    pub jobs: usize,

    /// Record failed videos and keep going instead of stopping at the first one
    pub continue_on_error: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            jobs: 1,
            continue_on_error: false,
        }
    }
}

impl<T: HttpTransport> TranscriptPipeline<T> {
    /// Fetch every video in `videos`, returning entries in input order.
    ///
    /// `on_entry` sees each entry as it is settled. Cancellation always stops the batch, even
    /// when `continue_on_error` is set, so an aborted run never yields partial output.
    pub async fn fetch_batch<S, F>(
        &self,
        videos: &[String],
        languages: &[S],
        options: BatchOptions,
        mut on_entry: F,
    ) -> Result<Vec<BatchEntry>, BatchError>
    where
        S: AsRef<str>,
        F: FnMut(&BatchEntry),
    {
        let mut results = futures_util::stream::iter(videos.iter())
            .map(|video| async move {
                let video_id = utils::extract_video_id(video);
                let result = self.fetch_transcript(&video_id, languages).await;
                (video, video_id, result)
            })
            .buffered(options.jobs.max(1));

        let mut entries = Vec::with_capacity(videos.len());
        while let Some((video, video_id, result)) = results.next().await {
            let entry = match result {
                Ok(fetched) => BatchEntry::Fetched(fetched),
                Err(e @ TranscriptError::Cancelled) => {
                    return Err(BatchError {
                        video: video.clone(),
                        source: e,
                    })
                }
                Err(e) if options.continue_on_error => {
                    tracing::debug!("Skipping {}: {}", video, e);
                    BatchEntry::Failed(FailedVideo {
                        video_id,
                        error: e.to_string(),
                    })
                }
                Err(e) => {
                    return Err(BatchError {
                        video: video.clone(),
                        source: e,
                    })
                }
            };
            on_entry(&entry);
            entries.push(entry);
        }

        Ok(entries)
    }
}
