//! Error type shared by the text and voice pipelines, and the ordered
//! fan-out both use for batches.

use crate::asr::AsrError;
use crate::config::FailurePolicy;
use crate::decode::DecodeError;
use crate::emotion::EmotionError;
use crate::text::CorrectionError;
use futures::stream::{self, StreamExt};
use std::future::Future;

#[derive(thiserror::Error, Debug)]
pub enum AnalysisError {
    #[error("text correction failed: {0}")]
    Correction(#[from] CorrectionError),
    #[error("emotion classification failed: {0}")]
    Emotion(#[from] EmotionError),
    #[error("transcription failed: {0}")]
    Asr(#[from] AsrError),
    #[error("audio decoding failed: {0}")]
    Decode(#[from] DecodeError),
}

/// Runs `f` over `items` with at most `concurrency` in flight and returns the
/// successes in input order.
///
/// Under [`FailurePolicy::FailFast`] the first error (in input order) is
/// returned; under [`FailurePolicy::SkipAndLog`] failing items are logged
/// with their index and dropped.
pub async fn run_ordered<T, R, F, Fut>(
    items: Vec<T>,
    concurrency: usize,
    policy: FailurePolicy,
    f: F,
) -> Result<Vec<R>, AnalysisError>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, AnalysisError>>,
{
    let total = items.len();
    let mut results = Vec::with_capacity(total);
    let mut stream = stream::iter(items.into_iter().enumerate().map(|(index, item)| {
        let fut = f(item);
        async move { (index, fut.await) }
    }))
    .buffered(concurrency.max(1));

    let mut skipped = 0usize;
    while let Some((index, result)) = stream.next().await {
        match result {
            Ok(record) => results.push(record),
            Err(e) => match policy {
                FailurePolicy::FailFast => {
                    tracing::error!(index, total, error = %e, "item failed, aborting batch");
                    return Err(e);
                }
                FailurePolicy::SkipAndLog => {
                    tracing::warn!(index, total, error = %e, "item failed, skipping");
                    skipped += 1;
                }
            },
        }
    }

    if skipped > 0 {
        tracing::info!(total, skipped, "batch finished with skipped items");
    }
    Ok(results)
}
