//! # Orientation Resolution
//!
//! A scan arrives in unknown orientation. The resolver builds four candidates (0°, 90°,
//! 180° and 270° clockwise), recognizes text on each, scores it, and keeps the best one.
//!
//! ## Pipeline
//!
//! 1. Crop to the calibration region (when known) and drop any alpha channel.
//! 2. Rotate, writing each candidate to a temporary `rotated.<r>.bmp` artifact.
//! 3. Recognize and score on blocking workers. At most `workers` candidates are in flight;
//!    finished workers are harvested and free slots refilled until nothing is left.
//! 4. Select: highest score wins. Equal scores go to the candidate harvested first.
//! 5. Recognize boxes on the winner only.
//!
//! Temporary artifacts are removed whatever the outcome, cancellation included.
//! Cancelling detaches the workers still running; their results are discarded.

use super::scoring::{NoScore, ScoreChain};
use super::{Candidate, EngineRegistry, OcrEngine};
use crate::boxes::LineBox;
use crate::error::{PaperError, Result};
use crate::model::{CropRegion, Document, LanguageConfig, Rotation};
use crate::store::{ArtifactStore, StorageBackend};
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// The selected candidate, ready to persist.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub rotation: Rotation,
    pub image: DynamicImage,
    pub text: String,
    pub boxes: Vec<LineBox>,
    pub score: i64,
}

pub struct OrientationResolver {
    engines: Arc<dyn EngineRegistry>,
    chain: ScoreChain,
    workers: usize,
}

/// Index of the best candidate: highest score, earliest on ties.
pub fn select_best(candidates: &[Candidate]) -> Option<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    // sort_by is stable, so equal scores keep harvest order
    order.sort_by(|a, b| candidates[*b].score.cmp(&candidates[*a].score));
    order.first().copied()
}

impl OrientationResolver {
    pub fn new(engines: Arc<dyn EngineRegistry>, chain: ScoreChain, workers: usize) -> Self {
        Self {
            engines,
            chain,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    fn engine(&self) -> Result<Arc<dyn OcrEngine>> {
        self.engines.first().ok_or_else(|| {
            error!("no OCR engine available");
            PaperError::NoOcrEngine
        })
    }

    /// Resolves the orientation of a fresh scan for `document`.
    pub async fn resolve<B: StorageBackend>(
        &self,
        store: &ArtifactStore<B>,
        document: &Document,
        image: &DynamicImage,
        langs: &LanguageConfig,
        crop: Option<CropRegion>,
        cancel: &CancellationToken,
    ) -> Result<Resolution> {
        let engine = self.engine()?;
        info!(engine = engine.name(), document = %document, "resolving orientation");

        let base = match crop {
            Some(region) => region.apply(image),
            None => image.clone(),
        };
        let base = DynamicImage::ImageRgb8(base.to_rgb8());

        let mut temp_paths = Vec::new();
        let outcome = self
            .resolve_candidates(store, document, &base, langs, cancel, engine, &mut temp_paths)
            .await;

        for path in &temp_paths {
            if let Err(e) = store.remove_temp(path) {
                warn!(path = %path.display(), error = %e, "failed to remove candidate");
            }
        }
        outcome
    }

    #[allow(clippy::too_many_arguments)]
    async fn resolve_candidates<B: StorageBackend>(
        &self,
        store: &ArtifactStore<B>,
        document: &Document,
        base: &DynamicImage,
        langs: &LanguageConfig,
        cancel: &CancellationToken,
        engine: Arc<dyn OcrEngine>,
        temp_paths: &mut Vec<PathBuf>,
    ) -> Result<Resolution> {
        let mut candidates = Vec::with_capacity(Rotation::ALL.len());
        for rotation in Rotation::ALL {
            let candidate = Candidate::new(rotation, rotation.apply(base));
            temp_paths.push(store.write_temp_candidate(document, rotation, &candidate.image)?);
            candidates.push(candidate);
        }

        let processed = self
            .process(candidates, &engine, &self.chain, langs, cancel)
            .await?;
        let winner = select_best(&processed)
            .and_then(|index| processed.into_iter().nth(index))
            .ok_or_else(|| PaperError::Recognition("No candidate survived".to_string()))?;
        info!(rotation = %winner.rotation, score = winner.score, "best orientation");

        self.finish(winner, engine, langs, cancel).await
    }

    /// Recognizes `image` as is: one candidate, no scoring.
    pub async fn recognize_single(
        &self,
        image: &DynamicImage,
        langs: &LanguageConfig,
        cancel: &CancellationToken,
    ) -> Result<Resolution> {
        let engine = self.engine()?;
        let candidate = Candidate::new(Rotation::Deg0, image.clone());
        let unscored = ScoreChain::new(vec![Arc::new(NoScore)]);
        let processed = self
            .process(vec![candidate], &engine, &unscored, langs, cancel)
            .await?;
        let winner = processed
            .into_iter()
            .next()
            .ok_or_else(|| PaperError::Recognition("No candidate survived".to_string()))?;
        self.finish(winner, engine, langs, cancel).await
    }

    /// Runs recognition and scoring over `candidates`, returning them in harvest order.
    async fn process(
        &self,
        candidates: Vec<Candidate>,
        engine: &Arc<dyn OcrEngine>,
        chain: &ScoreChain,
        langs: &LanguageConfig,
        cancel: &CancellationToken,
    ) -> Result<Vec<Candidate>> {
        let mut pending = candidates.into_iter();
        let mut running: JoinSet<Result<Candidate>> = JoinSet::new();
        let mut harvested = Vec::new();

        loop {
            while running.len() < self.workers {
                let Some(mut candidate) = pending.next() else {
                    break;
                };
                let engine = Arc::clone(engine);
                let chain = chain.clone();
                let langs = langs.clone();
                running.spawn_blocking(move || {
                    candidate.text = engine.recognize_text(&candidate.image, &langs.ocr)?;
                    candidate.score = chain.score(&candidate.text, &langs);
                    Ok(candidate)
                });
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(in_flight = running.len(), "orientation cancelled");
                    running.detach_all();
                    return Err(PaperError::Cancelled);
                }
                joined = running.join_next() => match joined {
                    None => break,
                    Some(Ok(Ok(candidate))) => {
                        debug!(rotation = %candidate.rotation, score = candidate.score, "candidate done");
                        harvested.push(candidate);
                    }
                    Some(Ok(Err(e))) => {
                        running.detach_all();
                        return Err(e);
                    }
                    Some(Err(e)) => {
                        running.detach_all();
                        return Err(PaperError::Recognition(format!("Worker failed: {}", e)));
                    }
                }
            }
        }

        Ok(harvested)
    }

    async fn finish(
        &self,
        winner: Candidate,
        engine: Arc<dyn OcrEngine>,
        langs: &LanguageConfig,
        cancel: &CancellationToken,
    ) -> Result<Resolution> {
        let image = winner.image.clone();
        let lang = langs.ocr.clone();
        let boxes = tokio::task::spawn_blocking(move || engine.recognize_boxes(&image, &lang));

        let boxes = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PaperError::Cancelled),
            joined = boxes => joined
                .map_err(|e| PaperError::Recognition(format!("Worker failed: {}", e)))??,
        };

        Ok(Resolution {
            rotation: winner.rotation,
            image: winner.image,
            text: winner.text,
            boxes,
            score: winner.score,
        })
    }
}
