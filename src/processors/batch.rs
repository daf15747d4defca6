// fitbatch/src/processors/batch.rs
use crate::core::processor::ImageProcessor;
use crate::core::registry::{ImageItem, ItemId, ItemRegistry, ProcessedImage, WorkItem};
use crate::core::{FitRequest, ProcessConfig, ResizeError, Result};
use image::GenericImageView;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation for a running batch. Items already in flight
/// finish; items not yet started go back to pending.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Tally of one run, derived from the per-item outcomes.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub done: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub total_size_before: u64,
    pub total_size_after: u64,
    pub errors: Vec<(ItemId, String, String)>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.done + self.failed + self.cancelled
    }

    pub fn is_complete(&self) -> bool {
        self.cancelled == 0
    }

    /// Percentage by which the outputs are smaller than their sources.
    pub fn size_reduction(&self) -> f64 {
        if self.total_size_before == 0 {
            return 0.0;
        }

        let savings = (self.total_size_before as f64 - self.total_size_after as f64)
            / self.total_size_before as f64
            * 100.0;
        savings.clamp(0.0, 100.0)
    }
}

enum Outcome {
    Done { before: u64, after: u64 },
    Failed(String),
    Cancelled,
}

pub struct BatchProcessor {
    processor: ImageProcessor,
    thread_pool: Option<rayon::ThreadPool>,
    show_progress: bool,
}

impl BatchProcessor {
    pub fn new(config: ProcessConfig, max_threads: usize) -> Result<Self> {
        config.validate()?;

        let mut processor = Self {
            processor: ImageProcessor::new(config),
            thread_pool: None,
            show_progress: false,
        };

        if max_threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(max_threads)
                .build()
                .map_err(|e| {
                    ResizeError::ProcessingError(format!("Failed to create thread pool: {}", e))
                })?;
            processor.thread_pool = Some(pool);
        }

        Ok(processor)
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn run_batch(&self, registry: &ItemRegistry, request: &FitRequest) -> Result<BatchSummary> {
        self.run_batch_with_cancel(registry, request, &CancelToken::new())
    }

    /// Processes every item of `registry` against `request`.
    ///
    /// Only an invalid request fails the call, and it does so before any
    /// item is touched. Per-item failures end up as `Error` on that item.
    pub fn run_batch_with_cancel(
        &self,
        registry: &ItemRegistry,
        request: &FitRequest,
        cancel: &CancelToken,
    ) -> Result<BatchSummary> {
        request.validate()?;

        let work = registry.begin_run();
        if work.is_empty() {
            log::warn!("No images queued");
            return Ok(BatchSummary::default());
        }

        log::info!(
            "Processing {} images to {}x{} ({})",
            work.len(),
            request.target_width,
            request.target_height,
            request.fit_mode
        );

        let pb = self.create_progress_bar(work.len());

        let outcomes: Vec<(ItemId, String, Outcome)> = match &self.thread_pool {
            Some(pool) => pool.install(|| self.process_all(&work, registry, request, cancel, &pb)),
            None => self.process_all(&work, registry, request, cancel, &pb),
        };

        let mut summary = BatchSummary::default();
        for (id, name, outcome) in outcomes {
            match outcome {
                Outcome::Done { before, after } => {
                    summary.done += 1;
                    summary.total_size_before += before;
                    summary.total_size_after += after;
                }
                Outcome::Failed(message) => {
                    summary.failed += 1;
                    summary.errors.push((id, name, message));
                }
                Outcome::Cancelled => summary.cancelled += 1,
            }
        }

        pb.finish_with_message(format!(
            "{} done, {} failed, {} cancelled",
            summary.done, summary.failed, summary.cancelled
        ));
        log::info!(
            "Batch finished: {} done, {} failed, {} cancelled",
            summary.done,
            summary.failed,
            summary.cancelled
        );

        Ok(summary)
    }

    fn process_all(
        &self,
        work: &[WorkItem],
        registry: &ItemRegistry,
        request: &FitRequest,
        cancel: &CancelToken,
        pb: &ProgressBar,
    ) -> Vec<(ItemId, String, Outcome)> {
        work.par_iter()
            .progress_with(pb.clone())
            .map(|item| {
                let outcome = self.process_item(item, registry, request, cancel);
                (item.id, item.name.clone(), outcome)
            })
            .collect()
    }

    fn process_item(
        &self,
        item: &WorkItem,
        registry: &ItemRegistry,
        request: &FitRequest,
        cancel: &CancelToken,
    ) -> Outcome {
        if cancel.is_cancelled() {
            registry.update(item.id, ImageItem::revert);
            return Outcome::Cancelled;
        }

        let result = catch_unwind(AssertUnwindSafe(|| self.render_item(item, registry, request)))
            .unwrap_or_else(|_| {
                Err(ResizeError::ProcessingError(
                    "image processing panicked".to_string(),
                ))
            });

        let (outcome, state) = match result {
            Ok(output) => (
                Outcome::Done {
                    before: item.source.len() as u64,
                    after: output.bytes.len() as u64,
                },
                Ok(output),
            ),
            Err(e) => {
                log::warn!("Failed to process {} ({}): {}", item.name, item.id, e);
                let message = e.to_string();
                (Outcome::Failed(message.clone()), Err(message))
            }
        };

        if !registry.update(item.id, |entry| entry.complete(state)) {
            log::debug!("{} was removed while processing, result dropped", item.id);
        }

        outcome
    }

    fn render_item(
        &self,
        item: &WorkItem,
        registry: &ItemRegistry,
        request: &FitRequest,
    ) -> Result<ProcessedImage> {
        let loaded = self.processor.load(&item.source)?;

        let (width, height) = loaded.image.dimensions();
        registry.update(item.id, |entry| {
            entry.record_dimensions(width, height);
            entry.record_format(loaded.format);
        });

        self.processor.render(&loaded, request)
    }

    fn create_progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::ItemStatus;
    use crate::core::FitMode;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([40, 80, 120])));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn corrupt_item_does_not_affect_siblings() {
        let registry = ItemRegistry::new();
        let ids = registry.ingest(vec![
            ("one.png".to_string(), png(30, 20)),
            ("broken.png".to_string(), b"\x89PNG not really".to_vec()),
            ("three.png".to_string(), png(20, 30)),
        ]);

        let batch = BatchProcessor::new(ProcessConfig::default(), 2).unwrap();
        let summary = batch
            .run_batch(&registry, &FitRequest::new(16, 16, FitMode::Cover))
            .unwrap();

        assert_eq!(summary.done, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors[0].0, ids[1]);
        assert_eq!(registry.len(), 3);

        assert_eq!(registry.get(ids[0]).unwrap().status(), ItemStatus::Done);
        assert_eq!(registry.get(ids[1]).unwrap().status(), ItemStatus::Error);
        assert_eq!(registry.get(ids[2]).unwrap().status(), ItemStatus::Done);
        assert!(registry.get(ids[1]).unwrap().result().is_none());
        assert_eq!(registry.exports().len(), 2);
    }

    #[test]
    fn invalid_request_leaves_items_pending() {
        let registry = ItemRegistry::new();
        let id = registry.ingest_one("a.png", png(4, 4));
        let batch = BatchProcessor::new(ProcessConfig::default(), 0).unwrap();

        let result = batch.run_batch(&registry, &FitRequest::new(10, 0, FitMode::Fill));
        assert!(matches!(result, Err(ResizeError::InvalidDimensions(_))));
        assert_eq!(registry.get(id).unwrap().status(), ItemStatus::Pending);
    }

    #[test]
    fn cancelled_batch_reverts_untouched_items() {
        let registry = ItemRegistry::new();
        registry.ingest(vec![
            ("a.png".to_string(), png(4, 4)),
            ("b.png".to_string(), png(4, 4)),
        ]);

        let cancel = CancelToken::new();
        cancel.cancel();

        let batch = BatchProcessor::new(ProcessConfig::default(), 1).unwrap();
        let summary = batch
            .run_batch_with_cancel(&registry, &FitRequest::new(8, 8, FitMode::Fill), &cancel)
            .unwrap();

        assert_eq!(summary.cancelled, 2);
        assert!(!summary.is_complete());
        assert_eq!(registry.count(ItemStatus::Pending), 2);
        assert_eq!(registry.count(ItemStatus::Processing), 0);
    }

    #[test]
    fn rerun_replaces_previous_results() {
        let registry = ItemRegistry::new();
        let id = registry.ingest_one("a.png", png(10, 10));
        let batch = BatchProcessor::new(ProcessConfig::default(), 0).unwrap();

        batch
            .run_batch(&registry, &FitRequest::new(8, 8, FitMode::Fill))
            .unwrap();
        batch
            .run_batch(&registry, &FitRequest::new(5, 3, FitMode::Contain))
            .unwrap();

        let item = registry.get(id).unwrap();
        assert_eq!(item.status(), ItemStatus::Done);
        let output = item.result().unwrap();
        assert_eq!((output.width, output.height), (5, 3));
    }

    #[test]
    fn decoded_size_wins_over_ingestion_probe() {
        use crate::processors::with_exif_orientation;

        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(12, 4, Rgb([9, 9, 9])));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Jpeg).unwrap();

        // Probed upright at ingestion, decoded raw by the batch.
        let registry = ItemRegistry::new();
        let id = registry.ingest_one("a.jpg", with_exif_orientation(buffer.get_ref(), 6));
        assert_eq!(registry.get(id).unwrap().original_dimensions(), (4, 12));

        let config = ProcessConfig {
            apply_orientation: false,
            ..Default::default()
        };
        let batch = BatchProcessor::new(config, 0).unwrap();
        batch
            .run_batch(&registry, &FitRequest::new(6, 6, FitMode::Cover))
            .unwrap();
        assert_eq!(registry.get(id).unwrap().original_dimensions(), (12, 4));
    }

    #[test]
    fn size_reduction_is_clamped() {
        let mut summary = BatchSummary::default();
        assert_eq!(summary.size_reduction(), 0.0);
        summary.total_size_before = 200;
        summary.total_size_after = 50;
        assert_eq!(summary.size_reduction(), 75.0);
        summary.total_size_after = 400;
        assert_eq!(summary.size_reduction(), 0.0);
    }

    #[test]
    fn empty_registry_is_a_no_op() {
        let batch = BatchProcessor::new(ProcessConfig::default(), 0).unwrap();
        let summary = batch
            .run_batch(&ItemRegistry::new(), &FitRequest::default())
            .unwrap();
        assert_eq!(summary.total(), 0);
    }
}
