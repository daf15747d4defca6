// fitbatch/src/core/registry.rs
//! Queued images and their processing state.
//!
//! The registry is an ordered map keyed by [`ItemId`] behind a single
//! `RwLock`. Every state change of an item happens inside one write-lock
//! critical section, so readers only ever see whole items.

use super::export::ExportEntry;
use super::{ProcessConfig, ResizeError, Result};
use crate::processors::Loader;
use crate::utils::suggested_file_name;
use image::ImageFormat;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Identifier handed out at ingestion. Ids increase monotonically and are
/// never reused, even after the item is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(u64);

impl ItemId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Pending,
    Processing,
    Done,
    Error,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Processing => "processing",
            ItemStatus::Done => "done",
            ItemStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// An encoded, resampled output.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub bytes: Arc<[u8]>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl ProcessedImage {
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

// The result only exists inside `Done`, so it is present exactly when the
// item is done.
#[derive(Debug, Clone)]
enum ItemState {
    Pending,
    Processing,
    Done(ProcessedImage),
    Error(String),
}

#[derive(Debug, Clone)]
pub struct ImageItem {
    id: ItemId,
    name: String,
    source: Arc<[u8]>,
    source_format: Option<ImageFormat>,
    dimensions: Option<(u32, u32)>,
    // Header probes are provisional; the first full decode settles the size.
    decoded: bool,
    state: ItemState,
}

impl ImageItem {
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &Arc<[u8]> {
        &self.source
    }

    pub fn source_format(&self) -> Option<ImageFormat> {
        self.source_format
    }

    /// Natural dimensions, `(0, 0)` until the source has been decoded once.
    pub fn original_dimensions(&self) -> (u32, u32) {
        self.dimensions.unwrap_or((0, 0))
    }

    pub fn is_measured(&self) -> bool {
        self.dimensions.is_some()
    }

    pub fn status(&self) -> ItemStatus {
        match self.state {
            ItemState::Pending => ItemStatus::Pending,
            ItemState::Processing => ItemStatus::Processing,
            ItemState::Done(_) => ItemStatus::Done,
            ItemState::Error(_) => ItemStatus::Error,
        }
    }

    pub fn result(&self) -> Option<&ProcessedImage> {
        match &self.state {
            ItemState::Done(output) => Some(output),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            ItemState::Error(message) => Some(message),
            _ => None,
        }
    }

    /// The downloadable form of a finished item; `None` unless it is done.
    pub fn export(&self) -> Option<ExportEntry> {
        let output = self.result()?;
        let source_format = self.source_format.unwrap_or(output.format);

        Some(ExportEntry {
            file_name: suggested_file_name(&self.name, source_format, output.format),
            bytes: Arc::clone(&output.bytes),
            mime_type: output.mime_type(),
        })
    }

    /// Records the size of the decoded source. The first decode replaces any
    /// ingestion-time probe; after that the dimensions never change.
    pub(crate) fn record_dimensions(&mut self, width: u32, height: u32) {
        if self.decoded || width == 0 || height == 0 {
            return;
        }

        if let Some((w, h)) = self.dimensions.filter(|&d| d != (width, height)) {
            log::debug!("{} probed as {}x{}, decoded as {}x{}", self.id, w, h, width, height);
        }
        self.dimensions = Some((width, height));
        self.decoded = true;
    }

    pub(crate) fn record_format(&mut self, format: ImageFormat) {
        self.source_format.get_or_insert(format);
    }

    /// Re-run entry point: drops any previous result and returns to pending.
    pub(crate) fn reset(&mut self) {
        self.state = ItemState::Pending;
    }

    pub(crate) fn begin(&mut self) -> bool {
        match self.state {
            ItemState::Pending => {
                self.state = ItemState::Processing;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn complete(&mut self, outcome: std::result::Result<ProcessedImage, String>) {
        if !matches!(self.state, ItemState::Processing) {
            log::warn!("Ignoring result for {} in state {}", self.id, self.status());
            return;
        }

        self.state = match outcome {
            Ok(output) => ItemState::Done(output),
            Err(message) => ItemState::Error(message),
        };
    }

    pub(crate) fn revert(&mut self) {
        if matches!(self.state, ItemState::Processing) {
            self.state = ItemState::Pending;
        }
    }
}

/// What a worker needs to process one item without holding the lock.
#[derive(Debug, Clone)]
pub(crate) struct WorkItem {
    pub id: ItemId,
    pub name: String,
    pub source: Arc<[u8]>,
}

struct Inner {
    items: BTreeMap<ItemId, ImageItem>,
    next_id: u64,
}

pub struct ItemRegistry {
    inner: RwLock<Inner>,
    loader: Loader,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self::with_loader(Loader::new())
    }

    /// Probes at ingestion with the same settings a processor built from
    /// `config` decodes with.
    pub fn for_config(config: &ProcessConfig) -> Self {
        Self::with_loader(Loader::from_config(config))
    }

    /// Uses `loader` to probe dimensions at ingestion time.
    pub fn with_loader(loader: Loader) -> Self {
        Self {
            inner: RwLock::new(Inner {
                items: BTreeMap::new(),
                next_id: 1,
            }),
            loader,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues encoded images under their display names.
    pub fn ingest<I>(&self, files: I) -> Vec<ItemId>
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        files
            .into_iter()
            .map(|(name, bytes)| self.ingest_one(name, bytes))
            .collect()
    }

    pub fn ingest_one(&self, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> ItemId {
        let name = name.into();
        let source: Arc<[u8]> = bytes.into();

        // Header probe only; failures surface when the batch decodes the item.
        let probed = match self.loader.probe(&source) {
            Ok(probe) => Some(probe),
            Err(e) => {
                log::debug!("Could not measure {}: {}", name, e);
                None
            }
        };

        let mut inner = self.write();
        let id = ItemId(inner.next_id);
        inner.next_id += 1;

        let item = ImageItem {
            id,
            name,
            source,
            source_format: probed.map(|(_, _, format)| format),
            dimensions: probed.map(|(w, h, _)| (w, h)),
            decoded: false,
            state: ItemState::Pending,
        };

        log::debug!(
            "Queued {} as {} ({}x{})",
            item.name,
            id,
            item.original_dimensions().0,
            item.original_dimensions().1
        );
        inner.items.insert(id, item);
        id
    }

    pub fn ingest_path(&self, path: &Path) -> Result<ItemId> {
        let bytes = std::fs::read(path)?;
        if bytes.is_empty() {
            return Err(ResizeError::InvalidParameter(format!(
                "File is empty: {}",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                ResizeError::InvalidParameter(format!("Invalid file name: {}", path.display()))
            })?;

        Ok(self.ingest_one(name, bytes))
    }

    pub fn get(&self, id: ItemId) -> Option<ImageItem> {
        self.read().items.get(&id).cloned()
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.read().items.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().items.is_empty()
    }

    pub fn count(&self, status: ItemStatus) -> usize {
        self.read()
            .items
            .values()
            .filter(|item| item.status() == status)
            .count()
    }

    /// Drops the item and with it the registry's hold on its source and result.
    pub fn remove(&self, id: ItemId) -> Result<ImageItem> {
        let removed = self.write().items.remove(&id).ok_or(ResizeError::UnknownItem(id))?;
        log::debug!("Removed {} ({})", removed.name, id);
        Ok(removed)
    }

    pub fn clear(&self) -> usize {
        let mut inner = self.write();
        let count = inner.items.len();
        inner.items.clear();
        log::debug!("Cleared {} items", count);
        count
    }

    pub fn export(&self, id: ItemId) -> Result<ExportEntry> {
        let inner = self.read();
        let item = inner.items.get(&id).ok_or(ResizeError::UnknownItem(id))?;
        item.export().ok_or_else(|| {
            ResizeError::InvalidParameter(format!("{} has no result ({})", id, item.status()))
        })
    }

    /// Export entries for every finished item, in ingestion order.
    pub fn exports(&self) -> Vec<ExportEntry> {
        self.read().items.values().filter_map(ImageItem::export).collect()
    }

    /// Resets every item not already claimed by another run and marks it
    /// processing, returning what the workers need.
    pub(crate) fn begin_run(&self) -> Vec<WorkItem> {
        let mut inner = self.write();
        inner
            .items
            .values_mut()
            .filter(|item| item.status() != ItemStatus::Processing)
            .filter_map(|item| {
                item.reset();
                item.begin().then(|| WorkItem {
                    id: item.id,
                    name: item.name.clone(),
                    source: Arc::clone(&item.source),
                })
            })
            .collect()
    }

    /// Applies `f` to one item under the write lock. Returns `false` if the
    /// item was removed in the meantime.
    pub(crate) fn update<F>(&self, id: ItemId, f: F) -> bool
    where
        F: FnOnce(&mut ImageItem),
    {
        match self.write().items.get_mut(&id) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }
}

impl Default for ItemRegistry {
    fn default() -> Self {
        Self::new()
    }
}
