// fitbatch/src/processors/mod.rs
mod batch;
mod compressor;
pub mod geometry;
mod loader;
mod metadata;
mod resampler;

pub use batch::{BatchProcessor, BatchSummary, CancelToken};
pub use compressor::Compressor;
pub use geometry::{resolve, PixelRect, PlacementRect};
pub use loader::{LoadedImage, Loader};
pub use metadata::{MetadataProcessor, Orientation};
#[cfg(test)]
pub(crate) use metadata::with_exif_orientation;
pub use resampler::{allocate_canvas, Resampler};
