mod cli;
mod core;
pub mod oracle;
mod processors;
mod utils;

pub use cli::{Algorithm, Cli, Commands, Format, Mode};
pub use crate::core::export::{DirectorySink, ExportEntry, ExportSink};
pub use crate::core::processor::ImageProcessor;
pub use crate::core::registry::{ImageItem, ItemId, ItemRegistry, ItemStatus, ProcessedImage};
pub use crate::core::{
    validate_config, Background, FitMode, FitRequest, OutputFormat, ProcessConfig, ResizeAlgorithm,
    ResizeError, Result, MAX_DIMENSION,
};
pub use oracle::{apply_suggestion, DimensionOracle, DimensionSuggestion, GeminiOracle, OracleError, PresetOracle};
pub use processors::{
    allocate_canvas, resolve, BatchProcessor, BatchSummary, CancelToken, Compressor, LoadedImage, Loader,
    MetadataProcessor, Orientation, PixelRect, PlacementRect, Resampler,
};
pub use utils::{
    calculate_aspect_ratio, collect_image_paths, format_file_size, is_supported_format, suggested_file_name,
};

pub mod prelude {
    pub use crate::{
        BatchProcessor, FitMode, FitRequest, ImageProcessor, ItemRegistry, ItemStatus, ProcessConfig,
        ResizeAlgorithm,
    };
}

// Re-export commonly used types
pub use image::{DynamicImage, ImageFormat};
