// fitbatch/src/core/mod.rs
pub mod color;
pub mod export;
pub mod processor;
pub mod registry;

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use color::Background;

/// Largest accepted width or height, for both sources and targets.
pub const MAX_DIMENSION: u32 = 100_000;

/// Interpolation filter used by the resampler. Nearest-neighbour is not
/// offered: every variant here produces smooth output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAlgorithm {
    Bilinear,
    Bicubic,
    Lanczos3,
}

/// How source and target aspect ratios are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Scale until the canvas is covered, then center-crop the overflow.
    #[default]
    Cover,
    /// Scale until the image fits, padding the short axis with background.
    Contain,
    /// Stretch to the exact target size, discarding the aspect ratio.
    Fill,
}

impl FitMode {
    pub fn needs_background(self) -> bool {
        matches!(self, FitMode::Contain)
    }
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FitMode::Cover => "cover",
            FitMode::Contain => "contain",
            FitMode::Fill => "fill",
        };
        f.write_str(name)
    }
}

impl FromStr for FitMode {
    type Err = ResizeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cover" | "crop" => Ok(FitMode::Cover),
            "contain" | "pad" => Ok(FitMode::Contain),
            "fill" | "stretch" => Ok(FitMode::Fill),
            other => Err(ResizeError::InvalidParameter(format!(
                "Unknown fit mode: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    SameAsInput,
}

impl OutputFormat {
    /// Resolves the encoder format for a source that was decoded as `source`.
    pub fn resolve(self, source: image::ImageFormat) -> image::ImageFormat {
        match self {
            OutputFormat::Jpeg => image::ImageFormat::Jpeg,
            OutputFormat::Png => image::ImageFormat::Png,
            OutputFormat::WebP => image::ImageFormat::WebP,
            OutputFormat::SameAsInput => source,
        }
    }
}

/// The per-batch target shared read-only by every item.
#[derive(Debug, Clone, PartialEq)]
pub struct FitRequest {
    pub target_width: u32,
    pub target_height: u32,
    pub fit_mode: FitMode,
    /// Only painted under [`FitMode::Contain`].
    pub background: Background,
}

impl FitRequest {
    pub fn new(target_width: u32, target_height: u32, fit_mode: FitMode) -> Self {
        Self {
            target_width,
            target_height,
            fit_mode,
            background: Background::default(),
        }
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.background = background;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_width == 0 || self.target_height == 0 {
            return Err(ResizeError::InvalidDimensions(format!(
                "target must be positive, got {}x{}",
                self.target_width, self.target_height
            )));
        }

        if self.target_width > MAX_DIMENSION || self.target_height > MAX_DIMENSION {
            return Err(ResizeError::InvalidDimensions(format!(
                "target {}x{} exceeds the {} pixel limit",
                self.target_width, self.target_height, MAX_DIMENSION
            )));
        }

        Ok(())
    }
}

impl Default for FitRequest {
    fn default() -> Self {
        Self::new(1080, 1080, FitMode::Cover)
    }
}

#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub algorithm: ResizeAlgorithm,
    pub quality: u8,
    pub format: OutputFormat,
    pub optimize_png: bool,
    pub apply_orientation: bool,
    pub max_dimensions: (u32, u32),
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            algorithm: ResizeAlgorithm::Lanczos3,
            quality: 92,
            format: OutputFormat::SameAsInput,
            optimize_png: false,
            apply_orientation: true,
            max_dimensions: (MAX_DIMENSION, MAX_DIMENSION),
        }
    }
}

impl ProcessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.quality == 0 || self.quality > 100 {
            return Err(ResizeError::InvalidParameter(
                "Quality must be between 1 and 100".to_string(),
            ));
        }

        let (max_w, max_h) = self.max_dimensions;
        if max_w == 0 || max_h == 0 {
            return Err(ResizeError::InvalidParameter(
                "Maximum source dimensions must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Failed to decode image: {0}")]
    DecodeFailure(String),

    #[error("Failed to encode image: {0}")]
    EncodeFailure(String),

    #[error("Allocation failure: {0}")]
    AllocationFailure(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Processing error: {0}")]
    ProcessingError(String),

    #[error("Memory limit exceeded: {0}")]
    MemoryLimitExceeded(String),

    #[error("Unknown item: {0}")]
    UnknownItem(registry::ItemId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, ResizeError>;

pub fn validate_config(config: &ProcessConfig, request: &FitRequest) -> Result<()> {
    config.validate()?;
    request.validate()
}
