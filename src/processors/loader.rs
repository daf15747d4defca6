// fitbatch/src/processors/loader.rs
use crate::core::{ProcessConfig, ResizeError, Result, MAX_DIMENSION};
use crate::processors::metadata::{MetadataProcessor, Orientation};
use crate::utils::image_format_to_string;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;

/// A decoded source together with the container format it came in.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub image: DynamicImage,
    pub format: ImageFormat,
}

#[derive(Clone)]
pub struct Loader {
    max_dimensions: Option<(u32, u32)>,
    apply_orientation: bool,
    metadata: MetadataProcessor,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            max_dimensions: Some((MAX_DIMENSION, MAX_DIMENSION)),
            apply_orientation: true,
            metadata: MetadataProcessor::new(),
        }
    }

    /// The loader a processor built from `config` decodes with.
    pub fn from_config(config: &ProcessConfig) -> Self {
        let (max_w, max_h) = config.max_dimensions;
        Self::new()
            .with_max_dimensions(max_w, max_h)
            .with_orientation(config.apply_orientation)
    }

    pub fn with_max_dimensions(mut self, width: u32, height: u32) -> Self {
        self.max_dimensions = Some((width, height));
        self
    }

    pub fn with_orientation(mut self, apply: bool) -> Self {
        self.apply_orientation = apply;
        self
    }

    pub fn load_from_bytes(&self, data: &[u8]) -> Result<LoadedImage> {
        let (width, height, format) = self.probe(data)?;
        self.check_limits(width, height)?;

        let image = self
            .reader(data)?
            .decode()
            .map_err(|e| ResizeError::DecodeFailure(e.to_string()))?;

        let image = match self.orientation(data) {
            Some(orientation) => orientation.apply(image),
            None => image,
        };

        let (width, height) = image.dimensions();
        log::info!(
            "Loaded image: {}x{} pixels, {} ({:?})",
            width,
            height,
            image_format_to_string(format),
            image.color()
        );

        Ok(LoadedImage { image, format })
    }

    /// Reads the natural dimensions from the header without decoding pixels.
    /// EXIF rotations that swap axes are taken into account.
    pub fn probe(&self, data: &[u8]) -> Result<(u32, u32, ImageFormat)> {
        if data.is_empty() {
            return Err(ResizeError::DecodeFailure("empty source".to_string()));
        }

        let reader = self.reader(data)?;
        let format = reader
            .format()
            .ok_or_else(|| ResizeError::DecodeFailure("unrecognized image format".to_string()))?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| ResizeError::DecodeFailure(e.to_string()))?;

        if width == 0 || height == 0 {
            return Err(ResizeError::DecodeFailure(format!(
                "image reports {}x{} pixels",
                width, height
            )));
        }

        match self.orientation(data) {
            Some(orientation) if orientation.swaps_axes() => Ok((height, width, format)),
            _ => Ok((width, height, format)),
        }
    }

    fn reader<'a>(&self, data: &'a [u8]) -> Result<ImageReader<Cursor<&'a [u8]>>> {
        ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ResizeError::DecodeFailure(e.to_string()))
    }

    fn orientation(&self, data: &[u8]) -> Option<Orientation> {
        if !self.apply_orientation {
            return None;
        }
        self.metadata.orientation(data)
    }

    fn check_limits(&self, width: u32, height: u32) -> Result<()> {
        if let Some((max_w, max_h)) = self.max_dimensions {
            if width > max_w || height > max_h {
                return Err(ResizeError::MemoryLimitExceeded(format!(
                    "Image dimensions {}x{} exceed maximum {}x{}",
                    width, height, max_w, max_h
                )));
            }
        }
        Ok(())
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
