// fitbatch/src/core/processor.rs
use super::registry::ProcessedImage;
use super::{FitRequest, ProcessConfig, Result};
use crate::processors::geometry::{resolve, PlacementRect};
use crate::processors::{Compressor, LoadedImage, Loader, Resampler};
use image::GenericImageView;

/// Single-image pipeline: decode, place, resample, encode.
pub struct ImageProcessor {
    config: ProcessConfig,
    loader: Loader,
    resampler: Resampler,
    compressor: Compressor,
}

impl ImageProcessor {
    pub fn new(config: ProcessConfig) -> Self {
        let loader = Loader::from_config(&config);
        let resampler = Resampler::new(config.algorithm);
        let compressor = Compressor::new(config.quality).with_png_optimization(config.optimize_png);

        Self {
            config,
            loader,
            resampler,
            compressor,
        }
    }

    pub fn load(&self, data: &[u8]) -> Result<LoadedImage> {
        self.loader.load_from_bytes(data)
    }

    pub fn placement(&self, loaded: &LoadedImage, request: &FitRequest) -> Result<PlacementRect> {
        let (width, height) = loaded.image.dimensions();
        resolve(
            width,
            height,
            request.target_width,
            request.target_height,
            request.fit_mode,
        )
    }

    /// Fits an already decoded source to `request` and encodes the result.
    pub fn render(&self, loaded: &LoadedImage, request: &FitRequest) -> Result<ProcessedImage> {
        let placement = self.placement(loaded, request)?;

        let canvas = self.resampler.resample(
            &loaded.image,
            &placement,
            request.target_width,
            request.target_height,
            request.fit_mode,
            request.background,
        )?;

        let format = self.config.format.resolve(loaded.format);
        let bytes = self
            .compressor
            .encode(canvas, loaded.image.color(), format)?;

        Ok(ProcessedImage {
            bytes: bytes.into(),
            format,
            width: request.target_width,
            height: request.target_height,
        })
    }

    pub fn process_bytes(&self, data: &[u8], request: &FitRequest) -> Result<ProcessedImage> {
        request.validate()?;
        let loaded = self.load(data)?;
        self.render(&loaded, request)
    }
}
