// fitbatch/src/cli.rs
use crate::core::{FitMode, OutputFormat, ResizeAlgorithm};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fitbatch", version, about = "Batch-fit images to a common target resolution")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fit every input image to the target size
    Resize {
        /// Image files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory receiving the batch_<name> outputs
        #[arg(short, long, default_value = "resized")]
        output: PathBuf,

        #[arg(short = 'W', long, default_value_t = 1080)]
        width: u32,

        #[arg(short = 'H', long, default_value_t = 1080)]
        height: u32,

        #[arg(short, long, value_enum, default_value_t = Mode::Cover)]
        mode: Mode,

        /// Padding color for contain mode (#rgb, #rrggbb or #rrggbbaa)
        #[arg(short, long, default_value = "#000000")]
        background: String,

        /// JPEG quality (1-100)
        #[arg(short, long, default_value_t = 92)]
        quality: u8,

        #[arg(short, long, value_enum, default_value_t = Format::Same)]
        format: Format,

        /// Worker threads, 0 for one per core
        #[arg(short = 'j', long, default_value_t = 0)]
        threads: usize,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,

        #[arg(short, long, value_enum, default_value_t = Algorithm::Lanczos3)]
        algorithm: Algorithm,

        /// Losslessly shrink PNG outputs
        #[arg(long)]
        optimize_png: bool,

        /// Ignore EXIF orientation tags
        #[arg(long)]
        no_orientation: bool,

        /// Describe the destination ("instagram story") to pick the size
        #[arg(short, long)]
        suggest: Option<String>,

        /// Use the built-in size table instead of the online service
        #[arg(long)]
        offline: bool,
    },

    /// Suggest target dimensions for a platform or use case
    Suggest {
        query: String,

        #[arg(long)]
        offline: bool,
    },

    /// Show where an image would be placed on the target canvas
    Plan {
        input: PathBuf,

        #[arg(short = 'W', long, default_value_t = 1080)]
        width: u32,

        #[arg(short = 'H', long, default_value_t = 1080)]
        height: u32,

        #[arg(short, long, value_enum, default_value_t = Mode::Cover)]
        mode: Mode,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Cover,
    Contain,
    Fill,
}

impl From<Mode> for FitMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Cover => FitMode::Cover,
            Mode::Contain => FitMode::Contain,
            Mode::Fill => FitMode::Fill,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Same,
    Jpeg,
    Png,
    Webp,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Same => OutputFormat::SameAsInput,
            Format::Jpeg => OutputFormat::Jpeg,
            Format::Png => OutputFormat::Png,
            Format::Webp => OutputFormat::WebP,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl From<Algorithm> for ResizeAlgorithm {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Bilinear => ResizeAlgorithm::Bilinear,
            Algorithm::Bicubic => ResizeAlgorithm::Bicubic,
            Algorithm::Lanczos3 => ResizeAlgorithm::Lanczos3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_resize_flags() {
        let cli = Cli::try_parse_from([
            "fitbatch", "resize", "a.png", "dir", "-W", "1280", "-H", "720", "--mode", "contain",
            "--background", "#fff", "--format", "webp", "-j", "2",
        ])
        .unwrap();

        match cli.command {
            Commands::Resize {
                inputs,
                width,
                height,
                mode,
                background,
                format,
                threads,
                ..
            } => {
                assert_eq!(inputs.len(), 2);
                assert_eq!((width, height), (1280, 720));
                assert_eq!(FitMode::from(mode), FitMode::Contain);
                assert_eq!(background, "#fff");
                assert_eq!(OutputFormat::from(format), OutputFormat::WebP);
                assert_eq!(threads, 2);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn resize_requires_inputs() {
        assert!(Cli::try_parse_from(["fitbatch", "resize"]).is_err());
    }
}
