use anyhow::{bail, Context, Result};
use clap::Parser;
use fitbatch::{
    apply_suggestion, calculate_aspect_ratio, collect_image_paths, format_file_size, resolve,
    validate_config, Algorithm, Background, BatchProcessor, Cli, Commands, DimensionOracle,
    DirectorySink, ExportSink, FitRequest, Format, GeminiOracle, ItemRegistry, Loader, Mode,
    PresetOracle, ProcessConfig,
};
use log::LevelFilter;
use std::path::PathBuf;

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    match cli.command {
        Commands::Resize {
            inputs,
            output,
            width,
            height,
            mode,
            background,
            quality,
            format,
            threads,
            recursive,
            algorithm,
            optimize_png,
            no_orientation,
            suggest,
            offline,
        } => {
            let options = ResizeOptions {
                inputs,
                output,
                width,
                height,
                mode,
                background,
                quality,
                format,
                threads,
                recursive,
                algorithm,
                optimize_png,
                apply_orientation: !no_orientation,
                suggest,
                offline,
            };
            process_resize(options)?;
        }
        Commands::Suggest { query, offline } => {
            process_suggest(&query, offline)?;
        }
        Commands::Plan {
            input,
            width,
            height,
            mode,
        } => {
            process_plan(input, width, height, mode)?;
        }
    }

    Ok(())
}

struct ResizeOptions {
    inputs: Vec<PathBuf>,
    output: PathBuf,
    width: u32,
    height: u32,
    mode: Mode,
    background: String,
    quality: u8,
    format: Format,
    threads: usize,
    recursive: bool,
    algorithm: Algorithm,
    optimize_png: bool,
    apply_orientation: bool,
    suggest: Option<String>,
    offline: bool,
}

fn make_oracle(offline: bool) -> Box<dyn DimensionOracle> {
    if offline {
        return Box::new(PresetOracle::new());
    }

    match GeminiOracle::from_env() {
        Ok(oracle) => Box::new(oracle),
        Err(e) => {
            log::warn!("{}; using the built-in size table", e);
            Box::new(PresetOracle::new())
        }
    }
}

fn process_resize(options: ResizeOptions) -> Result<()> {
    let (width, height) = match &options.suggest {
        Some(query) => {
            let oracle = make_oracle(options.offline);
            apply_suggestion((options.width, options.height), oracle.as_ref(), query)
        }
        None => (options.width, options.height),
    };

    let background: Background = options.background.parse()?;
    let request = FitRequest::new(width, height, options.mode.into()).with_background(background);

    let config = ProcessConfig {
        algorithm: options.algorithm.into(),
        quality: options.quality,
        format: options.format.into(),
        optimize_png: options.optimize_png,
        apply_orientation: options.apply_orientation,
        ..Default::default()
    };
    validate_config(&config, &request)?;

    let paths = collect_image_paths(&options.inputs, options.recursive);
    if paths.is_empty() {
        bail!("No images found in the given inputs");
    }

    let registry = ItemRegistry::for_config(&config);
    for path in &paths {
        if let Err(e) = registry.ingest_path(path) {
            log::warn!("Skipping {}: {}", path.display(), e);
        }
    }

    let batch = BatchProcessor::new(config, options.threads)?.with_progress(true);
    let summary = batch.run_batch(&registry, &request)?;

    let mut sink = DirectorySink::new(&options.output)
        .with_context(|| format!("Cannot write to {}", options.output.display()))?;
    let written = sink.accept_all(&registry.exports())?;

    println!(
        "Fitted {} of {} images to {}x{} ({}), saved to: {}",
        written,
        registry.len(),
        width,
        height,
        request.fit_mode,
        sink.root().display()
    );
    println!(
        "Total size: {} -> {} ({:.1}% smaller)",
        format_file_size(summary.total_size_before),
        format_file_size(summary.total_size_after),
        summary.size_reduction()
    );

    for (id, name, message) in &summary.errors {
        eprintln!("  failed {} {}: {}", id, name, message);
    }

    Ok(())
}

fn process_suggest(query: &str, offline: bool) -> Result<()> {
    let oracle = make_oracle(offline);
    let suggestion = oracle
        .suggest_dimensions(query)
        .with_context(|| format!("No suggestion for \"{}\"", query))?;

    println!("{} x {} pixels", suggestion.width, suggestion.height);
    if !suggestion.reasoning.is_empty() {
        println!("{}", suggestion.reasoning);
    }

    Ok(())
}

fn process_plan(input: PathBuf, width: u32, height: u32, mode: Mode) -> Result<()> {
    let data = std::fs::read(&input).with_context(|| format!("Cannot read {}", input.display()))?;
    let (src_w, src_h, _) = Loader::new().probe(&data)?;

    let placement = resolve(src_w, src_h, width, height, mode.into())?;
    let pixels = placement.to_pixels();
    let visible = placement.visible_region(width, height);

    println!("=== Placement ===");
    println!("File: {}", input.display());
    println!(
        "Source: {} x {} pixels ({:.2}:1)",
        src_w,
        src_h,
        calculate_aspect_ratio(src_w, src_h)
    );
    println!("Canvas: {} x {} pixels, mode {}", width, height, fitbatch::FitMode::from(mode));
    println!(
        "Offset: ({:.2}, {:.2}), draw size: {:.2} x {:.2}",
        placement.offset_x, placement.offset_y, placement.draw_width, placement.draw_height
    );
    println!(
        "Pixel grid: x {}..{}, y {}..{}",
        pixels.x,
        pixels.right(),
        pixels.y,
        pixels.bottom()
    );
    println!(
        "Visible: {} x {} at ({}, {}), background {}",
        visible.width,
        visible.height,
        visible.x,
        visible.y,
        if placement.needs_background { "visible" } else { "hidden" }
    );

    Ok(())
}
