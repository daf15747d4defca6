#[cfg(test)]
mod tests {
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use fitbatch::{
        resolve, BatchProcessor, DirectorySink, ExportSink, FitMode, FitRequest, ImageFormat,
        ItemRegistry, ItemStatus, OutputFormat, ProcessConfig,
    };
    use image::{GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};

    fn write_rgb(dir: &TempDir, name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let child = dir.child(name);
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
        img.save(child.path()).unwrap();
        child.path().to_path_buf()
    }

    #[test]
    fn test_batch_to_directory() {
        let temp_dir = TempDir::new().unwrap();
        let inputs = [
            write_rgb(&temp_dir, "wide.png", 192, 108),
            write_rgb(&temp_dir, "tall.jpg", 60, 120),
            write_rgb(&temp_dir, "square.bmp", 50, 50),
        ];

        let registry = ItemRegistry::new();
        for path in &inputs {
            registry.ingest_path(path).unwrap();
        }

        let request = FitRequest::new(108, 108, FitMode::Cover);
        let batch = BatchProcessor::new(ProcessConfig::default(), 2).unwrap();
        let summary = batch.run_batch(&registry, &request).unwrap();
        assert_eq!(summary.done, 3);
        assert!(summary.errors.is_empty());

        let output_dir = temp_dir.child("out");
        let mut sink = DirectorySink::new(output_dir.path()).unwrap();
        let written = sink.accept_all(&registry.exports()).unwrap();
        assert_eq!(written, 3);

        for name in ["batch_wide.png", "batch_tall.jpg", "batch_square.bmp"] {
            let file = output_dir.child(name);
            assert!(file.path().exists());
            let decoded = image::open(file.path()).unwrap();
            assert_eq!(decoded.dimensions(), (108, 108));
        }
    }

    #[test]
    fn test_corrupt_item_is_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let good = write_rgb(&temp_dir, "good.png", 40, 30);
        let bad = temp_dir.child("bad.png");
        bad.write_binary(b"\x89PNG\r\n\x1a\nthis is not a real png").unwrap();

        let registry = ItemRegistry::new();
        let ids = vec![
            registry.ingest_path(&good).unwrap(),
            registry.ingest_path(bad.path()).unwrap(),
            registry.ingest_path(&good).unwrap(),
        ];

        let batch = BatchProcessor::new(ProcessConfig::default(), 0).unwrap();
        batch
            .run_batch(&registry, &FitRequest::new(20, 20, FitMode::Contain))
            .unwrap();

        let statuses: Vec<ItemStatus> = ids.iter().map(|id| registry.get(*id).unwrap().status()).collect();
        assert_eq!(statuses, vec![ItemStatus::Done, ItemStatus::Error, ItemStatus::Done]);
        assert!(registry.export(ids[1]).is_err());
        assert!(registry.get(ids[1]).unwrap().error().is_some());
    }

    #[test]
    fn test_contain_bands_use_background() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_rgb(&temp_dir, "wide.png", 192, 108);

        let registry = ItemRegistry::new();
        let id = registry.ingest_path(&path).unwrap();

        let request = FitRequest::new(108, 108, FitMode::Contain).with_background("#ffffff".parse().unwrap());
        let batch = BatchProcessor::new(ProcessConfig::default(), 0).unwrap();
        batch.run_batch(&registry, &request).unwrap();

        let entry = registry.export(id).unwrap();
        assert_eq!(entry.mime_type, "image/png");
        let decoded = image::load_from_memory(&entry.bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (108, 108));

        // 192x108 scaled by 0.5625 is 108x60.75, drawn from y = 23.625.
        let placement = resolve(192, 108, 108, 108, FitMode::Contain).unwrap();
        let pixels = placement.to_pixels();
        assert_eq!((pixels.y, pixels.height), (24, 60));

        assert_eq!(decoded.get_pixel(54, 0), &Rgb([255, 255, 255]));
        assert_eq!(decoded.get_pixel(54, 23), &Rgb([255, 255, 255]));
        assert_eq!(decoded.get_pixel(54, 84), &Rgb([255, 255, 255]));
        assert_eq!(decoded.get_pixel(54, 107), &Rgb([255, 255, 255]));
        assert_ne!(decoded.get_pixel(54, 54), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_format_override_renames_export() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_rgb(&temp_dir, "photo.png", 30, 30);

        let registry = ItemRegistry::new();
        let id = registry.ingest_path(&path).unwrap();

        let config = ProcessConfig {
            format: OutputFormat::Jpeg,
            ..Default::default()
        };
        let batch = BatchProcessor::new(config, 0).unwrap();
        batch
            .run_batch(&registry, &FitRequest::new(16, 9, FitMode::Fill))
            .unwrap();

        let entry = registry.export(id).unwrap();
        assert_eq!(entry.file_name, "batch_photo.jpg");
        assert_eq!(entry.mime_type, "image/jpeg");
        let item = registry.get(id).unwrap();
        assert_eq!(item.result().unwrap().format, ImageFormat::Jpeg);
    }

    #[test]
    fn test_transparent_png_keeps_alpha() {
        let temp_dir = TempDir::new().unwrap();
        let child = temp_dir.child("logo.png");
        RgbaImage::from_pixel(20, 10, Rgba([255, 0, 0, 0]))
            .save(child.path())
            .unwrap();

        let registry = ItemRegistry::new();
        let id = registry.ingest_path(child.path()).unwrap();

        let batch = BatchProcessor::new(ProcessConfig::default(), 0).unwrap();
        batch
            .run_batch(&registry, &FitRequest::new(20, 20, FitMode::Contain))
            .unwrap();

        let entry = registry.export(id).unwrap();
        let decoded = image::load_from_memory(&entry.bytes).unwrap().to_rgba8();
        // Opaque black band above, untouched transparent pixels in the middle.
        assert_eq!(decoded.get_pixel(10, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(decoded.get_pixel(10, 10)[3], 0);
    }

    #[test]
    fn test_remove_and_clear() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_rgb(&temp_dir, "a.png", 8, 8);

        let registry = ItemRegistry::new();
        let first = registry.ingest_path(&path).unwrap();
        let second = registry.ingest_path(&path).unwrap();

        registry.remove(first).unwrap();
        assert_eq!(registry.ids(), vec![second]);
        assert_eq!(registry.clear(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_invalid_file() {
        let registry = ItemRegistry::new();
        let result = registry.ingest_path(std::path::Path::new("nonexistent.jpg"));
        assert!(result.is_err());
    }
}
