//! Job files
//!
//! Jobs are read from JSON (the serde form of [`LaserJob`]) or built from a
//! single bitmap image, which becomes one raster part.

use anyhow::{bail, Context, Result};
use laserlink_core::{LaserJob, LaserProperty, Point, RasterPart, Resolution};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

/// Extensions loaded through the `image` crate
const IMAGE_EXTENSIONS: &[&str] = &["png", "bmp", "jpg", "jpeg", "gif", "tif", "tiff"];

/// How a bitmap becomes a raster part
#[derive(Debug, Clone, PartialEq)]
pub struct ImageImport {
    /// Image resolution in dots per inch
    pub dpi: f64,
    /// Laser power in percent
    pub power: f64,
    /// Speed in percent of the device maximum
    pub speed: f64,
    /// Keep grey levels instead of thresholding to black/white
    pub greyscale: bool,
    /// Bed position of the top-left pixel, in pixels
    pub offset: Point,
}

impl Default for ImageImport {
    fn default() -> Self {
        Self {
            dpi: 500.0,
            power: 100.0,
            speed: 100.0,
            greyscale: false,
            offset: Point::default(),
        }
    }
}

/// Load a job from `path`, picking the reader by extension
pub fn load_job(path: &Path, import: &ImageImport) -> Result<LaserJob> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let job = if extension == "json" {
        load_json(path)?
    } else if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        load_image(path, import)?
    } else {
        bail!("Unsupported job file {}", path.display());
    };

    info!(name = %job.name, parts = job.parts.len(), "Loaded job from {}", path.display());
    Ok(job)
}

fn load_json(path: &Path) -> Result<LaserJob> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let job: LaserJob = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse job {}", path.display()))?;
    Ok(job)
}

fn load_image(path: &Path, import: &ImageImport) -> Result<LaserJob> {
    let resolution = Resolution::new(import.dpi)?;
    let image = image::open(path)
        .with_context(|| format!("Failed to read image {}", path.display()))?
        .to_luma8();
    debug!(width = image.width(), height = image.height(), "Decoded image");

    let property = LaserProperty::power_speed(import.power, import.speed);
    let part = if import.greyscale {
        RasterPart::from_gray_image(&image, property, resolution)
    } else {
        RasterPart::black_white_from_image(&image, property, resolution)
    }
    .at(import.offset);

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .to_string();
    let mut job = LaserJob::new(name);
    job.add_part(part);
    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use laserlink_communication::{save_job, DialectKind};
    use laserlink_core::{JobPart, RasterKind};
    use laserlink_settings::DriverSettings;
    use std::fs;

    const LINE_JOB: &str = r#"{
        "name": "line",
        "parts": [
            {
                "part": "vector",
                "resolution": 500.0,
                "commands": [
                    { "type": "set_property", "power": 50.0, "speed": 80.0 },
                    { "type": "move_to", "x": 0, "y": 0 },
                    { "type": "line_to", "x": 100, "y": 0 }
                ]
            }
        ]
    }"#;

    fn write_job(dir: &tempfile::TempDir, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_json_job_saves_generic_gcode() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_job(&dir, "line.json", LINE_JOB);

        let job = load_job(&path, &ImageImport::default()).unwrap();
        assert_eq!(job.name, "line");
        assert!(matches!(job.parts[0], JobPart::Vector(_)));

        let config = DriverSettings::default().session_config().unwrap();
        let mut out = Vec::new();
        let lines = save_job(&config, &job, &mut out).unwrap();

        assert_eq!(lines, 5);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "G21\r\nG90\r\nG0 X0.000000 Y0.000000\r\nG1 X5.080000 Y0.000000 S50.000000 F960\r\nG0 X0 Y0\r\n"
        );
    }

    #[test]
    fn test_lasersaur_output_uses_lf() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_job(&dir, "line.json", LINE_JOB);

        let job = load_job(&path, &ImageImport::default()).unwrap();
        let config = DriverSettings::for_dialect(DialectKind::Lasersaur)
            .session_config()
            .unwrap();
        let mut out = Vec::new();
        save_job(&config, &job, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains('\r'));
        assert!(text.starts_with("G54\nG21\nG90\nG0 X0 Y0\n"));
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_job(&dir, "broken.json", "{ \"name\": ");

        let err = load_job(&path, &ImageImport::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse job"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_job(Path::new("job.svg"), &ImageImport::default()).unwrap_err();
        assert!(err.to_string().contains("Unsupported job file"));
    }

    #[test]
    fn test_image_becomes_thresholded_raster() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        let mut img = GrayImage::from_pixel(3, 2, Luma([255]));
        img.put_pixel(1, 0, Luma([10]));
        img.put_pixel(2, 1, Luma([127]));
        img.save(&path).unwrap();

        let import = ImageImport {
            dpi: 254.0,
            offset: Point::new(4, 5),
            ..Default::default()
        };
        let job = load_job(&path, &import).unwrap();
        assert_eq!(job.name, "logo");
        let JobPart::Raster(part) = &job.parts[0] else {
            panic!("expected a raster part");
        };
        assert_eq!(part.kind, RasterKind::BlackWhite);
        assert_eq!(part.pixels, vec![0, 255, 0, 0, 0, 255]);
        assert_eq!(part.start, Point::new(4, 5));
        assert_eq!(part.resolution.dpi(), 254.0);
    }

    #[test]
    fn test_greyscale_import_inverts_luma() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shade.png");
        GrayImage::from_pixel(1, 1, Luma([55])).save(&path).unwrap();

        let import = ImageImport {
            greyscale: true,
            ..Default::default()
        };
        let job = load_job(&path, &import).unwrap();
        let JobPart::Raster(part) = &job.parts[0] else {
            panic!("expected a raster part");
        };
        assert_eq!(part.kind, RasterKind::Greyscale);
        assert_eq!(part.pixels, vec![200]);
    }

    #[test]
    fn test_invalid_dpi_is_rejected() {
        let import = ImageImport {
            dpi: 0.0,
            ..Default::default()
        };
        assert!(load_job(Path::new("x.png"), &import).is_err());
    }
}
