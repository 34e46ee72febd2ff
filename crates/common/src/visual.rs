//! Pixel-level screenshot comparison
//!
//! Both images are decoded to RGBA8 and compared pixel by pixel. A pixel is a
//! mismatch when any channel differs by more than `threshold * 255`. There is
//! no anti-aliasing detection, so results are reproducible across platforms.

use image::{GenericImageView, ImageFormat, Pixel, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::{CompareSettings, DEFAULT_THRESHOLD};
use crate::types::ComparisonResult;

/// Colour used for mismatched pixels in diff images
const DIFF_COLOR: image::Rgba<u8> = image::Rgba([255, 0, 0, 255]);

/// Options for a single comparison
#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Per-channel difference tolerated, as a fraction of full scale (0.0 - 1.0)
    pub threshold: f64,

    /// Whether to write a diff image when pixels mismatch
    pub generate_diff: bool,

    /// Where the diff image goes; no diff is written without it
    pub diff_path: Option<PathBuf>,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            generate_diff: true,
            diff_path: None,
        }
    }
}

impl From<&CompareSettings> for CompareOptions {
    fn from(settings: &CompareSettings) -> Self {
        Self {
            threshold: settings.threshold,
            generate_diff: settings.generate_diff,
            diff_path: None,
        }
    }
}

impl CompareOptions {
    pub fn with_diff_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.diff_path = Some(path.into());
        self
    }
}

/// Compare two images on disk.
///
/// Never fails: undecodable inputs are reported as a non-match with a 0%
/// difference, and differing dimensions as a non-match with 100%.
pub fn compare_images(path_a: &Path, path_b: &Path, options: &CompareOptions) -> ComparisonResult {
    let img_a = match image::open(path_a) {
        Ok(img) => img,
        Err(e) => {
            warn!("Cannot decode {:?}: {}", path_a, e);
            return ComparisonResult::failed();
        }
    };
    let img_b = match image::open(path_b) {
        Ok(img) => img,
        Err(e) => {
            warn!("Cannot decode {:?}: {}", path_b, e);
            return ComparisonResult::failed();
        }
    };

    if img_a.dimensions() != img_b.dimensions() {
        debug!(
            "Dimensions differ: {:?} vs {:?}",
            img_a.dimensions(),
            img_b.dimensions()
        );
        return ComparisonResult {
            matches: false,
            diff_percent: 100.0,
            diff_path: None,
        };
    }

    let (width, height) = img_a.dimensions();
    let total_pixels = (width as u64) * (height as u64);
    if total_pixels == 0 {
        return ComparisonResult {
            matches: true,
            diff_percent: 0.0,
            diff_path: None,
        };
    }

    let rgba_a = img_a.to_rgba8();
    let rgba_b = img_b.to_rgba8();
    let tolerance = channel_tolerance(options.threshold);

    let mut diff_img = RgbaImage::new(width, height);
    let mut diff_pixels = 0u64;

    for (x, y, pixel_a) in rgba_a.enumerate_pixels() {
        let pixel_b = rgba_b.get_pixel(x, y);

        if pixels_differ(pixel_a, pixel_b, tolerance) {
            diff_pixels += 1;
            diff_img.put_pixel(x, y, DIFF_COLOR);
        } else {
            // Keep the second image but dim it
            let channels = pixel_b.channels();
            diff_img.put_pixel(
                x,
                y,
                image::Rgba([channels[0] / 2, channels[1] / 2, channels[2] / 2, 128]),
            );
        }
    }

    let diff_percent = (diff_pixels as f64 / total_pixels as f64) * 100.0;

    let diff_path = match (&options.diff_path, options.generate_diff && diff_pixels > 0) {
        (Some(path), true) => write_diff(&diff_img, path),
        _ => None,
    };

    debug!(
        "Compared {:?} with {:?}: {}/{} pixels differ",
        path_a, path_b, diff_pixels, total_pixels
    );

    ComparisonResult {
        matches: diff_pixels == 0,
        diff_percent,
        diff_path,
    }
}

/// Largest per-channel difference still treated as equal
fn channel_tolerance(threshold: f64) -> f64 {
    let threshold = if threshold.is_nan() { DEFAULT_THRESHOLD } else { threshold };
    threshold.clamp(0.0, 1.0) * 255.0
}

fn pixels_differ(a: &image::Rgba<u8>, b: &image::Rgba<u8>, tolerance: f64) -> bool {
    a.channels()
        .iter()
        .zip(b.channels())
        .any(|(ca, cb)| (*ca as f64 - *cb as f64).abs() > tolerance)
}

fn write_diff(diff_img: &RgbaImage, path: &Path) -> Option<PathBuf> {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!("Cannot create diff directory {:?}: {}", parent, e);
            return None;
        }
    }
    match diff_img.save_with_format(path, ImageFormat::Png) {
        Ok(()) => Some(path.to_path_buf()),
        Err(e) => {
            warn!("Failed to write diff image {:?}: {}", path, e);
            None
        }
    }
}
