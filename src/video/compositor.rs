use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, GrayImage, ImageError, Rgb, RgbImage, RgbaImage};
use tracing::debug;

use crate::config::CompositorConfig;
use crate::error::{FrameFailureKind, OverlayError};
use crate::video::types::frame_file_name;

/// How a background is brought to the overlay's size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeStrategy {
    /// Scale the whole background inside the canvas and pad with black bars
    Fit,
    /// Scale to the canvas width and crop the overflow
    Fill,
}

impl ResizeStrategy {
    /// Relatively wider backgrounds are letterboxed, everything else
    /// (including an equal aspect ratio) is filled and cropped.
    pub fn choose(background: (u32, u32), overlay: (u32, u32)) -> Self {
        let bg_aspect = background.0 as f64 / background.1 as f64;
        let fg_aspect = overlay.0 as f64 / overlay.1 as f64;

        if bg_aspect > fg_aspect {
            Self::Fit
        } else {
            Self::Fill
        }
    }
}

/// Composites one background frame with the shared overlay image
///
/// The background is oriented, fitted or filled to the overlay's size,
/// desaturated, box-blurred and finally covered by the overlay using the
/// overlay's own alpha channel.
#[derive(Debug, Clone)]
pub struct BackgroundCompositor {
    config: CompositorConfig,
}

impl BackgroundCompositor {
    pub fn new(config: CompositorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Composite the frame at `source` and save it as frame `index` in `output_dir`.
    pub fn process_frame(
        &self,
        source: &Path,
        index: u64,
        overlay: &RgbaImage,
        output_dir: &Path,
    ) -> Result<PathBuf, OverlayError> {
        let background = image::open(source).map_err(|e| {
            let kind = match e {
                ImageError::IoError(_) => FrameFailureKind::Open,
                _ => FrameFailureKind::Decode,
            };
            frame_failure(source, kind, e)
        })?;

        let composited = self.compose(background, overlay);

        let output_path = output_dir.join(frame_file_name(&self.config.output_prefix, index, "png"));
        composited
            .save(&output_path)
            .map_err(|e| frame_failure(source, FrameFailureKind::Save, e))?;

        debug!("Processed {:?} -> {:?}", source, output_path);
        Ok(output_path)
    }

    /// Composite an in-memory background with the overlay.
    ///
    /// The result always has the overlay's dimensions.
    pub fn compose(&self, background: DynamicImage, overlay: &RgbaImage) -> RgbImage {
        let overlay_size = overlay.dimensions();

        let background = self.orient(background, overlay_size);
        let resized = self.fit_or_fill(&background.to_rgb8(), overlay_size);

        let gray = imageops::grayscale(&resized);
        let blurred = box_blur(&gray, self.config.blur_radius);

        let mut canvas = DynamicImage::ImageLuma8(blurred).to_rgba8();
        imageops::overlay(&mut canvas, overlay, 0, 0);

        DynamicImage::ImageRgba8(canvas).to_rgb8()
    }

    /// Rotate the background 90° clockwise when its dimensions are the
    /// overlay's dimensions swapped, so portrait and landscape line up.
    pub fn orient(&self, background: DynamicImage, overlay_size: (u32, u32)) -> DynamicImage {
        let background_size = background.dimensions();

        if needs_rotation(background_size, overlay_size, self.config.rotation_tolerance) {
            debug!("Rotating background {:?} to match overlay {:?}", background_size, overlay_size);
            background.rotate90()
        } else {
            background
        }
    }

    /// Bring the background to exactly `overlay_size`.
    ///
    /// Fit scales to the canvas width and pads top and bottom with black, so
    /// the whole background stays visible; fill scales to the width and
    /// crops the vertical overflow around the center.
    pub fn fit_or_fill(&self, background: &RgbImage, overlay_size: (u32, u32)) -> RgbImage {
        let (fg_width, fg_height) = overlay_size;
        let (bg_width, bg_height) = background.dimensions();
        let scale = fg_width as f64 / bg_width as f64;
        let scaled_height = (bg_height as f64 * scale).round() as u32;

        match ResizeStrategy::choose((bg_width, bg_height), overlay_size) {
            ResizeStrategy::Fit => {
                let new_height = scaled_height.clamp(1, fg_height);
                debug!("Letterboxing background to {}x{}", fg_width, new_height);

                let resized = imageops::resize(background, fg_width, new_height, FilterType::Lanczos3);
                let mut canvas = RgbImage::from_pixel(fg_width, fg_height, Rgb([0, 0, 0]));
                let top = (fg_height - new_height) / 2;
                imageops::replace(&mut canvas, &resized, 0, top as i64);
                canvas
            }
            ResizeStrategy::Fill => {
                // Never shorter than the canvas, even after rounding
                let new_height = scaled_height.max(fg_height);
                debug!("Filling background at {}x{} and cropping", fg_width, new_height);

                let resized = imageops::resize(background, fg_width, new_height, FilterType::Lanczos3);
                let top = (new_height - fg_height) / 2;
                imageops::crop_imm(&resized, 0, top, fg_width, fg_height).to_image()
            }
        }
    }
}

/// True when `background` is `overlay` with width and height swapped,
/// each within `tolerance` relative difference.
pub fn needs_rotation(background: (u32, u32), overlay: (u32, u32), tolerance: f64) -> bool {
    // An image that already matches needs no turn
    if background == overlay {
        return false;
    }
    is_close(background.0, overlay.1, tolerance) && is_close(background.1, overlay.0, tolerance)
}

fn is_close(a: u32, b: u32, rel_tol: f64) -> bool {
    let (a, b) = (a as f64, b as f64);
    (a - b).abs() <= rel_tol * a.abs().max(b.abs())
}

fn frame_failure(source: &Path, kind: FrameFailureKind, error: ImageError) -> OverlayError {
    OverlayError::FrameProcessingFailed {
        frame: source.display().to_string(),
        kind,
        reason: error.to_string(),
    }
}

/// Box blur with a `(2 * radius + 1)` wide window; edge pixels are repeated.
pub fn box_blur(image: &GrayImage, radius: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if radius == 0 || width == 0 || height == 0 {
        return image.clone();
    }

    let (w, h, r) = (width as usize, height as usize, radius as usize);
    let src = image.as_raw();

    let mut horizontal = vec![0u8; w * h];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        blur_line(w, r, |i| row[i], |i, v| horizontal[y * w + i] = v);
    }

    let mut output = vec![0u8; w * h];
    for x in 0..w {
        blur_line(h, r, |i| horizontal[i * w + x], |i, v| output[i * w + x] = v);
    }

    // Dimensions are unchanged, so the buffer always fits
    GrayImage::from_raw(width, height, output).unwrap_or_else(|| image.clone())
}

fn blur_line(len: usize, radius: usize, get: impl Fn(usize) -> u8, mut set: impl FnMut(usize, u8)) {
    let last = len as isize - 1;
    let at = |i: isize| get(i.clamp(0, last) as usize) as u32;
    let window = (2 * radius + 1) as u32;
    let r = radius as isize;

    let mut sum: u32 = (-r..=r).map(&at).sum();
    for i in 0..len as isize {
        set(i as usize, ((sum + window / 2) / window) as u8);
        sum = sum + at(i + r + 1) - at(i - r);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba};
    use tempfile::tempdir;

    fn compositor() -> BackgroundCompositor {
        BackgroundCompositor::new(CompositorConfig::default())
    }

    fn transparent_overlay(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]))
    }

    #[test]
    fn test_rotation_detection() {
        assert!(needs_rotation((1920, 1080), (1080, 1920), 1e-5));
        assert!(!needs_rotation((1080, 1920), (1080, 1920), 1e-5));
        assert!(!needs_rotation((1921, 1080), (1080, 1920), 1e-5));
        assert!(!needs_rotation((1280, 720), (1080, 1920), 1e-5));
        // A square overlay matches itself; no rotation
        assert!(!needs_rotation((500, 500), (500, 500), 1e-5));
    }

    #[test]
    fn test_orient_rotates_clockwise() {
        // Left half white, right half black
        let background = RgbImage::from_fn(160, 90, |x, _| {
            if x < 80 { Rgb([255, 255, 255]) } else { Rgb([0, 0, 0]) }
        });
        let oriented = compositor().orient(DynamicImage::ImageRgb8(background), (90, 160)).to_rgb8();

        assert_eq!(oriented.dimensions(), (90, 160));
        assert_eq!(oriented.get_pixel(45, 10), &Rgb([255, 255, 255]));
        assert_eq!(oriented.get_pixel(45, 150), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_orient_leaves_matching_image_alone() {
        let background = RgbImage::from_pixel(90, 160, Rgb([10, 20, 30]));
        let oriented = compositor().orient(DynamicImage::ImageRgb8(background.clone()), (90, 160));
        assert_eq!(oriented.to_rgb8(), background);
    }

    #[test]
    fn test_strategy_choice() {
        assert_eq!(ResizeStrategy::choose((1920, 1080), (1080, 1920)), ResizeStrategy::Fit);
        assert_eq!(ResizeStrategy::choose((720, 1600), (1080, 1920)), ResizeStrategy::Fill);
        // Equal aspect goes through fill
        assert_eq!(ResizeStrategy::choose((540, 960), (1080, 1920)), ResizeStrategy::Fill);
    }

    #[test]
    fn test_wider_background_is_letterboxed() {
        let background = RgbImage::from_pixel(200, 100, Rgb([255, 255, 255]));
        let fitted = compositor().fit_or_fill(&background, (90, 160));

        assert_eq!(fitted.dimensions(), (90, 160));
        // 200x100 scaled to 90x45, centered vertically at y = 57
        assert_eq!(fitted.get_pixel(45, 0), &Rgb([0, 0, 0]));
        assert_eq!(fitted.get_pixel(45, 159), &Rgb([0, 0, 0]));
        assert!(fitted.get_pixel(45, 80)[0] > 250);
        // Full width kept: no horizontal crop
        assert!(fitted.get_pixel(0, 80)[0] > 250);
        assert!(fitted.get_pixel(89, 80)[0] > 250);
    }

    #[test]
    fn test_taller_background_is_cropped() {
        // Top and bottom quarters black, middle white
        let background = RgbImage::from_fn(100, 400, |_, y| {
            if (100..300).contains(&y) { Rgb([255, 255, 255]) } else { Rgb([0, 0, 0]) }
        });
        let filled = compositor().fit_or_fill(&background, (90, 160));

        assert_eq!(filled.dimensions(), (90, 160));
        // 100x400 scales to 90x360; the center 160 rows all come from the white band
        assert!(filled.pixels().all(|p| p[0] > 250));
    }

    #[test]
    fn test_equal_aspect_is_filled_without_bars() {
        let background = RgbImage::from_pixel(180, 320, Rgb([255, 255, 255]));
        let filled = compositor().fit_or_fill(&background, (90, 160));

        assert_eq!(filled.dimensions(), (90, 160));
        assert!(filled.pixels().all(|p| p[0] > 250));
    }

    #[test]
    fn test_box_blur() {
        let flat = GrayImage::from_pixel(20, 20, Luma([77]));
        assert_eq!(box_blur(&flat, 3), flat);

        let mut dot = GrayImage::new(21, 21);
        dot.put_pixel(10, 10, Luma([255]));
        let blurred = box_blur(&dot, 1);
        // 255 spread over a 3x3 window
        assert_eq!(blurred.get_pixel(10, 10)[0], 28);
        assert_eq!(blurred.get_pixel(9, 11)[0], 28);
        assert_eq!(blurred.get_pixel(12, 10)[0], 0);

        assert_eq!(box_blur(&dot, 0), dot);
    }

    #[test]
    fn test_compose_pastes_overlay_with_alpha() {
        let mut overlay = transparent_overlay(90, 160);
        for y in 60..100 {
            for x in 20..70 {
                overlay.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }
        let background = RgbImage::from_fn(90, 160, |x, y| Rgb([(x * 2) as u8, (y) as u8, 200]));

        let result = compositor().compose(DynamicImage::ImageRgb8(background), &overlay);

        assert_eq!(result.dimensions(), (90, 160));
        assert_eq!(result.get_pixel(45, 80), &Rgb([255, 0, 0]));
        // Transparent overlay pixels leave the gray background visible
        let corner = result.get_pixel(5, 5);
        assert_eq!(corner[0], corner[1]);
        assert_eq!(corner[1], corner[2]);
    }

    #[test]
    fn test_process_frame_writes_numbered_output() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("frame_000000003.png");
        RgbImage::from_pixel(160, 90, Rgb([120, 60, 30])).save(&source).unwrap();

        let output = compositor()
            .process_frame(&source, 7, &transparent_overlay(90, 160), dir.path())
            .unwrap();

        assert_eq!(output, dir.path().join("final_image_000000007.png"));
        let written = image::open(&output).unwrap();
        assert_eq!(written.dimensions(), (90, 160));
    }

    #[test]
    fn test_process_frame_failures() {
        let dir = tempdir().unwrap();
        let overlay = transparent_overlay(9, 16);

        let corrupt = dir.path().join("frame_000000001.png");
        std::fs::write(&corrupt, b"definitely not a png").unwrap();
        match compositor().process_frame(&corrupt, 1, &overlay, dir.path()) {
            Err(OverlayError::FrameProcessingFailed { kind, .. }) => assert_eq!(kind, FrameFailureKind::Decode),
            other => panic!("expected decode failure, got {:?}", other),
        }

        let missing = dir.path().join("frame_000000002.png");
        match compositor().process_frame(&missing, 2, &overlay, dir.path()) {
            Err(OverlayError::FrameProcessingFailed { kind, .. }) => assert_eq!(kind, FrameFailureKind::Open),
            other => panic!("expected open failure, got {:?}", other),
        }
    }
}
