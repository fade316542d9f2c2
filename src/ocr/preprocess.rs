//! Region preprocessing ahead of recognition.
//!
//! Scoreboard glyphs are small and sit on unevenly lit broadcast video, so
//! each crop is upsampled 3x with cubic interpolation, contrast-equalized
//! with a tile-based CLAHE pass, and binarized with an Otsu threshold.
//! The glyph backend reads the binary mask; the scene-text backend reads
//! the enhanced color crop.

use image::imageops::FilterType;
use image::{imageops, GrayImage, RgbImage};

use crate::error::FrameError;
use crate::ocr::FieldKind;
use crate::roi::ScaledRegion;

/// Fixed upsample factor applied to every crop before recognition.
const UPSAMPLE_FACTOR: u32 = 3;

/// CLAHE contrast limit, relative to a uniform histogram.
const CLAHE_CLIP_LIMIT: f64 = 2.0;

/// CLAHE tile grid (tiles per axis).
const CLAHE_TILES: u32 = 4;

/// A preprocessed crop ready for recognition.
pub struct PreparedRegion {
    /// Upsampled color crop, for backends that want the raw appearance.
    pub color: RgbImage,
    /// Otsu-binarized mask of the contrast-enhanced crop.
    pub binary: GrayImage,
}

/// Crops, upsamples, enhances, and binarizes one scoreboard region.
///
/// The crop is clamped to the frame bounds; a region that ends up with zero
/// area reports [`FrameError::EmptyRegion`] so the caller can push an empty
/// reading and keep the frame cadence.
pub fn prepare_region(
    frame: &RgbImage,
    region: &ScaledRegion,
    field: FieldKind,
) -> Result<PreparedRegion, FrameError> {
    let (fw, fh) = frame.dimensions();

    let x0 = region.x1.clamp(0, fw as i64) as u32;
    let y0 = region.y1.clamp(0, fh as i64) as u32;
    let x1 = region.x2.clamp(0, fw as i64) as u32;
    let y1 = region.y2.clamp(0, fh as i64) as u32;

    if x1 <= x0 || y1 <= y0 {
        return Err(FrameError::EmptyRegion(field));
    }

    let crop = imageops::crop_imm(frame, x0, y0, x1 - x0, y1 - y0).to_image();
    let color = imageops::resize(
        &crop,
        crop.width() * UPSAMPLE_FACTOR,
        crop.height() * UPSAMPLE_FACTOR,
        FilterType::CatmullRom,
    );

    let gray = imageops::grayscale(&color);
    let enhanced = clahe(&gray, CLAHE_CLIP_LIMIT, CLAHE_TILES);
    let threshold = otsu_threshold(&enhanced);
    let binary = binarize(&enhanced, threshold);

    Ok(PreparedRegion { color, binary })
}

/// Contrast-limited adaptive histogram equalization.
///
/// The image is divided into a `tiles` x `tiles` grid; each tile gets a
/// clipped-histogram equalization mapping, and every pixel is remapped by
/// bilinear interpolation between the mappings of the four nearest tile
/// centers. Clipped excess is redistributed uniformly across bins.
pub fn clahe(img: &GrayImage, clip_limit: f64, tiles: u32) -> GrayImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }

    let tiles = tiles.max(1);
    let tile_w = width.div_ceil(tiles).max(1);
    let tile_h = height.div_ceil(tiles).max(1);
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    // One 256-entry lookup table per tile.
    let mut luts = vec![[0u8; 256]; (tiles_x * tiles_y) as usize];

    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);
            let area = ((x1 - x0) * (y1 - y0)) as u64;

            let mut hist = [0u64; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[img.get_pixel(x, y).0[0] as usize] += 1;
                }
            }

            // Clip and redistribute, OpenCV-style: the limit is relative to
            // a perfectly uniform histogram over this tile.
            let limit = ((clip_limit * area as f64 / 256.0) as u64).max(1);
            let mut excess = 0u64;
            for count in hist.iter_mut() {
                if *count > limit {
                    excess += *count - limit;
                    *count = limit;
                }
            }
            let bonus = excess / 256;
            let mut leftover = excess % 256;
            for count in hist.iter_mut() {
                *count += bonus;
                if leftover > 0 {
                    *count += 1;
                    leftover -= 1;
                }
            }

            let lut = &mut luts[(ty * tiles_x + tx) as usize];
            let mut cdf = 0u64;
            for (value, count) in hist.iter().enumerate() {
                cdf += count;
                lut[value] = ((cdf as f64 / area as f64) * 255.0).round().min(255.0) as u8;
            }
        }
    }

    let lut_at = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];

    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let value = img.get_pixel(x, y).0[0] as usize;

            // Position in tile-center space, clamped so border pixels use
            // the edge tile instead of extrapolating.
            let gx = ((x as f64 + 0.5) / tile_w as f64 - 0.5).clamp(0.0, (tiles_x - 1) as f64);
            let gy = ((y as f64 + 0.5) / tile_h as f64 - 0.5).clamp(0.0, (tiles_y - 1) as f64);
            let tx0 = gx.floor() as u32;
            let ty0 = gy.floor() as u32;
            let tx1 = (tx0 + 1).min(tiles_x - 1);
            let ty1 = (ty0 + 1).min(tiles_y - 1);
            let wx = gx - gx.floor();
            let wy = gy - gy.floor();

            let top = lut_at(tx0, ty0)[value] as f64 * (1.0 - wx)
                + lut_at(tx1, ty0)[value] as f64 * wx;
            let bottom = lut_at(tx0, ty1)[value] as f64 * (1.0 - wx)
                + lut_at(tx1, ty1)[value] as f64 * wx;
            let mapped = top * (1.0 - wy) + bottom * wy;

            out.put_pixel(x, y, image::Luma([mapped.round().clamp(0.0, 255.0) as u8]));
        }
    }

    out
}

/// Picks the global threshold that maximizes between-class variance.
pub fn otsu_threshold(img: &GrayImage) -> u8 {
    let mut hist = [0u64; 256];
    for pixel in img.pixels() {
        hist[pixel.0[0] as usize] += 1;
    }
    let total: u64 = hist.iter().sum();
    if total == 0 {
        return 0;
    }

    let sum_all: f64 = hist
        .iter()
        .enumerate()
        .map(|(value, &count)| value as f64 * count as f64)
        .sum();

    let mut best_threshold = 0u8;
    let mut best_variance = -1.0f64;
    let mut weight_bg = 0u64;
    let mut sum_bg = 0.0f64;

    for threshold in 0..256usize {
        weight_bg += hist[threshold];
        if weight_bg == 0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0 {
            break;
        }
        sum_bg += threshold as f64 * hist[threshold] as f64;

        let mean_bg = sum_bg / weight_bg as f64;
        let mean_fg = (sum_all - sum_bg) / weight_fg as f64;
        let diff = mean_bg - mean_fg;
        let variance = weight_bg as f64 * weight_fg as f64 * diff * diff;

        if variance > best_variance {
            best_variance = variance;
            best_threshold = threshold as u8;
        }
    }

    best_threshold
}

/// Fixed binary rule: pixels above the threshold become white.
pub fn binarize(img: &GrayImage, threshold: u8) -> GrayImage {
    let mut out = GrayImage::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        let value = if pixel.0[0] > threshold { 255u8 } else { 0u8 };
        out.put_pixel(x, y, image::Luma([value]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn flat_frame(width: u32, height: u32, value: u8) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([value, value, value]))
    }

    #[test]
    fn test_prepare_region_upsamples() {
        let frame = flat_frame(100, 100, 128);
        let region = ScaledRegion { x1: 10, y1: 10, x2: 30, y2: 20 };
        let prepared = prepare_region(&frame, &region, FieldKind::Clock).unwrap();
        assert_eq!(prepared.color.dimensions(), (60, 30));
        assert_eq!(prepared.binary.dimensions(), (60, 30));
    }

    #[test]
    fn test_prepare_region_clamps_to_frame() {
        let frame = flat_frame(50, 50, 128);
        let region = ScaledRegion { x1: 40, y1: 40, x2: 80, y2: 80 };
        let prepared = prepare_region(&frame, &region, FieldKind::Score1).unwrap();
        // 10x10 remaining pixels, times 3
        assert_eq!(prepared.color.dimensions(), (30, 30));
    }

    #[test]
    fn test_prepare_region_empty_is_error() {
        let frame = flat_frame(50, 50, 128);
        let outside = ScaledRegion { x1: 60, y1: 60, x2: 90, y2: 90 };
        match prepare_region(&frame, &outside, FieldKind::Quarter) {
            Err(FrameError::EmptyRegion(FieldKind::Quarter)) => {}
            other => panic!("expected EmptyRegion, got {:?}", other.map(|_| ())),
        }

        let degenerate = ScaledRegion { x1: 10, y1: 10, x2: 10, y2: 30 };
        assert!(prepare_region(&frame, &degenerate, FieldKind::Clock).is_err());
    }

    #[test]
    fn test_otsu_separates_bimodal() {
        let mut img = GrayImage::new(10, 10);
        for (x, _, pixel) in img.enumerate_pixels_mut() {
            pixel.0[0] = if x < 5 { 20 } else { 230 };
        }
        let t = otsu_threshold(&img);
        assert!(t >= 20 && t < 230, "threshold {} should split the modes", t);

        let binary = binarize(&img, t);
        assert_eq!(binary.get_pixel(0, 0).0[0], 0);
        assert_eq!(binary.get_pixel(9, 0).0[0], 255);
    }

    #[test]
    fn test_binarize_only_emits_black_and_white() {
        let mut img = GrayImage::new(16, 1);
        for (x, _, pixel) in img.enumerate_pixels_mut() {
            pixel.0[0] = (x * 16) as u8;
        }
        let binary = binarize(&img, 127);
        assert!(binary.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn test_clahe_preserves_flat_image_shape() {
        let img = GrayImage::from_pixel(32, 32, image::Luma([100]));
        let out = clahe(&img, 2.0, 4);
        assert_eq!(out.dimensions(), (32, 32));
        // A flat tile maps everything to a single level; no new extremes appear.
        let first = out.get_pixel(0, 0).0[0];
        assert!(out.pixels().all(|p| p.0[0] == first));
    }

    #[test]
    fn test_clahe_spreads_low_contrast() {
        // Two close gray levels should move apart after equalization.
        let mut img = GrayImage::new(32, 32);
        for (x, _, pixel) in img.enumerate_pixels_mut() {
            pixel.0[0] = if x < 16 { 118 } else { 138 };
        }
        let out = clahe(&img, 4.0, 1);
        let dark = out.get_pixel(0, 16).0[0];
        let bright = out.get_pixel(31, 16).0[0];
        assert!(bright > dark);
        assert!(bright - dark >= 20);
    }
}
