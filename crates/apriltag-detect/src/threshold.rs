//! Adaptive binarization.
//!
//! The image is divided into square tiles; each tile records its intensity
//! extrema, which are then spread over a 3x3 tile neighborhood so the
//! threshold stays stable across tile boundaries. Pixels in regions whose
//! local range is below the contrast floor produce no foreground, so flat
//! images (all black, all white, smooth gradients) binarize to nothing.

use apriltag_core::GrayImageView;

/// Binarized image: 1 = foreground (dark), 0 = background.
pub(crate) struct BinaryImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

pub(crate) fn adaptive_binarize(
    img: &GrayImageView<'_>,
    tile_size: usize,
    min_contrast: u8,
) -> BinaryImage {
    let (w, h) = (img.width, img.height);
    let tile = tile_size.max(2);
    let tx = w.div_ceil(tile);
    let ty = h.div_ceil(tile);

    let mut tile_min = vec![255u8; tx * ty];
    let mut tile_max = vec![0u8; tx * ty];

    for y in 0..h {
        let trow = (y / tile) * tx;
        let row = y * w;
        for x in 0..w {
            let v = img.data[row + x];
            let t = trow + x / tile;
            if v < tile_min[t] {
                tile_min[t] = v;
            }
            if v > tile_max[t] {
                tile_max[t] = v;
            }
        }
    }

    // Spread extrema over the 3x3 tile neighborhood.
    let mut nbr_min = vec![255u8; tx * ty];
    let mut nbr_max = vec![0u8; tx * ty];
    for j in 0..ty {
        for i in 0..tx {
            let mut lo = 255u8;
            let mut hi = 0u8;
            for dj in j.saturating_sub(1)..=(j + 1).min(ty - 1) {
                for di in i.saturating_sub(1)..=(i + 1).min(tx - 1) {
                    let t = dj * tx + di;
                    lo = lo.min(tile_min[t]);
                    hi = hi.max(tile_max[t]);
                }
            }
            nbr_min[j * tx + i] = lo;
            nbr_max[j * tx + i] = hi;
        }
    }

    let mut out = vec![0u8; w * h];
    for y in 0..h {
        let trow = (y / tile) * tx;
        let row = y * w;
        for x in 0..w {
            let t = trow + x / tile;
            let (lo, hi) = (nbr_min[t], nbr_max[t]);
            if hi - lo < min_contrast {
                continue;
            }
            let thresh = lo + (hi - lo) / 2;
            if img.data[row + x] < thresh {
                out[row + x] = 1;
            }
        }
    }

    BinaryImage {
        width: w,
        height: h,
        data: out,
    }
}

/// Compute an Otsu threshold from a set of sample intensities.
///
/// Used by the payload decoder, where the sample set is small and known to
/// contain both module polarities.
pub(crate) fn otsu_threshold_from_samples(samples: &[u8]) -> u8 {
    if samples.is_empty() {
        return 127;
    }

    let mut min_v = 255u8;
    let mut max_v = 0u8;
    for &v in samples {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }
    if min_v == max_v {
        return min_v;
    }

    let mut hist = [0u32; 256];
    for &v in samples {
        hist[v as usize] += 1;
    }
    let mut nonzero_bins = 0u32;
    for &h in &hist {
        if h > 0 {
            nonzero_bins += 1;
        }
    }
    if nonzero_bins <= 2 {
        return ((min_v as u16 + max_v as u16) / 2) as u8;
    }

    let total: f64 = samples.len() as f64;
    let mut sum_total = 0f64;
    for (i, &h) in hist.iter().enumerate() {
        sum_total += (i as f64) * (h as f64);
    }

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_t = 127u8;

    for (t, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f < 1.0 {
            break;
        }

        sum_b += (t as f64) * (h as f64);
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;

        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = t as u8;
        }
    }

    best_t
}

#[cfg(test)]
mod tests {
    use super::*;
    use apriltag_core::GrayImage;

    fn binarize(img: &GrayImage) -> BinaryImage {
        adaptive_binarize(&img.view(), 16, 20)
    }

    #[test]
    fn flat_images_produce_no_foreground() {
        for fill in [0u8, 128, 255] {
            let img = GrayImage::filled(64, 64, fill);
            let bin = binarize(&img);
            assert!(bin.data.iter().all(|&v| v == 0), "fill {fill}");
        }
    }

    #[test]
    fn dark_square_on_white_is_foreground() {
        let mut img = GrayImage::filled(64, 64, 255);
        for y in 20..40 {
            for x in 20..40 {
                img.data[y * 64 + x] = 0;
            }
        }
        let bin = binarize(&img);
        assert_eq!(bin.data[30 * 64 + 30], 1);
        assert_eq!(bin.data[5 * 64 + 5], 0);
        let count: usize = bin.data.iter().map(|&v| v as usize).sum();
        assert_eq!(count, 400);
    }

    #[test]
    fn otsu_splits_bimodal_samples() {
        let mut samples = vec![10u8; 40];
        samples.extend(std::iter::repeat(240u8).take(24));
        samples.push(30);
        samples.push(220);
        let t = otsu_threshold_from_samples(&samples);
        assert!(t > 30 && t <= 220, "got {t}");
    }

    #[test]
    fn otsu_on_uniform_samples_rejects_everything() {
        // `v < t` must be false for all samples when they are uniform.
        let samples = vec![55u8; 16];
        assert_eq!(otsu_threshold_from_samples(&samples), 55);
    }

    #[test]
    fn smooth_gradient_is_background() {
        let mut img = GrayImage::filled(256, 16, 0);
        for y in 0..16 {
            for x in 0..256 {
                img.data[y * 256 + x] = x as u8;
            }
        }
        let bin = adaptive_binarize(&img.view(), 16, 64);
        // Per-neighborhood range is ~48 levels, below the floor.
        assert!(bin.data.iter().all(|&v| v == 0));
    }
}
