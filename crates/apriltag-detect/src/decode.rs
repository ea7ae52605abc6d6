//! Payload sampling and error-correcting decode for one candidate quad.

use apriltag_core::{get_gray, homography_from_4pt, GrayImageView};
use apriltag_families::Matcher;
use nalgebra::Point2;

use crate::config::DecodeParams;
use crate::detection::Detection;
use crate::quad::Quad;
use crate::threshold::otsu_threshold_from_samples;

/// Tag-frame corners of the outer border square, tag order (TL, TR, BR, BL).
pub(crate) fn tag_corner_points(side: f32) -> [Point2<f32>; 4] {
    [
        Point2::new(0.0, 0.0),
        Point2::new(side, 0.0),
        Point2::new(side, side),
        Point2::new(0.0, side),
    ]
}

/// Decode one quad: sample the module grid under the quad's homography,
/// threshold, verify the black border, match against the family codebook,
/// and normalize corner order for the decoded rotation.
///
/// Any failure (sampling outside the image, weak border, no codebook match,
/// degenerate homography) rejects this candidate only.
pub(crate) fn decode_quad(
    img: &GrayImageView<'_>,
    quad: &Quad,
    matcher: &Matcher,
    params: &DecodeParams,
) -> Option<Detection> {
    let family = matcher.family();
    let cells = family.total_dim();
    let side = cells as f32;
    let tag_pts = tag_corner_points(side);

    let h = homography_from_4pt(&tag_pts, &quad.corners)?;

    let mut samples = Vec::with_capacity(cells * cells);
    for cy in 0..cells {
        for cx in 0..cells {
            let p = h.apply(Point2::new(cx as f32 + 0.5, cy as f32 + 0.5));
            samples.push(sample_mean_3x3(img, p.x, p.y)?);
        }
    }

    let thr = otsu_threshold_from_samples(&samples);

    let mut border_ok = 0u32;
    let mut border_total = 0u32;
    let mut code = 0u64;
    for cy in 0..cells {
        for cx in 0..cells {
            let is_black = samples[cy * cells + cx] < thr;
            let on_border = cx == 0 || cy == 0 || cx + 1 == cells || cy + 1 == cells;
            if on_border {
                border_total += 1;
                if is_black {
                    border_ok += 1;
                }
            } else if is_black {
                code |= 1u64 << ((cy - 1) * family.dim + (cx - 1));
            }
        }
    }

    let border_score = border_ok as f32 / border_total.max(1) as f32;
    if border_score < params.min_border_score {
        return None;
    }

    let m = matcher.match_code(code)?;

    // The observed grid is the codeword rotated by `m.rotation` clockwise
    // quarter turns, which puts the tag's physical top-left corner at quad
    // index `m.rotation`.
    let start = m.rotation as usize;
    let corners = [
        quad.corners[start],
        quad.corners[(start + 1) % 4],
        quad.corners[(start + 2) % 4],
        quad.corners[(start + 3) % 4],
    ];
    let h = homography_from_4pt(&tag_pts, &corners)?;
    let center = h.apply(Point2::new(side * 0.5, side * 0.5));

    let ham_pen = 1.0 - m.hamming as f32 / family.bit_count().max(1) as f32;
    let score = (border_score * ham_pen).clamp(0.0, 1.0);

    Some(Detection {
        id: m.id,
        hamming: m.hamming,
        score,
        code,
        center,
        corners,
        h,
    })
}

fn sample_mean_3x3(img: &GrayImageView<'_>, x: f32, y: f32) -> Option<u8> {
    let ix = x.floor() as i32;
    let iy = y.floor() as i32;
    if ix - 1 < 0 || iy - 1 < 0 || ix + 1 >= img.width as i32 || iy + 1 >= img.height as i32 {
        return None;
    }

    let mut sum = 0u32;
    for dy in -1..=1 {
        for dx in -1..=1 {
            sum += get_gray(img, ix + dx, iy + dy, 0) as u32;
        }
    }
    Some((sum / 9) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apriltag_families::builtins::TAG16H5;
    use apriltag_print::render_tag;

    const PPM: usize = 8;

    /// Border corners of a tag rendered with one quiet-zone module, in
    /// pixel-center coordinates.
    fn rendered_corners() -> [Point2<f32>; 4] {
        let b0 = PPM as f32 - 0.5;
        let b1 = (1 + TAG16H5.total_dim()) as f32 * PPM as f32 - 0.5;
        [
            Point2::new(b0, b0),
            Point2::new(b1, b0),
            Point2::new(b1, b1),
            Point2::new(b0, b1),
        ]
    }

    #[test]
    fn decodes_rendered_tag_exactly() {
        let id = 11u32;
        let img = render_tag(TAG16H5, id, PPM, 1).expect("render");
        let quad = Quad {
            corners: rendered_corners(),
        };
        let matcher = Matcher::new(TAG16H5, 0);
        let det = decode_quad(&img.view(), &quad, &matcher, &DecodeParams::default())
            .expect("decode");
        assert_eq!(det.id, id);
        assert_eq!(det.hamming, 0);
        assert_eq!(det.code, TAG16H5.codes[id as usize]);
        assert!(det.score > 0.9);
    }

    #[test]
    fn corner_normalization_is_shift_invariant() {
        let id = 4u32;
        let img = render_tag(TAG16H5, id, PPM, 1).expect("render");
        let base = rendered_corners();
        let matcher = Matcher::new(TAG16H5, 0);

        let reference = decode_quad(
            &img.view(),
            &Quad { corners: base },
            &matcher,
            &DecodeParams::default(),
        )
        .expect("decode");

        for shift in 1..4usize {
            let corners = [
                base[shift % 4],
                base[(shift + 1) % 4],
                base[(shift + 2) % 4],
                base[(shift + 3) % 4],
            ];
            let det = decode_quad(
                &img.view(),
                &Quad { corners },
                &matcher,
                &DecodeParams::default(),
            )
            .unwrap_or_else(|| panic!("decode with shift {shift}"));
            assert_eq!(det.id, id, "shift {shift}");
            for j in 0..4 {
                let d = det.corners[j] - reference.corners[j];
                assert!(
                    d.norm() < 1e-3,
                    "shift {shift}: corner {j} moved to {:?}",
                    det.corners[j]
                );
            }
        }
    }

    #[test]
    fn center_is_projective_midpoint() {
        let img = render_tag(TAG16H5, 2, PPM, 1).expect("render");
        let quad = Quad {
            corners: rendered_corners(),
        };
        let matcher = Matcher::new(TAG16H5, 0);
        let det = decode_quad(&img.view(), &quad, &matcher, &DecodeParams::default())
            .expect("decode");
        // Axis-aligned placement: center is the arithmetic middle.
        let expect = (img.width as f32 - 1.0) * 0.5;
        assert!((det.center.x - expect).abs() < 0.1);
        assert!((det.center.y - expect).abs() < 0.1);
    }

    #[test]
    fn white_quad_fails_border_check() {
        let img = apriltag_core::GrayImage::filled(64, 64, 255);
        let quad = Quad {
            corners: rendered_corners(),
        };
        let matcher = Matcher::new(TAG16H5, 0);
        assert!(decode_quad(&img.view(), &quad, &matcher, &DecodeParams::default()).is_none());
    }

    #[test]
    fn quad_near_image_edge_is_rejected_not_panicking() {
        let img = render_tag(TAG16H5, 0, PPM, 1).expect("render");
        let s = img.width as f32;
        let quad = Quad {
            corners: [
                Point2::new(-0.4, -0.4),
                Point2::new(s - 0.6, -0.4),
                Point2::new(s - 0.6, s - 0.6),
                Point2::new(-0.4, s - 0.6),
            ],
        };
        let matcher = Matcher::new(TAG16H5, 0);
        // Sampling next to the boundary must bail out cleanly.
        let _ = decode_quad(&img.view(), &quad, &matcher, &DecodeParams::default());
    }
}
