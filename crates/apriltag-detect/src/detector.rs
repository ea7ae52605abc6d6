use apriltag_core::{homography_from_4pt, GrayImageView};
use apriltag_families::Matcher;
use nalgebra::Point2;

use crate::config::DetectorConfig;
use crate::decode::{decode_quad, tag_corner_points};
use crate::detection::Detection;
use crate::error::DetectError;
use crate::quad::quad_from_component;
use crate::refine::refine_quad_corners;
use crate::segment::find_components;
use crate::threshold::adaptive_binarize;

/// AprilTag detector for one family and configuration.
///
/// The detector is immutable after construction and holds no per-frame
/// state; `detect` may be called repeatedly and from a dedicated worker
/// thread.
pub struct Detector {
    config: DetectorConfig,
    matcher: Matcher,
}

impl Detector {
    /// Build a detector. `max_hamming` is clamped to the family's
    /// error-correction budget.
    pub fn new(mut config: DetectorConfig) -> Self {
        config.max_hamming = config.max_hamming.min(config.family.max_correction_bits);
        let matcher = Matcher::new(config.family, config.max_hamming);
        Self { config, matcher }
    }

    #[inline]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect all tags in a raw luma buffer of the given dimensions.
    pub fn detect_bytes(
        &self,
        data: &[u8],
        width: usize,
        height: usize,
    ) -> Result<Vec<Detection>, DetectError> {
        validate_dims(width, height, data.len())?;
        let expected = width * height;
        self.detect(&GrayImageView {
            width,
            height,
            data: &data[..expected],
        })
    }

    /// Detect all tags in a grayscale image.
    ///
    /// Returns an empty vector when no tags are found; errors are reserved
    /// for malformed input. A candidate that fails anywhere in the pipeline
    /// is dropped without affecting the others.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
    pub fn detect(&self, image: &GrayImageView<'_>) -> Result<Vec<Detection>, DetectError> {
        validate_dims(image.width, image.height, image.data.len())?;

        let quad_params = &self.config.quad;
        let bin = adaptive_binarize(image, quad_params.tile_size, quad_params.min_tile_contrast);
        let components = find_components(&bin, quad_params.min_component_pixels);

        let mut quads = 0usize;
        let mut detections = Vec::new();
        for comp in &components {
            let Some(quad) = quad_from_component(comp, quad_params) else {
                continue;
            };
            quads += 1;
            let Some(mut det) = decode_quad(image, &quad, &self.matcher, &self.config.decode)
            else {
                continue;
            };
            if self.config.refine_corners {
                self.refine_detection(image, &mut det);
            }
            detections.push(det);
        }

        log::debug!(
            "{} components, {} quads, {} decoded",
            components.len(),
            quads,
            detections.len()
        );

        if self.config.decode.dedup {
            detections = dedup_keep_best(detections);
        } else {
            detections.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        Ok(detections)
    }

    /// Subpixel-refine a decoded detection in place. Keeps the decoded
    /// corners when refinement does not converge.
    fn refine_detection(&self, image: &GrayImageView<'_>, det: &mut Detection) {
        let Some(corners) = refine_quad_corners(image, &det.corners) else {
            return;
        };
        let side = self.config.family.total_dim() as f32;
        let tag_pts = tag_corner_points(side);
        let Some(h) = homography_from_4pt(&tag_pts, &corners) else {
            return;
        };
        det.corners = corners;
        det.center = h.apply(Point2::new(side * 0.5, side * 0.5));
        det.h = h;
    }
}

fn validate_dims(width: usize, height: usize, len: usize) -> Result<(), DetectError> {
    if width == 0 || height == 0 {
        return Err(DetectError::EmptyImage { width, height });
    }
    let expected = width
        .checked_mul(height)
        .ok_or(DetectError::BufferTooSmall {
            width,
            height,
            expected: usize::MAX,
            actual: len,
        })?;
    if len < expected {
        return Err(DetectError::BufferTooSmall {
            width,
            height,
            expected,
            actual: len,
        });
    }
    Ok(())
}

/// Keep the best-scoring detection among near-coincident same-id decodes.
/// Same id far apart is two physical tags and is preserved.
fn dedup_keep_best(mut dets: Vec<Detection>) -> Vec<Detection> {
    dets.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut out: Vec<Detection> = Vec::with_capacity(dets.len());
    for d in dets {
        let radius = 0.5 * mean_side(&d);
        let dup = out
            .iter()
            .any(|k| k.id == d.id && (k.center - d.center).norm() < radius);
        if !dup {
            out.push(d);
        }
    }
    out
}

fn mean_side(det: &Detection) -> f32 {
    let mut sum = 0.0;
    for k in 0..4 {
        sum += (det.corners[k] - det.corners[(k + 1) % 4]).norm();
    }
    sum * 0.25
}

#[cfg(test)]
mod tests {
    use super::*;
    use apriltag_families::builtins::TAG16H5;

    #[test]
    fn zero_dimensions_fail_fast() {
        let det = Detector::new(crate::DetectorConfig::new(TAG16H5));
        let err = det.detect_bytes(&[], 0, 10).unwrap_err();
        assert!(matches!(err, DetectError::EmptyImage { .. }));
    }

    #[test]
    fn short_buffer_fails_fast() {
        let det = Detector::new(crate::DetectorConfig::new(TAG16H5));
        let buf = vec![0u8; 99];
        let err = det.detect_bytes(&buf, 10, 10).unwrap_err();
        match err {
            DetectError::BufferTooSmall {
                expected, actual, ..
            } => {
                assert_eq!(expected, 100);
                assert_eq!(actual, 99);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn max_hamming_is_clamped() {
        let mut cfg = crate::DetectorConfig::new(TAG16H5);
        cfg.max_hamming = 9;
        let det = Detector::new(cfg);
        assert_eq!(det.config().max_hamming, TAG16H5.max_correction_bits);
    }
}
