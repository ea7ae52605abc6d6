use apriltag_families::TagFamily;
use serde::{Deserialize, Serialize};

/// Quad-detection threshold parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuadParams {
    /// Side of the adaptive-threshold tiles, in pixels.
    pub tile_size: usize,
    /// Minimum local (3x3-tile neighborhood) intensity range for a tile to
    /// produce foreground at all. Lower-contrast regions are treated as
    /// background.
    pub min_tile_contrast: u8,
    /// Minimum number of foreground pixels for a component to be considered.
    pub min_component_pixels: usize,
    /// Minimum quad area in square pixels.
    pub min_quad_area: f32,
    /// Minimum quad side length in pixels.
    pub min_side_px: f32,
    /// Maximum ratio between the longest and shortest quad side.
    pub max_aspect: f32,
    /// Acceptable range for component pixel count / quad area. The lower
    /// bound rejects thin or sparse blobs; the upper bound rejects
    /// components whose hull badly overshoots the pixel mass.
    pub min_fill: f32,
    pub max_fill: f32,
}

impl Default for QuadParams {
    fn default() -> Self {
        Self {
            tile_size: 16,
            min_tile_contrast: 20,
            min_component_pixels: 24,
            min_quad_area: 64.0,
            min_side_px: 10.0,
            max_aspect: 6.0,
            min_fill: 0.25,
            max_fill: 1.2,
        }
    }
}

/// Payload decode parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecodeParams {
    /// Require this fraction of border modules to read black.
    pub min_border_score: f32,
    /// Suppress near-coincident detections that decoded to the same id,
    /// keeping the best score. Distinct tags with the same id elsewhere in
    /// the frame are kept.
    pub dedup: bool,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            min_border_score: 0.85,
            dedup: true,
        }
    }
}

/// Full detector configuration: the tag family plus decoding margin and
/// quad-detection thresholds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Tag family to decode against.
    pub family: TagFamily,
    /// Maximum number of corrected payload bits. Clamped to the family's
    /// `max_correction_bits` at detector construction.
    pub max_hamming: u8,
    pub quad: QuadParams,
    pub decode: DecodeParams,
    /// Subpixel corner refinement after a successful decode.
    pub refine_corners: bool,
}

impl DetectorConfig {
    /// Reasonable defaults for the given family.
    pub fn new(family: TagFamily) -> Self {
        Self {
            family,
            max_hamming: 2,
            quad: QuadParams::default(),
            decode: DecodeParams::default(),
            refine_corners: true,
        }
    }
}
