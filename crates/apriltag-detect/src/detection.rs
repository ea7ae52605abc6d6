use apriltag_core::Homography;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// One recognized tag instance within a single frame.
///
/// Detections are immutable value records: each call to
/// [`crate::Detector::detect`] produces a fresh, disjoint set, and nothing
/// persists across frames inside the detector.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Detection {
    /// Decoded tag id (after error correction), unique within the family.
    pub id: u32,
    /// Number of payload bits that had to be corrected.
    pub hamming: u8,
    /// Decoding confidence in `[0, 1]`: border blackness times codeword
    /// closeness.
    pub score: f32,
    /// Raw observed payload bits (row-major, black = 1), before correction.
    pub code: u64,
    /// Tag center in image coordinates (image of the tag-frame center under
    /// `h`, not the corner average).
    pub center: Point2<f32>,
    /// Outer border corners in image coordinates.
    ///
    /// Fixed winding: index 0 is the tag's own top-left corner, then
    /// top-right, bottom-right, bottom-left. The order is
    /// rotation-normalized, so a rotated view of the same tag yields the
    /// same physical corner at each index.
    pub corners: [Point2<f32>; 4],
    /// Homography mapping tag-local module coordinates to image pixels.
    ///
    /// Tag frame: the outer border spans `[0, dim + 2]` on both axes.
    pub h: Homography,
}
