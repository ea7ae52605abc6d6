//! Scene composition for synthetic test fixtures.
//!
//! A `Scene` is a grayscale canvas into which tags are placed under
//! arbitrary 4-point (perspective) placements. Placement corners name the
//! positions of the tag's outer border corners, in tag order (TL, TR, BR,
//! BL); the white quiet zone is drawn around them.

use apriltag_core::{homography_from_4pt, sample_bilinear_u8, GrayImage};
use apriltag_families::TagFamily;
use nalgebra::Point2;

use crate::render::render_tag;
use crate::RenderError;

pub struct Scene {
    image: GrayImage,
}

impl Scene {
    pub fn new(width: usize, height: usize, background: u8) -> Self {
        Self {
            image: GrayImage::filled(width, height, background),
        }
    }

    /// Canvas view of the composed scene.
    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }

    /// Place one tag so its outer border corners land on `corners`
    /// (canvas coordinates, tag order TL/TR/BR/BL).
    pub fn place_tag(
        &mut self,
        family: TagFamily,
        id: u32,
        px_per_module: usize,
        corners: &[Point2<f32>; 4],
    ) -> Result<(), RenderError> {
        let tag = render_tag(family, id, px_per_module, 1)?;
        let m = px_per_module as f32;
        let b0 = m; // quiet zone is one module
        let b1 = m + family.total_dim() as f32 * m;
        let tag_pts = [
            Point2::new(b0, b0),
            Point2::new(b1, b0),
            Point2::new(b1, b1),
            Point2::new(b0, b1),
        ];

        let h = homography_from_4pt(corners, &tag_pts).ok_or(RenderError::DegeneratePlacement)?;
        let hinv = h.inverse().ok_or(RenderError::DegeneratePlacement)?;

        // Canvas bounding box of the full tag image (quiet zone included).
        let side = tag.width as f32;
        let outer = [
            Point2::new(0.0, 0.0),
            Point2::new(side, 0.0),
            Point2::new(side, side),
            Point2::new(0.0, side),
        ]
        .map(|p| hinv.apply(p));

        let (w, hgt) = (self.image.width, self.image.height);
        let x_lo = outer.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
        let x_hi = outer.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
        let y_lo = outer.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let y_hi = outer.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);

        let x0 = (x_lo.floor().max(0.0)) as usize;
        let y0 = (y_lo.floor().max(0.0)) as usize;
        let x1 = (x_hi.ceil().min(w as f32)) as usize;
        let y1 = (y_hi.ceil().min(hgt as f32)) as usize;

        let tag_view = tag.view();
        for y in y0..y1 {
            for x in x0..x1 {
                let p = h.apply(Point2::new(x as f32 + 0.5, y as f32 + 0.5));
                if p.x < 0.0 || p.y < 0.0 || p.x > side || p.y > side {
                    continue;
                }
                let v = sample_bilinear_u8(&tag_view, p.x - 0.5, p.y - 0.5, 255);
                self.image.data[y * w + x] = v;
            }
        }

        Ok(())
    }
}

/// Border corners for a tag of side `side_px` centered at `(cx, cy)`,
/// rotated by `theta` radians (clockwise on a y-down canvas).
pub fn corners_from_similarity(cx: f32, cy: f32, side_px: f32, theta: f32) -> [Point2<f32>; 4] {
    let h = side_px * 0.5;
    let base = [(-h, -h), (h, -h), (h, h), (-h, h)];
    let (s, c) = theta.sin_cos();
    base.map(|(x, y)| Point2::new(cx + x * c - y * s, cy + x * s + y * c))
}
