//! Subpixel corner refinement.
//!
//! Each quad edge is re-sampled: at several stations along the edge the
//! intensity profile is probed along the edge normal and the gradient peak
//! located with parabolic interpolation. A total-least-squares line is fit
//! per edge, and refined corners are the adjacent line intersections.
//!
//! Refinement is conservative: if any edge yields too few good stations, or
//! a refined corner strays from the original, the caller keeps the decoded
//! corners unchanged.

use apriltag_core::{sample_bilinear, GrayImageView};
use nalgebra::{Point2, Vector2};

const PROBE_HALF_RANGE: f32 = 1.5;
const PROBE_STEP: f32 = 0.25;
const MIN_GRADIENT: f32 = 12.0;
const MAX_CORNER_SHIFT: f32 = 2.0;

pub(crate) fn refine_quad_corners(
    img: &GrayImageView<'_>,
    corners: &[Point2<f32>; 4],
) -> Option<[Point2<f32>; 4]> {
    let mut lines = Vec::with_capacity(4);
    for k in 0..4 {
        lines.push(fit_edge_line(img, corners[k], corners[(k + 1) % 4])?);
    }

    let mut refined = [Point2::origin(); 4];
    for k in 0..4 {
        let p = intersect(&lines[(k + 3) % 4], &lines[k])?;
        if (p - corners[k]).norm() > MAX_CORNER_SHIFT {
            return None;
        }
        refined[k] = p;
    }
    Some(refined)
}

#[derive(Clone, Copy, Debug)]
struct Line {
    point: Point2<f32>,
    dir: Vector2<f32>,
}

fn fit_edge_line(img: &GrayImageView<'_>, a: Point2<f32>, b: Point2<f32>) -> Option<Line> {
    let e = b - a;
    let len = e.norm();
    if len < 4.0 {
        return None;
    }
    let dir = e / len;
    let normal = Vector2::new(-dir.y, dir.x);

    let stations = ((len / 4.0) as usize).clamp(4, 12);
    let mut pts: Vec<Point2<f32>> = Vec::with_capacity(stations);

    for i in 0..stations {
        // middle 70% of the edge; corners themselves are unreliable
        let t = 0.15 + 0.7 * (i as f32 + 0.5) / stations as f32;
        let base = a + e * t;
        if let Some(offset) = edge_offset_along_normal(img, base, normal) {
            pts.push(base + normal * offset);
        }
    }

    if pts.len() < stations / 2 || pts.len() < 3 {
        return None;
    }
    fit_line_tls(&pts)
}

/// Locate the intensity transition along `normal` around `base`, as a signed
/// offset in pixels. Gradient-peak search with parabolic interpolation.
fn edge_offset_along_normal(
    img: &GrayImageView<'_>,
    base: Point2<f32>,
    normal: Vector2<f32>,
) -> Option<f32> {
    let n = (2.0 * PROBE_HALF_RANGE / PROBE_STEP) as usize + 1;
    let mut profile = Vec::with_capacity(n);
    for i in 0..n {
        let off = -PROBE_HALF_RANGE + i as f32 * PROBE_STEP;
        let p = base + normal * off;
        profile.push(sample_bilinear(img, p.x, p.y, 127));
    }

    // absolute gradient peak over the profile
    let mut best_i = 0usize;
    let mut best_g = 0.0f32;
    for i in 1..n - 1 {
        let g = (profile[i + 1] - profile[i - 1]).abs() * 0.5;
        if g > best_g {
            best_g = g;
            best_i = i;
        }
    }
    if best_g < MIN_GRADIENT || best_i == 0 || best_i + 1 >= n {
        return None;
    }

    let g = |i: usize| (profile[i + 1] - profile[i - 1]).abs() * 0.5;
    let (gm, g0, gp) = (
        if best_i >= 2 { g(best_i - 1) } else { 0.0 },
        g(best_i),
        if best_i + 2 < n { g(best_i + 1) } else { 0.0 },
    );
    let denom = gm - 2.0 * g0 + gp;
    let sub = if denom.abs() > 1e-6 {
        (0.5 * (gm - gp) / denom).clamp(-0.5, 0.5)
    } else {
        0.0
    };

    Some(-PROBE_HALF_RANGE + (best_i as f32 + sub) * PROBE_STEP)
}

/// Total-least-squares line through a point set (principal direction of the
/// centered covariance).
fn fit_line_tls(pts: &[Point2<f32>]) -> Option<Line> {
    let n = pts.len() as f32;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for p in pts {
        cx += p.x;
        cy += p.y;
    }
    cx /= n;
    cy /= n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for p in pts {
        let dx = p.x - cx;
        let dy = p.y - cy;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    let theta = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    let dir = Vector2::new(theta.cos(), theta.sin());
    if !dir.x.is_finite() || !dir.y.is_finite() {
        return None;
    }
    Some(Line {
        point: Point2::new(cx, cy),
        dir,
    })
}

fn intersect(l0: &Line, l1: &Line) -> Option<Point2<f32>> {
    let denom = l0.dir.x * l1.dir.y - l0.dir.y * l1.dir.x;
    if denom.abs() < 1e-6 {
        return None;
    }
    let d = l1.point - l0.point;
    let t = (d.x * l1.dir.y - d.y * l1.dir.x) / denom;
    Some(l0.point + l0.dir * t)
}
