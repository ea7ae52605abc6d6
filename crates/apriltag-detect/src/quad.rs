//! Candidate quadrilateral extraction from foreground components.
//!
//! The outer boundary of a dark tag blob is recovered as the convex hull of
//! its pixels; the quad corners are the 4 hull vertices maximizing the
//! enclosed area. Geometric filters reject components that cannot be tags.

use nalgebra::Point2;

use crate::config::QuadParams;
use crate::segment::Component;

/// Candidate quad with ordered corners (positive shoelace orientation,
/// arbitrary starting corner).
pub(crate) struct Quad {
    pub corners: [Point2<f32>; 4],
}

pub(crate) fn quad_from_component(comp: &Component, params: &QuadParams) -> Option<Quad> {
    let hull = convex_hull(comp.pixels.clone());
    if hull.len() < 4 {
        return None;
    }

    let idx = max_area_quad(&hull)?;
    let area2 = quad_area2(&hull, idx);
    let area = area2 as f32 * 0.5;
    if area < params.min_quad_area {
        return None;
    }

    // Fill: the component's pixel mass must roughly account for the hull
    // quad. A tag blob is at least its border ring; stray thin structures
    // fall below, hulls overshooting the mass fall above.
    let fill = comp.pixels.len() as f32 / area;
    if fill < params.min_fill || fill > params.max_fill {
        return None;
    }

    let mut corners = idx.map(|i| {
        let (x, y) = hull[i];
        Point2::new(x as f32, y as f32)
    });

    let mut min_side = f32::INFINITY;
    let mut max_side = 0.0_f32;
    for k in 0..4 {
        let d = corners[k] - corners[(k + 1) % 4];
        let len = d.norm();
        min_side = min_side.min(len);
        max_side = max_side.max(len);
    }
    if min_side < params.min_side_px || max_side > params.max_aspect * min_side {
        return None;
    }

    // Hull vertices are centers of boundary pixels; the physical boundary
    // sits half a pixel further out.
    let cx = corners.iter().map(|p| p.x).sum::<f32>() * 0.25;
    let cy = corners.iter().map(|p| p.y).sum::<f32>() * 0.25;
    for c in &mut corners {
        let d = *c - Point2::new(cx, cy);
        let n = d.norm();
        if n > 1e-6 {
            *c += d * (0.5 / n);
        }
    }

    Some(Quad { corners })
}

#[inline]
fn cross(o: (i32, i32), a: (i32, i32), b: (i32, i32)) -> i64 {
    let (ox, oy) = (o.0 as i64, o.1 as i64);
    let (ax, ay) = (a.0 as i64, a.1 as i64);
    let (bx, by) = (b.0 as i64, b.1 as i64);
    (ax - ox) * (by - oy) - (ay - oy) * (bx - ox)
}

/// Andrew's monotone chain. Returns strictly convex vertices in positive
/// shoelace order, which matches the tag corner convention (TL, TR, BR, BL
/// traversal on a y-down image).
fn convex_hull(mut pts: Vec<(i32, i32)>) -> Vec<(i32, i32)> {
    pts.sort_unstable();
    pts.dedup();
    let n = pts.len();
    if n <= 2 {
        return pts;
    }

    let mut hull: Vec<(i32, i32)> = Vec::with_capacity(2 * n);
    for &p in &pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0 {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

/// Twice the signed area of the quad formed by hull vertices `idx`.
fn quad_area2(hull: &[(i32, i32)], idx: [usize; 4]) -> i64 {
    let p = idx.map(|i| (hull[i].0 as i64, hull[i].1 as i64));
    let mut a2 = 0i64;
    for k in 0..4 {
        let (x0, y0) = p[k];
        let (x1, y1) = p[(k + 1) % 4];
        a2 += x0 * y1 - x1 * y0;
    }
    a2
}

/// Pick 4 hull vertices maximizing quad area: evenly spread seeds, then
/// coordinate-wise hill climbing. For near-quadrilateral hulls (the only
/// ones that survive decode) this reaches the true corners.
fn max_area_quad(hull: &[(i32, i32)]) -> Option<[usize; 4]> {
    let n = hull.len();
    if n < 4 {
        return None;
    }
    if n == 4 {
        return Some([0, 1, 2, 3]);
    }

    let mut idx = [0, n / 4, n / 2, 3 * n / 4];
    let mut best = quad_area2(hull, idx);

    for _ in 0..16 {
        let mut improved = false;
        for k in 0..4 {
            let prev = idx[(k + 3) % 4];
            let next = idx[(k + 1) % 4];
            let mut j = (prev + 1) % n;
            while j != next {
                if j != idx[k] {
                    let mut cand = idx;
                    cand[k] = j;
                    let a = quad_area2(hull, cand);
                    if a > best {
                        best = a;
                        idx = cand;
                        improved = true;
                    }
                }
                j = (j + 1) % n;
            }
        }
        if !improved {
            break;
        }
    }

    if best <= 0 {
        return None;
    }
    Some(idx)
}
