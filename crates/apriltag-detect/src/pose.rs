//! Tag pose recovery from the detection homography and camera intrinsics.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::detection::Detection;

/// Pinhole camera intrinsics (no distortion model).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

/// Rigid transform from the tag frame to the camera frame.
///
/// Tag frame: origin at the tag center, x right, y down (matching image
/// axes for an upright view), z out of the tag toward the camera;
/// `translation` is in the same units as `tag_size`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TagPose {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

/// Recover the tag pose from a detection.
///
/// `tag_size` is the physical side length of the outer black border.
/// Returns `None` when the homography is numerically degenerate.
pub fn estimate_pose(
    det: &Detection,
    intrinsics: &CameraIntrinsics,
    tag_size: f64,
) -> Option<TagPose> {
    if !(tag_size > 0.0) {
        return None;
    }

    // Detection homography maps tag module coords [0, s]^2 to pixels; re-base
    // it to metric tag-plane coords centered on the tag.
    let side_modules = module_side_from_detection(det)?;
    let scale = side_modules / tag_size;
    let to_modules = Matrix3::new(
        scale,
        0.0,
        side_modules * 0.5,
        0.0,
        scale,
        side_modules * 0.5,
        0.0,
        0.0,
        1.0,
    );
    let h_metric = det.h.h * to_modules;

    let k_inv = Matrix3::new(
        1.0 / intrinsics.fx,
        0.0,
        -intrinsics.cx / intrinsics.fx,
        0.0,
        1.0 / intrinsics.fy,
        -intrinsics.cy / intrinsics.fy,
        0.0,
        0.0,
        1.0,
    );

    let m = k_inv * h_metric;
    let v1 = m.column(0).into_owned();
    let v2 = m.column(1).into_owned();
    let v3 = m.column(2).into_owned();

    let n1 = v1.norm();
    let n2 = v2.norm();
    if n1 < 1e-12 || n2 < 1e-12 {
        return None;
    }
    let lambda = 2.0 / (n1 + n2);

    let mut r1 = v1 * lambda;
    let mut r2 = v2 * lambda;
    let mut t = v3 * lambda;

    // Camera looks down +z; the tag must be in front of it.
    if t.z < 0.0 {
        r1 = -r1;
        r2 = -r2;
        t = -t;
    }

    let r3 = r1.cross(&r2);
    let r_approx = Matrix3::from_columns(&[r1, r2, r3]);

    // Project onto the closest true rotation.
    let svd = r_approx.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;
    let det_uv = (u * v_t).determinant();
    let fix = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, det_uv.signum()));
    let rotation = u * fix * v_t;

    Some(TagPose {
        rotation,
        translation: t,
    })
}

/// Tag side length in module units, recovered from the detection's family
/// grid: the homography maps `[0, side]^2`, and `corners` are its images of
/// the corner points, so side = preimage extent. The detection stores no
/// family handle, but the homography's preimage of corner 1 is `(side, 0)`.
fn module_side_from_detection(det: &Detection) -> Option<f64> {
    let hinv = det.h.inverse()?;
    let p = hinv.apply(det.corners[1]);
    let side = p.x as f64;
    if side.is_finite() && side > 0.0 {
        Some(side)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apriltag_core::homography_from_4pt;
    use nalgebra::Point2;

    fn project(
        intr: &CameraIntrinsics,
        r: &Matrix3<f64>,
        t: &Vector3<f64>,
        p_tag: Vector3<f64>,
    ) -> Point2<f32> {
        let pc = r * p_tag + t;
        Point2::new(
            (intr.fx * pc.x / pc.z + intr.cx) as f32,
            (intr.fy * pc.y / pc.z + intr.cy) as f32,
        )
    }

    fn detection_for_pose(
        intr: &CameraIntrinsics,
        r: &Matrix3<f64>,
        t: &Vector3<f64>,
        tag_size: f64,
        side_modules: f32,
    ) -> Detection {
        let hs = tag_size * 0.5;
        let metric = [
            Vector3::new(-hs, -hs, 0.0),
            Vector3::new(hs, -hs, 0.0),
            Vector3::new(hs, hs, 0.0),
            Vector3::new(-hs, hs, 0.0),
        ];
        let corners = metric.map(|p| project(intr, r, t, p));
        let s = side_modules;
        let tag_pts = [
            Point2::new(0.0, 0.0),
            Point2::new(s, 0.0),
            Point2::new(s, s),
            Point2::new(0.0, s),
        ];
        let h = homography_from_4pt(&tag_pts, &corners).expect("homography");
        let center = h.apply(Point2::new(s * 0.5, s * 0.5));
        Detection {
            id: 0,
            hamming: 0,
            score: 1.0,
            code: 0,
            center,
            corners,
            h,
        }
    }

    #[test]
    fn recovers_frontal_pose() {
        let intr = CameraIntrinsics {
            fx: 600.0,
            fy: 600.0,
            cx: 320.0,
            cy: 240.0,
        };
        let r = Matrix3::identity();
        let t = Vector3::new(0.1, -0.05, 1.5);
        let det = detection_for_pose(&intr, &r, &t, 0.16, 8.0);

        let pose = estimate_pose(&det, &intr, 0.16).expect("pose");
        assert!((pose.translation - t).norm() < 1e-3, "{:?}", pose.translation);
        assert!((pose.rotation - r).norm() < 1e-3);
    }

    #[test]
    fn recovers_tilted_pose() {
        let intr = CameraIntrinsics {
            fx: 500.0,
            fy: 520.0,
            cx: 310.0,
            cy: 250.0,
        };
        // 25 degrees about the y axis.
        let a = 25.0_f64.to_radians();
        let r = Matrix3::new(
            a.cos(),
            0.0,
            a.sin(),
            0.0,
            1.0,
            0.0,
            -a.sin(),
            0.0,
            a.cos(),
        );
        let t = Vector3::new(-0.08, 0.02, 0.9);
        let det = detection_for_pose(&intr, &r, &t, 0.1, 10.0);

        let pose = estimate_pose(&det, &intr, 0.1).expect("pose");
        assert!((pose.translation - t).norm() < 1e-2);
        let rt = pose.rotation.transpose() * pose.rotation;
        assert!((rt - Matrix3::identity()).norm() < 1e-6, "not orthonormal");
        assert!((pose.rotation - r).norm() < 1e-2);
    }

    #[test]
    fn zero_tag_size_is_rejected() {
        let intr = CameraIntrinsics {
            fx: 600.0,
            fy: 600.0,
            cx: 320.0,
            cy: 240.0,
        };
        let det = detection_for_pose(&intr, &Matrix3::identity(), &Vector3::new(0.0, 0.0, 1.0), 0.16, 8.0);
        assert!(estimate_pose(&det, &intr, 0.0).is_none());
    }
}
