//! Core types and utilities for AprilTag detection.
//!
//! This crate is intentionally small: grayscale image views, bilinear
//! sampling, and planar homographies. It does *not* know anything about tag
//! families or the detection pipeline.

mod homography;
mod image;
mod logger;

pub use homography::{homography_from_4pt, warp_perspective_gray, Homography};
pub use image::{get_gray, sample_bilinear, sample_bilinear_u8, GrayImage, GrayImageView};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
