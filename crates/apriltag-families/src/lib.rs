//! AprilTag family codebooks and decoding utilities.
//!
//! This crate focuses on:
//! - embedded built-in families (compiled into the binary),
//! - matching observed payload codes against those families, with
//!   rotation search and Hamming-distance error correction.
//!
//! It does **not** perform quad detection or image sampling; see
//! `apriltag-detect` for the pipeline that produces payload codes.

pub mod builtins;
mod family;
mod matcher;

pub use family::TagFamily;
pub use matcher::{rotate_code_u64, Match, Matcher};
