//! Synthetic AprilTag rendering.
//!
//! This crate turns family codewords back into pixels: single-tag bitmaps
//! with a quiet zone, composed scenes with arbitrary perspective placement,
//! and PNG export. The detection pipeline's integration tests are built on
//! these fixtures.

mod error;
mod png_io;
mod render;
mod scene;

pub use error::RenderError;
pub use png_io::write_png;
pub use render::render_tag;
pub use scene::{corners_from_similarity, Scene};
