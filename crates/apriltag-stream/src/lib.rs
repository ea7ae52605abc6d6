//! Frame plumbing for live AprilTag detection.
//!
//! The camera side of the original system hands raw NV21 frames to the
//! detector and a colorspace converter once per frame. This crate carries
//! that boundary: borrowed [`YuvFrame`] views with luma extraction and
//! RGB conversion, a [`FramePool`] for buffer recycling, and a
//! [`DetectionWorker`] that decouples frame delivery from detection with a
//! bounded drop-oldest queue, so a slow detector can never stall the
//! producer.

mod error;
mod fps;
mod pool;
mod worker;
mod yuv;

pub use error::StreamError;
pub use fps::FpsCounter;
pub use pool::FramePool;
pub use worker::{DetectionWorker, Frame, FrameQueue, WorkerConfig, WorkerReport};
pub use yuv::YuvFrame;
