/// Errors for frame validation and worker lifecycle.
#[derive(thiserror::Error, Debug)]
pub enum StreamError {
    #[error("frame has a zero dimension ({width}x{height})")]
    EmptyFrame { width: usize, height: usize },
    #[error("NV21 requires even dimensions, got {width}x{height}")]
    OddDimensions { width: usize, height: usize },
    #[error("frame buffer too small: {width}x{height} NV21 needs {expected} bytes, got {actual}")]
    BufferTooSmall {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
    #[error("rgb output buffer too small: needs {expected} bytes, got {actual}")]
    OutputTooSmall { expected: usize, actual: usize },
}
