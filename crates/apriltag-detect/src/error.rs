/// Errors returned by the detector for malformed input.
///
/// "No tags found" is not an error; `detect` returns an empty vector.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("image has a zero dimension ({width}x{height})")]
    EmptyImage { width: usize, height: usize },
    #[error("image buffer too small: {width}x{height} needs {expected} bytes, got {actual}")]
    BufferTooSmall {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
}
