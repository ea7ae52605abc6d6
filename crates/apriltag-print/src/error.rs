/// Errors returned by tag rendering and export.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("id {id} out of range for family {family} ({len} codes)")]
    IdOutOfRange {
        id: u32,
        family: &'static str,
        len: usize,
    },
    #[error("px_per_module must be >= 1")]
    ZeroScale,
    #[error("tag placement is degenerate (collinear or repeated corners)")]
    DegeneratePlacement,
    #[error("png encoding failed: {0}")]
    Png(#[from] png::EncodingError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
