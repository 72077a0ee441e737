//! Error type for the extraction pipeline.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Every way an extraction can fail. Callers get either a complete palette
/// or one of these, never a partial result.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The image file could not be opened or read.
    #[error("cannot read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not a supported or valid image.
    #[error("cannot decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("invalid color count {requested}: must be between 1 and {max}", max = crate::MAX_COLORS)]
    InvalidColorCount { requested: usize },

    /// More clusters were requested than there are pixels left after downsampling.
    #[error("cannot find {requested} colors among {available} pixels")]
    TooFewPixels { requested: usize, available: usize },

    #[error("image has no pixels")]
    EmptyImage,
}

impl ExtractionError {
    /// Whether picking another file is the only remedy, as opposed to
    /// retrying the same file with different options.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ExtractionError::Read { .. } | ExtractionError::Decode(_) | ExtractionError::EmptyImage
        )
    }
}
