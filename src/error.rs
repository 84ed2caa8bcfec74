use std::path::PathBuf;

use crate::exif::Segment;

/// Errors returned by the metadata codec and the editor.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The given path does not exist or is not a regular file.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The raw metadata bytes are missing or do not form a valid EXIF block.
    #[error("failed to decode EXIF metadata: {0}")]
    MetadataDecodeError(String),

    /// A field value does not have a type its tag accepts.
    #[error("unsupported value type for {segment} tag {tag:#06x}: expected {expected}, found {found}")]
    UnsupportedFieldType {
        segment: Segment,
        tag: u16,
        expected: String,
        found: &'static str,
    },

    /// The file is not a container this crate can rewrite.
    #[error("unsupported image format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The file looks like a supported container but could not be parsed.
    #[error("invalid image {}: {reason}", path.display())]
    InvalidImage { path: PathBuf, reason: String },

    /// The encoded block does not fit in the container's metadata region.
    #[error("encoded EXIF block is {size} bytes, the container allows at most {max}")]
    MetadataTooLarge { size: usize, max: usize },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        Self::MetadataDecodeError(reason.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
