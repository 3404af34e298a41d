use std::io;

use crate::bundle::SourceId;
use crate::name::IntoEntryNameError;

pub type Result<T> = std::result::Result<T, BundleError>;

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("Failed to read bundle source. Source: '{1}'")]
    SourceUnreadable(#[source] io::Error, SourceId),

    #[error("Corrupt bundle metadata. Source: '{1}'")]
    CorruptMetadata(#[source] io::Error, SourceId),

    #[error("Entry not found in bundle. Entry: '{1}', source: '{0}'")]
    EntryNotFound(SourceId, String),

    #[error("Could not convert to a valid entry name. Name: '{1}'")]
    InvalidEntryName(#[source] IntoEntryNameError, String),
}

impl BundleError {
    /// Classify an I/O failure raised while reading the header region.
    /// Malformed or truncated header bytes are corruption; anything else is
    /// a transport failure on the underlying source.
    pub(crate) fn metadata_error(origin: &SourceId, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
                BundleError::CorruptMetadata(e, origin.clone())
            }
            _ => BundleError::SourceUnreadable(e, origin.clone()),
        }
    }

    /// Classify an I/O failure raised in the entry region. A malformed or
    /// short entry means the source could not be fully read; the cached
    /// metadata and the rest of the bundle stay usable.
    pub(crate) fn read_error(origin: &SourceId, e: io::Error) -> Self {
        BundleError::SourceUnreadable(e, origin.clone())
    }
}
