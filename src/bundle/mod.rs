pub(crate) mod meta;
mod reader;
mod source;
mod writer;

pub use self::meta::BundleMetadata;
pub use self::reader::{BundleReader, METADATA_FILE_NAME};
pub use self::source::{BundleSource, SourceId};
pub use self::writer::BundleWriter;
