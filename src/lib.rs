//! Herein lies the bundle format: binary archives of precompiled module
//! repositories, loadable from a file, a URL, an in-memory buffer or an
//! already-unpacked directory through one read interface.
//!
//! Use [BundleReader][BundleReader] to read bundles, and
//! [BundleWriter][BundleWriter] to write them.
//!
//! ```no_run
//! use bundle_format::BundleReader;
//!
//! fn main() -> bundle_format::Result<()> {
//!     let bundle = BundleReader::open_path("platform-core.bundle")?;
//!     println!("platform {}", bundle.metadata().platform_version());
//!     for name in bundle.entry_names()? {
//!         let bytes = bundle.read_entry(&name)?;
//!         println!("{}: {} bytes", name, bytes.len());
//!     }
//!     Ok(())
//! }
//! ```

mod bundle;
mod de;
mod error;
mod header;
pub mod name;
mod ser;

pub use bundle::{
    BundleMetadata, BundleReader, BundleSource, BundleWriter, SourceId, METADATA_FILE_NAME,
};
pub use de::ParseError;
pub use error::{BundleError, Result};
pub use header::VERSION;
pub use name::EntryName;

/// The URL type accepted by [`BundleReader::open_url`], re-exported for
/// convenience.
pub use reqwest::Url;
