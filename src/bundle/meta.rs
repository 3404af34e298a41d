use crate::header::VERSION;

/// The fixed metadata record at the front of every bundle.
///
/// Parsed once when a bundle is opened and cached for the life of the
/// reader; parsing the same bytes through any source variant yields an
/// identical value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleMetadata {
    /// Container format version, from the header.
    pub(crate) format_version: u32,

    /// Version of the platform that compiled the contained modules.
    pub(crate) platform_version: String,

    /// Version of the model serialization the entries use.
    pub(crate) model_version: String,

    /// Number of entries recorded in the header. Informational for
    /// unpacked directories, where the files on disk are authoritative.
    pub(crate) entry_count: u64,
}

impl BundleMetadata {
    pub fn new<P: Into<String>, M: Into<String>>(platform_version: P, model_version: M) -> Self {
        BundleMetadata {
            format_version: VERSION,
            platform_version: platform_version.into(),
            model_version: model_version.into(),
            entry_count: 0,
        }
    }

    #[inline(always)]
    pub fn format_version(&self) -> u32 {
        self.format_version
    }

    #[inline(always)]
    pub fn platform_version(&self) -> &str {
        &self.platform_version
    }

    #[inline(always)]
    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    #[inline(always)]
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }
}
