#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BundleHeader {
    pub(crate) magic_bytes: [u8; 4],
    pub(crate) version: u32,
    pub(crate) entry_count: u64,
}

// Make some attempt to not accidentally load plain text files,
// and also make it break almost immediately in any UTF-8 compliant text parser.
pub(crate) const MAGIC_BYTES: &[u8; 4] = b"\xffBDL";

pub const VERSION: u32 = 1;

/// Byte offset of the entry count field, so the writer can patch it in place
/// once the number of entries is known.
pub(crate) const ENTRY_COUNT_OFFSET: u64 = 8;

impl BundleHeader {
    pub(crate) fn new(entry_count: u64) -> BundleHeader {
        BundleHeader {
            magic_bytes: *MAGIC_BYTES,
            version: VERSION,
            entry_count,
        }
    }
}

impl Default for BundleHeader {
    fn default() -> Self {
        BundleHeader::new(0)
    }
}
