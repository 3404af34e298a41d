use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use reqwest::Url;

/// One concrete strategy for obtaining a byte stream over a bundle's
/// origin. The set is closed: adding an origin kind means extending the
/// match in every dispatch site, checked by the compiler.
#[derive(Debug, Clone)]
pub enum BundleSource {
    /// A bundle file on the local filesystem, reopened on every stream
    /// request.
    Path(PathBuf),
    /// A bundle behind a URL, re-fetched on every stream request.
    Url(Url),
    /// An owned, immutable copy of the bundle bytes.
    Bytes(Vec<u8>),
    /// A directory holding one file per entry plus the metadata file.
    Unpacked(PathBuf),
}

/// The identity of a bundle's origin, kept for diagnostics even after an
/// eagerly cached source has been collapsed into the bytes variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceId {
    Path(PathBuf),
    Url(Url),
    Memory,
    Directory(PathBuf),
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Path(path) => write!(f, "{}", path.display()),
            SourceId::Url(url) => write!(f, "{}", url),
            SourceId::Memory => f.write_str("<in-memory bytes>"),
            SourceId::Directory(path) => write!(f, "{}", path.display()),
        }
    }
}

impl BundleSource {
    pub fn path<P: AsRef<Path>>(path: P) -> BundleSource {
        BundleSource::Path(path.as_ref().to_path_buf())
    }

    pub fn url(url: Url) -> BundleSource {
        BundleSource::Url(url)
    }

    /// Copies the caller's bytes on entry, so later mutation of the
    /// original buffer cannot affect the bundle.
    pub fn bytes(bytes: &[u8]) -> BundleSource {
        BundleSource::Bytes(bytes.to_vec())
    }

    pub fn unpacked<P: AsRef<Path>>(dir: P) -> BundleSource {
        BundleSource::Unpacked(dir.as_ref().to_path_buf())
    }

    pub fn id(&self) -> SourceId {
        match self {
            BundleSource::Path(path) => SourceId::Path(path.clone()),
            BundleSource::Url(url) => SourceId::Url(url.clone()),
            BundleSource::Bytes(_) => SourceId::Memory,
            BundleSource::Unpacked(dir) => SourceId::Directory(dir.clone()),
        }
    }

    /// Open a fresh, independent, position-reset stream over the whole
    /// bundle. Every call yields a new handle; nothing is shared between
    /// streams, so concurrent callers do not interfere.
    ///
    /// Unpacked directories have no single archive stream, only per-entry
    /// files; asking for one is an error, not a panic.
    pub(crate) fn open_stream(&self) -> io::Result<Box<dyn Read + Send + '_>> {
        match self {
            BundleSource::Path(path) => {
                let file = File::open(path)?;
                Ok(Box::new(BufReader::new(file)))
            }
            BundleSource::Url(url) => open_url_stream(url),
            BundleSource::Bytes(bytes) => Ok(Box::new(Cursor::new(bytes.as_slice()))),
            BundleSource::Unpacked(dir) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!(
                    "unpacked bundle at {} has no single archive stream",
                    dir.display()
                ),
            )),
        }
    }

    /// Read the entire source into an owned buffer, for eager caching.
    pub(crate) fn read_to_bytes(&self) -> io::Result<Vec<u8>> {
        match self {
            BundleSource::Path(path) => std::fs::read(path),
            _ => {
                let mut buf = Vec::new();
                self.open_stream()?.read_to_end(&mut buf)?;
                Ok(buf)
            }
        }
    }
}

impl From<Vec<u8>> for BundleSource {
    fn from(bytes: Vec<u8>) -> Self {
        BundleSource::Bytes(bytes)
    }
}

fn open_url_stream(url: &Url) -> io::Result<Box<dyn Read + Send + 'static>> {
    if url.scheme().eq_ignore_ascii_case("file") {
        // A file URL has a potentially more efficient read path than the
        // generic one. Only a conversion or local I/O failure triggers the
        // fallback; the caller sees the same result either way.
        match local_file_fast_path(url) {
            Ok(file) => return Ok(Box::new(BufReader::new(file))),
            Err(e) => {
                tracing::debug!(%url, error = %e, "file URL fast path failed, using generic read");
            }
        }

        let path = file_url_fallback_path(url);
        let file = File::open(path)?;
        return Ok(Box::new(BufReader::new(file)));
    }

    let response = reqwest::blocking::get(url.clone())
        .and_then(|response| response.error_for_status())
        .map_err(io::Error::other)?;
    Ok(Box::new(response))
}

fn local_file_fast_path(url: &Url) -> io::Result<File> {
    let path = url.to_file_path().map_err(|()| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "URL is not convertible to a local path",
        )
    })?;
    File::open(path)
}

/// Generic interpretation of a file URL: the percent-decoded path
/// component, ignoring any host.
fn file_url_fallback_path(url: &Url) -> PathBuf {
    PathBuf::from(percent_decode(url.path()))
}

fn percent_decode(input: &str) -> String {
    fn hex_val(byte: u8) -> Option<u8> {
        (byte as char).to_digit(16).map(|v| v as u8)
    }

    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_decoding() {
        assert_eq!(percent_decode("/plain/path"), "/plain/path");
        assert_eq!(percent_decode("/with%20space"), "/with space");
        assert_eq!(percent_decode("/trailing%2"), "/trailing%2");
        assert_eq!(percent_decode("/not%zzhex"), "/not%zzhex");
    }

    #[cfg(unix)]
    #[test]
    fn fallback_path_ignores_host() {
        let url = Url::parse("file://some-host/tmp/repo%20dir/core.bundle").unwrap();
        assert!(url.to_file_path().is_err());
        assert_eq!(
            file_url_fallback_path(&url),
            PathBuf::from("/tmp/repo dir/core.bundle")
        );
    }

    #[test]
    fn bytes_are_copied_on_entry() {
        let mut original = vec![1u8, 2, 3, 4];
        let source = BundleSource::bytes(&original);
        original[0] = 0xff;

        let mut read_back = Vec::new();
        source
            .open_stream()
            .unwrap()
            .read_to_end(&mut read_back)
            .unwrap();
        assert_eq!(read_back, vec![1, 2, 3, 4]);
    }

    #[test]
    fn each_stream_is_position_reset() {
        let source = BundleSource::bytes(b"abcdef");
        for _ in 0..2 {
            let mut buf = Vec::new();
            source
                .open_stream()
                .unwrap()
                .read_to_end(&mut buf)
                .unwrap();
            assert_eq!(buf, b"abcdef");
        }
    }
}
