use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use reqwest::Url;
use walkdir::WalkDir;

use crate::de;
use crate::error::{BundleError, Result};
use crate::name::{EntryName, IntoEntryNameError};
use crate::ser::Serialize;

use super::meta::BundleMetadata;
use super::source::{BundleSource, SourceId};

/// Name of the file holding the serialized header region inside an
/// unpacked bundle directory. Excluded from entry enumeration.
pub const METADATA_FILE_NAME: &str = ".bundle-meta";

/// Read facade over one bundle, whatever its origin.
///
/// A reader owns exactly one [`BundleSource`] and the [`BundleMetadata`]
/// parsed from it at construction time. The metadata is parsed once and
/// never re-derived; every entry access opens a fresh, independent stream
/// over the source, so a shared reader can serve concurrent callers.
pub struct BundleReader {
    origin: SourceId,
    source: BundleSource,
    meta: BundleMetadata,
}

impl fmt::Debug for BundleReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleReader")
            .field("origin", &self.origin)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

impl BundleReader {
    /// Open a bundle in lazy mode: the origin is reopened on every read.
    pub fn open(source: BundleSource) -> Result<BundleReader> {
        Self::open_with(source, false)
    }

    /// Open a bundle, choosing the caching policy.
    ///
    /// With `cache_bytes` a path or URL source is read once, in full, into
    /// an owned buffer, and the reader behaves exactly as if it had been
    /// constructed from those bytes. Without it, only the reference is
    /// stored and every stream request reopens the origin. Unpacked
    /// directories ignore the flag, since their entries are already
    /// discrete files.
    pub fn open_with(source: BundleSource, cache_bytes: bool) -> Result<BundleReader> {
        let origin = source.id();

        let source = if cache_bytes
            && matches!(source, BundleSource::Path(_) | BundleSource::Url(_))
        {
            let bytes = source
                .read_to_bytes()
                .map_err(|e| BundleError::read_error(&origin, e))?;
            BundleSource::Bytes(bytes)
        } else {
            source
        };

        let meta = match &source {
            BundleSource::Unpacked(dir) => read_directory_metadata(&origin, dir)?,
            source => {
                let mut stream = source
                    .open_stream()
                    .map_err(|e| BundleError::read_error(&origin, e))?;
                de::read_metadata(&mut stream)
                    .map_err(|e| BundleError::metadata_error(&origin, e))?
            }
        };

        Ok(BundleReader {
            origin,
            source,
            meta,
        })
    }

    /// Lazy-mode reader over a bundle file.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<BundleReader> {
        Self::open(BundleSource::path(path))
    }

    /// Lazy-mode reader over a bundle behind a URL.
    pub fn open_url(url: Url) -> Result<BundleReader> {
        Self::open(BundleSource::Url(url))
    }

    /// Reader over a defensive copy of the given bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<BundleReader> {
        Self::open(BundleSource::bytes(bytes))
    }

    /// Reader over an unpacked bundle directory.
    pub fn from_unpacked<P: AsRef<Path>>(dir: P) -> Result<BundleReader> {
        Self::open(BundleSource::unpacked(dir))
    }

    /// The metadata parsed when this reader was constructed.
    #[inline(always)]
    pub fn metadata(&self) -> &BundleMetadata {
        &self.meta
    }

    /// The identity of the origin this reader was constructed from.
    #[inline(always)]
    pub fn origin(&self) -> &SourceId {
        &self.origin
    }

    #[inline(always)]
    pub fn source(&self) -> &BundleSource {
        &self.source
    }

    /// Names of all entries: archive order for stream-backed sources,
    /// lexicographic file order for unpacked directories.
    pub fn entry_names(&self) -> Result<Vec<String>> {
        match &self.source {
            BundleSource::Unpacked(dir) => directory_entry_names(&self.origin, dir),
            _ => {
                let mut stream = self.open_positioned()?;
                let mut names = Vec::new();
                for _ in 0..self.meta.entry_count {
                    let entry = de::read_entry_header(&mut stream)
                        .map_err(|e| BundleError::read_error(&self.origin, e))?;
                    de::skip_bytes(&mut stream, entry.length)
                        .map_err(|e| BundleError::read_error(&self.origin, e))?;
                    names.push(entry.name);
                }
                Ok(names)
            }
        }
    }

    /// Open an independent stream over one entry's payload.
    ///
    /// The consumer owns interpretation of the bytes; this crate treats
    /// them as opaque. The stream is a scoped resource, released on drop.
    pub fn open_entry(&self, name: &str) -> Result<Box<dyn Read + Send + '_>> {
        match &self.source {
            BundleSource::Unpacked(dir) => {
                // The metadata file is not an entry, even by direct name.
                if name == METADATA_FILE_NAME {
                    return Err(BundleError::EntryNotFound(
                        self.origin.clone(),
                        name.to_string(),
                    ));
                }
                let path = entry_file_path(dir, name)?;
                match File::open(&path) {
                    Ok(file) => Ok(Box::new(BufReader::new(file))),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => Err(
                        BundleError::EntryNotFound(self.origin.clone(), name.to_string()),
                    ),
                    Err(e) => Err(BundleError::read_error(&self.origin, e)),
                }
            }
            _ => {
                let mut stream = self.open_positioned()?;
                for _ in 0..self.meta.entry_count {
                    let entry = de::read_entry_header(&mut stream)
                        .map_err(|e| BundleError::read_error(&self.origin, e))?;
                    if entry.name == name {
                        return Ok(Box::new(stream.take(entry.length)));
                    }
                    de::skip_bytes(&mut stream, entry.length)
                        .map_err(|e| BundleError::read_error(&self.origin, e))?;
                }
                Err(BundleError::EntryNotFound(
                    self.origin.clone(),
                    name.to_string(),
                ))
            }
        }
    }

    /// Read one entry's payload in full. Unlike [`BundleReader::open_entry`],
    /// the payload is checked against its recorded length, so a source
    /// truncated mid-entry is an error rather than a short buffer.
    pub fn read_entry(&self, name: &str) -> Result<Vec<u8>> {
        match &self.source {
            BundleSource::Unpacked(_) => {
                let mut stream = self.open_entry(name)?;
                let mut buf = Vec::new();
                stream
                    .read_to_end(&mut buf)
                    .map_err(|e| BundleError::read_error(&self.origin, e))?;
                Ok(buf)
            }
            _ => {
                let mut stream = self.open_positioned()?;
                for _ in 0..self.meta.entry_count {
                    let entry = de::read_entry_header(&mut stream)
                        .map_err(|e| BundleError::read_error(&self.origin, e))?;
                    if entry.name == name {
                        return read_payload(&self.origin, &mut stream, entry.length);
                    }
                    de::skip_bytes(&mut stream, entry.length)
                        .map_err(|e| BundleError::read_error(&self.origin, e))?;
                }
                Err(BundleError::EntryNotFound(
                    self.origin.clone(),
                    name.to_string(),
                ))
            }
        }
    }

    /// Read the named entries in one pass over the source.
    pub fn read_entries<I, S>(&self, names: I) -> Result<BTreeMap<String, Vec<u8>>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut wanted: BTreeSet<String> =
            names.into_iter().map(|n| n.as_ref().to_string()).collect();
        let mut out = BTreeMap::new();

        match &self.source {
            BundleSource::Unpacked(_) => {
                for name in std::mem::take(&mut wanted) {
                    out.insert(name.clone(), self.read_entry(&name)?);
                }
            }
            _ => {
                let mut stream = self.open_positioned()?;
                for _ in 0..self.meta.entry_count {
                    if wanted.is_empty() {
                        break;
                    }
                    let entry = de::read_entry_header(&mut stream)
                        .map_err(|e| BundleError::read_error(&self.origin, e))?;
                    if wanted.remove(&entry.name) {
                        let payload = read_payload(&self.origin, &mut stream, entry.length)?;
                        out.insert(entry.name, payload);
                    } else {
                        de::skip_bytes(&mut stream, entry.length)
                            .map_err(|e| BundleError::read_error(&self.origin, e))?;
                    }
                }
                if let Some(missing) = wanted.into_iter().next() {
                    return Err(BundleError::EntryNotFound(self.origin.clone(), missing));
                }
            }
        }

        Ok(out)
    }

    /// Read every entry in one pass over the source.
    pub fn read_all_entries(&self) -> Result<BTreeMap<String, Vec<u8>>> {
        match &self.source {
            BundleSource::Unpacked(_) => {
                let mut out = BTreeMap::new();
                for name in self.entry_names()? {
                    let payload = self.read_entry(&name)?;
                    out.insert(name, payload);
                }
                Ok(out)
            }
            _ => {
                let mut stream = self.open_positioned()?;
                let mut out = BTreeMap::new();
                for _ in 0..self.meta.entry_count {
                    let entry = de::read_entry_header(&mut stream)
                        .map_err(|e| BundleError::read_error(&self.origin, e))?;
                    let payload = read_payload(&self.origin, &mut stream, entry.length)?;
                    out.insert(entry.name, payload);
                }
                Ok(out)
            }
        }
    }

    /// Materialize the bundle as an unpacked directory: the metadata file
    /// plus one file per entry. Inverse of [`BundleReader::from_unpacked`].
    pub fn unpack<P: AsRef<Path>>(&self, dest: P) -> io::Result<()> {
        let dest = dest.as_ref();
        std::fs::create_dir_all(dest)?;

        let mut meta_file = BufWriter::new(File::create(dest.join(METADATA_FILE_NAME))?);
        self.meta.write(&mut meta_file)?;
        meta_file.flush()?;

        for (name, payload) in self.read_all_entries().map_err(io::Error::other)? {
            let name = EntryName::new(&name).map_err(|e| e.as_io_error())?;
            let path = dest.join(name.to_path_buf());
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, payload)?;
        }
        Ok(())
    }

    /// Open a fresh stream positioned at the first entry. The header region
    /// is skipped, not re-parsed; the cached metadata stays authoritative.
    fn open_positioned(&self) -> Result<Box<dyn Read + Send + '_>> {
        let mut stream = self
            .source
            .open_stream()
            .map_err(|e| BundleError::read_error(&self.origin, e))?;
        de::skip_header_region(&mut stream)
            .map_err(|e| BundleError::read_error(&self.origin, e))?;
        Ok(stream)
    }
}

// Length prefixes are untrusted input; the payload buffer grows only as
// bytes actually arrive, so a corrupt length cannot drive the allocation.
fn read_payload<R: Read>(origin: &SourceId, stream: &mut R, length: u64) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    let read = stream
        .take(length)
        .read_to_end(&mut payload)
        .map_err(|e| BundleError::read_error(origin, e))?;
    if read as u64 != length {
        return Err(BundleError::read_error(
            origin,
            crate::de::ParseError::Truncated {
                expected: length,
                read: read as u64,
            }
            .into(),
        ));
    }
    Ok(payload)
}

fn entry_file_path(dir: &Path, name: &str) -> Result<PathBuf> {
    let name = EntryName::new(name)
        .map_err(|e| BundleError::InvalidEntryName(e, name.to_string()))?;
    Ok(dir.join(name.to_path_buf()))
}

fn read_directory_metadata(origin: &SourceId, dir: &Path) -> Result<BundleMetadata> {
    let path = dir.join(METADATA_FILE_NAME);
    let file = File::open(path).map_err(|e| BundleError::read_error(origin, e))?;
    let mut reader = BufReader::new(file);
    de::read_metadata(&mut reader).map_err(|e| BundleError::metadata_error(origin, e))
}

fn directory_entry_names(origin: &SourceId, dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| BundleError::read_error(origin, io::Error::other(e)))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| BundleError::read_error(origin, io::Error::other(e)))?;
        if rel == Path::new(METADATA_FILE_NAME) {
            continue;
        }

        let mut parts = Vec::new();
        for component in rel.iter() {
            let part = component.to_str().ok_or_else(|| {
                BundleError::InvalidEntryName(
                    IntoEntryNameError::UnrepresentableChar,
                    rel.to_string_lossy().into_owned(),
                )
            })?;
            parts.push(part);
        }
        names.push(parts.join(crate::name::NAME_SEP));
    }
    Ok(names)
}
