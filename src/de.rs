use std::io::{self, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use fastvlq::ReadVu64Ext;

use crate::bundle::BundleMetadata;
use crate::header::{BundleHeader, MAGIC_BYTES, VERSION};

/// Upper bound for length-prefixed strings (entry names, version fields).
/// Anything larger is assumed to be garbage rather than a real bundle.
const MAX_STRING_LEN: u64 = 64 * 1024;

/// Error type for decoding the structured regions of a bundle.
#[derive(Debug)]
pub enum ParseError {
    /// The stream does not start with the bundle magic bytes.
    BadMagic([u8; 4]),
    /// The format version is zero or newer than this crate understands.
    UnsupportedVersion(u32),
    /// A length-prefixed string was not valid UTF-8.
    InvalidUtf8,
    /// A length prefix exceeds the sanity bound for strings.
    StringTooLong(u64),
    /// The stream ended before a length-prefixed region was complete.
    Truncated { expected: u64, read: u64 },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::BadMagic(magic) => write!(f, "bad magic bytes: {:02x?}", magic),
            ParseError::UnsupportedVersion(v) => write!(f, "unsupported format version: {}", v),
            ParseError::InvalidUtf8 => write!(f, "invalid UTF-8 in string"),
            ParseError::StringTooLong(len) => write!(f, "string length {} exceeds limit", len),
            ParseError::Truncated { expected, read } => {
                write!(f, "stream ended after {} of {} bytes", read, expected)
            }
        }
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for io::Error {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::Truncated { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, e),
            ParseError::BadMagic(_)
            | ParseError::UnsupportedVersion(_)
            | ParseError::InvalidUtf8
            | ParseError::StringTooLong(_) => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}

/// Name and payload length of one entry, read from the stream position
/// immediately preceding the payload bytes.
#[derive(Debug)]
pub(crate) struct EntryHeader {
    pub(crate) name: String,
    pub(crate) length: u64,
}

pub(crate) fn read_string<R: Read>(reader: &mut R) -> io::Result<String> {
    let len = reader.read_vu64()?;
    if len > MAX_STRING_LEN {
        return Err(ParseError::StringTooLong(len).into());
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|_| ParseError::InvalidUtf8.into())
}

fn skip_string<R: Read>(reader: &mut R) -> io::Result<()> {
    let len = reader.read_vu64()?;
    if len > MAX_STRING_LEN {
        return Err(ParseError::StringTooLong(len).into());
    }
    skip_bytes(reader, len)
}

pub(crate) fn read_header<R: Read>(reader: &mut R) -> io::Result<BundleHeader> {
    let mut magic_bytes = [0u8; 4];
    reader.read_exact(&mut magic_bytes)?;
    if &magic_bytes != MAGIC_BYTES {
        return Err(ParseError::BadMagic(magic_bytes).into());
    }

    let version = reader.read_u32::<LittleEndian>()?;
    if version == 0 || version > VERSION {
        return Err(ParseError::UnsupportedVersion(version).into());
    }

    let entry_count = reader.read_u64::<LittleEndian>()?;

    tracing::debug!(version, entry_count, "deserialized BundleHeader");

    Ok(BundleHeader {
        magic_bytes,
        version,
        entry_count,
    })
}

/// Read the whole header region: fixed header plus version strings. Leaves
/// the stream positioned at the first entry.
pub(crate) fn read_metadata<R: Read>(reader: &mut R) -> io::Result<BundleMetadata> {
    let header = read_header(reader)?;
    let platform_version = read_string(reader)?;
    let model_version = read_string(reader)?;

    tracing::debug!(
        %platform_version,
        %model_version,
        "deserialized BundleMetadata"
    );

    Ok(BundleMetadata {
        format_version: header.version,
        platform_version,
        model_version,
        entry_count: header.entry_count,
    })
}

/// Skip past the header region without rebuilding metadata, leaving the
/// stream positioned at the first entry. The header was already validated
/// when the bundle was opened.
pub(crate) fn skip_header_region<R: Read>(reader: &mut R) -> io::Result<()> {
    read_header(reader)?;
    skip_string(reader)?;
    skip_string(reader)
}

pub(crate) fn read_entry_header<R: Read>(reader: &mut R) -> io::Result<EntryHeader> {
    let name = read_string(reader)?;
    let length = reader.read_vu64()?;

    tracing::debug!(%name, length, "deserialized EntryHeader");

    Ok(EntryHeader { name, length })
}

pub(crate) fn skip_bytes<R: Read>(reader: &mut R, count: u64) -> io::Result<()> {
    let read = io::copy(&mut reader.take(count), &mut io::sink())?;
    if read != count {
        return Err(ParseError::Truncated {
            expected: count,
            read,
        }
        .into());
    }
    Ok(())
}
