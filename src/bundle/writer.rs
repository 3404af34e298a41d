use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::header::ENTRY_COUNT_OFFSET;
use crate::name::EntryName;
use crate::ser::Serialize;

use super::meta::BundleMetadata;

/// Writes a bundle: the header region up front, then entries as they are
/// inserted. The entry count is patched in place by [`BundleWriter::finish`],
/// so the sink must be seekable.
pub struct BundleWriter<W: Write + Seek> {
    dest: W,
    entry_count: u64,
    finished: bool,
}

impl BundleWriter<BufWriter<File>> {
    /// Create a new bundle file, erroring if the file already exists.
    pub fn create<P: AsRef<Path>>(path: P, meta: BundleMetadata) -> io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path.as_ref())?;
        Self::new(BufWriter::new(file), meta)
    }
}

impl<W: Write + Seek> BundleWriter<W> {
    /// Start a bundle on any seekable sink. The header region is written
    /// immediately, with a zero entry count.
    pub fn new(mut dest: W, meta: BundleMetadata) -> io::Result<Self> {
        let meta = BundleMetadata {
            entry_count: 0,
            ..meta
        };
        meta.write(&mut dest)?;
        Ok(BundleWriter {
            dest,
            entry_count: 0,
            finished: false,
        })
    }

    /// Append one entry. The payload is buffered in memory to learn its
    /// length before the length-prefixed write.
    pub fn insert<R: Read>(&mut self, name: EntryName, data: &mut R) -> io::Result<()> {
        let mut payload = Vec::new();
        data.read_to_end(&mut payload)?;

        name.as_str().write(&mut self.dest)?;
        payload.as_slice().write(&mut self.dest)?;
        self.entry_count += 1;

        tracing::debug!(%name, bytes = payload.len(), "inserted entry");
        Ok(())
    }

    fn finish_inner(&mut self) -> io::Result<u64> {
        let end = self.dest.stream_position()?;
        self.dest.seek(SeekFrom::Start(ENTRY_COUNT_OFFSET))?;
        self.dest.write_u64::<LittleEndian>(self.entry_count)?;
        self.dest.seek(SeekFrom::Start(end))?;
        self.dest.flush()?;
        self.finished = true;
        Ok(end)
    }

    /// Patch the entry count into the header and flush. Returns the total
    /// number of bytes written.
    pub fn finish(mut self) -> io::Result<u64> {
        self.finish_inner()
    }
}

impl<W: Write + Seek> Drop for BundleWriter<W> {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.finish_inner();
        }
    }
}
