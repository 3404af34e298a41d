use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use fastvlq::WriteVu64Ext;

use crate::bundle::BundleMetadata;
use crate::header::BundleHeader;

pub(crate) trait Serialize {
    fn write<W: Write>(&self, writer: &mut W) -> io::Result<()>;
}

impl Serialize for str {
    fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_vu64(self.len() as u64)?;
        writer.write_all(self.as_bytes())
    }
}

impl Serialize for [u8] {
    fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_vu64(self.len() as u64)?;
        writer.write_all(self)
    }
}

impl Serialize for BundleHeader {
    fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.magic_bytes)?;
        writer.write_u32::<LittleEndian>(self.version)?;
        writer.write_u64::<LittleEndian>(self.entry_count)
    }
}

impl Serialize for BundleMetadata {
    fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let header = BundleHeader {
            magic_bytes: *crate::header::MAGIC_BYTES,
            version: self.format_version,
            entry_count: self.entry_count,
        };
        header.write(writer)?;
        self.platform_version.write(writer)?;
        self.model_version.write(writer)
    }
}
