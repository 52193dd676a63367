// isocdmak/src/iso/iso_writer.rs
use std::io::{self, Read, Write};

use crate::error::{BuildError, Result};
use crate::iso::dir_record::{IsoDirEntry, RecordCursor, RecordForm};
use crate::iso::fs_node::IsoEntry;
use crate::iso::path_table::{PathTableEndian, generate_path_table};
use crate::progress::CancelToken;
use crate::source_fs::SourceFs;
use crate::utils::{
    COPY_CHUNK_SIZE, ISO_SECTOR_SIZE, SYSTEM_AREA_SECTORS, TRAILING_PAD_SECTORS, align_to_sector,
    pad_to_sector, write_zeros,
};

/// Forward-only image sink that counts bytes and checksums everything written.
pub struct ImageWriter<W: Write> {
    inner: W,
    hasher: crc32fast::Hasher,
    written: u64,
}

impl<W: Write> ImageWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: crc32fast::Hasher::new(),
            written: 0,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Sector the next byte lands in.
    pub fn current_sector(&self) -> u64 {
        self.written / ISO_SECTOR_SIZE as u64
    }

    /// CRC-32 of everything written so far.
    pub fn checksum(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for ImageWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

pub fn write_system_area<W: Write + ?Sized>(out: &mut W) -> io::Result<()> {
    write_zeros(out, SYSTEM_AREA_SECTORS as u64 * ISO_SECTOR_SIZE as u64)
}

/// Writes the big-endian path table followed by the little-endian one.
pub fn write_path_tables<W: Write + ?Sized>(out: &mut W, entries: &[IsoEntry]) -> io::Result<()> {
    out.write_all(&generate_path_table(entries, PathTableEndian::Big))?;
    out.write_all(&generate_path_table(entries, PathTableEndian::Little))?;
    Ok(())
}

/// Writes the trademark resource, zero-filled to a whole sector.
/// An empty resource still takes one zeroed sector.
pub fn write_trademark<W: Write + ?Sized>(out: &mut W, data: &[u8]) -> io::Result<()> {
    let len = data.len() as u64;
    out.write_all(data)?;
    write_zeros(out, align_to_sector(len) - len)
}

/// Writes the records of one directory: ".", "..", then every child.
///
/// Records are placed with the same cursor the layout used to size the
/// directory, so the written length always equals its sector-aligned size.
pub fn write_directory<W: Write + ?Sized>(
    out: &mut W,
    entries: &[IsoEntry],
    dir: &IsoEntry,
) -> io::Result<()> {
    let parent = &entries[dir.parent_index];
    out.write_all(&IsoDirEntry::new(dir, RecordForm::SelfRef).to_bytes())?;
    out.write_all(&IsoDirEntry::new(parent, RecordForm::ParentRef).to_bytes())?;

    let mut cursor = RecordCursor::new();
    for child in &entries[dir.children.clone()] {
        let record = IsoDirEntry::new(child, RecordForm::Normal);
        let padding = cursor.place(record.record_len());
        write_zeros(out, padding as u64)?;
        out.write_all(&record.to_bytes())?;
    }
    pad_to_sector(out, cursor.total())
}

/// Copies a file's bytes into the image in fixed-size chunks.
///
/// Cancellation is checked after every chunk. Exactly `file.size` bytes are
/// copied; a source that ends early fails with `SourceChanged`. An empty file
/// still takes one zeroed sector.
pub fn copy_file<W, F>(out: &mut W, fs: &F, file: &IsoEntry, cancel: &CancelToken) -> Result<()>
where
    W: Write + ?Sized,
    F: SourceFs + ?Sized,
{
    if file.size == 0 {
        write_zeros(out, ISO_SECTOR_SIZE as u64)?;
        return Ok(());
    }

    let mut source = fs.open(&file.path)?.take(file.size);
    let mut buffer = vec![0u8; COPY_CHUNK_SIZE.min(file.size as usize)];
    let mut remaining = file.size;
    while remaining > 0 {
        let n = read_chunk(&mut source, &mut buffer)?;
        if n == 0 {
            return Err(BuildError::SourceChanged(file.path.clone()));
        }
        out.write_all(&buffer[..n])?;
        remaining -= n as u64;
        cancel.check()?;
    }

    pad_to_sector(out, file.size)?;
    Ok(())
}

/// Fills `buffer` as far as the source allows. Returns bytes read.
fn read_chunk<R: Read + ?Sized>(source: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match source.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

pub fn write_trailing_pad<W: Write + ?Sized>(out: &mut W) -> io::Result<()> {
    write_zeros(out, TRAILING_PAD_SECTORS as u64 * ISO_SECTOR_SIZE as u64)
}
