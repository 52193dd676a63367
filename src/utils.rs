// isocdmak/src/utils.rs

pub const ISO_SECTOR_SIZE: usize = 2048;

/// Sectors reserved for the system area at the start of every image.
pub const SYSTEM_AREA_SECTORS: u32 = 16;

/// Sectors of zeroes appended after the last entry (64 KiB).
pub const TRAILING_PAD_SECTORS: u32 = 32;

/// Chunk size used when copying file payloads into the image.
pub const COPY_CHUNK_SIZE: usize = 1024 * 1024;

use std::io::{self, Read, Write};

/// Rounds `size` up to a whole number of sectors, in bytes.
/// Empty data still occupies one sector.
pub fn align_to_sector(size: u64) -> u64 {
    sectors_for(size) as u64 * ISO_SECTOR_SIZE as u64
}

/// Number of sectors needed to store `size` bytes. Never returns zero.
pub fn sectors_for(size: u64) -> u32 {
    if size == 0 {
        return 1;
    }
    size.div_ceil(ISO_SECTOR_SIZE as u64) as u32
}

/// Writes `count` zero bytes to the sink.
pub fn write_zeros<W: Write + ?Sized>(out: &mut W, count: u64) -> io::Result<()> {
    if count > 0 {
        io::copy(&mut io::repeat(0).take(count), out)?;
    }
    Ok(())
}

/// Zero-fills from `used` bytes into the current sector up to the next boundary.
pub fn pad_to_sector<W: Write + ?Sized>(out: &mut W, used: u64) -> io::Result<()> {
    let remainder = used % ISO_SECTOR_SIZE as u64;
    if remainder != 0 {
        write_zeros(out, ISO_SECTOR_SIZE as u64 - remainder)?;
    }
    Ok(())
}

/// Encodes text as Latin-1. Characters outside U+0000..=U+00FF become `?`.
pub fn latin1_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Uppercases Latin-1 bytes one character at a time.
///
/// A character is only replaced when its uppercase form is a single Latin-1
/// character, so the output always has the same length as the input.
pub fn latin1_uppercase(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .map(|&b| {
            let mut upper = char::from(b).to_uppercase();
            match (upper.next(), upper.next()) {
                (Some(c), None) => u8::try_from(u32::from(c)).unwrap_or(b),
                _ => b,
            }
        })
        .collect()
}

/// Copies `text` as Latin-1 into `field`, truncating to the field width.
/// The remainder of the field is left untouched (zeroed by the caller).
pub fn put_text(field: &mut [u8], text: &[u8]) {
    let len = text.len().min(field.len());
    field[..len].copy_from_slice(&text[..len]);
}
