// isocdmak/src/iso/dir_record.rs

use crate::iso::endian::both_u32_bytes;
use crate::iso::fs_node::{IsoEntry, MIN_DIR_RECORD_SIZE};
use crate::utils::ISO_SECTOR_SIZE;

pub const DIR_FLAG: u8 = 0x02;

/// Which kind of record to emit for an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordForm {
    /// The entry's own identifier.
    Normal,
    /// "." – first record of a directory, identifier byte 0x00.
    SelfRef,
    /// ".." – second record of a directory, identifier byte 0x01.
    ParentRef,
}

/// ISO9660 directory record for one entry.
pub struct IsoDirEntry<'a> {
    pub entry: &'a IsoEntry,
    pub form: RecordForm,
}

impl<'a> IsoDirEntry<'a> {
    pub fn new(entry: &'a IsoEntry, form: RecordForm) -> Self {
        Self { entry, form }
    }

    pub fn record_len(&self) -> usize {
        match self.form {
            RecordForm::Normal => self.entry.dir_record_size,
            RecordForm::SelfRef | RecordForm::ParentRef => MIN_DIR_RECORD_SIZE,
        }
    }

    /// Creates ISO9660 directory record bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let entry = self.entry;
        let mut record = vec![0u8; self.record_len()];

        record[0] = record.len() as u8;
        record[1] = 0; // Extended attribute length
        record[2..10].copy_from_slice(&both_u32_bytes(entry.starting_sector));
        record[10..18].copy_from_slice(&both_u32_bytes(entry.data_length() as u32));
        record[18..25].copy_from_slice(entry.date.as_bytes());
        record[25] = if entry.is_dir() { DIR_FLAG } else { 0 };
        // Bytes 26-31: file unit size, interleave gap, volume sequence number (zeroed)
        match self.form {
            RecordForm::SelfRef => {
                record[32] = 1;
                record[33] = 0x00;
            }
            RecordForm::ParentRef => {
                record[32] = 1;
                record[33] = 0x01;
            }
            RecordForm::Normal => {
                let id = &entry.identifier;
                record[32] = id.len() as u8;
                // Even-length identifiers leave a trailing zero pad byte.
                record[33..33 + id.len()].copy_from_slice(id);
            }
        }

        record
    }
}

/// Places directory records so that none crosses a sector boundary.
///
/// Starts after the "." and ".." records. Used both to size a directory and
/// to write it, so the two always agree.
#[derive(Clone, Copy, Debug)]
pub struct RecordCursor {
    sector_pos: usize,
    total: u64,
}

impl Default for RecordCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordCursor {
    pub fn new() -> Self {
        let dots = 2 * MIN_DIR_RECORD_SIZE;
        Self {
            sector_pos: dots,
            total: dots as u64,
        }
    }

    /// Reserves room for a record and returns the zero padding that must
    /// precede it.
    pub fn place(&mut self, record_len: usize) -> usize {
        let mut padding = 0;
        if self.sector_pos + record_len > ISO_SECTOR_SIZE {
            padding = ISO_SECTOR_SIZE - self.sector_pos;
            self.total += padding as u64;
            self.sector_pos = 0;
        }
        self.sector_pos += record_len;
        self.total += record_len as u64;
        padding
    }

    /// Bytes used so far, including inter-sector padding.
    pub fn total(&self) -> u64 {
        self.total
    }
}

/// Byte size of a directory holding records of the given lengths.
pub fn directory_size(record_lens: impl IntoIterator<Item = usize>) -> u64 {
    let mut cursor = RecordCursor::new();
    for len in record_lens {
        cursor.place(len);
    }
    cursor.total()
}
