// isocdmak/src/iso/fs_node.rs
use std::ops::Range;
use std::path::PathBuf;
use std::time::SystemTime;

use time::OffsetDateTime;

use crate::utils::{ISO_SECTOR_SIZE, latin1_bytes};

/// Fixed part of a directory record, including a one byte identifier.
pub const MIN_DIR_RECORD_SIZE: usize = 34;
/// Largest directory record; its length is a single byte.
pub const MAX_DIR_RECORD_SIZE: usize = u8::MAX as usize;
/// Fixed part of a path table record, including a one byte identifier.
pub const MIN_PATH_TABLE_RECORD_SIZE: usize = 9;
pub const ROOT_DIRECTORY_NUMBER: u16 = 1;
/// Identifier given to the root entry.
pub const ROOT_IDENTIFIER: &[u8] = b"\x01";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// 7-byte recording date used in directory records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BinaryDate([u8; 7]);

impl BinaryDate {
    /// Converts a timestamp to the on-disc form, truncated to whole seconds (UTC).
    /// The timezone offset byte is always zero.
    pub fn from_system_time(time: SystemTime) -> Self {
        let time = OffsetDateTime::from(time);
        let year = (time.year() - 1900).clamp(0, u8::MAX as i32) as u8;
        BinaryDate([
            year,
            u8::from(time.month()),
            time.day(),
            time.hour(),
            time.minute(),
            time.second(),
            0,
        ])
    }

    pub fn as_bytes(&self) -> &[u8; 7] {
        &self.0
    }
}

/// Size of the directory record for an identifier of `identifier_len` bytes.
/// Records are padded to an even length.
pub fn dir_record_size(identifier_len: usize) -> usize {
    MIN_DIR_RECORD_SIZE + (identifier_len - 1) + usize::from(identifier_len % 2 == 0)
}

/// Size of the path table record for an identifier of `identifier_len` bytes.
/// Records are padded to an even length.
pub fn path_table_record_size(identifier_len: usize) -> usize {
    MIN_PATH_TABLE_RECORD_SIZE + (identifier_len - 1) + usize::from(identifier_len % 2 == 1)
}

/// One file or directory in the image.
#[derive(Clone, Debug)]
pub struct IsoEntry {
    /// Position in the entry list; 0 is the root.
    pub index: usize,
    pub parent_index: usize,
    pub parent_directory_number: u16,
    /// Only set for directories. The root is 1.
    pub directory_number: u16,
    /// Entries listed in this directory (directories only).
    pub children: Range<usize>,
    pub path: PathBuf,
    pub name: String,
    /// On-disc identifier, Latin-1. Files carry the ";1" version suffix.
    pub identifier: Vec<u8>,
    pub kind: EntryKind,
    /// Files: byte length. Directories: record bytes, filled in by layout.
    pub size: u64,
    pub date: BinaryDate,
    pub dir_record_size: usize,
    /// Only set for directories.
    pub path_table_record_size: usize,
    pub sector_aligned_size: u64,
    pub sector_count: u32,
    pub starting_sector: u32,
}

impl IsoEntry {
    fn new(name: String, identifier: Vec<u8>, kind: EntryKind, path: PathBuf) -> Self {
        let dir_record_size = dir_record_size(identifier.len());
        let path_table_record_size = match kind {
            EntryKind::Directory => path_table_record_size(identifier.len()),
            EntryKind::File => 0,
        };
        Self {
            index: 0,
            parent_index: 0,
            parent_directory_number: ROOT_DIRECTORY_NUMBER,
            directory_number: 0,
            children: 0..0,
            path,
            name,
            identifier,
            kind,
            size: 0,
            date: BinaryDate::default(),
            dir_record_size,
            path_table_record_size,
            sector_aligned_size: 0,
            sector_count: 0,
            starting_sector: 0,
        }
    }

    /// A file entry. The identifier gets the ";1" version suffix.
    pub fn file(name: &str, path: PathBuf, size: u64, modified: SystemTime) -> Self {
        let mut identifier = latin1_bytes(name);
        identifier.extend_from_slice(b";1");
        let mut entry = IsoEntry::new(name.to_string(), identifier, EntryKind::File, path);
        entry.size = size;
        entry.date = BinaryDate::from_system_time(modified);
        entry
    }

    /// A directory entry. The caller assigns the directory number.
    pub fn directory(name: &str, path: PathBuf, modified: SystemTime) -> Self {
        let identifier = latin1_bytes(name);
        let mut entry = IsoEntry::new(name.to_string(), identifier, EntryKind::Directory, path);
        entry.date = BinaryDate::from_system_time(modified);
        entry
    }

    /// The root directory: index 0, directory number 1, its own parent.
    pub fn root(path: PathBuf, modified: SystemTime) -> Self {
        let mut entry = IsoEntry::new(
            String::new(),
            ROOT_IDENTIFIER.to_vec(),
            EntryKind::Directory,
            path,
        );
        entry.directory_number = ROOT_DIRECTORY_NUMBER;
        entry.parent_directory_number = ROOT_DIRECTORY_NUMBER;
        entry.date = BinaryDate::from_system_time(modified);
        entry
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Value of the data length field: exact size for files,
    /// whole sectors for directories.
    pub fn data_length(&self) -> u64 {
        match self.kind {
            EntryKind::File => self.size,
            EntryKind::Directory => self.sector_aligned_size,
        }
    }

    /// First byte of this entry in the image.
    pub fn byte_offset(&self) -> u64 {
        self.starting_sector as u64 * ISO_SECTOR_SIZE as u64
    }
}
