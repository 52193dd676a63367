// isocdmak/src/iso/layout.rs
//! Sector assignment for every part of the image.
//!
//! The image is laid out as system area, two primary volume descriptors,
//! the terminator, both path tables, the optional trademark resource, optional
//! capacity padding, every entry in list order and finally the trailing pad.

use tracing::debug;

use crate::error::{BuildError, Result};
use crate::iso::dir_record::directory_size;
use crate::iso::fs_node::{IsoEntry, MAX_DIR_RECORD_SIZE};
use crate::iso::path_table::{BIG_ENDIAN_PATH_TABLE_SECTOR, path_table_size};
use crate::options::PadSize;
use crate::utils::{ISO_SECTOR_SIZE, SYSTEM_AREA_SECTORS, TRAILING_PAD_SECTORS, align_to_sector, sectors_for};

/// Primary descriptor, its duplicate and the set terminator.
pub const VOLUME_DESCRIPTOR_SECTORS: u32 = 3;

/// Where the trademark resource sits and how big it is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrademarkBlock {
    pub len: u32,
    pub start_sector: u32,
    pub sectors: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageLayout {
    /// Record bytes in one path table.
    pub path_table_size: u32,
    /// Sectors occupied by one path table.
    pub path_table_sectors: u32,
    pub little_endian_path_table_sector: u32,
    pub trademark: Option<TrademarkBlock>,
    /// First sector after the trademark, before padding is applied.
    pub directories_start_sector: u32,
    pub padding_sectors: u32,
    pub total_sectors: u32,
    pub capacity_sectors: u32,
}

impl ImageLayout {
    pub fn big_endian_path_table_sector(&self) -> u32 {
        BIG_ENDIAN_PATH_TABLE_SECTOR
    }
}

/// Sizes every entry and assigns its starting sector.
///
/// `trademark_len` is the byte length of the trademark resource when one is
/// embedded. Fails with `ImageTooLarge` if the image does not fit the disc
/// selected by `pad_size`; in that case no sector is shifted.
pub fn calculate_layout(
    entries: &mut [IsoEntry],
    trademark_len: Option<u64>,
    pad_size: PadSize,
) -> Result<ImageLayout> {
    size_entries(entries)?;

    let path_table_size = path_table_size(entries);
    let path_table_sectors = sectors_for(path_table_size as u64);
    let little_endian_path_table_sector = BIG_ENDIAN_PATH_TABLE_SECTOR + path_table_sectors;
    let trademark_start = little_endian_path_table_sector + path_table_sectors;
    debug_assert_eq!(
        trademark_start,
        SYSTEM_AREA_SECTORS + VOLUME_DESCRIPTOR_SECTORS + 2 * path_table_sectors
    );

    let trademark = match trademark_len {
        Some(len) => Some(TrademarkBlock {
            len: u32::try_from(len).map_err(|_| {
                BuildError::ImageTooLarge {
                    required: len.div_ceil(ISO_SECTOR_SIZE as u64),
                    capacity: pad_size.capacity_sectors(),
                }
            })?,
            start_sector: trademark_start,
            sectors: sectors_for(len),
        }),
        None => None,
    };
    let directories_start_sector = trademark_start + trademark.map_or(0, |tm| tm.sectors);

    let mut next_sector = directories_start_sector as u64;
    for entry in entries.iter() {
        next_sector += entry.sector_count as u64;
    }
    let required = next_sector + TRAILING_PAD_SECTORS as u64;

    let capacity = pad_size.capacity_sectors();
    if required > capacity as u64 {
        return Err(BuildError::ImageTooLarge { required, capacity });
    }
    // Checked against a u32 capacity above.
    let required = required as u32;

    let padding_sectors = if pad_size.pads() {
        capacity - required
    } else {
        0
    };
    let mut sector = directories_start_sector + padding_sectors;
    for entry in entries.iter_mut() {
        entry.starting_sector = sector;
        sector += entry.sector_count;
    }

    let layout = ImageLayout {
        path_table_size,
        path_table_sectors,
        little_endian_path_table_sector,
        trademark,
        directories_start_sector,
        padding_sectors,
        total_sectors: required + padding_sectors,
        capacity_sectors: capacity,
    };
    debug!(
        path_table_size = layout.path_table_size,
        trademark_sector = ?layout.trademark.map(|tm| tm.start_sector),
        directories_start = layout.directories_start_sector,
        padding = layout.padding_sectors,
        total = layout.total_sectors,
        "calculated image layout"
    );
    Ok(layout)
}

/// Fills in byte size, aligned size and sector count of every entry.
fn size_entries(entries: &mut [IsoEntry]) -> Result<()> {
    for index in 0..entries.len() {
        // Record lengths are stored in a single byte.
        if entries[index].dir_record_size > MAX_DIR_RECORD_SIZE {
            return Err(BuildError::NameTooLong(entries[index].path.clone()));
        }
        if entries[index].is_dir() {
            let children = entries[index].children.clone();
            let size = directory_size(entries[children].iter().map(|c| c.dir_record_size));
            entries[index].size = size;
        } else if entries[index].size > u32::MAX as u64 {
            return Err(BuildError::FileTooLarge(entries[index].path.clone()));
        }

        let entry = &mut entries[index];
        entry.sector_aligned_size = align_to_sector(entry.size);
        entry.sector_count = sectors_for(entry.size);
    }
    Ok(())
}
