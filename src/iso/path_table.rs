// isocdmak/src/iso/path_table.rs
//! Path tables list every directory with its extent and parent directory
//! number. The image carries one big-endian (type M) and one little-endian
//! (type L) copy, each zero-padded to whole sectors.

use crate::iso::fs_node::IsoEntry;
use crate::utils::{ISO_SECTOR_SIZE, align_to_sector, latin1_uppercase};

/// Big-endian path table always follows the three volume descriptor sectors.
pub const BIG_ENDIAN_PATH_TABLE_SECTOR: u32 = 19;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathTableEndian {
    Little,
    Big,
}

/// Total record bytes of one path table, before sector padding.
pub fn path_table_size(entries: &[IsoEntry]) -> u32 {
    entries
        .iter()
        .filter(|e| e.is_dir())
        .map(|e| e.path_table_record_size as u32)
        .sum()
}

/// Builds a sector-aligned path table.
///
/// Directory identifiers are stored uppercased here, while the directory
/// records keep the case they were given.
pub fn generate_path_table(entries: &[IsoEntry], endian: PathTableEndian) -> Vec<u8> {
    let mut table = Vec::with_capacity(ISO_SECTOR_SIZE);

    for entry in entries.iter().filter(|e| e.is_dir()) {
        let id = latin1_uppercase(&entry.identifier);

        table.push(id.len() as u8);
        table.push(0); // Extended attribute record length
        match endian {
            PathTableEndian::Little => {
                table.extend_from_slice(&entry.starting_sector.to_le_bytes());
                table.extend_from_slice(&entry.parent_directory_number.to_le_bytes());
            }
            PathTableEndian::Big => {
                table.extend_from_slice(&entry.starting_sector.to_be_bytes());
                table.extend_from_slice(&entry.parent_directory_number.to_be_bytes());
            }
        }
        table.extend_from_slice(&id);
        if id.len() % 2 == 1 {
            table.push(0);
        }
    }

    table.resize(align_to_sector(table.len() as u64) as usize, 0);
    table
}
