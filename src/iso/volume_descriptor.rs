// isocdmak/src/iso/volume_descriptor.rs
use std::io::{self, Write};

use time::{OffsetDateTime, PrimitiveDateTime};
use time::macros::datetime;

use crate::iso::cdfs::{APPLICATION_USE_LEN, cdfs_block};
use crate::iso::dir_record::{IsoDirEntry, RecordForm};
use crate::iso::endian::{both_u16_bytes, both_u32_bytes};
use crate::iso::fs_node::IsoEntry;
use crate::iso::layout::ImageLayout;
use crate::iso::path_table::BIG_ENDIAN_PATH_TABLE_SECTOR;
use crate::options::{
    APPLICATION_ID_LEN, BuildOptions, DATA_PREPARER_ID_LEN, PUBLISHER_ID_LEN, VOLUME_ID_LEN,
    VOLUME_SET_ID_LEN,
};
use crate::utils::{ISO_SECTOR_SIZE, latin1_bytes, put_text};

pub const ISO_VOLUME_DESCRIPTOR_TERMINATOR: u8 = 255;
pub const ISO_VOLUME_DESCRIPTOR_PRIMARY: u8 = 1;
pub const ISO_ID: &[u8] = b"CD001";
pub const ISO_VERSION: u8 = 1;
pub const FILE_STRUCTURE_VERSION: u8 = 1;

/// Appended to the user's data preparer text.
pub const DATA_PREPARER_SUFFIX: &str = " - ISOCD-Win by Ben Squibb -";

pub const PVD_SYSTEM_ID_OFFSET: usize = 8;
pub const PVD_VOLUME_ID_OFFSET: usize = 40;
pub const PVD_TOTAL_SECTORS_OFFSET: usize = 80;
pub const PVD_VOL_SET_SIZE_OFFSET: usize = 120;
pub const PVD_VOL_SEQ_NUM_OFFSET: usize = 124;
pub const PVD_LOGICAL_BLOCK_SIZE_OFFSET: usize = 128;
pub const PVD_PATH_TABLE_SIZE_OFFSET: usize = 132;
pub const PVD_L_PATH_TABLE_OFFSET: usize = 140;
pub const PVD_OPT_L_PATH_TABLE_OFFSET: usize = 144;
pub const PVD_M_PATH_TABLE_OFFSET: usize = 148;
pub const PVD_OPT_M_PATH_TABLE_OFFSET: usize = 152;
pub const PVD_ROOT_DIR_RECORD_OFFSET: usize = 156;
pub const PVD_VOLUME_SET_ID_OFFSET: usize = 190;
pub const PVD_PUBLISHER_ID_OFFSET: usize = 318;
pub const PVD_DATA_PREPARER_ID_OFFSET: usize = 446;
pub const PVD_APPLICATION_ID_OFFSET: usize = 574;
pub const PVD_CREATION_DATE_OFFSET: usize = 813;
pub const PVD_FILE_STRUCTURE_VERSION_OFFSET: usize = 881;
pub const PVD_APPLICATION_USE_OFFSET: usize = 883;

const SYSTEM_ID_LEN: usize = 32;

/// Time stamped into the volume creation date.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VolumeTimestamp {
    /// Local time when the descriptor is written. Falls back to UTC when the
    /// offset is unknown, which on Unix includes any multi-threaded process.
    #[default]
    Now,
    Fixed(PrimitiveDateTime),
}

impl VolumeTimestamp {
    /// The stamp used for reproducible images.
    pub const REPRODUCIBLE: VolumeTimestamp = VolumeTimestamp::Fixed(datetime!(2000-01-01 00:00:00));

    pub fn resolve(self) -> PrimitiveDateTime {
        match self {
            VolumeTimestamp::Fixed(at) => at,
            VolumeTimestamp::Now => {
                let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
                PrimitiveDateTime::new(now.date(), now.time())
            }
        }
    }
}

/// 17-byte creation date: `YYYYMMDDhhmmss`, hundredths "00", zero offset.
pub fn format_volume_date(at: PrimitiveDateTime) -> [u8; 17] {
    let text = format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}00",
        at.year().clamp(0, 9999),
        u8::from(at.month()),
        at.day(),
        at.hour(),
        at.minute(),
        at.second()
    );
    let mut date = [0u8; 17];
    date[..16].copy_from_slice(text.as_bytes());
    date
}

/// Builds the primary volume descriptor sector.
pub fn primary_volume_descriptor(
    options: &BuildOptions,
    layout: &ImageLayout,
    root: &IsoEntry,
    created: PrimitiveDateTime,
) -> [u8; ISO_SECTOR_SIZE] {
    let mut pvd = [0u8; ISO_SECTOR_SIZE];
    pvd[0] = ISO_VOLUME_DESCRIPTOR_PRIMARY;
    pvd[1..6].copy_from_slice(ISO_ID);
    pvd[6] = ISO_VERSION;

    let mut system_id = [b' '; SYSTEM_ID_LEN];
    put_text(&mut system_id, options.target_system.system_identifier().as_bytes());
    pvd[PVD_SYSTEM_ID_OFFSET..PVD_SYSTEM_ID_OFFSET + SYSTEM_ID_LEN].copy_from_slice(&system_id);

    put_text(
        &mut pvd[PVD_VOLUME_ID_OFFSET..PVD_VOLUME_ID_OFFSET + VOLUME_ID_LEN],
        &latin1_bytes(&options.volume_id),
    );

    pvd[PVD_TOTAL_SECTORS_OFFSET..PVD_TOTAL_SECTORS_OFFSET + 8]
        .copy_from_slice(&both_u32_bytes(layout.total_sectors));
    pvd[PVD_VOL_SET_SIZE_OFFSET..PVD_VOL_SET_SIZE_OFFSET + 4].copy_from_slice(&both_u16_bytes(1));
    pvd[PVD_VOL_SEQ_NUM_OFFSET..PVD_VOL_SEQ_NUM_OFFSET + 4].copy_from_slice(&both_u16_bytes(1));
    pvd[PVD_LOGICAL_BLOCK_SIZE_OFFSET..PVD_LOGICAL_BLOCK_SIZE_OFFSET + 4]
        .copy_from_slice(&both_u16_bytes(ISO_SECTOR_SIZE as u16));
    pvd[PVD_PATH_TABLE_SIZE_OFFSET..PVD_PATH_TABLE_SIZE_OFFSET + 8]
        .copy_from_slice(&both_u32_bytes(layout.path_table_size));

    // Primary and optional tables point at the same copy.
    let l_table = layout.little_endian_path_table_sector.to_le_bytes();
    pvd[PVD_L_PATH_TABLE_OFFSET..PVD_L_PATH_TABLE_OFFSET + 4].copy_from_slice(&l_table);
    pvd[PVD_OPT_L_PATH_TABLE_OFFSET..PVD_OPT_L_PATH_TABLE_OFFSET + 4].copy_from_slice(&l_table);
    let m_table = BIG_ENDIAN_PATH_TABLE_SECTOR.to_be_bytes();
    pvd[PVD_M_PATH_TABLE_OFFSET..PVD_M_PATH_TABLE_OFFSET + 4].copy_from_slice(&m_table);
    pvd[PVD_OPT_M_PATH_TABLE_OFFSET..PVD_OPT_M_PATH_TABLE_OFFSET + 4].copy_from_slice(&m_table);

    let root_record = IsoDirEntry::new(root, RecordForm::SelfRef).to_bytes();
    pvd[PVD_ROOT_DIR_RECORD_OFFSET..PVD_ROOT_DIR_RECORD_OFFSET + root_record.len()]
        .copy_from_slice(&root_record);

    let mut data_preparer = latin1_bytes(&options.data_preparer_id);
    data_preparer.extend_from_slice(DATA_PREPARER_SUFFIX.as_bytes());
    let text_fields = [
        (PVD_VOLUME_SET_ID_OFFSET, VOLUME_SET_ID_LEN, latin1_bytes(&options.volume_set_id)),
        (PVD_PUBLISHER_ID_OFFSET, PUBLISHER_ID_LEN, latin1_bytes(&options.publisher_id)),
        (PVD_DATA_PREPARER_ID_OFFSET, DATA_PREPARER_ID_LEN, data_preparer),
        (PVD_APPLICATION_ID_OFFSET, APPLICATION_ID_LEN, latin1_bytes(&options.application_id)),
    ];
    for (offset, len, text) in text_fields {
        put_text(&mut pvd[offset..offset + len], &text);
    }

    pvd[PVD_CREATION_DATE_OFFSET..PVD_CREATION_DATE_OFFSET + 17]
        .copy_from_slice(&format_volume_date(created));
    pvd[PVD_FILE_STRUCTURE_VERSION_OFFSET] = FILE_STRUCTURE_VERSION;

    let block = cdfs_block(options, layout.trademark.as_ref());
    let len = block.len().min(APPLICATION_USE_LEN);
    pvd[PVD_APPLICATION_USE_OFFSET..PVD_APPLICATION_USE_OFFSET + len].copy_from_slice(&block[..len]);

    pvd
}

pub fn volume_descriptor_terminator() -> [u8; ISO_SECTOR_SIZE] {
    let mut term = [0u8; ISO_SECTOR_SIZE];
    term[0] = ISO_VOLUME_DESCRIPTOR_TERMINATOR;
    term[1..6].copy_from_slice(ISO_ID);
    term[6] = ISO_VERSION;
    term
}

/// Writes the primary descriptor twice, then the set terminator.
pub fn write_volume_descriptors<W: Write + ?Sized>(
    out: &mut W,
    pvd: &[u8; ISO_SECTOR_SIZE],
) -> io::Result<()> {
    out.write_all(pvd)?;
    out.write_all(pvd)?;
    out.write_all(&volume_descriptor_terminator())?;
    Ok(())
}
