// isocdmak/src/iso/cdfs.rs
//! CDFS driver settings carried in the "application use" field of the
//! primary volume descriptor.
//!
//! The block starts with a zero byte and then lists tagged records with
//! big-endian fields. Numeric settings are only listed when they differ from
//! the driver's defaults, flags only when set.

use crate::iso::layout::TrademarkBlock;
use crate::options::{
    BuildOptions, DEFAULT_DATA_CACHE, DEFAULT_DIR_CACHE, DEFAULT_FILE_HANDLE, DEFAULT_FILE_LOCK,
    DEFAULT_RETRIES,
};

/// Room reserved for the block in the volume descriptor.
pub const APPLICATION_USE_LEN: usize = 512;

const NUMERIC_PAYLOAD_LEN: u16 = 0x0002;
const FLAG_PAYLOAD_LEN: u16 = 0x0000;
const TRADEMARK_PAYLOAD_LEN: u16 = 0x0014;

pub const TAG_DATA_CACHE: [u8; 2] = *b"CR";
pub const TAG_DIR_CACHE: [u8; 2] = *b"CD";
pub const TAG_FILE_LOCK: [u8; 2] = *b"PL";
pub const TAG_FILE_HANDLE: [u8; 2] = *b"PF";
pub const TAG_RETRIES: [u8; 2] = *b"RC";
pub const TAG_DIRECT_READ: [u8; 2] = *b"DR";
pub const TAG_FAST_SEARCH: [u8; 2] = *b"FS";
pub const TAG_SPEED_INDEPENDENT: [u8; 2] = *b"SI";
pub const TAG_TRADEMARK: [u8; 2] = *b"TM";

/// Builds the vendor block. Never longer than [`APPLICATION_USE_LEN`].
pub fn cdfs_block(options: &BuildOptions, trademark: Option<&TrademarkBlock>) -> Vec<u8> {
    let mut block = vec![0u8];

    let numeric = [
        (TAG_DATA_CACHE, options.data_cache, DEFAULT_DATA_CACHE),
        (TAG_DIR_CACHE, options.dir_cache, DEFAULT_DIR_CACHE),
        (TAG_FILE_LOCK, options.file_lock, DEFAULT_FILE_LOCK),
        (TAG_FILE_HANDLE, options.file_handle, DEFAULT_FILE_HANDLE),
        (TAG_RETRIES, options.retries, DEFAULT_RETRIES),
    ];
    for (tag, value, default) in numeric {
        if value != default {
            block.extend_from_slice(&tag);
            block.extend_from_slice(&NUMERIC_PAYLOAD_LEN.to_be_bytes());
            block.extend_from_slice(&value.to_be_bytes());
        }
    }

    let flags = [
        (TAG_DIRECT_READ, options.direct_read),
        (TAG_FAST_SEARCH, options.fast_search),
        (TAG_SPEED_INDEPENDENT, options.speed_independent),
    ];
    for (tag, set) in flags {
        if set {
            block.extend_from_slice(&tag);
            block.extend_from_slice(&FLAG_PAYLOAD_LEN.to_be_bytes());
        }
    }

    // An empty resource keeps its sector but is not announced to the driver.
    if let Some(tm) = trademark.filter(|tm| tm.len > 0) {
        block.extend_from_slice(&TAG_TRADEMARK);
        block.extend_from_slice(&TRADEMARK_PAYLOAD_LEN.to_be_bytes());
        block.extend_from_slice(&tm.len.to_be_bytes());
        block.extend_from_slice(&tm.start_sector.to_be_bytes());
    }

    debug_assert!(block.len() <= APPLICATION_USE_LEN);
    block
}
