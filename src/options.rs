// isocdmak/src/options.rs
use std::ops::RangeInclusive;
use std::path::PathBuf;

pub const DEFAULT_VOLUME_ID: &str = "CD32_TEST";

pub const DEFAULT_DATA_CACHE: u16 = 8;
pub const DEFAULT_DIR_CACHE: u16 = 16;
pub const DEFAULT_FILE_LOCK: u16 = 40;
pub const DEFAULT_FILE_HANDLE: u16 = 16;
pub const DEFAULT_RETRIES: u16 = 32;

// Documented bounds, enforced by whoever collects the options.
pub const DATA_CACHE_RANGE: RangeInclusive<u16> = 1..=127;
pub const DIR_CACHE_RANGE: RangeInclusive<u16> = 1..=127;
pub const FILE_LOCK_RANGE: RangeInclusive<u16> = 1..=9999;
pub const FILE_HANDLE_RANGE: RangeInclusive<u16> = 1..=9999;
pub const RETRIES_RANGE: RangeInclusive<u16> = 0..=127;

pub const VOLUME_ID_LEN: usize = 32;
pub const VOLUME_SET_ID_LEN: usize = 128;
pub const PUBLISHER_ID_LEN: usize = 128;
pub const DATA_PREPARER_ID_LEN: usize = 128;
pub const APPLICATION_ID_LEN: usize = 128;

pub const MAX_SECTORS_CDR74: u32 = 333_000;
pub const MAX_SECTORS_CDR80: u32 = 360_000;

pub const CD32_TRADEMARK_FILE: &str = "CD32.TM";
pub const CD32_TRADEMARK_FILE_SIZE: u64 = 2048;
pub const CDTV_TRADEMARK_FILE: &str = "CDTV.TM";
pub const CDTV_TRADEMARK_FILE_SIZE: u64 = 22152;

/// Disc the image is padded out to, if any.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PadSize {
    /// No padding. The image must still fit an 80 minute disc.
    #[default]
    None,
    /// 74 minute CD-R.
    Cdr74,
    /// 80 minute CD-R.
    Cdr80,
}

impl PadSize {
    /// Largest image, in sectors, this selection accepts.
    pub fn capacity_sectors(self) -> u32 {
        match self {
            PadSize::Cdr74 => MAX_SECTORS_CDR74,
            PadSize::None | PadSize::Cdr80 => MAX_SECTORS_CDR80,
        }
    }

    pub fn pads(self) -> bool {
        self != PadSize::None
    }
}

/// The machine the disc is mastered for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TargetSystem {
    #[default]
    Cd32,
    Cdtv,
    /// A plain Amiga with a CD drive; no boot trademark.
    Amiga,
}

impl TargetSystem {
    /// System identifier written to the volume descriptor.
    ///
    /// CDFS on every Commodore target keys off "CDTV", so CD32 and plain
    /// Amiga discs carry it too.
    pub fn system_identifier(self) -> &'static str {
        match self {
            TargetSystem::Cd32 | TargetSystem::Cdtv | TargetSystem::Amiga => "CDTV",
        }
    }

    /// File name of the trademark resource this system boots from.
    pub fn trademark_file_name(self) -> Option<&'static str> {
        match self {
            TargetSystem::Cd32 => Some(CD32_TRADEMARK_FILE),
            TargetSystem::Cdtv => Some(CDTV_TRADEMARK_FILE),
            TargetSystem::Amiga => None,
        }
    }

    /// Byte length of a genuine trademark resource for this system.
    pub fn trademark_file_size(self) -> Option<u64> {
        match self {
            TargetSystem::Cd32 => Some(CD32_TRADEMARK_FILE_SIZE),
            TargetSystem::Cdtv => Some(CDTV_TRADEMARK_FILE_SIZE),
            TargetSystem::Amiga => None,
        }
    }

    pub fn uses_trademark(self) -> bool {
        self.trademark_file_name().is_some()
    }
}

/// Everything the builder needs to produce one image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildOptions {
    pub input_folder: PathBuf,
    pub output_file: PathBuf,
    pub trademark_file: Option<PathBuf>,
    /// Embed the trademark file and reference it from the CDFS block.
    pub trademark: bool,

    pub volume_id: String,
    pub volume_set_id: String,
    pub publisher_id: String,
    pub data_preparer_id: String,
    pub application_id: String,

    pub data_cache: u16,
    pub dir_cache: u16,
    pub file_lock: u16,
    pub file_handle: u16,
    pub retries: u16,

    pub direct_read: bool,
    pub fast_search: bool,
    pub speed_independent: bool,

    pub pad_size: PadSize,
    pub target_system: TargetSystem,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            input_folder: PathBuf::new(),
            output_file: PathBuf::new(),
            trademark_file: None,
            trademark: true,
            volume_id: DEFAULT_VOLUME_ID.to_string(),
            volume_set_id: String::new(),
            publisher_id: String::new(),
            data_preparer_id: String::new(),
            application_id: String::new(),
            data_cache: DEFAULT_DATA_CACHE,
            dir_cache: DEFAULT_DIR_CACHE,
            file_lock: DEFAULT_FILE_LOCK,
            file_handle: DEFAULT_FILE_HANDLE,
            retries: DEFAULT_RETRIES,
            direct_read: false,
            fast_search: true,
            speed_independent: false,
            pad_size: PadSize::None,
            target_system: TargetSystem::Cd32,
        }
    }
}

impl BuildOptions {
    /// Options for `target` with every other value at its default.
    pub fn new(
        input_folder: impl Into<PathBuf>,
        output_file: impl Into<PathBuf>,
        target_system: TargetSystem,
    ) -> Self {
        Self {
            input_folder: input_folder.into(),
            output_file: output_file.into(),
            trademark: target_system.uses_trademark(),
            target_system,
            ..Self::default()
        }
    }

    /// Includes `path` as the trademark resource.
    pub fn with_trademark_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.trademark_file = Some(path.into());
        self.trademark = true;
        self
    }

    /// Leaves the trademark resource out of the image.
    pub fn without_trademark(mut self) -> Self {
        self.trademark = false;
        self
    }
}
