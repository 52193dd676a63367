// isocdmak/src/iso/mod.rs
pub mod builder;
pub mod cdfs;
pub mod dir_record;
pub mod endian;
pub mod fs_node;
pub mod iso_writer;
pub mod layout;
pub mod path_table;
pub mod scanner;
pub mod volume_descriptor;

pub use self::builder::{BuildSummary, ImageBuilder, PADDING_STATUS};
pub use self::volume_descriptor::VolumeTimestamp;
