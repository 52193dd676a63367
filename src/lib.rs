// isocdmak/src/lib.rs
//! ISO 9660 images for the Amiga CD32 and CDTV.
//!
//! Images carry the CDFS driver settings in the primary volume descriptor
//! and can embed the trademark resource the consoles need to boot.

use crate::progress::{CancelToken, Progress};

pub mod error;
pub mod iso;
pub mod options;
pub mod progress;
pub mod source_fs;
pub mod utils;
pub mod worker;

pub use crate::error::{BuildError, Result};
pub use crate::iso::{BuildSummary, ImageBuilder, VolumeTimestamp};
pub use crate::options::{BuildOptions, PadSize, TargetSystem};
pub use crate::worker::{BuildWorker, Completion, WorkerEvent};

/// High-level function to build an image from the host filesystem.
///
/// Runs on the calling thread and cannot be cancelled; use [`BuildWorker`]
/// for that.
pub fn build_image(options: BuildOptions) -> Result<BuildSummary> {
    ImageBuilder::new(options).build(&CancelToken::new(), &mut |_: Progress| {})
}
