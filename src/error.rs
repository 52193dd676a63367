// isocdmak/src/error.rs
use std::io;
use std::path::PathBuf;

/// Everything that can stop an image build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Provided input folder does not exist: {}", .0.display())]
    InputFolderMissing(PathBuf),

    #[error("Provided output folder does not exist: {}", .0.display())]
    OutputFolderMissing(PathBuf),

    #[error("Provided trademark file does not exist: {}", .0.display())]
    TrademarkFileMissing(PathBuf),

    #[error("Provided source folder is empty: {}", .0.display())]
    InputFolderEmpty(PathBuf),

    #[error("ISO image needs {required} sectors but the selected disc holds {capacity}")]
    ImageTooLarge { required: u64, capacity: u32 },

    #[error("File '{}' is too large for ISO9660 (exceeds u32::MAX bytes)", .0.display())]
    FileTooLarge(PathBuf),

    #[error("Name of '{}' is too long for an ISO9660 directory record", .0.display())]
    NameTooLong(PathBuf),

    #[error("File '{}' changed while the image was being written", .0.display())]
    SourceChanged(PathBuf),

    #[error("Build was cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl BuildError {
    /// True for conditions detected before any output is written.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            BuildError::InputFolderMissing(_)
                | BuildError::OutputFolderMissing(_)
                | BuildError::TrademarkFileMissing(_)
                | BuildError::InputFolderEmpty(_)
                | BuildError::ImageTooLarge { .. }
                | BuildError::FileTooLarge(_)
                | BuildError::NameTooLong(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
