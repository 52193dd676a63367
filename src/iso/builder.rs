// isocdmak/src/iso/builder.rs
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{BuildError, Result};
use crate::iso::fs_node::IsoEntry;
use crate::iso::iso_writer::{
    ImageWriter, copy_file, write_directory, write_path_tables, write_system_area, write_trademark,
    write_trailing_pad,
};
use crate::iso::layout::{ImageLayout, calculate_layout};
use crate::iso::scanner::scan_tree;
use crate::iso::volume_descriptor::{
    VolumeTimestamp, primary_volume_descriptor, write_volume_descriptors,
};
use crate::options::BuildOptions;
use crate::progress::{CancelToken, Progress, ProgressSink};
use crate::source_fs::{HostFs, SourceFs};
use crate::utils::{ISO_SECTOR_SIZE, write_zeros};

/// Status reported just before the capacity padding is written.
pub const PADDING_STATUS: &str = "Adding padding to start of image...";

/// What a successful build produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildSummary {
    /// Files and directories written, root included.
    pub entries: usize,
    pub total_sectors: u32,
    pub bytes_written: u64,
    pub padding_sectors: u32,
    pub trademark_sector: Option<u32>,
    /// CRC-32 of the whole image.
    pub crc32: u32,
}

/// Builds one CDFS image from a source tree.
pub struct ImageBuilder<F: SourceFs = HostFs> {
    fs: F,
    options: BuildOptions,
    timestamp: VolumeTimestamp,
}

impl ImageBuilder<HostFs> {
    pub fn new(options: BuildOptions) -> Self {
        Self::with_fs(HostFs, options)
    }
}

impl<F: SourceFs> ImageBuilder<F> {
    /// A builder reading from, and writing to, `fs`.
    pub fn with_fs(fs: F, options: BuildOptions) -> Self {
        Self {
            fs,
            options,
            timestamp: VolumeTimestamp::Now,
        }
    }

    /// Sets the volume creation time. Use [`VolumeTimestamp::REPRODUCIBLE`]
    /// for byte-identical images across runs.
    pub fn with_timestamp(mut self, timestamp: VolumeTimestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Replaces [`VolumeTimestamp::Now`] with the current time.
    ///
    /// The local UTC offset can only be read while the process has a single
    /// thread, so call this before handing the builder to another thread.
    pub fn resolve_timestamp(mut self) -> Self {
        self.timestamp = VolumeTimestamp::Fixed(self.timestamp.resolve());
        self
    }

    pub fn timestamp(&self) -> VolumeTimestamp {
        self.timestamp
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Checks everything that can be known before scanning.
    /// Returns the trademark file to embed, if any.
    fn check_preconditions(&self) -> Result<Option<PathBuf>> {
        let options = &self.options;
        if !self.fs.is_dir(&options.input_folder) {
            return Err(BuildError::InputFolderMissing(options.input_folder.clone()));
        }

        let output_folder = options.output_file.parent().unwrap_or(Path::new(""));
        if !output_folder.as_os_str().is_empty() && !self.fs.is_dir(output_folder) {
            return Err(BuildError::OutputFolderMissing(output_folder.to_path_buf()));
        }

        if !options.trademark {
            return Ok(None);
        }
        match &options.trademark_file {
            Some(path) if self.fs.is_file(path) => Ok(Some(path.clone())),
            Some(path) => Err(BuildError::TrademarkFileMissing(path.clone())),
            None => Err(BuildError::TrademarkFileMissing(PathBuf::new())),
        }
    }

    fn read_trademark(&self, path: &Path) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.fs.open(path)?.read_to_end(&mut data)?;

        if let Some(expected) = self.options.target_system.trademark_file_size() {
            if data.len() as u64 != expected {
                warn!(
                    path = %path.display(),
                    size = data.len(),
                    expected,
                    "trademark file size does not match the target system"
                );
            }
        }
        Ok(data)
    }

    /// Scans, lays out and writes the image.
    ///
    /// Every precondition failure is reported before the output file is
    /// created. On cancellation or an I/O error mid-write the partial output
    /// is left in place for the caller to remove.
    pub fn build(&self, cancel: &CancelToken, progress: &mut dyn ProgressSink) -> Result<BuildSummary> {
        let mut output_created = false;
        self.build_tracked(cancel, progress, &mut output_created)
    }

    /// Like [`ImageBuilder::build`], also recording whether the output file
    /// was created, so a partial image can be removed without touching a
    /// file that predates the build.
    pub(crate) fn build_tracked(
        &self,
        cancel: &CancelToken,
        progress: &mut dyn ProgressSink,
        output_created: &mut bool,
    ) -> Result<BuildSummary> {
        let options = &self.options;
        info!(
            input = %options.input_folder.display(),
            output = %options.output_file.display(),
            target = ?options.target_system,
            "building image"
        );

        let trademark_path = self.check_preconditions()?;
        let mut entries = scan_tree(&self.fs, &options.input_folder, cancel)?;
        if entries.len() == 1 {
            return Err(BuildError::InputFolderEmpty(options.input_folder.clone()));
        }

        let trademark = match &trademark_path {
            Some(path) => Some(self.read_trademark(path)?),
            None => None,
        };
        let layout = calculate_layout(
            &mut entries,
            trademark.as_ref().map(|data| data.len() as u64),
            options.pad_size,
        )?;

        let sink = self.fs.create(&options.output_file)?;
        *output_created = true;
        let mut out = ImageWriter::new(BufWriter::new(sink));
        self.write_image(&mut out, &entries, &layout, trademark.as_deref(), cancel, progress)?;
        out.flush()?;

        let summary = BuildSummary {
            entries: entries.len(),
            total_sectors: layout.total_sectors,
            bytes_written: out.bytes_written(),
            padding_sectors: layout.padding_sectors,
            trademark_sector: layout.trademark.map(|tm| tm.start_sector),
            crc32: out.checksum(),
        };
        debug_assert_eq!(
            summary.bytes_written,
            summary.total_sectors as u64 * ISO_SECTOR_SIZE as u64
        );
        info!(
            entries = summary.entries,
            sectors = summary.total_sectors,
            crc32 = %format!("{:08x}", summary.crc32),
            "image complete"
        );
        Ok(summary)
    }

    fn write_image<W: Write>(
        &self,
        out: &mut ImageWriter<W>,
        entries: &[IsoEntry],
        layout: &ImageLayout,
        trademark: Option<&[u8]>,
        cancel: &CancelToken,
        progress: &mut dyn ProgressSink,
    ) -> Result<()> {
        write_system_area(out)?;
        let pvd = primary_volume_descriptor(
            &self.options,
            layout,
            &entries[0],
            self.timestamp.resolve(),
        );
        write_volume_descriptors(out, &pvd)?;
        write_path_tables(out, entries)?;
        if let Some(data) = trademark {
            write_trademark(out, data)?;
        }

        if layout.padding_sectors > 0 {
            progress.report(Progress::status(PADDING_STATUS));
            write_zeros(out, layout.padding_sectors as u64 * ISO_SECTOR_SIZE as u64)?;
        }

        let total = entries.len();
        for entry in entries {
            cancel.check()?;
            debug_assert_eq!(out.current_sector(), entry.starting_sector as u64);
            if entry.is_dir() {
                write_directory(out, entries, entry)?;
            } else {
                copy_file(out, &self.fs, entry, cancel)?;
            }
            progress.report(Progress::entry(entry.index + 1, total));
        }

        write_trailing_pad(out)?;
        debug!(bytes = out.bytes_written(), "wrote image data");
        Ok(())
    }
}
