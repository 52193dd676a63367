// tests/integration_tests/common.rs
use std::io;
use std::path::{Path, PathBuf};

use isocdmak::iso::VolumeTimestamp;
use isocdmak::progress::{CancelToken, Progress};
use isocdmak::source_fs::{MemFs, SourceEntry, SourceFs};
use isocdmak::{BuildOptions, BuildSummary, ImageBuilder, Result, TargetSystem};

pub const SECTOR: usize = 2048;
pub const INPUT: &str = "/amiga";
pub const OUTPUT: &str = "/out/cd.iso";

/// Routes `tracing` output to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// The small Amiga tree used by the size regression tests.
pub fn amiga_tree() -> MemFs {
    let fs = MemFs::new();
    fs.add_file("/amiga/ReadmeCD³²", b"Nothing to see here!".to_vec());
    fs.add_file("/amiga/C/cls", b"\x00\x00\x03\xf3 fake hunk".to_vec());
    fs.add_file(
        "/amiga/S/Startup-sequence",
        b"C:cls\necho \"Hello World!\"\n".to_vec(),
    );
    fs.add_dir("/out");
    fs
}

pub fn amiga_options() -> BuildOptions {
    BuildOptions::new(INPUT, OUTPUT, TargetSystem::Cd32).without_trademark()
}

/// Builds into `fs` with a fixed timestamp and returns the image bytes.
pub fn build_in_memory(fs: MemFs, options: BuildOptions) -> Result<(BuildSummary, Vec<u8>)> {
    init_tracing();
    let output = options.output_file.clone();
    let builder =
        ImageBuilder::with_fs(fs, options).with_timestamp(VolumeTimestamp::REPRODUCIBLE);
    let summary = builder.build(&CancelToken::new(), &mut |_: Progress| {})?;
    let image = builder.fs().contents(output).unwrap_or_default();
    Ok((summary, image))
}

pub fn sector(image: &[u8], index: usize) -> &[u8] {
    &image[index * SECTOR..(index + 1) * SECTOR]
}

/// Reads a both-endian 32-bit field and checks its two halves agree.
pub fn both_endian_u32(bytes: &[u8], offset: usize) -> u32 {
    let le = u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap());
    let be = u32::from_be_bytes(bytes[offset + 4..offset + 8].try_into().unwrap());
    assert_eq!(le, be, "both-endian halves differ at offset {offset}");
    le
}

/// A `MemFs` that reports one file as far larger than its contents.
pub struct InflatedFs {
    pub inner: MemFs,
    pub path: PathBuf,
    pub len: u64,
}

impl InflatedFs {
    fn inflate(&self, mut entry: SourceEntry) -> SourceEntry {
        if entry.path == self.path {
            entry.len = self.len;
        }
        entry
    }
}

impl SourceFs for InflatedFs {
    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.inner.is_file(path)
    }

    fn metadata(&self, path: &Path) -> io::Result<SourceEntry> {
        Ok(self.inflate(self.inner.metadata(path)?))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<SourceEntry>> {
        Ok(self
            .inner
            .read_dir(path)?
            .into_iter()
            .map(|entry| self.inflate(entry))
            .collect())
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn io::Read + '_>> {
        self.inner.open(path)
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn io::Write + '_>> {
        self.inner.create(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.inner.remove_file(path)
    }
}
