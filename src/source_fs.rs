// isocdmak/src/source_fs.rs
//! Filesystem access used by the builder.
//!
//! `HostFs` goes straight to `std::fs`. `MemFs` keeps a whole tree in memory
//! with fixed timestamps so images built from it are reproducible.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use time::macros::datetime;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    File,
    Directory,
}

/// What the builder needs to know about one file or directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceEntry {
    pub path: PathBuf,
    pub name: String,
    pub kind: SourceKind,
    /// Byte length for files, zero for directories.
    pub len: u64,
    pub modified: SystemTime,
}

pub trait SourceFs {
    fn is_dir(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn metadata(&self, path: &Path) -> io::Result<SourceEntry>;
    /// Immediate children of `path`, in no particular order.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<SourceEntry>>;
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>>;
    /// Creates or truncates `path` for writing.
    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + '_>>;
    fn remove_file(&self, path: &Path) -> io::Result<()>;
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The real filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostFs;

impl HostFs {
    fn entry_for(path: PathBuf, metadata: &fs::Metadata) -> io::Result<SourceEntry> {
        let kind = if metadata.is_dir() {
            SourceKind::Directory
        } else {
            SourceKind::File
        };
        Ok(SourceEntry {
            name: entry_name(&path),
            len: if kind == SourceKind::File { metadata.len() } else { 0 },
            modified: metadata.modified()?,
            kind,
            path,
        })
    }
}

impl SourceFs for HostFs {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn metadata(&self, path: &Path) -> io::Result<SourceEntry> {
        let metadata = fs::metadata(path)?;
        HostFs::entry_for(path.to_path_buf(), &metadata)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<SourceEntry>> {
        let mut entries = Vec::new();
        for dir_entry in fs::read_dir(path)? {
            let dir_entry = dir_entry?;
            let child = dir_entry.path();
            // Follows symlinks; anything that is neither file nor directory is skipped.
            let metadata = fs::metadata(&child)?;
            if metadata.is_dir() || metadata.is_file() {
                entries.push(HostFs::entry_for(child, &metadata)?);
            }
        }
        Ok(entries)
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(File::open(path)?))
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
        Ok(Box::new(File::create(path)?))
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

#[derive(Clone, Debug)]
enum MemNode {
    Directory { modified: SystemTime },
    File { data: Arc<Mutex<Vec<u8>>>, modified: SystemTime },
}

/// An in-memory tree.
///
/// Parents are created implicitly and every node is stamped
/// 2000-01-01 00:00:00 UTC unless changed with [`MemFs::set_modified`].
#[derive(Debug, Default)]
pub struct MemFs {
    nodes: Mutex<BTreeMap<PathBuf, MemNode>>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_timestamp() -> SystemTime {
        datetime!(2000-01-01 0:00 UTC).into()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, MemNode>> {
        // A panic while holding the lock leaves the map intact.
        self.nodes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn insert_parents(nodes: &mut BTreeMap<PathBuf, MemNode>, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            nodes
                .entry(ancestor.to_path_buf())
                .or_insert(MemNode::Directory {
                    modified: MemFs::default_timestamp(),
                });
        }
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut nodes = self.lock();
        MemFs::insert_parents(&mut nodes, path);
        nodes.entry(path.to_path_buf()).or_insert(MemNode::Directory {
            modified: MemFs::default_timestamp(),
        });
    }

    pub fn add_file(&self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        let mut nodes = self.lock();
        MemFs::insert_parents(&mut nodes, path);
        nodes.insert(
            path.to_path_buf(),
            MemNode::File {
                data: Arc::new(Mutex::new(data.into())),
                modified: MemFs::default_timestamp(),
            },
        );
    }

    pub fn set_modified(&self, path: impl AsRef<Path>, when: SystemTime) {
        if let Some(node) = self.lock().get_mut(path.as_ref()) {
            match node {
                MemNode::Directory { modified } | MemNode::File { modified, .. } => {
                    *modified = when
                }
            }
        }
    }

    /// Current contents of a file, if it exists.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.lock().get(path.as_ref()) {
            Some(MemNode::File { data, .. }) => Some(
                data.lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .clone(),
            ),
            _ => None,
        }
    }

    fn entry_for(path: &Path, node: &MemNode) -> SourceEntry {
        match node {
            MemNode::Directory { modified } => SourceEntry {
                path: path.to_path_buf(),
                name: entry_name(path),
                kind: SourceKind::Directory,
                len: 0,
                modified: *modified,
            },
            MemNode::File { data, modified } => SourceEntry {
                path: path.to_path_buf(),
                name: entry_name(path),
                kind: SourceKind::File,
                len: data
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .len() as u64,
                modified: *modified,
            },
        }
    }

    fn not_found(path: &Path) -> io::Error {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} not found", path.display()),
        )
    }
}

impl SourceFs for MemFs {
    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(MemNode::Directory { .. }))
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(MemNode::File { .. }))
    }

    fn metadata(&self, path: &Path) -> io::Result<SourceEntry> {
        let nodes = self.lock();
        let node = nodes.get(path).ok_or_else(|| MemFs::not_found(path))?;
        Ok(MemFs::entry_for(path, node))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<SourceEntry>> {
        let nodes = self.lock();
        match nodes.get(path) {
            Some(MemNode::Directory { .. }) => {}
            Some(MemNode::File { .. }) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} is not a directory", path.display()),
                ));
            }
            None => return Err(MemFs::not_found(path)),
        }
        Ok(nodes
            .iter()
            .filter(|(child, _)| child.parent() == Some(path))
            .map(|(child, node)| MemFs::entry_for(child, node))
            .collect())
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        let data = match self.lock().get(path) {
            Some(MemNode::File { data, .. }) => data
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone(),
            _ => return Err(MemFs::not_found(path)),
        };
        Ok(Box::new(Cursor::new(data)))
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
        let mut nodes = self.lock();
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                if !matches!(nodes.get(parent), Some(MemNode::Directory { .. })) {
                    return Err(MemFs::not_found(parent));
                }
            }
            _ => {}
        }
        let data = Arc::new(Mutex::new(Vec::new()));
        nodes.insert(
            path.to_path_buf(),
            MemNode::File {
                data: Arc::clone(&data),
                modified: SystemTime::now(),
            },
        );
        Ok(Box::new(MemFileWriter { data }))
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut nodes = self.lock();
        match nodes.get(path) {
            Some(MemNode::File { .. }) => {
                nodes.remove(path);
                Ok(())
            }
            _ => Err(MemFs::not_found(path)),
        }
    }
}

struct MemFileWriter {
    data: Arc<Mutex<Vec<u8>>>,
}

impl Write for MemFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
