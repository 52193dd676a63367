// isocdmak/src/iso/scanner.rs
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::Result;
use crate::iso::fs_node::{IsoEntry, ROOT_DIRECTORY_NUMBER};
use crate::progress::CancelToken;
use crate::source_fs::{SourceEntry, SourceFs, SourceKind};

/// WinUAE keeps Amiga file attributes in this file; it never goes on the disc.
pub const UAE_ATTRIBUTES_FILE: &str = "_UAEFSDB.___";

/// A directory waiting to have its children listed.
struct DirectoryQueueEntry {
    path: PathBuf,
    index: usize,
    directory_number: u16,
}

/// Compares two strings ordinally, ignoring case.
///
/// Each character is compared by its simple uppercase form, so the result
/// does not depend on locale.
pub fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    fn fold(c: char) -> char {
        let mut upper = c.to_uppercase();
        match (upper.next(), upper.next()) {
            (Some(u), None) => u,
            _ => c,
        }
    }
    a.chars().map(fold).cmp(b.chars().map(fold))
}

fn compare_entries(a: &SourceEntry, b: &SourceEntry) -> Ordering {
    compare_ignore_case(&a.path.to_string_lossy(), &b.path.to_string_lossy())
}

/// Lists the whole tree under `root`, breadth first.
///
/// Entry 0 is the root. The children of every directory are sorted by path,
/// ignoring case, and stored contiguously; `IsoEntry::children` points at them.
pub fn scan_tree<F: SourceFs + ?Sized>(
    fs: &F,
    root: &Path,
    cancel: &CancelToken,
) -> Result<Vec<IsoEntry>> {
    let root_meta = fs.metadata(root)?;
    let mut entries = vec![IsoEntry::root(root.to_path_buf(), root_meta.modified)];
    let mut last_directory_number = ROOT_DIRECTORY_NUMBER;

    let mut queue = VecDeque::new();
    queue.push_back(DirectoryQueueEntry {
        path: root.to_path_buf(),
        index: 0,
        directory_number: ROOT_DIRECTORY_NUMBER,
    });

    while let Some(dir) = queue.pop_front() {
        cancel.check()?;

        let mut children: Vec<SourceEntry> = fs
            .read_dir(&dir.path)?
            .into_iter()
            .filter(|c| !(c.kind == SourceKind::File && c.name == UAE_ATTRIBUTES_FILE))
            .collect();
        children.sort_by(compare_entries);

        let first_child = entries.len();
        for child in children {
            let mut entry = match child.kind {
                SourceKind::File => IsoEntry::file(&child.name, child.path, child.len, child.modified),
                SourceKind::Directory => {
                    last_directory_number = last_directory_number.checked_add(1).ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::InvalidInput,
                            "Too many directories for an ISO9660 path table",
                        )
                    })?;
                    let mut entry = IsoEntry::directory(&child.name, child.path, child.modified);
                    entry.directory_number = last_directory_number;
                    entry
                }
            };
            entry.index = entries.len();
            entry.parent_index = dir.index;
            entry.parent_directory_number = dir.directory_number;

            if entry.is_dir() {
                queue.push_back(DirectoryQueueEntry {
                    path: entry.path.clone(),
                    index: entry.index,
                    directory_number: entry.directory_number,
                });
            }
            entries.push(entry);
        }
        entries[dir.index].children = first_child..entries.len();

        trace!(
            directory = %dir.path.display(),
            children = entries.len() - first_child,
            "scanned directory"
        );
    }

    Ok(entries)
}
