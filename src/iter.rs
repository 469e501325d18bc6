//! Lazy snapshot iteration over a queue's contents.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use crate::name;
use crate::Result;

/// A forward-only iterator over element names, oldest first.
///
/// The set of intermediate directories is snapshotted when the iterator is
/// created; directories added afterwards are not visited, and directories
/// removed by a concurrent purge are skipped. Each directory's elements are
/// listed lazily, the first time the iterator reaches it.
///
/// Elements are yielded regardless of lock state: lock before relying on
/// exclusive access to anything this returns.
pub struct QueueIter {
    root: PathBuf,
    dirs: VecDeque<String>,
    elements: VecDeque<String>,
}

impl QueueIter {
    pub(crate) fn snapshot(root: &Path) -> Result<Self> {
        let mut dirs = Vec::new();
        for entry in fs::read_dir(root)? {
            let entry = entry?;
            if let Some(dir) = entry.file_name().to_str() {
                if name::is_directory_name(dir) {
                    dirs.push(dir.to_owned());
                }
            }
        }
        dirs.sort_unstable();
        Ok(Self {
            root: root.to_path_buf(),
            dirs: dirs.into(),
            elements: VecDeque::new(),
        })
    }

    pub(crate) fn empty() -> Self {
        Self {
            root: PathBuf::new(),
            dirs: VecDeque::new(),
            elements: VecDeque::new(),
        }
    }

    /// Refill the element buffer from the next non-empty directory in the
    /// snapshot. Returns false once the snapshot is exhausted.
    fn refill(&mut self) -> bool {
        while let Some(dir) = self.dirs.pop_front() {
            let listing = match fs::read_dir(self.root.join(&dir)) {
                Ok(listing) => listing,
                // the directory vanished since the snapshot was taken
                Err(_) => continue,
            };
            let mut batch = Vec::new();
            for entry in listing.flatten() {
                if let Some(elem) = entry.file_name().to_str() {
                    if name::is_element_name(elem) {
                        batch.push(format!("{dir}/{elem}"));
                    }
                }
            }
            if batch.is_empty() {
                continue;
            }
            batch.sort_unstable();
            self.elements.extend(batch);
            return true;
        }
        false
    }
}

impl Iterator for QueueIter {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.elements.is_empty() && !self.refill() {
            return None;
        }
        self.elements.pop_front()
    }
}
