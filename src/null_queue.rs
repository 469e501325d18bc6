//! A queue that discards everything, in the spirit of `/dev/null`.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use crate::iter::QueueIter;
use crate::queue::Queue;
use crate::{Error, Result};

/// A black-hole implementation of [`Queue`].
///
/// Added data disappears immediately and the queue always appears empty.
/// Useful for testing, or to drop data the way a shell redirect to
/// `/dev/null` would. Additions succeed and return the empty (invalid)
/// element name; element-level operations are unsupported and fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullQueue;

impl NullQueue {
    pub fn new() -> Self {
        Self
    }
}

impl Queue for NullQueue {
    fn id(&self) -> &str {
        "NULL"
    }

    fn add(&self, _data: &[u8]) -> Result<String> {
        Ok(String::new())
    }

    /// The file is deleted, honoring the contract that it is moved into the
    /// queue; the queue side of the move just goes nowhere.
    fn add_path(&self, path: &Path) -> Result<String> {
        match fs::remove_file(path) {
            Ok(()) => Ok(String::new()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn get(&self, _name: &str) -> Result<Vec<u8>> {
        Err(Error::Unsupported("get on a null queue"))
    }

    fn lock_with(&self, _name: &str, _permissive: bool) -> Result<bool> {
        Err(Error::Unsupported("lock on a null queue"))
    }

    fn unlock_with(&self, _name: &str, _permissive: bool) -> Result<bool> {
        Err(Error::Unsupported("unlock on a null queue"))
    }

    fn remove(&self, _name: &str) -> Result<()> {
        Err(Error::Unsupported("remove on a null queue"))
    }

    fn count(&self) -> Result<usize> {
        Ok(0)
    }

    fn purge_with(&self, _max_lock: Option<Duration>, _max_temp: Option<Duration>) -> Result<()> {
        Ok(())
    }

    fn iter(&self) -> Result<QueueIter> {
        Ok(QueueIter::empty())
    }
}
