//! The capability surface shared by the queue variants.

use std::path::Path;
use std::time::Duration;

use crate::iter::QueueIter;
use crate::Result;

/// Default maximum age of a locked element before purge reclaims its lock.
pub const DEFAULT_MAX_LOCK: Duration = Duration::from_secs(600);
/// Default maximum age of a temporary element before purge removes it.
pub const DEFAULT_MAX_TEMP: Duration = Duration::from_secs(300);

/// Operations common to the directory-backed queue and the null queue.
///
/// An element name is always of the form `directory/file` as returned by
/// [`Queue::add`]; it is the only handle callers ever hold on stored data.
pub trait Queue {
    /// A unique identifier for the queue, allowing two handles that reference
    /// the same physical storage through different paths to be recognized.
    fn id(&self) -> &str;

    /// Add a byte string to the queue and return the new element's name.
    fn add(&self, data: &[u8]) -> Result<String>;

    /// Move an existing file into the queue and return the new element's
    /// name. The file must live on the same filesystem as the queue; it is
    /// consumed by this call.
    fn add_path(&self, path: &Path) -> Result<String>;

    /// Read a locked element's data.
    ///
    /// Reads go through the lock name, so retrieving an element that is not
    /// locked surfaces the OS "not found" error.
    fn get(&self, name: &str) -> Result<Vec<u8>>;

    /// Lock an element.
    ///
    /// In permissive mode, an element that is already locked or no longer
    /// exists yields `Ok(false)` instead of an error. Callers probing
    /// elements discovered through iteration should use the permissive
    /// [`Queue::lock`] shorthand, as any of them may be claimed or consumed
    /// by another process at any time.
    fn lock_with(&self, name: &str, permissive: bool) -> Result<bool>;

    /// Unlock an element.
    ///
    /// In permissive mode, a missing lock yields `Ok(false)` instead of an
    /// error.
    fn unlock_with(&self, name: &str, permissive: bool) -> Result<bool>;

    /// Remove a locked element from the queue.
    ///
    /// Holding the lock is the caller's responsibility and is not checked
    /// separately: calling this on an unlocked element surfaces the OS
    /// "not found" error for the missing lock file.
    fn remove(&self, name: &str) -> Result<()>;

    /// Number of elements in the queue: locked elements are counted,
    /// temporary ones are not.
    fn count(&self) -> Result<usize>;

    /// Reclaim abandoned temporary elements and staled locks, then remove
    /// the empty intermediate directories left behind.
    ///
    /// `None` selects the queue's configured default for that threshold; a
    /// zero duration disables reclamation for that category. This walks the
    /// whole queue and can take a while on large ones, so it is meant to be
    /// called periodically by a maintenance task, never on the hot path.
    fn purge_with(&self, max_lock: Option<Duration>, max_temp: Option<Duration>) -> Result<()>;

    /// A snapshot iterator over the element names currently in the queue,
    /// oldest first, regardless of lock state.
    fn iter(&self) -> Result<QueueIter>;

    /// Lock an element in permissive mode.
    fn lock(&self, name: &str) -> Result<bool> {
        self.lock_with(name, true)
    }

    /// Unlock an element in non-permissive mode: a consumer that believes it
    /// holds the lock fails loudly if it does not.
    fn unlock(&self, name: &str) -> Result<bool> {
        self.unlock_with(name, false)
    }

    /// Purge with the queue's configured default thresholds.
    fn purge(&self) -> Result<()> {
        self.purge_with(None, None)
    }
}
