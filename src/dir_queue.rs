//! The filesystem-backed queue engine.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, warn};

use crate::clock::{Clock, SystemClock, MICROS_PER_SEC};
use crate::fsutil;
use crate::iter::QueueIter;
use crate::name::{self, LOCKED_SUFFIX, TEMPORARY_SUFFIX};
use crate::queue::{Queue, DEFAULT_MAX_LOCK, DEFAULT_MAX_TEMP};
use crate::{Error, Result};

/// Configuration of a [`DirQueue`] handle.
///
/// Settings are per handle and carry no cross-process coupling: two
/// processes can open the same queue with different options safely.
#[derive(Debug, Clone, Copy)]
pub struct QueueOptions {
    /// Width of the insertion-time buckets, in seconds. New intermediate
    /// directories are created at most this often; 0 disables bucketing,
    /// one directory per distinct second.
    pub granularity: u32,
    /// Umask applied to everything the queue creates. `None` leaves the
    /// process umask in charge.
    pub umask: Option<u32>,
    /// Default staleness threshold for locks reclaimed by purge.
    pub default_max_lock: Duration,
    /// Default staleness threshold for temporary elements removed by purge.
    pub default_max_temp: Duration,
    /// The hex digit appended to element names to lower the odds of two
    /// writers colliding at the same microsecond. `None` derives it from
    /// the process id. Only the low 4 bits are used. Collisions stay
    /// correct either way; the write pipeline retries on them.
    pub rnd_hex: Option<u8>,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            granularity: 60,
            umask: None,
            default_max_lock: DEFAULT_MAX_LOCK,
            default_max_temp: DEFAULT_MAX_TEMP,
            rnd_hex: None,
        }
    }
}

/// A directory-based queue shared by cooperating processes.
///
/// Elements are opaque byte strings stored one per file under time-bucketed
/// intermediate directories. All coordination goes through the filesystem's
/// own atomicity guarantees; there is no daemon and no shared in-process
/// state between handles.
pub struct DirQueue {
    root: PathBuf,
    id: String,
    granularity: u32,
    umask: Option<u32>,
    default_max_lock: Duration,
    default_max_temp: Duration,
    rnd_hex: u8,
    clock: Box<dyn Clock>,
}

impl DirQueue {
    /// Open the queue rooted at `root` with default options, creating the
    /// root directory if needed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(root, QueueOptions::default())
    }

    /// Open the queue rooted at `root`, creating the root directory (and any
    /// missing ancestors) if needed.
    pub fn open_with(root: impl AsRef<Path>, options: QueueOptions) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if let Some(umask) = options.umask {
            if umask >= 0o1000 {
                return Err(Error::InvalidUmask(umask));
            }
        }
        if root.exists() && !root.is_dir() {
            return Err(Error::NotADirectory(root));
        }
        let dir_mode = options.umask.map(|umask| fsutil::mode_bits(umask).0);
        fsutil::create_dir_tree(&root, dir_mode)?;

        let id = fsutil::file_key(&root)?;
        let rnd_hex = options
            .rnd_hex
            .unwrap_or_else(|| (std::process::id() % 16) as u8)
            & 0xf;

        Ok(Self {
            root,
            id,
            granularity: options.granularity,
            umask: options.umask,
            default_max_lock: options.default_max_lock,
            default_max_temp: options.default_max_temp,
            rnd_hex,
            clock: Box::new(SystemClock),
        })
    }

    /// The queue's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The path a locked element can be read from. The file can be read in
    /// place but must only be removed through [`Queue::remove`].
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}{LOCKED_SUFFIX}"))
    }

    pub fn granularity(&self) -> u32 {
        self.granularity
    }

    pub fn set_granularity(&mut self, granularity: u32) {
        self.granularity = granularity;
    }

    pub fn set_umask(&mut self, umask: Option<u32>) -> Result<()> {
        if let Some(umask) = umask {
            if umask >= 0o1000 {
                return Err(Error::InvalidUmask(umask));
            }
        }
        self.umask = umask;
        Ok(())
    }

    pub fn set_default_max_lock(&mut self, max_lock: Duration) {
        self.default_max_lock = max_lock;
    }

    pub fn set_default_max_temp(&mut self, max_temp: Duration) {
        self.default_max_temp = max_temp;
    }

    pub fn set_rnd_hex(&mut self, rnd_hex: u8) {
        self.rnd_hex = rnd_hex & 0xf;
    }

    /// Replace the time source used for naming and staleness decisions.
    pub fn set_clock(&mut self, clock: impl Clock) {
        self.clock = Box::new(clock);
    }

    fn dir_mode(&self) -> Option<u32> {
        self.umask.map(|umask| fsutil::mode_bits(umask).0)
    }

    fn file_mode(&self) -> Option<u32> {
        self.umask.map(|umask| fsutil::mode_bits(umask).1)
    }

    fn insertion_dir(&self) -> String {
        let secs = self.clock.now_micros() / MICROS_PER_SEC;
        name::directory_name(secs, self.granularity)
    }

    fn new_name(&self) -> String {
        name::element_name(self.clock.now_micros(), self.rnd_hex)
    }

    /// Current time as a `SystemTime`, through the injected clock.
    fn now(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_micros(self.clock.now_micros())
    }

    /// Create a uniquely named temporary file inside the given intermediate
    /// directory, retrying on the two benign races: the candidate name is
    /// taken (pick a fresh one, time has advanced) or the directory lost a
    /// race with purge (recreate it).
    fn create_temporary(&self, dir: &str) -> Result<(PathBuf, File)> {
        let dir_path = self.root.join(dir);
        loop {
            let path = dir_path.join(format!("{}{TEMPORARY_SUFFIX}", self.new_name()));
            match fsutil::create_exclusive(&path, self.file_mode()) {
                Ok(file) => return Ok((path, file)),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    fsutil::ensure_dir(&dir_path, self.dir_mode())?;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Publish a fully written file under a final element name, retrying on
    /// name collisions. The source is consumed on success. Partial content
    /// is never reachable through a name matching the element pattern: the
    /// hardlink appears only after the payload is complete.
    fn publish(&self, source: &Path, dir: &str) -> Result<String> {
        loop {
            let elem = self.new_name();
            let target = self.root.join(dir).join(&elem);
            match fs::hard_link(source, &target) {
                Ok(()) => {
                    fs::remove_file(source)?;
                    return Ok(format!("{dir}/{elem}"));
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Reclaim the expired dotted entries of one intermediate directory.
    /// Published elements never contain a dot, so everything dotted is a
    /// temporary element, a lock, or junk from outside the queue.
    fn purge_dir(
        &self,
        dir_path: &Path,
        lock_cutoff: Option<SystemTime>,
        temp_cutoff: Option<SystemTime>,
    ) -> Result<()> {
        let expired = |mtime: SystemTime, cutoff: Option<SystemTime>| {
            cutoff.is_some_and(|cutoff| mtime < cutoff)
        };
        let listing = match fs::read_dir(dir_path) {
            Ok(listing) => listing,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };
        for entry in listing {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if !file_name.contains('.') {
                continue;
            }
            let mtime = match entry.metadata() {
                Ok(meta) => meta.modified()?,
                // vanished mid-scan
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };
            if file_name.ends_with(TEMPORARY_SUFFIX) && !expired(mtime, temp_cutoff) {
                continue;
            }
            if file_name.ends_with(LOCKED_SUFFIX) && !expired(mtime, lock_cutoff) {
                continue;
            }
            let path = entry.path();
            warn!("removing stale file: {}", path.display());
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}

impl Queue for DirQueue {
    fn id(&self) -> &str {
        &self.id
    }

    fn add(&self, data: &[u8]) -> Result<String> {
        let dir = self.insertion_dir();
        let (tmp, mut file) = self.create_temporary(&dir)?;
        file.write_all(data)?;
        drop(file);
        self.publish(&tmp, &dir)
    }

    fn add_path(&self, path: &Path) -> Result<String> {
        let dir = self.insertion_dir();
        fsutil::ensure_dir(&self.root.join(&dir), self.dir_mode())?;
        self.publish(path, &dir)
    }

    /// Reads through the lock path, so retrieving an element that is not
    /// locked surfaces the OS "not found" error.
    fn get(&self, name: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.path_of(name))?)
    }

    fn lock_with(&self, name: &str, permissive: bool) -> Result<bool> {
        let elem = self.root.join(name);
        let lock = self.path_of(name);
        match fs::hard_link(&elem, &lock) {
            Ok(()) => {}
            // already locked, or already consumed by another process
            Err(err)
                if permissive
                    && matches!(
                        err.kind(),
                        io::ErrorKind::AlreadyExists | io::ErrorKind::NotFound
                    ) =>
            {
                return Ok(false);
            }
            Err(err) => return Err(err.into()),
        }
        // Stamp the element as freshly locked; the lock shares its storage,
        // so purge sees the same modification time through either name.
        match fsutil::touch(&elem) {
            Ok(()) => Ok(true),
            Err(err) if permissive && err.kind() == io::ErrorKind::NotFound => {
                // the element vanished between link and touch
                let _ = fs::remove_file(&lock);
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn unlock_with(&self, name: &str, permissive: bool) -> Result<bool> {
        match fs::remove_file(self.path_of(name)) {
            Ok(()) => Ok(true),
            Err(err) if permissive && err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn remove(&self, name: &str) -> Result<()> {
        fs::remove_file(self.root.join(name))?;
        fs::remove_file(self.path_of(name))?;
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        let mut total = 0;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let dir_name = entry.file_name();
            let Some(dir_name) = dir_name.to_str() else {
                continue;
            };
            if !name::is_directory_name(dir_name) {
                continue;
            }
            let listing = match fs::read_dir(entry.path()) {
                Ok(listing) => listing,
                // removed by a concurrent purge
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };
            for elem in listing {
                let elem = elem?;
                if let Some(elem_name) = elem.file_name().to_str() {
                    if name::is_element_name(elem_name) {
                        total += 1;
                    }
                }
            }
        }
        Ok(total)
    }

    fn purge_with(&self, max_lock: Option<Duration>, max_temp: Option<Duration>) -> Result<()> {
        let max_lock = max_lock.unwrap_or(self.default_max_lock);
        let max_temp = max_temp.unwrap_or(self.default_max_temp);

        let mut dirs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if let Some(dir) = entry.file_name().to_str() {
                if name::is_directory_name(dir) {
                    dirs.push(dir.to_owned());
                }
            }
        }
        dirs.sort_unstable();

        if !max_lock.is_zero() || !max_temp.is_zero() {
            let now = self.now();
            // a disabled category never expires
            let lock_cutoff = (!max_lock.is_zero())
                .then(|| now.checked_sub(max_lock))
                .flatten();
            let temp_cutoff = (!max_temp.is_zero())
                .then(|| now.checked_sub(max_temp))
                .flatten();
            for dir in &dirs {
                self.purge_dir(&self.root.join(dir), lock_cutoff, temp_cutoff)?;
            }
        }

        // Compact the now-empty intermediate directories, sparing the most
        // recent one: a concurrent add is likely about to populate it.
        if dirs.len() > 1 {
            for dir in &dirs[..dirs.len() - 1] {
                if fsutil::try_rmdir(&self.root.join(dir))? {
                    debug!("removed empty intermediate directory: {dir}");
                }
            }
        }
        Ok(())
    }

    fn iter(&self) -> Result<QueueIter> {
        QueueIter::snapshot(&self.root)
    }
}
