//! Time-derived names for intermediate directories and elements.
//!
//! The on-disk format is shared with the other implementations of this
//! queue, so the widths and suffixes here cannot change: an intermediate
//! directory is 8 lowercase hex digits (the insertion second truncated to
//! the granularity), an element is 14 lowercase hex digits (8 for the
//! second, 5 for the microsecond remainder, 1 random digit that lowers the
//! odds of two writers picking the same name at the same instant).

use crate::clock::MICROS_PER_SEC;

/// Suffix of an element that is still being written.
pub const TEMPORARY_SUFFIX: &str = ".tmp";
/// Suffix of the hardlink marking an element as locked.
pub const LOCKED_SUFFIX: &str = ".lck";

const DIRECTORY_NAME_LEN: usize = 8;
const ELEMENT_NAME_LEN: usize = 14;

/// Name of the intermediate directory for an insertion at `secs`.
///
/// A granularity of 0 disables bucketing, one directory per distinct second.
pub fn directory_name(secs: u64, granularity: u32) -> String {
    let bucket = if granularity > 0 {
        secs - secs % u64::from(granularity)
    } else {
        secs
    };
    format!("{bucket:08x}")
}

/// Element name for an insertion at `micros` (microseconds since the epoch).
///
/// `rnd` is the per-queue-instance random digit; only its low 4 bits are used.
pub fn element_name(micros: u64, rnd: u8) -> String {
    let secs = micros / MICROS_PER_SEC;
    let remainder = micros % MICROS_PER_SEC;
    format!("{secs:08x}{remainder:05x}{:x}", rnd & 0xf)
}

/// True for exactly 8 lowercase hex digits.
pub fn is_directory_name(name: &str) -> bool {
    is_lower_hex(name, DIRECTORY_NAME_LEN)
}

/// True for exactly 14 lowercase hex digits, which excludes the `.tmp` and
/// `.lck` variants as well as unrelated files.
pub fn is_element_name(name: &str) -> bool {
    is_lower_hex(name, ELEMENT_NAME_LEN)
}

fn is_lower_hex(name: &str, len: usize) -> bool {
    name.len() == len
        && name
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
