use std::fs;

use dirqueue::clock::MICROS_PER_SEC;
use dirqueue::{Clock, DirQueue, Queue};
use tempfile::tempdir;

/// A clock pinned to a fixed instant.
struct FixedClock(u64);

impl Clock for FixedClock {
    fn now_micros(&self) -> u64 {
        self.0
    }
}

const T0: u64 = 1_600_000_000 * MICROS_PER_SEC;

#[test]
fn one_pass_consumes_everything() {
    let dir = tempdir().expect("tempdir");
    let queue = DirQueue::open(dir.path().join("q")).expect("queue open");
    for i in 0..5u8 {
        queue.add(&[i]).expect("add");
    }
    assert_eq!(queue.count().expect("count"), 5);

    let mut consumed = 0;
    for elem in queue.iter().expect("iter") {
        assert!(queue.lock(&elem).expect("lock"));
        queue.remove(&elem).expect("remove");
        consumed += 1;
    }
    assert_eq!(consumed, 5);
    assert_eq!(queue.count().expect("count after"), 0);
    assert_eq!(queue.iter().expect("fresh iter").count(), 0);
}

#[test]
fn elements_come_out_in_insertion_order() {
    let dir = tempdir().expect("tempdir");
    let mut queue = DirQueue::open(dir.path().join("q")).expect("queue open");

    let mut added = Vec::new();
    for (i, offset) in [0u64, 0, 120, 120, 240].iter().enumerate() {
        queue.set_clock(FixedClock(T0 + offset * MICROS_PER_SEC + i as u64));
        added.push(queue.add(&[i as u8]).expect("add"));
    }
    let seen: Vec<String> = queue.iter().expect("iter").collect();
    assert_eq!(seen, added);
}

#[test]
fn iteration_ignores_lock_state() {
    let dir = tempdir().expect("tempdir");
    let queue = DirQueue::open(dir.path().join("q")).expect("queue open");
    let elem = queue.add(b"abc").expect("add");
    assert!(queue.lock(&elem).expect("lock"));

    let seen: Vec<String> = queue.iter().expect("iter").collect();
    assert_eq!(seen, vec![elem]);
}

#[test]
fn directories_added_after_the_snapshot_are_not_visited() {
    let dir = tempdir().expect("tempdir");
    let mut queue = DirQueue::open(dir.path().join("q")).expect("queue open");

    queue.set_clock(FixedClock(T0));
    let early = queue.add(b"early").expect("add early");
    let snapshot = queue.iter().expect("iter");

    queue.set_clock(FixedClock(T0 + 120 * MICROS_PER_SEC));
    let late = queue.add(b"late").expect("add late");

    let seen: Vec<String> = snapshot.collect();
    assert_eq!(seen, vec![early.clone()]);
    let fresh: Vec<String> = queue.iter().expect("fresh iter").collect();
    assert_eq!(fresh, vec![early, late]);
}

#[test]
fn directories_removed_mid_iteration_are_skipped() {
    let dir = tempdir().expect("tempdir");
    let mut queue = DirQueue::open(dir.path().join("q")).expect("queue open");

    queue.set_clock(FixedClock(T0));
    queue.add(b"early").expect("add early");
    queue.set_clock(FixedClock(T0 + 120 * MICROS_PER_SEC));
    let late = queue.add(b"late").expect("add late");

    let snapshot = queue.iter().expect("iter");
    let early_bucket = queue.root().join(dirqueue::name::directory_name(
        T0 / MICROS_PER_SEC,
        queue.granularity(),
    ));
    fs::remove_dir_all(early_bucket).expect("drop early bucket");

    let seen: Vec<String> = snapshot.collect();
    assert_eq!(seen, vec![late]);
}

#[test]
fn foreign_files_are_invisible() {
    let dir = tempdir().expect("tempdir");
    let queue = DirQueue::open(dir.path().join("q")).expect("queue open");
    let elem = queue.add(b"abc").expect("add");
    let bucket = queue.root().join(elem.split_once('/').expect("form").0);

    fs::write(bucket.join("foo.bar"), b"junk").expect("junk in bucket");
    fs::write(queue.root().join("notes.txt"), b"junk").expect("junk in root");
    fs::create_dir(queue.root().join("subdir")).expect("junk directory");

    assert_eq!(queue.count().expect("count"), 1);
    let seen: Vec<String> = queue.iter().expect("iter").collect();
    assert_eq!(seen, vec![elem]);
}
