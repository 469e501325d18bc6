use std::fs;

use dirqueue::{Error, NullQueue, Queue};
use tempfile::tempdir;

#[test]
fn additions_vanish() {
    let queue = NullQueue::new();
    assert_eq!(queue.id(), "NULL");
    assert_eq!(queue.add(b"abc").expect("add"), "");
    assert_eq!(queue.count().expect("count"), 0);
    assert_eq!(queue.iter().expect("iter").count(), 0);
    queue.purge().expect("purge");
}

#[test]
fn add_path_still_consumes_the_source() {
    let dir = tempdir().expect("tempdir");
    let queue = NullQueue::new();

    let source = dir.path().join("incoming");
    fs::write(&source, b"gone").expect("write source");
    assert_eq!(queue.add_path(&source).expect("add_path"), "");
    assert!(!source.exists());

    // a missing source is not an error
    assert_eq!(queue.add_path(&source).expect("repeat add_path"), "");
}

#[test]
fn element_operations_are_unsupported() {
    let queue = NullQueue::new();

    for err in [
        queue.get("00000000/0123456789abcd").err(),
        queue.lock("00000000/0123456789abcd").err(),
        queue.unlock("00000000/0123456789abcd").err(),
        queue.remove("00000000/0123456789abcd").err(),
    ] {
        match err.expect("operation should fail") {
            Error::Unsupported(_) => {}
            other => panic!("expected Unsupported, got {other}"),
        }
    }
}
