// SPDX-License-Identifier: MIT OR Apache-2.0
use contextlog::thread::{self, CARRIER_START, PLAIN_START};
use contextlog::{Fields, Patch, fields, get_logger};
use std::sync::{Mutex, PoisonError};

static TEST_GUARD: Mutex<()> = Mutex::new(());

fn child_context() -> Fields {
    thread::spawn(|| get_logger!().context().clone())
        .join()
        .unwrap()
}

#[test]
fn test_patch_threading() {
    let _guard = TEST_GUARD.lock().unwrap_or_else(PoisonError::into_inner);
    let previous = thread::set_start_hook(&PLAIN_START);

    let _log = get_logger!(foo = "bar");
    assert_eq!(thread::patch_threading(), Patch::Applied);
    assert_eq!(child_context(), fields! { foo = "bar" });

    thread::set_start_hook(previous);
}

#[test]
fn test_without_patch_child_is_empty() {
    let _guard = TEST_GUARD.lock().unwrap_or_else(PoisonError::into_inner);
    let previous = thread::set_start_hook(&PLAIN_START);

    let _log = get_logger!(foo = "bar");
    assert!(child_context().is_empty());

    thread::set_start_hook(previous);
}

#[test]
fn test_patch_twice_is_a_no_op() {
    let _guard = TEST_GUARD.lock().unwrap_or_else(PoisonError::into_inner);
    let previous = thread::set_start_hook(&PLAIN_START);

    thread::patch_threading();
    let hook = thread::start_hook();
    assert_eq!(thread::patch_threading(), Patch::AlreadyApplied);
    assert!(std::ptr::eq(hook, thread::start_hook()));
    assert!(std::ptr::eq(hook, &CARRIER_START));

    thread::set_start_hook(previous);
}

#[test]
fn test_child_fields_merge_with_snapshot() {
    let _guard = TEST_GUARD.lock().unwrap_or_else(PoisonError::into_inner);
    let previous = thread::set_start_hook(&CARRIER_START);

    let _log = get_logger!(foo = "bar", shared = "parent");
    let seen = thread::Builder::new()
        .name("child".to_owned())
        .spawn(|| get_logger!(shared = "child", own = 1).context().clone())
        .unwrap()
        .join()
        .unwrap();
    assert_eq!(seen, fields! { foo = "bar", own = 1, shared = "child" });

    thread::set_start_hook(previous);
}

#[test]
fn test_snapshot_is_taken_at_spawn() {
    let _guard = TEST_GUARD.lock().unwrap_or_else(PoisonError::into_inner);
    let previous = thread::set_start_hook(&CARRIER_START);

    let (tx, rx) = std::sync::mpsc::channel::<()>();
    let handle = {
        let _log = get_logger!(stage = "spawn");
        thread::spawn(move || {
            rx.recv().unwrap();
            get_logger!().context().clone()
        })
    };
    // the parent's scope is gone before the child reads its context
    let _later = get_logger!(stage = "later");
    tx.send(()).unwrap();
    assert_eq!(handle.join().unwrap(), fields! { stage = "spawn" });

    thread::set_start_hook(previous);
}
