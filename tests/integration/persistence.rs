//! Counter persistence across daemon restarts.

use std::sync::atomic::{AtomicU64, Ordering};

use canseal_core::codec::SecretKey;
use canseal_services::{CounterStore, GuardPolicy, ReplayGuard, Verdict};

use crate::round_trip;

static DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_dir() -> std::path::PathBuf {
    let id = DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "canseal-integration-{}-{}",
        std::process::id(),
        id
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

/// Accept a frame and persist its counter, as the receive loop does.
fn accept_and_persist(
    guard: &mut ReplayGuard,
    store: &CounterStore,
    key: &SecretKey,
    counter: u16,
) {
    let decoded = round_trip(key, 0x12C, b"open", counter).unwrap();
    assert_eq!(guard.evaluate(&decoded), Verdict::Accept);
    store.save(counter).unwrap();
}

#[test]
fn replay_is_still_rejected_after_a_restart() {
    let key = SecretKey::generate();
    let dir = temp_dir();
    let store = CounterStore::open(&dir, "last_counter").unwrap();

    let mut guard = ReplayGuard::new(GuardPolicy::default(), store.load());
    accept_and_persist(&mut guard, &store, &key, 40);
    accept_and_persist(&mut guard, &store, &key, 41);
    drop(guard);

    // Restart: new guard seeded from disk, attacker replays counter 40.
    let store = CounterStore::open(&dir, "last_counter").unwrap();
    let mut guard = ReplayGuard::new(GuardPolicy::default(), store.load());
    assert_eq!(guard.last_accepted(), Some(41));

    let replayed = round_trip(&key, 0x12C, b"close", 40).unwrap();
    assert_eq!(
        guard.evaluate(&replayed),
        Verdict::Replay { last_accepted: 41 }
    );
}

#[test]
fn a_restarted_sender_is_rebaselined_against_persisted_state() {
    let key = SecretKey::generate();
    let dir = temp_dir();
    let store = CounterStore::open(&dir, "last_counter").unwrap();
    store.save(150).unwrap();

    let mut guard = ReplayGuard::new(GuardPolicy::default(), store.load());

    // Sender lost its counter file and starts over near zero.
    let fresh = round_trip(&key, 0x12C, b"open", 5).unwrap();
    assert_eq!(guard.evaluate(&fresh), Verdict::Accept);
    assert_eq!(guard.last_accepted(), Some(5));
}

#[test]
fn first_boot_accepts_any_counter() {
    let key = SecretKey::generate();
    let dir = temp_dir();
    let store = CounterStore::open(&dir, "last_counter").unwrap();
    assert_eq!(store.load(), None);

    let mut guard = ReplayGuard::new(GuardPolicy::default(), store.load());
    let decoded = round_trip(&key, 0x12C, b"open", 60_000).unwrap();
    assert_eq!(guard.evaluate(&decoded), Verdict::Accept);
}

#[test]
fn send_counter_advances_monotonically_across_restarts() {
    let dir = temp_dir();

    // Two "daemon lifetimes" sending two frames each.
    for lifetime in 0..2u16 {
        let store = CounterStore::open(&dir, "msg_counter").unwrap();
        for i in 0..2u16 {
            let counter = store.load().unwrap_or(0);
            assert_eq!(counter, lifetime * 2 + i);
            store.save(counter.wrapping_add(1)).unwrap();
        }
    }
}
