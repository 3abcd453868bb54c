//! End-to-end pipeline tests.
//!
//! These run the full in-process path a frame travels between two
//! daemons: encode → split into transport units → reassemble →
//! decode → replay guard, plus counter persistence across restarts.
//! No sockets; the bus bridge is byte-transparent and covered by its
//! own unit tests.

use canseal_core::chunk;
use canseal_core::codec::{CodecError, DecodedFrame, FrameCodec, SecretKey};
use canseal_core::wire::{BASE_UNIT_ADDR, FRAME_LEN, UNITS_PER_FRAME};
use canseal_services::{GuardPolicy, Progress, Reassembler, ReplayGuard, Verdict};

mod persistence;
mod security;

/// Run frame bytes through a fresh reassembler as 8-byte units.
/// Panics unless exactly the last unit completes the frame.
pub fn reassemble(units: &[canseal_core::TransportUnit]) -> [u8; FRAME_LEN] {
    let mut r = Reassembler::new();
    for (i, unit) in units.iter().enumerate() {
        match r.push(&unit.data) {
            Progress::Ready(frame) => {
                assert_eq!(i, units.len() - 1, "frame completed early");
                return frame;
            }
            Progress::Accumulating(_) => {}
            Progress::Overflow(n) => panic!("unexpected overflow at {n} bytes"),
        }
    }
    panic!("units did not complete a frame");
}

/// Encode, transport, and decode one frame between two codecs sharing
/// `key`. This is the honest-peer path every test builds on.
pub fn round_trip(
    key: &SecretKey,
    frame_id: u16,
    payload: &[u8],
    counter: u16,
) -> Result<DecodedFrame, CodecError> {
    let sender = FrameCodec::new(key.clone());
    let receiver = FrameCodec::new(key.clone());

    let frame = sender.encode(frame_id, payload, counter)?;
    let units = chunk::split(&frame);
    let rebuilt = reassemble(&units);
    receiver.decode(&rebuilt)
}

#[test]
fn frame_survives_the_full_transport_path() {
    let key = SecretKey::generate();
    let decoded = round_trip(&key, 0x12C, &[0, 0, 0, 0x80], 7).unwrap();

    assert_eq!(decoded.frame_id, 0x12C);
    assert_eq!(decoded.payload, vec![0, 0, 0, 0x80]);
    assert_eq!(decoded.counter, 7);
}

#[test]
fn units_are_addressed_descending_from_the_base() {
    let key = SecretKey::generate();
    let codec = FrameCodec::new(key);
    let frame = codec.encode(0x3E8, &[1], 0).unwrap();

    let units = chunk::split(&frame);
    assert_eq!(units.len(), UNITS_PER_FRAME);
    for (i, unit) in units.iter().enumerate() {
        assert_eq!(unit.addr, BASE_UNIT_ADDR - i as u32);
    }
}

#[test]
fn accepted_frames_advance_the_guard() {
    let key = SecretKey::generate();
    let mut guard = ReplayGuard::new(GuardPolicy::default(), None);

    for counter in 1..=3u16 {
        let decoded = round_trip(&key, 0x1F4, &counter.to_be_bytes(), counter).unwrap();
        assert_eq!(guard.evaluate(&decoded), Verdict::Accept);
    }
    assert_eq!(guard.last_accepted(), Some(3));
}

#[test]
fn empty_and_maximal_payloads_round_trip() {
    let key = SecretKey::generate();

    let empty = round_trip(&key, 0x190, &[], 1).unwrap();
    assert_eq!(empty.payload, Vec::<u8>::new());

    let max = [0xA5u8; canseal_core::wire::MAX_PAYLOAD];
    let full = round_trip(&key, 0x190, &max, 2).unwrap();
    assert_eq!(full.payload, max.to_vec());
}

#[test]
fn each_encoding_of_the_same_message_differs_on_the_wire() {
    let key = SecretKey::generate();
    let codec = FrameCodec::new(key);

    let a = codec.encode(0x12C, b"open", 1).unwrap();
    let b = codec.encode(0x12C, b"open", 1).unwrap();
    // Fresh IV per frame: identical plaintext never repeats bytes.
    assert_ne!(a.as_bytes(), b.as_bytes());
}
