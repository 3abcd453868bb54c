//! Attack-path tests: tampering, replay, duplication, desync.

use std::time::Duration;

use canseal_core::chunk;
use canseal_core::codec::{CodecError, FrameCodec, SecretKey};
use canseal_services::{GuardPolicy, Progress, Reassembler, ReplayGuard, Verdict};

use crate::{reassemble, round_trip};

#[test]
fn a_flipped_bit_in_transit_is_rejected() {
    let key = SecretKey::generate();
    let codec = FrameCodec::new(key.clone());
    let frame = codec.encode(0x12C, &[0, 0, 0, 0x80], 1).unwrap();

    let mut units = chunk::split(&frame);
    units[2].data[3] ^= 0x01;

    let rebuilt = reassemble(&units);
    assert_eq!(codec.decode(&rebuilt), Err(CodecError::AuthenticationFailure));
}

#[test]
fn a_peer_with_a_different_key_cannot_forge_frames() {
    let ours = SecretKey::generate();
    let theirs = SecretKey::generate();

    let forged = FrameCodec::new(theirs).encode(0x3E8, &[1], 1).unwrap();
    let rebuilt = reassemble(&chunk::split(&forged));
    assert_eq!(
        FrameCodec::new(ours).decode(&rebuilt),
        Err(CodecError::AuthenticationFailure)
    );
}

#[test]
fn a_recorded_frame_replayed_later_is_rejected() {
    let key = SecretKey::generate();
    let mut guard = ReplayGuard::new(GuardPolicy::default(), None);

    // Attacker records the counter-1 frame, lets counter-2 through,
    // then injects the recording.
    let first = round_trip(&key, 0x12C, b"open", 1).unwrap();
    assert_eq!(guard.evaluate(&first), Verdict::Accept);

    let second = round_trip(&key, 0x12C, b"close", 2).unwrap();
    assert_eq!(guard.evaluate(&second), Verdict::Accept);

    assert_eq!(
        guard.evaluate(&first),
        Verdict::Replay { last_accepted: 2 }
    );
}

#[test]
fn a_burst_duplicate_is_suppressed_silently() {
    let key = SecretKey::generate();
    let mut guard = ReplayGuard::new(GuardPolicy::default(), None);

    let decoded = round_trip(&key, 0x12C, b"open", 1).unwrap();
    assert_eq!(guard.evaluate(&decoded), Verdict::Accept);

    // Same decoded content arriving again inside the window, as a
    // re-delivery would.
    assert_eq!(guard.evaluate(&decoded), Verdict::Duplicate);
    assert_eq!(guard.last_accepted(), Some(1));
}

#[test]
fn the_duplicate_window_expires() {
    let key = SecretKey::generate();
    let policy = GuardPolicy {
        duplicate_window: Duration::from_millis(50),
        ..GuardPolicy::default()
    };
    let mut guard = ReplayGuard::new(policy, None);

    let decoded = round_trip(&key, 0x12C, b"open", 1).unwrap();
    assert_eq!(guard.evaluate(&decoded), Verdict::Accept);

    std::thread::sleep(Duration::from_millis(80));
    // Past the window the frame is judged on its counter, and loses.
    assert_eq!(
        guard.evaluate(&decoded),
        Verdict::Replay { last_accepted: 1 }
    );
}

#[test]
fn an_injected_runt_unit_desyncs_one_burst_only() {
    let key = SecretKey::generate();
    let codec = FrameCodec::new(key);
    let frame = codec.encode(0x354, &[4], 1).unwrap();
    let units = chunk::split(&frame);

    let mut r = Reassembler::new();
    // Attacker injects 3 stray bytes before the real burst.
    r.push(&[0xDE, 0xAD, 0xBE]);
    for unit in &units[..4] {
        assert!(matches!(r.push(&unit.data), Progress::Accumulating(_)));
    }
    assert_eq!(r.push(&units[4].data), Progress::Overflow(43));

    // The next clean burst decodes normally.
    let frame2 = codec.encode(0x354, &[4], 2).unwrap();
    let rebuilt = reassemble(&chunk::split(&frame2));
    assert_eq!(codec.decode(&rebuilt).unwrap().counter, 2);
}

#[test]
fn truncated_frames_never_reach_the_codec_as_valid() {
    let key = SecretKey::generate();
    let codec = FrameCodec::new(key);
    let frame = codec.encode(0x12C, &[1], 1).unwrap();

    // Only 4 of 5 units arrive; the buffer stays in accumulation and
    // hands nothing to decode.
    let units = chunk::split(&frame);
    let mut r = Reassembler::new();
    for unit in &units[..4] {
        assert!(matches!(r.push(&unit.data), Progress::Accumulating(_)));
    }
    assert_eq!(r.len(), 32);
}
