//! Frame reassembly — accumulates transport units into complete frames.
//!
//! Push-driven state machine over the inbound byte stream:
//!
//!   EMPTY / ACCUMULATING  buffer < 40 bytes, keep appending
//!   READY                 buffer == 40 bytes, frame handed to the caller
//!   OVERFLOW              buffer > 40 bytes, whole burst discarded
//!
//! The buffer is single-use per frame attempt: READY and OVERFLOW both
//! reset to EMPTY, and the decode outcome of a READY frame does not
//! feed back. There is deliberately no timeout — the design assumes one
//! frame in flight, so a peer that stalls mid-frame parks the machine
//! in ACCUMULATING until its bytes either complete or overflow.
//!
//! Units are fed in as raw byte runs rather than fixed 8-byte slices:
//! a hostile or broken peer can send short datagrams, and those must
//! push the buffer off the 40-byte boundary into OVERFLOW rather than
//! crash or desync silently.

use canseal_core::wire::FRAME_LEN;

/// What a pushed unit did to the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// Still short of a full frame; carries the bytes buffered so far.
    Accumulating(usize),
    /// Exactly one frame completed. Buffer has been reset.
    Ready([u8; FRAME_LEN]),
    /// Buffer ran past the frame boundary; carries the bytes discarded.
    /// No prefix recovery is attempted. Buffer has been reset.
    Overflow(usize),
}

/// Session-scoped accumulator for one inbound unit stream.
#[derive(Debug, Default)]
pub struct Reassembler {
    buf: Vec<u8>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one unit's data bytes and report the resulting state.
    pub fn push(&mut self, data: &[u8]) -> Progress {
        self.buf.extend_from_slice(data);
        match self.buf.len() {
            n if n < FRAME_LEN => Progress::Accumulating(n),
            n if n == FRAME_LEN => {
                let mut frame = [0u8; FRAME_LEN];
                frame.copy_from_slice(&self.buf);
                self.buf.clear();
                Progress::Ready(frame)
            }
            n => {
                self.buf.clear();
                Progress::Overflow(n)
            }
        }
    }

    /// True when no partial frame is buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes currently buffered.
    pub fn len(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_full_units_complete_a_frame() {
        let mut r = Reassembler::new();
        for i in 0..4 {
            assert_eq!(r.push(&[i; 8]), Progress::Accumulating((i as usize + 1) * 8));
        }
        match r.push(&[4; 8]) {
            Progress::Ready(frame) => {
                assert_eq!(&frame[..8], &[0; 8]);
                assert_eq!(&frame[32..], &[4; 8]);
            }
            other => panic!("expected Ready, got {other:?}"),
        }
        assert!(r.is_empty());
    }

    #[test]
    fn buffer_resets_after_ready() {
        let mut r = Reassembler::new();
        for _ in 0..4 {
            r.push(&[0xAA; 8]);
        }
        assert!(matches!(r.push(&[0xAA; 8]), Progress::Ready(_)));

        // The next unit starts a fresh frame attempt.
        assert_eq!(r.push(&[0xBB; 8]), Progress::Accumulating(8));
    }

    #[test]
    fn forty_one_bytes_overflow_and_decode_nothing() {
        let mut r = Reassembler::new();
        // A 1-byte runt unit desyncs the stream: 8*5 + 1 = 41.
        assert_eq!(r.push(&[0xFF]), Progress::Accumulating(1));
        for i in 0..4 {
            assert_eq!(r.push(&[0; 8]), Progress::Accumulating(8 * (i + 1) + 1));
        }
        assert_eq!(r.push(&[0; 8]), Progress::Overflow(41));
        assert!(r.is_empty());
    }

    #[test]
    fn overflow_discards_the_valid_prefix_too() {
        let mut r = Reassembler::new();
        for _ in 0..4 {
            r.push(&[1; 8]);
        }
        // A 9-byte unit runs past the boundary; the 32 valid prefix
        // bytes are dropped along with it.
        assert_eq!(r.push(&[1; 9]), Progress::Overflow(41));
        assert_eq!(r.len(), 0);

        // Recovery: a clean 5-unit burst afterwards completes normally.
        for _ in 0..4 {
            r.push(&[2; 8]);
        }
        assert!(matches!(r.push(&[2; 8]), Progress::Ready(_)));
    }

    #[test]
    fn short_units_accumulate_byte_accurately() {
        let mut r = Reassembler::new();
        assert_eq!(r.push(&[0; 3]), Progress::Accumulating(3));
        assert_eq!(r.push(&[0; 5]), Progress::Accumulating(8));
        assert_eq!(r.push(&[0; 32]), Progress::Ready([0; 40]));
    }

    #[test]
    fn empty_unit_is_a_no_op_in_effect() {
        let mut r = Reassembler::new();
        r.push(&[7; 8]);
        assert_eq!(r.push(&[]), Progress::Accumulating(8));
    }
}
