//! Chunker — splits an encrypted frame into addressed transport units.
//!
//! The bus carries at most 8 bytes per datagram, so a 40-byte frame
//! goes out as 5 consecutive slices. Unit i gets address
//! `BASE_UNIT_ADDR - i`; the descending addresses make units
//! distinguishable on a trace, but the payload carries no sequence tag.
//! Reassembly therefore depends on delivery order matching send order
//! and on a single frame being in flight at a time.

use crate::wire::{EncryptedFrame, TransportUnit, BASE_UNIT_ADDR, UNITS_PER_FRAME, UNIT_DATA_LEN};

/// Split a frame into its ordered transport units.
pub fn split(frame: &EncryptedFrame) -> Vec<TransportUnit> {
    split_bytes(frame.as_bytes())
}

/// General splitter over any byte run: 8-byte slices, final slice
/// zero-padded. For the fixed 40-byte frame the padding branch is
/// never taken, but the scheme must hold for any length.
fn split_bytes(bytes: &[u8]) -> Vec<TransportUnit> {
    bytes
        .chunks(UNIT_DATA_LEN)
        .enumerate()
        .map(|(i, slice)| {
            let mut data = [0u8; UNIT_DATA_LEN];
            data[..slice.len()].copy_from_slice(slice);
            TransportUnit {
                addr: BASE_UNIT_ADDR - i as u32,
                data,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::FRAME_LEN;

    fn numbered_frame() -> EncryptedFrame {
        let mut raw = [0u8; FRAME_LEN];
        for (i, b) in raw.iter_mut().enumerate() {
            *b = i as u8;
        }
        EncryptedFrame::from(raw)
    }

    #[test]
    fn frame_splits_into_five_units() {
        let units = split(&numbered_frame());
        assert_eq!(units.len(), UNITS_PER_FRAME);
    }

    #[test]
    fn addresses_count_down_from_base() {
        let units = split(&numbered_frame());
        let addrs: Vec<u32> = units.iter().map(|u| u.addr).collect();
        assert_eq!(addrs, vec![0x7FF, 0x7FE, 0x7FD, 0x7FC, 0x7FB]);
    }

    #[test]
    fn concatenated_units_reproduce_the_frame() {
        let frame = numbered_frame();
        let units = split(&frame);
        let mut joined = Vec::new();
        for unit in &units {
            joined.extend_from_slice(&unit.data);
        }
        assert_eq!(&joined, frame.as_bytes());
    }

    #[test]
    fn short_tail_is_zero_padded() {
        let units = split_bytes(&[0xAB; 11]);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].data, [0xAB; 8]);
        assert_eq!(units[1].data, [0xAB, 0xAB, 0xAB, 0, 0, 0, 0, 0]);
        assert_eq!(units[1].addr, BASE_UNIT_ADDR - 1);
    }

    #[test]
    fn empty_input_yields_no_units() {
        assert!(split_bytes(&[]).is_empty());
    }
}
