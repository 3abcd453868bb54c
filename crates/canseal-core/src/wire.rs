//! canseal wire format — on-wire layout of the encrypted frame and the
//! transport units that carry it.
//!
//! These constants ARE the protocol. The encrypted frame is exactly 40
//! bytes and every conforming implementation must be byte-compatible:
//!
//!   iv(16) || frame_id(2, big-endian) || ciphertext(16) || mac(6)
//!
//! The bus delivers at most 8 bytes per datagram, so a frame travels as
//! 5 consecutive transport units addressed by counting down from
//! `BASE_UNIT_ADDR`. Units carry no sequence tag of their own; the
//! receiver assumes a single frame in flight and in-order delivery.

use static_assertions::{assert_eq_size, const_assert_eq};
use zerocopy::{AsBytes, FromBytes, FromZeroes};

// ── Frame layout ─────────────────────────────────────────────────────────────

/// Initialization vector length. Fresh random IV per frame, never reused.
pub const IV_LEN: usize = 16;

/// Frame identifier length (big-endian u16 in the clear, covered by the MAC).
pub const FRAME_ID_LEN: usize = 2;

/// AES block length. Ciphertext length is always a multiple of this.
pub const BLOCK_LEN: usize = 16;

/// Ciphertext length for this system's fixed frame shape: one padded block.
pub const CIPHERTEXT_LEN: usize = 16;

/// Truncated MAC length. 48 bits is a deliberate size trade-off that
/// keeps the frame at 5 bus units; see the codec docs.
pub const MAC_LEN: usize = 6;

/// Total encrypted frame length. Anything else on the wire is malformed.
pub const FRAME_LEN: usize = IV_LEN + FRAME_ID_LEN + CIPHERTEXT_LEN + MAC_LEN;

const_assert_eq!(FRAME_LEN, 40);
const_assert_eq!(CIPHERTEXT_LEN % BLOCK_LEN, 0);

/// Length of the counter prefix inside the plaintext block.
pub const COUNTER_LEN: usize = 2;

/// Maximum payload length. Derived, not assumed: the counter prefix and
/// at least one padding byte must fit the single ciphertext block.
pub const MAX_PAYLOAD: usize = CIPHERTEXT_LEN - COUNTER_LEN - 1;

const_assert_eq!(MAX_PAYLOAD, 13);

// ── Transport units ──────────────────────────────────────────────────────────

/// Maximum data bytes per bus datagram.
pub const UNIT_DATA_LEN: usize = 8;

/// Units per frame: 40 bytes in 8-byte slices.
pub const UNITS_PER_FRAME: usize = (FRAME_LEN + UNIT_DATA_LEN - 1) / UNIT_DATA_LEN;

const_assert_eq!(UNITS_PER_FRAME, 5);

/// Base transport address. Unit i of a frame is sent at
/// `BASE_UNIT_ADDR - i`, so addresses are distinguishable by ordering
/// but carry no explicit sequence number.
pub const BASE_UNIT_ADDR: u32 = 0x7FF;

/// One fixed-size slice of an encrypted frame, as sent on the bus.
///
/// `data` is zero-padded when the slice is shorter than 8 bytes. The
/// receive side works from the raw datagram bytes instead (a hostile or
/// broken peer may send short units), so this type only appears on the
/// send path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportUnit {
    pub addr: u32,
    pub data: [u8; UNIT_DATA_LEN],
}

/// Datagram header preceding the unit data bytes on the UDP bus bridge.
///
/// Wire size: 4 bytes, followed by up to `UNIT_DATA_LEN` data bytes.
#[derive(Debug, Clone, AsBytes, FromBytes, FromZeroes)]
#[repr(C, packed)]
pub struct UnitHeader {
    pub addr: u32,
}

// Compile-time size guard. If this fails, the datagram format has changed.
assert_eq_size!(UnitHeader, [u8; 4]);

/// Wire size of `UnitHeader`.
pub const UNIT_HEADER_LEN: usize = 4;

// ── Encrypted frame ──────────────────────────────────────────────────────────

/// A complete 40-byte encrypted frame.
///
/// Construction goes through [`from_bytes`](Self::from_bytes) or the
/// codec's encode path, so holding one guarantees the length invariant
/// (and nothing more — authenticity is the codec's job).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedFrame([u8; FRAME_LEN]);

impl EncryptedFrame {
    /// Wrap raw frame bytes, checking only the length invariant.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        let arr: [u8; FRAME_LEN] = bytes
            .try_into()
            .map_err(|_| WireError::BadFrameLength(bytes.len()))?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    pub fn into_inner(self) -> [u8; FRAME_LEN] {
        self.0
    }
}

impl From<[u8; FRAME_LEN]> for EncryptedFrame {
    fn from(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for EncryptedFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ── Errors ───────────────────────────────────────────────────────────────────

/// Errors that can arise when interpreting wire-format data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("encrypted frame must be {FRAME_LEN} bytes, got {0}")]
    BadFrameLength(usize),

    #[error("unit datagram shorter than its {UNIT_HEADER_LEN}-byte header: {0} bytes")]
    BadDatagramLength(usize),
}

// ── Tests ────────────────────────────────────────────────────────────────────
