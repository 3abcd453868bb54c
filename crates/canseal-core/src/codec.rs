//! Frame codec — authenticated encryption of the fixed 40-byte frame.
//!
//! Encrypt-then-MAC over AES-128-CBC:
//!
//!   plaintext  = counter_be16 || payload, PKCS#7-padded to one block
//!   ciphertext = AES-128-CBC(key, iv, plaintext)
//!   mac        = HMAC-SHA256(key, iv || frame_id_be16 || ciphertext)[..6]
//!   frame      = iv || frame_id_be16 || ciphertext || mac
//!
//! The MAC is verified (in constant time) on the ciphertext before any
//! decrypted byte is looked at, so padding is only ever inspected on
//! authenticated data. The 48-bit tag is a deliberate trade-off that
//! keeps the frame at exactly 5 bus units; widening it would change
//! `FRAME_LEN` and break wire compatibility.
//!
//! Pure transformation: no I/O, no state. Encoding consumes randomness
//! for the IV; `encode_with_iv` makes the output deterministic for tests.

use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::wire::{
    EncryptedFrame, BLOCK_LEN, CIPHERTEXT_LEN, COUNTER_LEN, FRAME_ID_LEN, FRAME_LEN, IV_LEN,
    MAC_LEN, MAX_PAYLOAD,
};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// Symmetric key length. One key drives both cipher and MAC.
pub const KEY_LEN: usize = 16;

// ── Secret key ───────────────────────────────────────────────────────────────

/// The shared 16-byte symmetric key.
///
/// Distributed out-of-band, constant for the life of the process, used
/// identically by sender and receiver. Wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey(Zeroizing<[u8; KEY_LEN]>);

impl SecretKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(Zeroizing::new(bytes))
    }

    /// Parse a key from its 32-character hex form.
    pub fn from_hex(s: &str) -> Result<Self, CodecError> {
        let decoded = hex::decode(s.trim()).map_err(|_| CodecError::BadKey)?;
        let bytes: [u8; KEY_LEN] = decoded.try_into().map_err(|_| CodecError::BadKey)?;
        Ok(Self(Zeroizing::new(bytes)))
    }

    /// Hex form for persistent storage. Store with restrictive permissions.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(*self.0))
    }

    fn raw(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

// ── Decoded frame ────────────────────────────────────────────────────────────

/// The plaintext contents of a successfully authenticated frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub frame_id: u16,
    pub payload: Vec<u8>,
    pub counter: u16,
}

// ── Codec ────────────────────────────────────────────────────────────────────

/// Stateless encoder/decoder bound to one secret key.
pub struct FrameCodec {
    key: SecretKey,
}

impl FrameCodec {
    pub fn new(key: SecretKey) -> Self {
        Self { key }
    }

    /// Encrypt and authenticate one frame with a fresh random IV.
    ///
    /// `counter` must strictly increase across frames from one sender;
    /// that is the caller's contract, not enforced here.
    pub fn encode(
        &self,
        frame_id: u16,
        payload: &[u8],
        counter: u16,
    ) -> Result<EncryptedFrame, CodecError> {
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);
        self.encode_with_iv(frame_id, payload, counter, iv)
    }

    /// Like [`encode`](Self::encode) with a caller-supplied IV.
    ///
    /// Deterministic, which makes frame bytes checkable in tests. Never
    /// reuse an IV outside of tests.
    pub fn encode_with_iv(
        &self,
        frame_id: u16,
        payload: &[u8],
        counter: u16,
        iv: [u8; IV_LEN],
    ) -> Result<EncryptedFrame, CodecError> {
        if payload.len() > MAX_PAYLOAD {
            return Err(CodecError::PayloadTooLarge(payload.len()));
        }

        // counter || payload || PKCS#7 pad, exactly one block
        let body_len = COUNTER_LEN + payload.len();
        let pad = (CIPHERTEXT_LEN - body_len) as u8;
        let mut block = [pad; CIPHERTEXT_LEN];
        block[..COUNTER_LEN].copy_from_slice(&counter.to_be_bytes());
        block[COUNTER_LEN..body_len].copy_from_slice(payload);

        let ciphertext = Aes128CbcEnc::new(self.key.raw().into(), (&iv).into())
            .encrypt_padded_vec_mut::<NoPadding>(&block);
        block.zeroize();

        let frame_id_be = frame_id.to_be_bytes();
        let mac = self.mac_tag(&iv, &frame_id_be, &ciphertext);

        let mut frame = [0u8; FRAME_LEN];
        frame[..IV_LEN].copy_from_slice(&iv);
        frame[IV_LEN..IV_LEN + FRAME_ID_LEN].copy_from_slice(&frame_id_be);
        frame[IV_LEN + FRAME_ID_LEN..FRAME_LEN - MAC_LEN].copy_from_slice(&ciphertext);
        frame[FRAME_LEN - MAC_LEN..].copy_from_slice(&mac);
        Ok(EncryptedFrame::from(frame))
    }

    /// Verify and decrypt one frame.
    ///
    /// Checks, in order: length (before any cryptographic work), MAC
    /// over the ciphertext, then padding of the decrypted block. A frame
    /// that fails any check yields no plaintext to the caller.
    pub fn decode(&self, frame: &[u8]) -> Result<DecodedFrame, CodecError> {
        if frame.len() != FRAME_LEN {
            return Err(CodecError::MalformedFrame("length must be 40 bytes"));
        }
        let iv = &frame[..IV_LEN];
        let frame_id_be = &frame[IV_LEN..IV_LEN + FRAME_ID_LEN];
        let ciphertext = &frame[IV_LEN + FRAME_ID_LEN..FRAME_LEN - MAC_LEN];
        let mac = &frame[FRAME_LEN - MAC_LEN..];

        if ciphertext.len() % BLOCK_LEN != 0 {
            return Err(CodecError::MalformedFrame(
                "ciphertext is not block-aligned",
            ));
        }

        // Authenticate before trusting a single decrypted byte.
        let expected = self.mac_tag(iv, frame_id_be, ciphertext);
        if !bool::from(expected.ct_eq(mac)) {
            return Err(CodecError::AuthenticationFailure);
        }

        let iv_arr: [u8; IV_LEN] = iv.try_into().expect("slice length fixed above");
        let padded = Aes128CbcDec::new(self.key.raw().into(), (&iv_arr).into())
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
            .map_err(|_| CodecError::MalformedFrame("ciphertext is not block-aligned"))?;

        let plaintext = strip_pkcs7(&padded)?;
        if plaintext.len() < COUNTER_LEN {
            return Err(CodecError::MalformedFrame("plaintext lacks counter prefix"));
        }

        let counter = u16::from_be_bytes([plaintext[0], plaintext[1]]);
        let frame_id = u16::from_be_bytes([frame_id_be[0], frame_id_be[1]]);
        Ok(DecodedFrame {
            frame_id,
            payload: plaintext[COUNTER_LEN..].to_vec(),
            counter,
        })
    }

    /// HMAC-SHA256 over iv || frame_id || ciphertext, truncated to 6 bytes.
    fn mac_tag(&self, iv: &[u8], frame_id_be: &[u8], ciphertext: &[u8]) -> [u8; MAC_LEN] {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.key.raw())
            .expect("HMAC-SHA256 accepts keys of any length");
        mac.update(iv);
        mac.update(frame_id_be);
        mac.update(ciphertext);
        let digest = mac.finalize().into_bytes();
        let mut tag = [0u8; MAC_LEN];
        tag.copy_from_slice(&digest[..MAC_LEN]);
        tag
    }
}

/// Validate and strip PKCS#7 padding.
///
/// Every indicated pad byte is checked, not just the last one; a pad
/// length of 0 or beyond one block is rejected.
fn strip_pkcs7(padded: &[u8]) -> Result<&[u8], CodecError> {
    let pad = *padded.last().ok_or(CodecError::PaddingError)? as usize;
    if pad == 0 || pad > BLOCK_LEN || pad > padded.len() {
        return Err(CodecError::PaddingError);
    }
    if padded[padded.len() - pad..].iter().any(|&b| b as usize != pad) {
        return Err(CodecError::PaddingError);
    }
    Ok(&padded[..padded.len() - pad])
}

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Wrong length or structure. Recoverable: drop the frame, resume.
    #[error("malformed frame: {0}")]
    MalformedFrame(&'static str),

    /// MAC mismatch. Always a tamper event, never silently ignored.
    #[error("authentication failure: MAC mismatch")]
    AuthenticationFailure,

    /// Inconsistent padding on an authenticated block. Reported like an
    /// authentication failure.
    #[error("invalid padding in decrypted frame")]
    PaddingError,

    /// Encoding-side: payload cannot fit the fixed frame.
    #[error("payload length {0} exceeds maximum {MAX_PAYLOAD}")]
    PayloadTooLarge(usize),

    /// Key material is not exactly 16 bytes of hex.
    #[error("secret key must be {KEY_LEN} bytes of hex")]
    BadKey,
}

// ── Tests ────────────────────────────────────────────────────────────────────
