//! canseal-core — wire format, frame codec, chunker, and shared types.
//! All other canseal crates depend on this one.

pub mod chunk;
pub mod codec;
pub mod config;
pub mod events;
pub mod wire;

pub use codec::{DecodedFrame, FrameCodec, SecretKey};
pub use events::{AlertKind, Event};
pub use wire::{EncryptedFrame, TransportUnit};
