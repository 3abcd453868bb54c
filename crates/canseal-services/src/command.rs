//! Symbolic command registry.
//!
//! The HTTP surface accepts command names, not raw frames. Each name
//! maps to a frame identifier and the pre-encoded signal payload for
//! that message — signal encoding itself (schemas, bit packing) is an
//! upstream concern, so what lives here are the finished byte strings.
//! Unknown names are rejected with no side effects.

use canseal_core::codec::CodecError;
use canseal_core::wire::MAX_PAYLOAD;

use crate::counter_store::StoreError;

/// One dispatchable command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub frame_id: u16,
    pub payload: &'static [u8],
}

/// The command table for the vehicle body controllers on this bus.
const COMMANDS: &[CommandSpec] = &[
    CommandSpec { name: "engine_on", frame_id: 0x3E8, payload: &[0x01, 0x32, 0x00] },
    CommandSpec { name: "engine_off", frame_id: 0x3E8, payload: &[0x00, 0x32, 0x00] },
    CommandSpec { name: "door_open", frame_id: 0x12C, payload: &[0x00, 0x00, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00] },
    CommandSpec { name: "door_close", frame_id: 0x12C, payload: &[0x00; 8] },
    CommandSpec { name: "bonnet_open", frame_id: 0x354, payload: &[0x00, 0x00, 0x00, 0x04] },
    CommandSpec { name: "bonnet_close", frame_id: 0x354, payload: &[0x00; 4] },
    CommandSpec { name: "headlamp_on", frame_id: 0x1F4, payload: &[0x08, 0x00] },
    CommandSpec { name: "headlamp_off", frame_id: 0x1F4, payload: &[0x00, 0x00] },
    CommandSpec { name: "left_ind_on", frame_id: 0x190, payload: &[0x20, 0x00] },
    CommandSpec { name: "left_ind_off", frame_id: 0x190, payload: &[0x00, 0x00] },
    CommandSpec { name: "right_ind_on", frame_id: 0x190, payload: &[0x40, 0x00] },
    CommandSpec { name: "right_ind_off", frame_id: 0x190, payload: &[0x00, 0x00] },
    CommandSpec { name: "chrome_on", frame_id: 0x403, payload: &[0x5A, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00] },
];

/// Lookup over the static command table.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry;

impl CommandRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a symbolic name. `None` for unknown commands.
    pub fn resolve(&self, name: &str) -> Option<&'static CommandSpec> {
        COMMANDS.iter().find(|c| c.name == name)
    }

    /// All known command names, in table order.
    pub fn names(&self) -> Vec<&'static str> {
        COMMANDS.iter().map(|c| c.name).collect()
    }

    pub fn len(&self) -> usize {
        COMMANDS.len()
    }

    pub fn is_empty(&self) -> bool {
        COMMANDS.is_empty()
    }
}

// ── Send-path contract ───────────────────────────────────────────────────────

/// What the daemon reports after transmitting a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentInfo {
    pub command: String,
    pub frame_id: u16,
    pub counter: u16,
    pub units: usize,
}

/// Errors on the send path, returned synchronously to the caller.
/// Each aborts only the one attempt.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("bus transmit failed: {0}")]
    Bus(#[from] std::io::Error),
}

/// A queued send request, answered over the enclosed channel.
#[derive(Debug)]
pub struct SendRequest {
    pub command: String,
    pub reply: tokio::sync::oneshot::Sender<Result<SentInfo, SendError>>,
}
