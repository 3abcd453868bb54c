//! Notifier event contract.
//!
//! The receive path publishes these to external observers (dashboards,
//! loggers). They are emitted, never consumed, by the core: a missing
//! subscriber is not an error. Field names are part of the published
//! JSON contract.

use serde::{Deserialize, Serialize};

use crate::codec::DecodedFrame;

/// Category of a security alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    /// Authenticated frame with a non-advancing counter.
    Replay,
    /// Frame that failed authentication, padding, or structural checks.
    Tamper,
}

/// Event published on the notifier channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Event {
    /// A frame passed every check and was acted on.
    #[serde(rename_all = "camelCase")]
    AcceptedFrame {
        frame_id: u16,
        payload_hex: String,
        counter: u16,
    },

    /// A frame was rejected after reassembly.
    #[serde(rename_all = "camelCase")]
    SecurityAlert {
        #[serde(rename = "type")]
        kind: AlertKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        frame_id: Option<u16>,
        #[serde(skip_serializing_if = "Option::is_none")]
        payload_hex: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        counter: Option<u16>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl Event {
    pub fn accepted(frame: &DecodedFrame) -> Self {
        Event::AcceptedFrame {
            frame_id: frame.frame_id,
            payload_hex: hex::encode(&frame.payload),
            counter: frame.counter,
        }
    }

    pub fn replay(frame: &DecodedFrame) -> Self {
        Event::SecurityAlert {
            kind: AlertKind::Replay,
            frame_id: Some(frame.frame_id),
            payload_hex: Some(hex::encode(&frame.payload)),
            counter: Some(frame.counter),
            error: None,
        }
    }

    pub fn tamper(error: impl Into<String>) -> Self {
        Event::SecurityAlert {
            kind: AlertKind::Tamper,
            frame_id: None,
            payload_hex: None,
            counter: None,
            error: Some(error.into()),
        }
    }
}
