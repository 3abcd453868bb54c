//! Inbound pipeline: bus datagrams → reassembly → decode → guard.
//!
//! Every rejection is terminal for that frame; nothing downstream sees
//! a frame that failed an earlier stage. Decode failures and replays
//! are published as security alerts, duplicates stay silent.

use std::sync::Arc;

use tokio::sync::broadcast;

use canseal_core::codec::FrameCodec;
use canseal_core::events::Event;
use canseal_services::{CounterStore, Notifier, Progress, Reassembler, ReplayGuard, Verdict};

use crate::bus::UdpBus;

pub struct ReceiveLoop {
    bus: Arc<UdpBus>,
    codec: FrameCodec,
    guard: ReplayGuard,
    store: CounterStore,
    notifier: Notifier,
    shutdown: broadcast::Receiver<()>,
}

impl ReceiveLoop {
    pub fn new(
        bus: Arc<UdpBus>,
        codec: FrameCodec,
        guard: ReplayGuard,
        store: CounterStore,
        notifier: Notifier,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            bus,
            codec,
            guard,
            store,
            notifier,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        let mut reassembler = Reassembler::new();
        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("receive loop shutting down");
                    return;
                }
                unit = self.bus.recv_unit() => {
                    let unit = match unit {
                        Ok(Some(u)) => u,
                        Ok(None) => continue,
                        Err(e) => {
                            tracing::error!(error = %e, "bus receive failed");
                            continue;
                        }
                    };
                    self.handle_unit(&mut reassembler, unit.addr, &unit.data);
                }
            }
        }
    }

    fn handle_unit(&mut self, reassembler: &mut Reassembler, addr: u32, data: &[u8]) {
        match reassembler.push(data) {
            Progress::Accumulating(len) => {
                tracing::debug!(addr, buffered = len, "unit buffered");
            }
            Progress::Overflow(discarded) => {
                tracing::warn!(discarded, "reassembly overflow, burst discarded");
            }
            Progress::Ready(frame) => self.handle_frame(&frame),
        }
    }

    fn handle_frame(&mut self, frame: &[u8; canseal_core::wire::FRAME_LEN]) {
        let decoded = match self.codec.decode(frame) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(error = %e, "frame rejected before decryption output");
                self.notifier.publish(Event::tamper(e.to_string()));
                return;
            }
        };

        match self.guard.evaluate(&decoded) {
            Verdict::Duplicate => {
                tracing::debug!(
                    frame_id = decoded.frame_id,
                    counter = decoded.counter,
                    "duplicate suppressed"
                );
            }
            Verdict::Replay { last_accepted } => {
                tracing::warn!(
                    frame_id = decoded.frame_id,
                    counter = decoded.counter,
                    last_accepted,
                    "replay rejected"
                );
                self.notifier.publish(Event::replay(&decoded));
            }
            Verdict::Accept => {
                // Persist before acting so a crash cannot re-open the
                // window for this counter.
                if let Err(e) = self.store.save(decoded.counter) {
                    tracing::warn!(error = %e, "failed to persist accepted counter");
                }
                tracing::info!(
                    frame_id = decoded.frame_id,
                    payload = %hex::encode(&decoded.payload),
                    counter = decoded.counter,
                    "frame accepted"
                );
                self.notifier.publish(Event::accepted(&decoded));
            }
        }
    }
}
