//! Outbound pipeline: command name → encoded frame → transport units.
//!
//! One worker owns the message counter, so concurrent API calls cannot
//! race it. The counter file stores the next value to use and is
//! advanced only after every unit of the frame went out.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use canseal_core::chunk;
use canseal_core::codec::FrameCodec;
use canseal_services::{CommandRegistry, CounterStore, SendError, SendRequest, SentInfo};

use crate::bus::UdpBus;

pub struct SendWorker {
    bus: Arc<UdpBus>,
    codec: FrameCodec,
    registry: CommandRegistry,
    store: CounterStore,
    requests: mpsc::Receiver<SendRequest>,
    shutdown: broadcast::Receiver<()>,
}

impl SendWorker {
    pub fn new(
        bus: Arc<UdpBus>,
        codec: FrameCodec,
        registry: CommandRegistry,
        store: CounterStore,
        requests: mpsc::Receiver<SendRequest>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            bus,
            codec,
            registry,
            store,
            requests,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("send worker shutting down");
                    return;
                }
                req = self.requests.recv() => {
                    let Some(req) = req else {
                        tracing::info!("send queue closed, worker exiting");
                        return;
                    };
                    let result = self.transmit(&req.command).await;
                    if let Err(e) = &result {
                        tracing::warn!(command = %req.command, error = %e, "send failed");
                    }
                    // Caller may have given up; nothing to do then.
                    let _ = req.reply.send(result);
                }
            }
        }
    }

    async fn transmit(&self, command: &str) -> Result<SentInfo, SendError> {
        let spec = self
            .registry
            .resolve(command)
            .ok_or_else(|| SendError::UnknownCommand(command.to_string()))?;

        let counter = self.store.load().unwrap_or(0);
        let frame = self.codec.encode(spec.frame_id, spec.payload, counter)?;
        let units = chunk::split(&frame);
        for unit in &units {
            self.bus.send_unit(unit).await?;
        }
        self.store.save(counter.wrapping_add(1))?;

        tracing::info!(
            command,
            frame_id = spec.frame_id,
            counter,
            units = units.len(),
            "command transmitted"
        );

        Ok(SentInfo {
            command: command.to_string(),
            frame_id: spec.frame_id,
            counter,
            units: units.len(),
        })
    }
}
