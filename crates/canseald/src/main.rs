//! canseald — secure control-message daemon for the broadcast bus.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use canseal_core::codec::FrameCodec;
use canseal_core::config::CansealConfig;
use canseal_services::{CommandRegistry, CounterStore, GuardPolicy, Notifier, ReplayGuard};

mod bus;
mod keyfile;
mod rx;
mod tx;

use bus::UdpBus;

const SEND_QUEUE_DEPTH: usize = 32;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = CansealConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = CansealConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        CansealConfig::default()
    });
    tracing::info!(
        bind = %config.bus.bind_addr,
        peer = %config.bus.peer_addr,
        api_port = config.api.port,
        "canseald starting"
    );

    // Shared key
    let key = keyfile::load_or_generate(&config.identity.key_path)?;

    // Persisted counters
    let rx_counter = CounterStore::open(&config.storage.data_dir, "last_counter")
        .context("failed to open receive counter store")?;
    let tx_counter = CounterStore::open(&config.storage.data_dir, "msg_counter")
        .context("failed to open send counter store")?;

    // Replay guard, seeded from disk
    let policy = GuardPolicy {
        rebaseline: config.guard.rebaseline,
        duplicate_window: Duration::from_millis(config.guard.duplicate_window_ms),
        recent_capacity: config.guard.recent_capacity,
    };
    let guard = ReplayGuard::new(policy, rx_counter.load());
    tracing::info!(
        last_accepted = ?guard.last_accepted(),
        rebaseline = config.guard.rebaseline,
        "replay guard ready"
    );

    let registry = CommandRegistry::new();
    let notifier = Notifier::new();

    // Bus bridge
    let bus = Arc::new(
        UdpBus::bind(&config.bus.bind_addr, &config.bus.peer_addr)
            .await
            .context("failed to bind bus bridge")?,
    );

    // Outbound command queue
    let (send_tx, send_rx) = mpsc::channel(SEND_QUEUE_DEPTH);

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    let receive_task = tokio::spawn(
        rx::ReceiveLoop::new(
            bus.clone(),
            FrameCodec::new(key.clone()),
            guard,
            rx_counter.clone(),
            notifier.clone(),
            shutdown_tx.subscribe(),
        )
        .run(),
    );

    let send_task = tokio::spawn(
        tx::SendWorker::new(
            bus,
            FrameCodec::new(key),
            registry.clone(),
            tx_counter.clone(),
            send_rx,
            shutdown_tx.subscribe(),
        )
        .run(),
    );

    // Event log: everything the receive loop publishes, as JSON lines.
    let event_task = {
        let mut events = notifier.subscribe();
        let mut shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.recv() => return,
                    event = events.recv() => match event {
                        Ok(event) => match serde_json::to_string(&event) {
                            Ok(json) => tracing::info!(%json, "event"),
                            Err(e) => tracing::warn!(error = %e, "failed to serialize event"),
                        },
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(missed = n, "event logger lagged");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
                    }
                }
            }
        })
    };

    // HTTP command dispatcher
    let api_task = {
        let state = canseal_api::ApiState {
            send_tx,
            registry,
            rx_counter,
            tx_counter,
        };
        let port = config.api.port;
        tokio::spawn(async move {
            if let Err(e) = canseal_api::serve(state, port).await {
                tracing::error!(error = %e, "API server failed");
            }
        })
    };

    // ── Wait for exit ────────────────────────────────────────────────────────

    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::select! {
        _ = shutdown_rx.recv() => tracing::info!("shutting down"),
        r = receive_task       => tracing::error!("receive loop exited: {:?}", r),
        r = send_task          => tracing::error!("send worker exited: {:?}", r),
        r = event_task         => tracing::error!("event logger exited: {:?}", r),
        r = api_task           => tracing::error!("API server exited: {:?}", r),
    }

    Ok(())
}
