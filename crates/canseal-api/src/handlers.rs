//! HTTP API handlers — exposes daemon state as JSON.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::{extract::State, Json};
use serde::Serialize;

use canseal_services::{CommandRegistry, CounterStore, SendError, SendRequest};

#[derive(Clone)]
pub struct ApiState {
    pub send_tx: tokio::sync::mpsc::Sender<SendRequest>,
    pub registry: CommandRegistry,
    pub rx_counter: CounterStore,
    pub tx_counter: CounterStore,
}

// ── /status ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatusResponse {
    pub last_accepted_counter: Option<u16>,
    pub next_message_counter: u16,
    pub commands: usize,
}

pub async fn handle_status(State(state): State<ApiState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        last_accepted_counter: state.rx_counter.load(),
        next_message_counter: state.tx_counter.load().unwrap_or(0),
        commands: state.registry.len(),
    })
}

// ── /commands ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct CommandsResponse {
    pub commands: Vec<&'static str>,
}

pub async fn handle_commands(State(state): State<ApiState>) -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: state.registry.names(),
    })
}

// ── /send/:command ────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct SendResponse {
    pub command: String,
    pub frame_id: u16,
    pub counter: u16,
    pub units_sent: usize,
}

pub async fn handle_send(
    State(state): State<ApiState>,
    Path(command): Path<String>,
) -> Result<Json<SendResponse>, (StatusCode, String)> {
    // Reject unknown names here so a typo never reaches the send queue.
    if state.registry.resolve(&command).is_none() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("unknown command: {command}"),
        ));
    }

    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
    state
        .send_tx
        .send(SendRequest {
            command: command.clone(),
            reply: reply_tx,
        })
        .await
        .map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "send queue closed".to_string(),
            )
        })?;

    let sent = reply_rx
        .await
        .map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "send task dropped the request".to_string(),
            )
        })?
        .map_err(|e| match e {
            SendError::UnknownCommand(name) => {
                (StatusCode::BAD_REQUEST, format!("unknown command: {name}"))
            }
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        })?;

    tracing::info!(
        command = %sent.command,
        frame_id = sent.frame_id,
        counter = sent.counter,
        "command transmitted via API"
    );

    Ok(Json(SendResponse {
        command: sent.command,
        frame_id: sent.frame_id,
        counter: sent.counter,
        units_sent: sent.units,
    }))
}
