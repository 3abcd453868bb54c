//! canseal-ctl — command-line interface for the canseal daemon.

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_PORT: u16 = 5000;

// ── Response types ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct StatusResponse {
    last_accepted_counter: Option<u16>,
    next_message_counter:  u16,
    commands:              usize,
}

#[derive(Deserialize)]
struct CommandsResponse {
    commands: Vec<String>,
}

#[derive(Deserialize)]
struct SendResponse {
    command:    String,
    frame_id:   u16,
    counter:    u16,
    units_sent: usize,
}

// ── HTTP helpers ──────────────────────────────────────────────────────────────

fn base_url(port: u16) -> String {
    format!("http://127.0.0.1:{}/api", port)
}

async fn get_json<T: for<'de> Deserialize<'de>>(url: &str) -> Result<T> {
    let resp = reqwest::get(url)
        .await
        .with_context(|| format!("failed to connect to canseald at {} — is it running?", url))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("daemon returned {}: {}", status, body);
    }

    resp.json::<T>().await.context("failed to parse response")
}

// ── Subcommand handlers ───────────────────────────────────────────────────────

async fn cmd_status(port: u16) -> Result<()> {
    let resp: StatusResponse = get_json(&format!("{}/status", base_url(port))).await?;

    println!("═══════════════════════════════════════");
    println!("  Canseal Daemon Status");
    println!("═══════════════════════════════════════");
    match resp.last_accepted_counter {
        Some(c) => println!("  Last accepted counter : {}", c),
        None    => println!("  Last accepted counter : (no history)"),
    }
    println!("  Next message counter  : {}", resp.next_message_counter);
    println!("  Known commands        : {}", resp.commands);

    Ok(())
}

async fn cmd_commands(port: u16) -> Result<()> {
    let resp: CommandsResponse = get_json(&format!("{}/commands", base_url(port))).await?;

    println!("Available commands ({}):", resp.commands.len());
    for name in &resp.commands {
        println!("  {}", name);
    }

    Ok(())
}

async fn cmd_send(port: u16, command: &str) -> Result<()> {
    let resp: SendResponse =
        get_json(&format!("{}/send/{}", base_url(port), command)).await?;

    println!("Sent '{}'", resp.command);
    println!("  frame id : {:#05x}", resp.frame_id);
    println!("  counter  : {}", resp.counter);
    println!("  units    : {}", resp.units_sent);

    Ok(())
}

fn print_usage() {
    println!("Usage: canseal-ctl [--port <port>] <command>");
    println!();
    println!("Commands:");
    println!("  status          Show counters and daemon state");
    println!("  commands        List dispatchable command names");
    println!("  send <name>     Encrypt and transmit a command");
    println!();
    println!("Options:");
    println!("  --port <port>   Daemon API port (default: {})", DEFAULT_PORT);
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Parse --port option
    let mut port = DEFAULT_PORT;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--port" {
            i += 1;
            port = args.get(i)
                .context("--port requires a value")?
                .parse()
                .context("--port must be a number")?;
        } else {
            remaining.push(&args[i]);
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["status"] | []                => cmd_status(port).await,
        ["commands"]                   => cmd_commands(port).await,
        ["send", name]                 => cmd_send(port, name).await,
        ["help"] | ["--help"] | ["-h"] => { print_usage(); Ok(()) }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
