//! SnackHub - Actor-based terminal client
//!
//! Architecture:
//! - Front end - reads commands from stdin and prints each render
//! - App Layer - central state machine processing events
//! - Network Layer (Tokio) - async HTTP execution and payment polling

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use snackhub::constants::{APP_NAME, APP_VERSION, LOG_FILE};
use snackhub::messages::ui_events::parse_command;
use snackhub::{
    ui, ApiClient, AppActor, AppState, Config, NetworkActor, NetworkCommand, NetworkResponse,
    RenderState, Storage, UiEvent,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging to file
    let file_appender = tracing_appender::rolling::never(".", LOG_FILE);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    let config = Config::load().context("Failed to load configuration")?;
    tracing::info!(api = %config.api_base_url, "Starting {} {}", APP_NAME, APP_VERSION);

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (net_cmd_tx, net_cmd_rx) = mpsc::unbounded_channel::<NetworkCommand>();
    let (net_resp_tx, net_resp_rx) = mpsc::unbounded_channel::<NetworkResponse>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn network actor
    let network_actor = NetworkActor::new(ApiClient::new(&config), config.poll_interval(), net_resp_tx);
    let network = tokio::spawn(network_actor.run(net_cmd_rx));

    // Spawn app actor
    let app_actor = AppActor::new(AppState::new(Storage::new()), net_cmd_tx, render_tx);
    tokio::spawn(app_actor.run(ui_rx, net_resp_rx));

    println!("{} {} - type 'help' for commands", APP_NAME, APP_VERSION);
    run_front_end(ui_tx, &mut render_rx).await?;

    // Give running tasks the chance to wind down after Shutdown
    let _ = network.await;
    Ok(())
}

/// Read commands from stdin and print every render until quit or EOF
async fn run_front_end(
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    let _ = ui_tx.send(UiEvent::Quit);
                    break;
                };
                let events = match parse_command(&line) {
                    Ok(events) => events,
                    Err(usage) => {
                        println!("{}", usage);
                        continue;
                    }
                };
                for event in events {
                    match event {
                        UiEvent::Help => println!("{}", ui::HELP_TEXT),
                        UiEvent::Quit => {
                            let _ = ui_tx.send(UiEvent::Quit);
                            return Ok(());
                        }
                        event => {
                            let _ = ui_tx.send(event);
                        }
                    }
                }
            }
            Some(state) = render_rx.recv() => {
                for line in ui::render(&state) {
                    println!("{}", line);
                }
            }
        }
    }

    Ok(())
}
