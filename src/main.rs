use anyhow::Result;
use parser_ai::app;
use parser_ai::app::events::UserEvent;
use parser_ai::app::file_dialog::NativeDialogService;
use parser_ai::app::state::AppState;
use parser_ai::config::AppConfig;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Reads `IpcMessage`s as JSON lines from stdin and writes `UserEvent`s as
/// JSON lines to stdout. Paths given on the command line are opened first.
///
/// A single-threaded runtime keeps commands in arrival order.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the events.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });
    let state = AppState::from_config(config).into_shared();
    let dialog = Arc::new(NativeDialogService);
    let (proxy, mut events) = mpsc::unbounded_channel::<UserEvent>();

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(event) = events.recv().await {
            let mut line = match serde_json::to_string(&event) {
                Ok(line) => line,
                Err(e) => {
                    tracing::error!("Failed to serialize event: {}", e);
                    continue;
                }
            };
            line.push('\n');
            if let Err(e) = stdout.write_all(line.as_bytes()).await {
                tracing::error!("Output closed: {}", e);
                break;
            }
            stdout.flush().await.ok();
        }
    });

    let mut handles = Vec::new();
    handles.extend(app::handle_ipc_message(
        r#"{"command":"initialize"}"#,
        dialog.clone(),
        proxy.clone(),
        state.clone(),
    ));

    let initial_paths: Vec<String> = std::env::args().skip(1).collect();
    if !initial_paths.is_empty() {
        let message = serde_json::json!({
            "command": "openPaths",
            "payload": { "paths": initial_paths },
        });
        handles.extend(app::handle_ipc_message(
            &message.to_string(),
            dialog.clone(),
            proxy.clone(),
            state.clone(),
        ));
    }

    tracing::info!("Application initialized, waiting for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        handles.retain(|handle| !handle.is_finished());
        handles.extend(app::handle_ipc_message(
            line,
            dialog.clone(),
            proxy.clone(),
            state.clone(),
        ));
    }

    tracing::info!("Input closed, waiting for {} running commands.", handles.len());
    for handle in handles {
        if let Err(e) = handle.await {
            tracing::error!("Command task failed: {}", e);
        }
    }
    drop(proxy);
    writer.await?;
    Ok(())
}
