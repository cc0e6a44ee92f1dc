//! Control bridge: line-delimited JSON over a Unix domain socket.
//!
//! Each connection is served serially, one command per newline-terminated
//! line; multiple connections are served concurrently. Domain errors come
//! back as JSON error objects and never drop the connection.

mod commands;

pub use commands::CommandDispatcher;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tracing::{error, info, warn};

use crate::domain::models::BridgeConfig;
use crate::services::coordinator::SwarmHiveCoordinator;

/// Unix-socket control channel for the coordination engine.
pub struct ControlBridge {
    socket_path: PathBuf,
    coordinator: Arc<SwarmHiveCoordinator>,
    dispatcher: Arc<CommandDispatcher>,
    shutdown: Notify,
}

impl ControlBridge {
    /// Create a bridge for the configured socket path.
    pub fn new(config: &BridgeConfig, coordinator: Arc<SwarmHiveCoordinator>) -> Self {
        Self {
            socket_path: PathBuf::from(&config.socket_path),
            coordinator: Arc::clone(&coordinator),
            dispatcher: Arc::new(CommandDispatcher::new(coordinator)),
            shutdown: Notify::new(),
        }
    }

    /// The socket path this bridge serves on.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Bind the socket and serve until `stop` is called. A stale socket
    /// file from a previous run is removed before binding.
    pub async fn serve(self: Arc<Self>) -> Result<()> {
        if let Some(parent) = self.socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create socket dir {}", parent.display()))?;
        }
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)
                .with_context(|| format!("cannot remove stale socket {}", self.socket_path.display()))?;
        }

        let listener = UnixListener::bind(&self.socket_path)
            .with_context(|| format!("cannot bind {}", self.socket_path.display()))?;
        info!(socket = %self.socket_path.display(), "control_bridge_started");

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, _addr)) => {
                            let dispatcher = Arc::clone(&self.dispatcher);
                            tokio::spawn(async move {
                                if let Err(err) = handle_connection(stream, dispatcher).await {
                                    warn!(error = %err, "client_handler_error");
                                }
                            });
                        }
                        Err(err) => {
                            error!(error = %err, "accept_failed");
                        }
                    }
                }
                () = self.shutdown.notified() => {
                    break;
                }
            }
        }

        info!("control_bridge_stopped");
        Ok(())
    }

    /// Stop serving: drain active swarms and remove the socket file.
    /// Errors during cleanup are logged and swallowed.
    pub async fn stop(&self) {
        self.shutdown.notify_waiters();
        self.coordinator.stop().await;
        if self.socket_path.exists() {
            if let Err(err) = std::fs::remove_file(&self.socket_path) {
                warn!(error = %err, "socket_cleanup_failed");
            }
        }
    }
}

/// Serve one connection: read a line, dispatch, write the response line.
async fn handle_connection(stream: UnixStream, dispatcher: Arc<CommandDispatcher>) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let reader = BufReader::new(read_half);
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = dispatcher.dispatch_line(line).await;
        let mut payload = serde_json::to_vec(&response)?;
        payload.push(b'\n');
        write_half.write_all(&payload).await?;
        write_half.flush().await?;
    }

    Ok(())
}
