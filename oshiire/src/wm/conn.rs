use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::net::UnixStream;
use tokio::sync::{mpsc, Mutex};

use super::event::WindowEvent;
use super::props::{self, WindowProps};
use super::proto::{self, MessageType};
use super::tree::Node;
use super::WmClient;

#[derive(Debug, Deserialize)]
struct CommandOutcome {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubscribeOutcome {
    success: bool,
}

/// Live connection to the window manager's IPC socket.
///
/// Requests and replies are serialized through one stream; the event
/// subscription runs on its own connection (see [`subscribe_windows`]),
/// so replies never interleave with event frames.
pub struct WmConnection {
    stream: Mutex<UnixStream>,
}

impl WmConnection {
    pub async fn connect() -> Result<Self> {
        let path = socket_path().await?;
        let stream = UnixStream::connect(&path)
            .await
            .with_context(|| format!("failed to connect to WM socket {:?}", path))?;
        tracing::info!("connected to window manager at {:?}", path);
        Ok(Self {
            stream: Mutex::new(stream),
        })
    }

    async fn request(&self, kind: MessageType, payload: &[u8]) -> Result<Vec<u8>> {
        let mut stream = self.stream.lock().await;
        proto::write_message(&mut *stream, kind, payload).await?;
        let reply = proto::read_message(&mut *stream).await?;
        Ok(reply.payload)
    }

    /// Open a dedicated connection subscribed to `window` events and feed
    /// them into a channel consumed by the daemon's event loop.
    pub async fn subscribe_windows() -> Result<mpsc::Receiver<WindowEvent>> {
        let path = socket_path().await?;
        let mut stream = UnixStream::connect(&path)
            .await
            .with_context(|| format!("failed to connect to WM socket {:?}", path))?;

        proto::write_message(&mut stream, MessageType::Subscribe, b"[\"window\"]").await?;
        let reply = proto::read_message(&mut stream).await?;
        let outcome: SubscribeOutcome =
            serde_json::from_slice(&reply.payload).context("bad subscribe reply")?;
        if !outcome.success {
            bail!("window manager rejected the window event subscription");
        }

        let (tx, rx) = mpsc::channel::<WindowEvent>(256);
        tokio::spawn(async move {
            loop {
                let msg = match proto::read_message(&mut stream).await {
                    Ok(msg) => msg,
                    Err(e) => {
                        tracing::error!("WM event stream closed: {}", e);
                        break;
                    }
                };
                if !msg.is_event() || msg.event_type() != proto::WINDOW_EVENT {
                    continue;
                }
                match serde_json::from_slice::<WindowEvent>(&msg.payload) {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!("undecodable window event: {}", e),
                }
            }
        });

        Ok(rx)
    }
}

#[async_trait]
impl WmClient for WmConnection {
    async fn get_tree(&self) -> Result<Node> {
        let payload = self.request(MessageType::GetTree, b"").await?;
        serde_json::from_slice(&payload).context("failed to decode window tree")
    }

    async fn run_command(&self, cmd: &str) {
        tracing::debug!("wm command: {}", cmd);
        let payload = match self.request(MessageType::RunCommand, cmd.as_bytes()).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("wm command failed to send: {}", e);
                return;
            }
        };
        if let Ok(outcomes) = serde_json::from_slice::<Vec<CommandOutcome>>(&payload) {
            for outcome in outcomes.iter().filter(|o| !o.success) {
                tracing::warn!(
                    "wm rejected command {:?}: {}",
                    cmd,
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }

    async fn window_props(&self, xid: u32) -> Option<WindowProps> {
        props::probe(xid).await
    }
}

async fn socket_path() -> Result<PathBuf> {
    for var in ["I3SOCK", "SWAYSOCK"] {
        if let Ok(path) = std::env::var(var) {
            return Ok(PathBuf::from(path));
        }
    }

    // Fall back to asking the WM binary, the way i3ipc clients do.
    let output = tokio::process::Command::new("i3")
        .arg("--get-socketpath")
        .output()
        .await
        .context("neither I3SOCK nor SWAYSOCK is set and `i3 --get-socketpath` failed to run")?;
    if !output.status.success() {
        bail!("`i3 --get-socketpath` exited with {}", output.status);
    }
    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if path.is_empty() {
        bail!("`i3 --get-socketpath` returned nothing");
    }
    Ok(PathBuf::from(path))
}
