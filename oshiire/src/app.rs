use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use oshiire_ipc::{Command, Response};

use crate::core::{Config, Scratchpad};
use crate::ipc::IpcServer;
use crate::wm::{WmClient, WmConnection};

pub type IpcCommandWithResponse = (Command, mpsc::Sender<Response>);

const DEFAULT_AUTOSAVE_INTERVAL_MS: u64 = 500;

pub struct App {}

impl App {
    pub fn run() -> Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(Self::run_async())
    }

    /// Daemon body. One loop owns the scratchpad state; control commands,
    /// WM events and the autosave tick all funnel through it, so every
    /// mutation of tag membership is serialized in arrival order.
    async fn run_async() -> Result<()> {
        let config_path = Config::default_path();
        let config = Config::load(&config_path)
            .with_context(|| format!("cannot start without config at {:?}", config_path))?;
        tracing::info!("loaded {} tags from {:?}", config.tags.len(), config_path);

        let wm = Arc::new(WmConnection::connect().await?);
        let mut wm_events = WmConnection::subscribe_windows().await?;

        let (cmd_tx, mut cmd_rx) = mpsc::channel::<IpcCommandWithResponse>(256);
        let ipc_server = IpcServer::new(cmd_tx);
        tokio::spawn(async move {
            if let Err(e) = ipc_server.run().await {
                tracing::error!("control socket error: {}", e);
            }
        });

        let interval_ms = config
            .autosave_interval_ms
            .unwrap_or(DEFAULT_AUTOSAVE_INTERVAL_MS);
        let mut autosave = tokio::time::interval(Duration::from_millis(interval_ms));
        autosave.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut pad = Scratchpad::new(wm, config, config_path);
        pad.resync(true).await;

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                Some((cmd, resp_tx)) = cmd_rx.recv() => {
                    let quit = matches!(cmd, Command::Quit);
                    let response = dispatch(&mut pad, &cmd).await;
                    let _ = resp_tx.send(response).await;
                    if quit {
                        tracing::info!("quit command received");
                        break;
                    }
                }
                event = wm_events.recv() => {
                    match event {
                        Some(event) => pad.handle_window_event(event).await,
                        None => {
                            tracing::error!("window manager event stream ended");
                            break;
                        }
                    }
                }
                _ = autosave.tick() => pad.autosave_tick().await,
                _ = &mut shutdown => {
                    tracing::info!("interrupted");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Exhaustive mapping from control operations to controller calls.
pub async fn dispatch<W: WmClient>(pad: &mut Scratchpad<W>, cmd: &Command) -> Response {
    match cmd {
        Command::Show { tag } => {
            pad.focus(tag, true).await;
            Response::Ok
        }
        Command::Hide { tag } => {
            pad.unfocus(tag).await;
            Response::Ok
        }
        Command::Next => {
            pad.next_window().await;
            Response::Ok
        }
        Command::Toggle { tag } => {
            pad.toggle(tag).await;
            Response::Ok
        }
        Command::HideCurrent => {
            pad.hide_current().await;
            Response::Ok
        }
        Command::Run { tag, app } => {
            pad.run_subtag(tag, app).await;
            Response::Ok
        }
        Command::Dialog => {
            pad.dialog_toggle().await;
            Response::Ok
        }
        Command::GeomRestore => {
            pad.geom_restore_current().await;
            Response::Ok
        }
        Command::GeomDump => match pad.geom_dump_current().await {
            Ok(()) => Response::Ok,
            Err(e) => Response::Error {
                message: format!("{:#}", e),
            },
        },
        Command::GeomSave => {
            pad.geom_save_current().await;
            Response::Ok
        }
        Command::GeomAutosaveMode => {
            pad.autosave_toggle().await;
            Response::Ok
        }
        Command::ListTags => Response::Tags {
            tags: pad.tag_infos(),
        },
        Command::GetState => Response::State {
            state: pad.state_info(),
        },
        Command::Reload => match pad.reload().await {
            Ok(()) => Response::Ok,
            Err(e) => Response::Error {
                message: format!("config reload failed, keeping previous config: {:#}", e),
            },
        },
        Command::Quit => Response::Ok,
    }
}
