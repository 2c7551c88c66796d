//! examclockd - The examclock background service
//!
//! This is the main entry point for the examclockd service.
//! It wires together all the components:
//! - Configuration loading
//! - Store initialization
//! - Session engine and auto-start scheduler
//! - Display host (Linux)
//! - IPC server

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::Parser;
use examclock_api::{
    API_VERSION, ClientCommand, Command, ErrorCode, ErrorInfo, Event, EventPayload, Request,
    Response, ResponsePayload,
};
use examclock_config::{Policy, load_config_or_default};
use examclock_core::{AutoStartScheduler, CoreEvent, SchedulerAction, SessionEngine};
use examclock_host_api::DisplayHost;
use examclock_host_linux::LinuxDisplayHost;
use examclock_ipc::{IpcServer, ServerMessage};
use examclock_store::{SessionReport, SqliteStore, Store};
use examclock_util::{ClientId, database_path, default_config_path, reports_dir};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// examclockd - Countdown timing service for examination rooms
#[derive(Parser, Debug)]
#[command(name = "examclockd")]
#[command(about = "Countdown timing service for examination rooms", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/examclock/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Socket path override (or set EXAMCLOCK_SOCKET env var)
    #[arg(short, long, env = "EXAMCLOCK_SOCKET")]
    socket: Option<PathBuf>,

    /// Data directory override (or set EXAMCLOCK_DATA_DIR env var)
    #[arg(short, long, env = "EXAMCLOCK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Main service state
struct Service {
    policy: Policy,
    engine: Mutex<SessionEngine>,
    scheduler: Mutex<AutoStartScheduler>,
    host: Arc<LinuxDisplayHost>,
    ipc: Arc<IpcServer>,
    reports_dir: PathBuf,
}

impl Service {
    async fn new(args: &Args) -> Result<Self> {
        let policy = load_config_or_default(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            session_presets = policy.defaults.session_presets.len(),
            exam_presets = policy.exam_presets.len(),
            "Configuration loaded"
        );

        let socket_path = args
            .socket
            .clone()
            .unwrap_or_else(|| policy.service.socket_path.clone());

        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| policy.service.data_dir.clone());

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        let db_path = database_path(&data_dir);
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        let host = Arc::new(LinuxDisplayHost::new());
        let engine = SessionEngine::new(policy.defaults.clone(), store);

        let mut ipc = IpcServer::new(&socket_path);
        ipc.start().await?;

        Ok(Self {
            policy,
            engine: Mutex::new(engine),
            scheduler: Mutex::new(AutoStartScheduler::new()),
            host,
            ipc: Arc::new(ipc),
            reports_dir: reports_dir(&data_dir),
        })
    }

    async fn run(self) -> Result<()> {
        let mut ipc_messages = self
            .ipc
            .take_message_receiver()
            .await
            .context("IPC message receiver already taken")?;

        let ipc_accept = self.ipc.clone();
        tokio::spawn(async move {
            if let Err(e) = ipc_accept.run().await {
                error!(error = %e, "IPC server error");
            }
        });

        // A session restored from the store is still running
        if self.engine.lock().await.state().is_live {
            info!("Resuming live session");
            self.hold_sleep_inhibit().await;
        }

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sighup =
            signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

        let mut tick_timer = tokio::time::interval(self.policy.service.tick);

        info!(tick_ms = self.policy.service.tick.as_millis() as u64, "Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }

                // Sent by the compositor on exit
                _ = sighup.recv() => {
                    info!("Received SIGHUP, shutting down gracefully");
                    break;
                }

                _ = tick_timer.tick() => {
                    self.tick(examclock_util::now()).await;
                }

                Some(msg) = ipc_messages.recv() => {
                    self.handle_ipc_message(msg).await;
                }
            }
        }

        info!("Shutting down examclockd");

        self.ipc.broadcast_event(Event::new(EventPayload::Shutdown));

        // The snapshot keeps a live session; only the inhibit goes away
        if let Err(e) = self.host.release_sleep().await {
            warn!(error = %e, "Failed to release sleep inhibit");
        }

        self.ipc.shutdown();

        info!("Shutdown complete");
        Ok(())
    }

    /// Auto-start, timing watches and the periodic view broadcast
    async fn tick(&self, now: DateTime<Local>) {
        let action = {
            let engine = self.engine.lock().await;
            self.scheduler.lock().await.poll(engine.state(), now)
        };

        if let Some(SchedulerAction::Commence { target }) = action {
            info!(target = %target, "Auto-start time reached");
            self.prepare_display().await;
            self.hold_sleep_inhibit().await;
            self.apply(Command::BeginLiveSession, now).await;
        }

        let (events, view) = {
            let mut engine = self.engine.lock().await;
            let events = engine.apply_due(now);
            let view = engine.state().is_live.then(|| engine.view(now));
            (events, view)
        };

        self.handle_core_events(events).await;

        if let Some(view) = view {
            self.ipc
                .broadcast_event(Event::new(EventPayload::StateChanged(view)));
        }
    }

    /// Apply a command, publish what it caused; returns whether it changed anything
    async fn apply(&self, command: Command, now: DateTime<Local>) -> bool {
        let (applied, view) = {
            let mut engine = self.engine.lock().await;
            let applied = engine.apply(command, now);
            let view = applied.changed.then(|| engine.view(now));
            (applied, view)
        };

        self.handle_core_events(applied.events).await;

        if let Some(view) = view {
            self.ipc
                .broadcast_event(Event::new(EventPayload::StateChanged(view)));
        }

        applied.changed
    }

    async fn handle_core_events(&self, events: Vec<CoreEvent>) {
        for event in events {
            match event {
                CoreEvent::SessionCommenced {
                    started_at,
                    exam_count,
                } => {
                    // Both calls are idempotent; an auto-start already made them
                    self.prepare_display().await;
                    self.hold_sleep_inhibit().await;
                    self.ipc
                        .broadcast_event(Event::new(EventPayload::SessionCommenced {
                            started_at,
                            exam_count,
                        }));
                }

                CoreEvent::SessionEnded { report } => {
                    let report_path = self.write_report(&report);

                    if let Err(e) = self.host.release_sleep().await {
                        warn!(error = %e, "Failed to release sleep inhibit");
                    }

                    self.ipc
                        .broadcast_event(Event::new(EventPayload::SessionEnded {
                            title: report.title,
                            ended_at: report.ended_at,
                            report_path,
                        }));
                }

                CoreEvent::ExamFinished { exam_id, name } => {
                    self.ipc
                        .broadcast_event(Event::new(EventPayload::ExamFinished { exam_id, name }));
                }

                CoreEvent::AutoStartArmed { target } => {
                    self.ipc
                        .broadcast_event(Event::new(EventPayload::AutoStartArmed { target }));
                }

                CoreEvent::AutoStartCancelled => {
                    debug!("Auto-start cancelled");
                }
            }
        }
    }

    fn write_report(&self, report: &SessionReport) -> Option<String> {
        match report.write_to(&self.reports_dir) {
            Ok(path) => Some(path.display().to_string()),
            Err(e) => {
                warn!(error = %e, dir = %self.reports_dir.display(), "Failed to write session log");
                None
            }
        }
    }

    /// Best effort: the session goes ahead even when the display refuses
    async fn prepare_display(&self) {
        if !self.host.capabilities().can_force_fullscreen {
            debug!("Fullscreen not available, skipping");
            return;
        }
        if let Err(e) = self.host.request_exclusive_display().await {
            warn!(error = %e, "Failed to request exclusive display");
        }
    }

    async fn hold_sleep_inhibit(&self) {
        if !self.host.capabilities().can_inhibit_sleep {
            return;
        }
        if let Err(e) = self.host.inhibit_sleep().await {
            warn!(error = %e, "Failed to inhibit sleep");
        }
    }

    async fn handle_ipc_message(&self, msg: ServerMessage) {
        match msg {
            ServerMessage::Request { client_id, request } => {
                let response = self.handle_request(&client_id, request).await;
                if let Err(e) = self.ipc.send_response(&client_id, response).await {
                    debug!(client_id = %client_id, error = %e, "Failed to send response");
                }
            }

            ServerMessage::ClientConnected { client_id, uid } => {
                info!(client_id = %client_id, uid = ?uid, "Client connected");
            }

            ServerMessage::ClientDisconnected { client_id } => {
                debug!(client_id = %client_id, "Client disconnected");
            }
        }
    }

    async fn handle_request(&self, client_id: &ClientId, request: Request) -> Response {
        let request_id = request.request_id;

        if request.api_version != API_VERSION {
            return Response::error(
                request_id,
                ErrorInfo::new(
                    ErrorCode::UnsupportedVersion,
                    format!(
                        "API version {} not supported (expected {})",
                        request.api_version, API_VERSION
                    ),
                ),
            );
        }

        let now = examclock_util::now();

        match request.command {
            ClientCommand::Apply { command } => {
                debug!(client_id = %client_id, command = command.name(), "Apply requested");
                let changed = self.apply(command, now).await;
                Response::success(request_id, ResponsePayload::Applied { changed })
            }

            ClientCommand::GetState => {
                let state = self.engine.lock().await.state().clone();
                Response::success(request_id, ResponsePayload::State(state))
            }

            ClientCommand::GetView => {
                let view = self.engine.lock().await.view(now);
                Response::success(request_id, ResponsePayload::View(view))
            }

            ClientCommand::ExportSession => match self.engine.lock().await.export_session(now) {
                Ok((file_name, contents)) => Response::success(
                    request_id,
                    ResponsePayload::Exported {
                        file_name,
                        contents,
                    },
                ),
                Err(e) => Response::error(
                    request_id,
                    ErrorInfo::new(ErrorCode::StoreError, e.to_string()),
                ),
            },

            ClientCommand::ListPresets => {
                Response::success(request_id, ResponsePayload::Presets(self.policy.catalogue()))
            }

            ClientCommand::SubscribeEvents => {
                // New subscribers get the current picture straight away
                let view = self.engine.lock().await.view(now);
                self.ipc
                    .broadcast_event(Event::new(EventPayload::StateChanged(view)));

                Response::success(
                    request_id,
                    ResponsePayload::Subscribed {
                        client_id: client_id.clone(),
                    },
                )
            }

            ClientCommand::Ping => Response::success(request_id, ResponsePayload::Pong),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "examclockd starting");

    let service = Service::new(&args).await?;
    service.run().await
}
