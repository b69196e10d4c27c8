//! Event loop of the running instance
//!
//! One task drives everything: stats polling, config file checks, async
//! status replies, server start/stop signals, IPC requests and the delayed
//! restart after a preset change.

mod ipc_handler;

use anyhow::{Context, Result, bail};
use std::pin::pin;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval, sleep_until};
use tokio_stream::StreamExt;
use tracing::{debug, error, info};

use crate::config::PresetSource;
use crate::constants::intervals::{CHECK_CONF_MS, GET_STATS_MS, RESTART_MS};
use crate::ipc::{SelectRequest, SelectResponse, SelectServer, StatusSnapshot};
use crate::jack::{
    ConfigureBackend, ControlBackend, JackBus, ServerConfig, ServerControl, StatusField,
    StatusReply, StatusValue,
};
use crate::preset::{self, Outcome, PresetApplier};
use crate::schema::Component;
use crate::status::{JackStatus, Transition};

/// Which preset to activate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetRequest {
    Default,
    Named(String),
}

/// Why the event loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    Exit,
    Interrupted,
}

pub struct Daemon<C, F> {
    source: PresetSource,
    control: ServerControl<C>,
    config: ServerConfig<F>,
    status: JackStatus,
    restart_at: Option<Instant>,
    startup_preset: Option<PresetRequest>,
}

impl<C: ControlBackend, F: ConfigureBackend> Daemon<C, F> {
    pub fn new(source: PresetSource, control: ServerControl<C>, config: ServerConfig<F>) -> Self {
        Self {
            source,
            control,
            config,
            status: JackStatus::new(),
            restart_at: None,
            startup_preset: None,
        }
    }

    /// Activate a preset once the server state is known
    pub fn queue_startup_preset(&mut self, request: PresetRequest) {
        self.startup_preset = Some(request);
    }

    pub fn reload_presets(&mut self) {
        if self.source.reload_if_changed() {
            let store = self.source.store();
            info!(
                path = %self.source.path().display(),
                presets = store.presets.len(),
                default = ?store.default_preset,
                "Loaded presets"
            );
        }
    }

    pub fn poll_stats(&self) {
        if self.status.is_started() {
            self.control.is_realtime();
            self.control.get_sample_rate();
            self.control.get_period();
            self.control.get_load();
            self.control.get_xruns();
            self.control.get_latency();
        }
    }

    pub async fn receive(&mut self, reply: StatusReply) {
        let field = reply.field;
        let transition = self.status.receive(reply);
        self.on_transition(transition);

        if field == StatusField::IsStarted {
            if let Some(request) = self.startup_preset.take() {
                // Failure is already logged
                let _ = self.activate_preset(&request).await;
            }
        }
    }

    pub fn on_server_signal(&mut self, started: bool) {
        let transition = self
            .status
            .update(StatusField::IsStarted, StatusValue::Flag(started));
        self.on_transition(transition);
    }

    /// A freshly started server gets its stats fetched right away instead of
    /// on the next tick
    fn on_transition(&self, transition: Option<Transition>) {
        if transition == Some(Transition::Started) {
            self.poll_stats();
        }
    }

    /// Apply a preset, stop the server and schedule its restart
    pub async fn activate_preset(&mut self, request: &PresetRequest) -> Result<String> {
        let store = self.source.store();
        let name = match request {
            PresetRequest::Named(name) => name.clone(),
            PresetRequest::Default => match &store.default_preset {
                Some(name) => name.clone(),
                None => {
                    error!("No default preset. Ignoring request.");
                    bail!("No default preset");
                }
            },
        };

        if !store.contains(&name) {
            error!(preset = %name, "Unknown preset. Ignoring it.");
            bail!("Unknown preset '{name}'");
        }

        // Listed but without settings: everything goes back to defaults
        let settings = store.settings_for(&name).cloned().unwrap_or_default();
        let outcomes = PresetApplier::new(&self.config).apply(&settings).await;
        info!(
            preset = %name,
            applied = preset::count(&outcomes, Outcome::Applied),
            reset = preset::count(&outcomes, Outcome::Reset),
            skipped = preset::count(&outcomes, Outcome::Skipped),
            failed = preset::count(&outcomes, Outcome::Failed),
            "Activated preset"
        );
        for (component, setting, value) in settings.iter() {
            debug!(%component, setting, %value, "Preset setting");
        }

        self.stop_server();
        self.restart_at = Some(Instant::now() + Duration::from_millis(RESTART_MS));
        self.status.active_preset = Some(name.clone());
        Ok(name)
    }

    pub fn stop_server(&self) {
        if self.status.is_started() {
            self.control.stop();
        }
    }

    /// Restart timer fired
    pub fn start_server(&mut self) {
        self.restart_at = None;
        if !self.status.is_started() {
            self.control.start();
        }
    }

    pub fn restart_pending(&self) -> bool {
        self.restart_at.is_some()
    }

    pub fn restart_deadline(&self) -> Instant {
        self.restart_at.unwrap_or_else(Instant::now)
    }

    /// Answer an IPC request; the flag asks the loop to exit
    pub async fn handle_request(&mut self, request: SelectRequest) -> (SelectResponse, bool) {
        match request {
            SelectRequest::GetPid => {
                debug!("Client requested PID");
                (SelectResponse::Pid(std::process::id()), false)
            }
            SelectRequest::Exit => {
                debug!("Client requested application exit");
                (SelectResponse::Ready, true)
            }
            SelectRequest::ActivatePreset(name) => {
                debug!(preset = %name, "Client requested activating preset");
                (self.activation_response(&PresetRequest::Named(name)).await, false)
            }
            SelectRequest::ActivateDefaultPreset => {
                debug!("Client requested activating default preset");
                (self.activation_response(&PresetRequest::Default).await, false)
            }
            SelectRequest::StopServer => {
                debug!("Client requested stopping JACK server");
                self.stop_server();
                (SelectResponse::Ready, false)
            }
            SelectRequest::GetStatus => (SelectResponse::Status(self.snapshot()), false),
        }
    }

    async fn activation_response(&mut self, request: &PresetRequest) -> SelectResponse {
        match self.activate_preset(request).await {
            Ok(_) => SelectResponse::Ready,
            Err(e) => SelectResponse::Error(e.to_string()),
        }
    }

    fn snapshot(&self) -> StatusSnapshot {
        let store = self.source.store();
        StatusSnapshot {
            active_preset: self.status.active_preset.clone(),
            default_preset: store.default_preset.clone(),
            presets: store.presets.clone(),
            server_started: self.status.is_started(),
            summary: self.status.summary().to_string(),
            fields: StatusSnapshot::field_values(self.status.fields()),
        }
    }
}

/// Run as the primary instance until asked to exit or interrupted
pub async fn run(
    bus: JackBus,
    source: PresetSource,
    server: SelectServer,
    startup: Option<PresetRequest>,
) -> Result<Shutdown> {
    let (reply_tx, mut replies) = mpsc::unbounded_channel();
    let (request_tx, mut requests) = mpsc::channel(8);
    let _listener = ipc_handler::spawn_ipc_listener(server, request_tx);

    let mut started = pin!(
        bus.control
            .receive_server_started()
            .await
            .context("Failed to subscribe to ServerStarted")?
    );
    let mut stopped = pin!(
        bus.control
            .receive_server_stopped()
            .await
            .context("Failed to subscribe to ServerStopped")?
    );

    let control = ServerControl::new(bus.control.clone(), reply_tx);
    let mut daemon = Daemon::new(source, control, ServerConfig::new(bus.configure));
    if let Some(request) = startup {
        daemon.queue_startup_preset(request);
    }
    daemon.reload_presets();
    daemon.control.is_started();
    if let Some(driver) = daemon
        .config
        .get_parameter(Component::Engine, "driver", None)
        .await
    {
        info!(%driver, "Active JACK driver");
    }

    let mut stats = interval(Duration::from_millis(GET_STATS_MS));
    stats.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut conf = interval(Duration::from_millis(CHECK_CONF_MS));
    conf.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stats.tick() => daemon.poll_stats(),
            _ = conf.tick() => daemon.reload_presets(),
            Some(reply) = replies.recv() => daemon.receive(reply).await,
            Some(_) = started.next() => daemon.on_server_signal(true),
            Some(_) = stopped.next() => daemon.on_server_signal(false),
            Some((request, reply)) = requests.recv() => {
                let (response, exit) = daemon.handle_request(request).await;
                let _ = reply.send(response);
                if exit {
                    debug!("Exiting main loop");
                    return Ok(Shutdown::Exit);
                }
            }
            _ = sleep_until(daemon.restart_deadline()), if daemon.restart_pending() => {
                daemon.start_server();
            }
            _ = tokio::signal::ctrl_c() => return Ok(Shutdown::Interrupted),
        }
    }
}
