//! Playback shell: owns one mounted lesson session and wires the deck,
//! the attention engine and the telemetry reporter together.

pub mod input;
pub mod view;

pub use input::Command;
pub use view::{render, AttentionIndicator, DeckView, ShellSnapshot, SlideView};

use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::api::LessonApi;
use crate::attention::{AttentionCell, AttentionEngine, CameraSource, DetectorFactory, EngineStatus};
use crate::config::PlayerConfig;
use crate::deck::{DeckController, DeckFetch, FetchOutcome};
use crate::error::ConfigError;
use crate::telemetry::{TelemetryConfig, TelemetryReporter};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    Command(Command),
    DeckFetched(FetchOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// External services the shell talks to.
#[derive(Clone)]
pub struct ShellServices {
    pub api: Arc<dyn LessonApi>,
    pub camera: Arc<dyn CameraSource>,
    pub detectors: Arc<dyn DetectorFactory>,
}

pub struct PlaybackShell {
    session_id: Uuid,
    telemetry: TelemetryConfig,
    deck: DeckController,
    engine: AttentionEngine,
    reporter: TelemetryReporter,
    cell: AttentionCell,
    events_tx: mpsc::UnboundedSender<ShellEvent>,
    events_rx: mpsc::UnboundedReceiver<ShellEvent>,
    mounted: bool,
}

impl PlaybackShell {
    pub fn new(config: &PlayerConfig, services: ShellServices) -> Result<Self, ConfigError> {
        config.validate()?;
        let telemetry = config.telemetry_config()?;

        let cell = AttentionCell::new();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Ok(Self {
            session_id: Uuid::new_v4(),
            telemetry,
            deck: DeckController::new(Arc::clone(&services.api), config.lesson_id.clone()),
            engine: AttentionEngine::new(
                services.camera,
                services.detectors,
                config.capture,
                config.detector,
                cell.clone(),
            ),
            reporter: TelemetryReporter::new(services.api, cell.clone()),
            cell,
            events_tx,
            events_rx,
            mounted: false,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn deck(&self) -> &DeckController {
        &self.deck
    }

    pub fn engine_status(&self) -> &EngineStatus {
        self.engine.status()
    }

    pub fn attention(&self) -> &AttentionCell {
        &self.cell
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Handle for input sources feeding commands into the shell.
    pub fn sender(&self) -> mpsc::UnboundedSender<ShellEvent> {
        self.events_tx.clone()
    }

    /// Start the deck fetch, the attention engine and the reporter.
    pub async fn mount(&mut self) -> Result<()> {
        if self.mounted {
            return Ok(());
        }
        log_info!(
            "mounting lesson {} (session {})",
            self.deck.lesson_id(),
            self.session_id
        );

        if let Some(fetch) = self.deck.begin_load() {
            self.spawn_fetch(fetch);
        }
        self.engine.start();
        self.reporter.start(self.telemetry.clone()).await?;

        self.mounted = true;
        Ok(())
    }

    /// Apply one event. Navigation and retry are synchronous state changes;
    /// fetches run on their own task and come back as `DeckFetched`.
    pub fn handle(&mut self, event: ShellEvent) -> Flow {
        match event {
            ShellEvent::Command(Command::Navigate(direction)) => {
                self.deck.navigate(direction);
                Flow::Continue
            }
            ShellEvent::Command(Command::Retry) => {
                if let Some(fetch) = self.deck.begin_retry() {
                    self.spawn_fetch(fetch);
                }
                Flow::Continue
            }
            ShellEvent::Command(Command::Quit) => Flow::Quit,
            ShellEvent::DeckFetched(outcome) => {
                self.deck.complete_load(outcome);
                Flow::Continue
            }
        }
    }

    /// Wait for the next queued event.
    pub async fn next_event(&mut self) -> Option<ShellEvent> {
        self.events_rx.recv().await
    }

    /// Change the lesson or interval the reporter uses; restarts its timer
    /// when anything differs.
    pub async fn set_telemetry(&mut self, config: TelemetryConfig) -> Result<()> {
        self.telemetry = config.clone();
        if self.mounted {
            self.reporter.reconfigure(config).await?;
        }
        Ok(())
    }

    pub fn snapshot(&self) -> ShellSnapshot {
        ShellSnapshot {
            lesson_id: self.deck.lesson_id().to_string(),
            chapter_title: self
                .deck
                .state()
                .deck()
                .and_then(|deck| deck.chapter_title.clone()),
            deck: DeckView::from(self.deck.state()),
            attention: AttentionIndicator::from(self.cell.latest()),
        }
    }

    /// Event loop: re-render after every event and every attention change
    /// until a `Quit` command arrives.
    pub async fn run<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let mut attention = self.cell.subscribe();
        self.render_to(out)?;

        loop {
            tokio::select! {
                event = self.events_rx.recv() => {
                    let Some(event) = event else { break };
                    if self.handle(event) == Flow::Quit {
                        break;
                    }
                }
                changed = attention.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    attention.borrow_and_update();
                }
            }
            self.render_to(out)?;
        }

        Ok(())
    }

    /// Stop capture (releasing the camera), cancel the report timer, and stop
    /// accepting fetch results. In-flight requests are left to finish.
    pub async fn unmount(&mut self) -> Result<()> {
        if !self.mounted {
            return Ok(());
        }

        if let Err(err) = self.engine.stop().await {
            log_error!("attention engine did not stop cleanly: {err:#}");
        }
        if let Err(err) = self.reporter.stop().await {
            log_error!("attention reporter did not stop cleanly: {err:#}");
        }
        self.deck.teardown();
        self.mounted = false;

        log_info!("unmounted session {}", self.session_id);
        Ok(())
    }

    fn spawn_fetch(&self, fetch: DeckFetch) {
        let tx = self.events_tx.clone();
        log_debug!("starting slide fetch #{}", fetch.attempt());
        tokio::spawn(async move {
            let outcome = fetch.run().await;
            // The shell may be gone by now; the result is simply dropped.
            let _ = tx.send(ShellEvent::DeckFetched(outcome));
        });
    }

    fn render_to<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "{}", render(&self.snapshot()))?;
        out.flush()?;
        Ok(())
    }
}
