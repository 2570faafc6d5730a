//! Playback engine
//!
//! Owns the sequencer and the per-turn local players and drives them from a
//! single task. Two inputs are multiplexed with `tokio::select!`:
//!
//! - **Commands** from any number of [`EngineHandle`]s (play, pause, seek,
//!   local player controls, status queries)
//! - **Resource events** from every backend, routed by [`ResourceOwner`]
//!
//! Because everything runs on one task, sequencer transitions never race with
//! each other and need no locking.

use crate::audio::ClockBackend;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::playback::events::{ResourceEvent, ResourceOwner, RoutedEvent};
use crate::playback::local::LocalPlayer;
use crate::playback::sequencer::Sequencer;
use crate::playback::slot::AudioBackend;
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use turnplay_common::api::TurnDescriptor;
use turnplay_common::events::{EventBus, PlaybackSnapshot};

/// Bounded command queue depth per engine
const COMMAND_QUEUE_DEPTH: usize = 32;

/// Commands accepted by the engine task
#[derive(Debug)]
pub enum PlayerCommand {
    Play,
    Pause,
    SeekToRatio(f64),
    LocalPlay(usize),
    LocalPause(usize),
    LocalSeek(usize, f64),
    Status(oneshot::Sender<PlaybackSnapshot>),
    Shutdown,
}

type BackendFactory<B> = Box<dyn FnMut(ResourceOwner) -> B + Send>;

pub struct PlaybackEngine<B: AudioBackend> {
    sequencer: Sequencer<B>,
    locals: HashMap<usize, LocalPlayer<B>>,
    make_backend: BackendFactory<B>,
    bus: EventBus,
    commands: mpsc::Receiver<PlayerCommand>,
    events: mpsc::UnboundedReceiver<RoutedEvent>,
}

impl<B: AudioBackend + 'static> PlaybackEngine<B> {
    /// Build an engine around a loaded sequencer
    ///
    /// `make_backend` opens backends for local players on first use; every
    /// backend it returns must report on the sender paired with `events`.
    pub fn new(
        sequencer: Sequencer<B>,
        make_backend: impl FnMut(ResourceOwner) -> B + Send + 'static,
        events: mpsc::UnboundedReceiver<RoutedEvent>,
    ) -> (Self, EngineHandle) {
        let (tx, commands) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let bus = sequencer.bus().clone();

        let engine = Self {
            sequencer,
            locals: HashMap::new(),
            make_backend: Box::new(make_backend),
            bus,
            commands,
            events,
        };

        (engine, EngineHandle { tx })
    }

    pub fn sequencer(&self) -> &Sequencer<B> {
        &self.sequencer
    }

    /// Run the engine on its own task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process commands and resource events until shutdown
    ///
    /// Returns when a [`PlayerCommand::Shutdown`] arrives or every handle is dropped.
    pub async fn run(mut self) {
        info!("Playback engine started (session {})", self.sequencer.session_id());

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    None | Some(PlayerCommand::Shutdown) => break,
                    Some(command) => self.handle_command(command),
                },
                Some(routed) = self.events.recv() => self.route(routed),
            }
        }

        self.sequencer.unload();
        for local in self.locals.values_mut() {
            local.close();
        }
        info!("Playback engine stopped");
    }

    fn handle_command(&mut self, command: PlayerCommand) {
        debug!("Command: {:?}", command);
        match command {
            PlayerCommand::Play => self.sequencer.play(),
            PlayerCommand::Pause => self.sequencer.pause(),
            PlayerCommand::SeekToRatio(ratio) => self.sequencer.seek_to_ratio(ratio),
            PlayerCommand::LocalPlay(index) => {
                if let Some(local) = self.local(index) {
                    local.play();
                }
            }
            PlayerCommand::LocalPause(index) => {
                if let Some(local) = self.local(index) {
                    local.pause();
                }
            }
            PlayerCommand::LocalSeek(index, ratio) => {
                if let Some(local) = self.local(index) {
                    local.seek_to_ratio(ratio);
                }
            }
            PlayerCommand::Status(reply) => {
                if reply.send(self.sequencer.snapshot()).is_err() {
                    debug!("Status requester went away");
                }
            }
            PlayerCommand::Shutdown => {}
        }
    }

    fn route(&mut self, routed: RoutedEvent) {
        match routed.owner {
            ResourceOwner::Global => self.sequencer.handle_slot_event(routed.event),
            ResourceOwner::Local(index) => {
                let Some(local) = self.locals.get_mut(&index) else {
                    debug!("Event for closed local player {}", index);
                    return;
                };
                if let Some(ResourceEvent::MetadataReady(duration)) =
                    local.handle_slot_event(routed.event)
                {
                    // Any load of a clip teaches the global timeline its duration
                    self.sequencer.record_duration(index, duration);
                }
            }
        }
    }

    /// Local player for a turn, created on first use
    fn local(&mut self, index: usize) -> Option<&mut LocalPlayer<B>> {
        let Some(segment) = self.sequencer.registry().and_then(|r| r.get(index)) else {
            warn!("No turn {} in this transcript", index);
            return None;
        };

        if !self.locals.contains_key(&index) {
            let backend = (self.make_backend)(ResourceOwner::Local(index));
            let player = LocalPlayer::new(index, segment.source_ref(), backend, self.bus.clone());
            self.locals.insert(index, player);
        }

        self.locals.get_mut(&index)
    }
}

impl PlaybackEngine<ClockBackend> {
    /// Engine over the clock backend, with the transcript already loaded
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// - [`Error::EmptyInput`] when `turns` is empty
    /// - [`Error::Runtime`] outside a tokio runtime
    pub fn with_clock_backend(
        turns: &[TurnDescriptor],
        config: &Config,
        bus: EventBus,
    ) -> Result<(Self, EngineHandle)> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let backend = ClockBackend::new(
            ResourceOwner::Global,
            events_tx,
            config.root_folder.clone(),
            config.tick_interval,
        )?;

        let mut sequencer = Sequencer::new(backend.clone(), bus);
        sequencer.load(turns)?;

        Ok(Self::new(
            sequencer,
            move |owner| backend.for_owner(owner),
            events_rx,
        ))
    }
}

/// Cloneable command sender for a running engine
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<PlayerCommand>,
}

impl EngineHandle {
    pub async fn send(&self, command: PlayerCommand) -> Result<()> {
        self.tx.send(command).await.map_err(|_| Error::EngineStopped)
    }

    pub async fn play(&self) -> Result<()> {
        self.send(PlayerCommand::Play).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(PlayerCommand::Pause).await
    }

    pub async fn seek_to_ratio(&self, ratio: f64) -> Result<()> {
        self.send(PlayerCommand::SeekToRatio(ratio)).await
    }

    /// Current progress, active segment and intent
    pub async fn status(&self) -> Result<PlaybackSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(PlayerCommand::Status(reply)).await?;
        rx.await.map_err(|_| Error::EngineStopped)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(PlayerCommand::Shutdown).await
    }
}
