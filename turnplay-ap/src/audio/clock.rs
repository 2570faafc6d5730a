//! Clock-driven audio backend
//!
//! Each opened resource is a tokio task that probes the clip's duration on the
//! blocking pool, then advances a playhead against the wall clock while
//! playing. It reports metadata, position ticks, end of clip and load failures
//! on the engine's shared event channel, stamped with the bind generation it
//! was opened under.
//!
//! No samples are sent to an output device; the playhead is what the
//! sequencer and the UI observe.

use crate::audio::probe::probe_duration;
use crate::error::{Error, Result};
use crate::playback::events::{BindGeneration, ResourceEvent, ResourceOwner, RoutedEvent, SlotEvent};
use crate::playback::slot::{AudioBackend, AudioResource};
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};
use turnplay_common::config::resolve_audio_path;

/// Commands from the slot to a resource task
#[derive(Debug, Clone, Copy, PartialEq)]
enum Control {
    Play,
    Pause,
    Seek(f64),
}

/// Opens [`ClockResource`]s for one owner
#[derive(Clone)]
pub struct ClockBackend {
    owner: ResourceOwner,
    events: mpsc::UnboundedSender<RoutedEvent>,
    root_folder: PathBuf,
    tick: Duration,
    runtime: Handle,
}

impl ClockBackend {
    /// Create a backend bound to the current tokio runtime
    ///
    /// # Errors
    /// [`Error::Runtime`] when called outside a tokio runtime.
    pub fn new(
        owner: ResourceOwner,
        events: mpsc::UnboundedSender<RoutedEvent>,
        root_folder: PathBuf,
        tick: Duration,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| Error::Runtime(e.to_string()))?;
        Ok(Self {
            owner,
            events,
            root_folder,
            tick,
            runtime,
        })
    }

    /// Same channel and settings, different owner
    pub fn for_owner(&self, owner: ResourceOwner) -> Self {
        Self {
            owner,
            ..self.clone()
        }
    }
}

impl AudioBackend for ClockBackend {
    type Resource = ClockResource;

    fn open(&mut self, source_ref: &str, generation: BindGeneration) -> ClockResource {
        let path = resolve_audio_path(&self.root_folder, source_ref);
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        let reporter = Reporter {
            owner: self.owner,
            generation,
            events: self.events.clone(),
        };
        let task = self
            .runtime
            .spawn(run_resource(path, reporter, control_rx, self.tick));

        ClockResource {
            control: control_tx,
            task: Some(task),
        }
    }
}

/// Handle to one resource task
pub struct ClockResource {
    control: mpsc::UnboundedSender<Control>,
    task: Option<JoinHandle<()>>,
}

impl ClockResource {
    fn send(&self, command: Control) {
        if self.control.send(command).is_err() {
            trace!("Resource task gone, dropping {:?}", command);
        }
    }
}

impl AudioResource for ClockResource {
    fn play(&mut self) {
        self.send(Control::Play);
    }

    fn pause(&mut self) {
        self.send(Control::Pause);
    }

    fn seek(&mut self, offset_secs: f64) {
        self.send(Control::Seek(offset_secs));
    }

    fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ClockResource {
    fn drop(&mut self) {
        self.close();
    }
}

struct Reporter {
    owner: ResourceOwner,
    generation: BindGeneration,
    events: mpsc::UnboundedSender<RoutedEvent>,
}

impl Reporter {
    fn send(&self, event: ResourceEvent) {
        let routed = RoutedEvent {
            owner: self.owner,
            event: SlotEvent::new(self.generation, event),
        };
        if self.events.send(routed).is_err() {
            trace!("Event channel closed ({:?}, {})", self.owner, self.generation);
        }
    }
}

async fn run_resource(
    path: PathBuf,
    reporter: Reporter,
    mut control: mpsc::UnboundedReceiver<Control>,
    tick: Duration,
) {
    let probe_path = path.clone();
    let duration = match tokio::task::spawn_blocking(move || probe_duration(&probe_path)).await {
        Ok(Ok(duration)) => duration,
        Ok(Err(e)) => {
            warn!("Failed to load {}: {}", path.display(), e);
            reporter.send(ResourceEvent::LoadError(e.to_string()));
            return;
        }
        Err(e) => {
            reporter.send(ResourceEvent::LoadError(format!("Probe task failed: {}", e)));
            return;
        }
    };

    debug!(
        "Loaded {} ({:.3}s, {:?}, {})",
        path.display(),
        duration,
        reporter.owner,
        reporter.generation
    );
    reporter.send(ResourceEvent::MetadataReady(duration));

    let mut playhead = Playhead::new(duration);
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            command = control.recv() => {
                let Some(command) = command else {
                    break;
                };
                match command {
                    Control::Play => {
                        playhead.play(Instant::now());
                        if playhead.at_end() {
                            playhead.finish();
                            reporter.send(ResourceEvent::PositionTick(duration));
                            reporter.send(ResourceEvent::Ended);
                        }
                    }
                    Control::Pause => {
                        playhead.pause(Instant::now());
                        reporter.send(ResourceEvent::PositionTick(playhead.position()));
                    }
                    Control::Seek(offset) => {
                        playhead.seek(offset, Instant::now());
                        reporter.send(ResourceEvent::PositionTick(playhead.position()));
                    }
                }
            }
            _ = ticker.tick(), if playhead.is_playing() => {
                playhead.advance(Instant::now());
                reporter.send(ResourceEvent::PositionTick(playhead.position()));
                if playhead.at_end() {
                    playhead.finish();
                    reporter.send(ResourceEvent::Ended);
                }
            }
        }
    }
}

/// Wall-clock playhead over a clip of known duration
#[derive(Debug)]
struct Playhead {
    duration: f64,
    position: f64,
    playing: bool,
    ended: bool,
    last: Instant,
}

impl Playhead {
    fn new(duration: f64) -> Self {
        Self {
            duration,
            position: 0.0,
            playing: false,
            ended: false,
            last: Instant::now(),
        }
    }

    /// Playing again after the end restarts the clip
    fn play(&mut self, now: Instant) {
        if self.ended {
            self.position = 0.0;
            self.ended = false;
        }
        self.playing = true;
        self.last = now;
    }

    fn pause(&mut self, now: Instant) {
        if self.playing {
            self.advance(now);
        }
        self.playing = false;
    }

    fn seek(&mut self, offset: f64, now: Instant) {
        self.position = if offset > 0.0 { offset.min(self.duration) } else { 0.0 };
        self.ended = false;
        self.last = now;
    }

    fn advance(&mut self, now: Instant) {
        self.position = (self.position + (now - self.last).as_secs_f64()).min(self.duration);
        self.last = now;
    }

    fn finish(&mut self) {
        self.position = self.duration;
        self.playing = false;
        self.ended = true;
    }

    fn at_end(&self) -> bool {
        self.position >= self.duration
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn position(&self) -> f64 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playhead_advances_only_while_playing() {
        let start = Instant::now();
        let mut playhead = Playhead::new(10.0);

        playhead.play(start);
        playhead.advance(start + Duration::from_millis(1500));
        assert!((playhead.position() - 1.5).abs() < 1e-9);

        playhead.pause(start + Duration::from_millis(2000));
        assert!((playhead.position() - 2.0).abs() < 1e-9);
        assert!(!playhead.is_playing());
    }

    #[test]
    fn test_playhead_clamps_to_duration() {
        let start = Instant::now();
        let mut playhead = Playhead::new(1.0);

        playhead.play(start);
        playhead.advance(start + Duration::from_secs(5));
        assert_eq!(playhead.position(), 1.0);
        assert!(playhead.at_end());
    }

    #[test]
    fn test_playhead_seek_clamps() {
        let now = Instant::now();
        let mut playhead = Playhead::new(2.0);

        playhead.seek(-1.0, now);
        assert_eq!(playhead.position(), 0.0);
        playhead.seek(9.0, now);
        assert_eq!(playhead.position(), 2.0);
    }

    #[test]
    fn test_play_after_end_restarts() {
        let now = Instant::now();
        let mut playhead = Playhead::new(2.0);

        playhead.seek(2.0, now);
        playhead.finish();
        playhead.play(now);

        assert_eq!(playhead.position(), 0.0);
        assert!(playhead.is_playing());
        assert!(!playhead.at_end());
    }
}
