//! Sequential multi-segment playback
//!
//! Bottom-up: [`registry`] holds the clips, [`timeline`] maps global time to
//! clip offsets, [`slot`] guards the single live resource, [`sequencer`] runs
//! the state machine, [`progress`] publishes what the UI needs and
//! [`engine`] drives it all from one task.

pub mod engine;
pub mod events;
pub mod local;
pub mod progress;
pub mod registry;
pub mod sequencer;
pub mod slot;
pub mod state;
pub mod timeline;

pub use engine::{EngineHandle, PlaybackEngine, PlayerCommand};
pub use events::{BindGeneration, ResourceEvent, ResourceOwner, RoutedEvent, SlotEvent};
pub use local::LocalPlayer;
pub use registry::{Segment, SegmentRegistry};
pub use sequencer::{Sequencer, SequencerInput};
pub use slot::{AudioBackend, AudioResource, PlaybackSlot};
pub use state::{PlaybackState, SequencerState};
pub use timeline::{SegmentPosition, Timeline};
