//! Internal playback events (not broadcast on the EventBus)
//!
//! Defines the notifications an audio resource sends back to its owner
//! (backend → sequencer / local player). These are converted into
//! `turnplay_common::events::PlayerEvent` values before anything reaches a UI.

/// Identifies one `bind` of a playback slot
///
/// Incremented on every bind. A resource event is only acted on when its
/// generation equals the slot's current one; anything else was produced by a
/// resource that has since been released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BindGeneration(u64);

impl BindGeneration {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// The generation following this one
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for BindGeneration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}

/// Notification from a bound audio resource
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceEvent {
    /// Current offset within the resource, in seconds
    PositionTick(f64),

    /// Resource duration became known, in seconds
    MetadataReady(f64),

    /// Playback reached the end of the resource
    Ended,

    /// The resource could not be loaded or decoded
    LoadError(String),
}

/// A resource event stamped with the generation of the bind that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct SlotEvent {
    pub generation: BindGeneration,
    pub event: ResourceEvent,
}

impl SlotEvent {
    pub fn new(generation: BindGeneration, event: ResourceEvent) -> Self {
        Self { generation, event }
    }
}

/// Which player a resource belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceOwner {
    /// The global sequencer
    Global,
    /// The standalone player of one turn
    Local(usize),
}

/// A slot event addressed to its owner
///
/// All backends of one engine share a single channel; the engine routes by
/// `owner`.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedEvent {
    pub owner: ResourceOwner,
    pub event: SlotEvent,
}
