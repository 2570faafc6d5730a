//! Audio resources: duration probing and the clock-driven backend

pub mod clock;
pub mod probe;

pub use clock::{ClockBackend, ClockResource};
pub use probe::probe_duration;
