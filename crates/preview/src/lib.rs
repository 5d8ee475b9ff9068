//! Preview runtime: authoritative timeline clock, tick scheduler, and
//! the per-frame clip resolution layer.

pub mod clock;
pub mod renderer;

pub use clock::{tick, ClockState, DriftGate, SubscriptionId, TimelineClock};
pub use renderer::{resolve_clip, resolve_frame, ClipFrameState};
