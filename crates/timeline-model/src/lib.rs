//! Cliplab Timeline Model
//!
//! Defines the core data contracts for Cliplab timelines:
//! - **Assets:** Imported or generated media sources, independent of placement
//! - **Clips:** Timed, transformed instances of assets on a layered timeline
//! - **Settings:** Export container, resolution, frame rate, and quality
//!
//! Spatial transforms are expressed in canvas pixel space; all times are
//! seconds. Model invariants (trim bounds, minimum clip length, fade
//! overlap) are enforced by clamping at the mutation boundary — mutation
//! never fails.

pub mod asset;
pub mod clip;
pub mod settings;

pub use asset::*;
pub use clip::*;
pub use settings::*;
