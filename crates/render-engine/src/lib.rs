//! Cliplab Render Engine
//!
//! Export pipeline that executes a compositing plan against ffmpeg:
//! stage media into engine storage, run the filter graph once, stream
//! coarse progress, retrieve the artifact, and clean up on every exit
//! path.
//!
//! # Pipeline Architecture
//!
//! ```text
//! clip model ──► planner ──► filter graph
//!                                  │
//! media bytes ──► staging dir ─────┤
//!                                  ▼
//!                          ffmpeg (one shot)
//!                                  │
//!              progress pipe ◄─────┤
//!                                  ▼
//!                          output.{mp4,webm} ──► ExportArtifact
//! ```
//!
//! Remote generation/render jobs live in [`remote`].

pub mod engine;
pub mod export;
pub mod remote;

pub use engine::FfmpegEngine;
pub use export::{ExportArtifact, ExportPipeline, ExportState};
pub use remote::{JobState, JobStatus, RemoteJobClient};
