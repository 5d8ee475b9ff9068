//! Deterministic compositing: filter-graph IR, snap geometry, and the
//! pure planner that turns a frozen clip list into an executable graph.

pub mod graph;
pub mod planner;
pub mod snap;

pub use graph::{Filter, FilterArg, FilterChain, FilterGraph};
pub use planner::{ffmpeg_args, plan, CompositePlan, PlanInput};
pub use snap::{edge_guides, snap, SnapResult};
