//! Guide snapping for drag, resize, and drop placement.
//!
//! The planner itself never snaps; export geometry must exactly match
//! whatever the editing surface last committed, so the same function is
//! used for all editing-time snapping decisions.

/// Result of snapping a 1-D value against a set of guide lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    /// The snapped (or passed-through) value.
    pub value: f64,
    /// Whether a guide captured the value.
    pub snapped: bool,
    /// The guide that captured the value, if any.
    pub guide: Option<f64>,
}

/// Snap `value` to the first guide within `threshold`, in iteration
/// order. Callers order guides by priority (typically
/// `[0, mid, extent]`); the first match wins even when a later guide
/// is closer.
pub fn snap(value: f64, guides: &[f64], threshold: f64) -> SnapResult {
    for &guide in guides {
        if (value - guide).abs() <= threshold {
            return SnapResult {
                value: guide,
                snapped: true,
                guide: Some(guide),
            };
        }
    }
    SnapResult {
        value,
        snapped: false,
        guide: None,
    }
}

/// Standard priority-ordered guides for an extent: start, center, end.
pub fn edge_guides(extent: f64) -> [f64; 3] {
    [0.0, extent / 2.0, extent]
}
