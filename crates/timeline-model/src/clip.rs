//! Timeline clips: placed, transformed instances of assets.
//!
//! A clip owns its playback window (`start_time`, `duration`,
//! `source_offset`), a spatial transform in canvas pixel space, and the
//! audio envelope (volume plus smoothstep fade ramps). All invariants are
//! enforced by clamping at the mutation boundary; clip mutation never
//! fails.

use serde::{Deserialize, Serialize};

use crate::asset::{Asset, AssetKind};

/// Minimum clip length after any trim or split operation.
pub const MIN_CLIP_DURATION_SECS: f64 = 0.1;

/// Pre-roll margin around the visibility window within which a clip is
/// considered "near" for preview resource warm-up.
pub const NEAR_MARGIN_SECS: f64 = 2.0;

/// Spatial transform of a clip in canvas pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation_degrees: f64,
}

impl Transform {
    /// Transform centered on a canvas at the given content size.
    pub fn centered(canvas_width: f64, canvas_height: f64, width: f64, height: f64) -> Self {
        Self {
            x: (canvas_width - width) / 2.0,
            y: (canvas_height - height) / 2.0,
            width,
            height,
            rotation_degrees: 0.0,
        }
    }
}

/// A placed, transformed instance of an asset on the timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clip {
    /// Unique instance identifier (distinct from the asset id).
    pub id: String,

    /// Media kind inherited from the asset.
    pub kind: AssetKind,

    /// Source URL or handle inherited from the asset.
    pub source: String,

    /// Timeline position in seconds.
    pub start_time: f64,

    /// Seconds actually played.
    pub duration: f64,

    /// Seconds into the source at which playback begins.
    pub source_offset: f64,

    /// Full trimmable length of the underlying source (upper bound).
    pub source_duration: f64,

    /// Stacking index; lower numeric layers draw on top.
    pub layer: i32,

    /// Spatial transform in canvas pixel space.
    pub transform: Transform,

    /// Opacity in `[0, 1]`.
    pub opacity: f64,

    /// Audio gain in `[0, 2]`.
    pub volume: f64,

    /// Fade-in ramp length in seconds.
    pub fade_in: f64,

    /// Fade-out ramp length in seconds.
    pub fade_out: f64,
}

impl Clip {
    /// Create a clip by dropping an asset onto the timeline.
    ///
    /// Copies the intrinsic duration as both `duration` and
    /// `source_duration`, starts playback at source offset zero, and
    /// centers the clip on the canvas at the asset's intrinsic size
    /// (or the full canvas for assets without one).
    pub fn from_asset(asset: &Asset, start_time: f64, canvas_width: u32, canvas_height: u32) -> Self {
        let (w, h) = asset
            .resolution
            .map(|(w, h)| (w as f64, h as f64))
            .unwrap_or((canvas_width as f64, canvas_height as f64));

        Self {
            id: instance_id(),
            kind: asset.kind,
            source: asset.source.clone(),
            start_time: start_time.max(0.0),
            duration: asset.duration_secs.max(MIN_CLIP_DURATION_SECS),
            source_offset: 0.0,
            source_duration: asset.duration_secs.max(MIN_CLIP_DURATION_SECS),
            layer: 0,
            transform: Transform::centered(canvas_width as f64, canvas_height as f64, w, h),
            opacity: 1.0,
            volume: 1.0,
            fade_in: 0.0,
            fade_out: 0.0,
        }
    }

    /// End of the visibility window (exclusive).
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Whether `t` falls inside the half-open visibility window.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_time && t < self.end_time()
    }

    /// Whether `t` is within the pre-roll margin of the visibility
    /// window; used for preview resource warm-up.
    pub fn is_near(&self, t: f64) -> bool {
        t >= self.start_time - NEAR_MARGIN_SECS && t < self.end_time() + NEAR_MARGIN_SECS
    }

    /// Shave `delta` seconds from the front of the clip, moving the
    /// in-point without moving source material. Negative `delta`
    /// extends the front. Clamped so the clip never reads before the
    /// source start, never starts before timeline zero, and never
    /// shrinks below the minimum length.
    pub fn trim_leading(&mut self, delta: f64) {
        let max_shave = self.duration - MIN_CLIP_DURATION_SECS;
        let max_extend = (-self.source_offset).max(-self.start_time);
        let delta = delta.clamp(max_extend, max_shave.max(0.0));
        self.start_time += delta;
        self.source_offset += delta;
        self.duration -= delta;
    }

    /// Adjust the clip's duration by `delta` seconds at the tail.
    /// Clamped so playback never reads past the source bounds and the
    /// clip never shrinks below the minimum length.
    pub fn trim_trailing(&mut self, delta: f64) {
        let max_duration = self.source_duration - self.source_offset;
        self.duration = (self.duration + delta).clamp(MIN_CLIP_DURATION_SECS, max_duration);
    }

    /// Split the clip at timeline time `t`, strictly inside the
    /// visibility window. Returns `None` when the split point is outside
    /// the window or either half would fall below the minimum length.
    ///
    /// The halves tile the original window exactly and preserve source
    /// continuity. The left half keeps the fade-in, the right half keeps
    /// the fade-out; the cut point itself has no fade.
    pub fn split_at(&self, t: f64) -> Option<(Clip, Clip)> {
        let left_duration = t - self.start_time;
        let right_duration = self.end_time() - t;
        if left_duration < MIN_CLIP_DURATION_SECS || right_duration < MIN_CLIP_DURATION_SECS {
            return None;
        }

        let mut left = self.clone();
        left.duration = left_duration;
        left.fade_out = 0.0;

        let mut right = self.clone();
        right.id = instance_id();
        right.start_time = t;
        right.duration = right_duration;
        right.source_offset = self.source_offset + left_duration;
        right.fade_in = 0.0;

        Some((left, right))
    }

    /// Effective fade durations after the canonical overlap clamp:
    /// each ramp is limited to half the clip's duration.
    pub fn clamped_fades(&self) -> (f64, f64) {
        let half = self.duration / 2.0;
        (
            self.fade_in.clamp(0.0, half),
            self.fade_out.clamp(0.0, half),
        )
    }

    /// Audio gain at `local_time` seconds into the clip: constant
    /// `volume` shaped by smoothstep fade ramps at both ends. Zero
    /// outside `[0, duration]`.
    pub fn gain_at(&self, local_time: f64) -> f64 {
        if local_time < 0.0 || local_time > self.duration {
            return 0.0;
        }

        let (fade_in, fade_out) = self.clamped_fades();
        let mut gain = self.volume;

        if fade_in > 0.0 && local_time < fade_in {
            gain *= smoothstep(local_time / fade_in);
        }
        let remaining = self.duration - local_time;
        if fade_out > 0.0 && remaining < fade_out {
            gain *= smoothstep(remaining / fade_out);
        }

        gain
    }
}

/// Hermite smoothstep on `[0, 1]`.
fn smoothstep(x: f64) -> f64 {
    let x = x.clamp(0.0, 1.0);
    x * x * (3.0 - 2.0 * x)
}

/// Generate a unique clip instance id without an external dependency.
fn instance_id() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("clip-{:016x}{:04x}", (seed & 0xFFFF_FFFF_FFFF_FFFF) as u64, n & 0xFFFF)
}
