//! Per-frame clip resolution for the live preview.
//!
//! This layer decides, for each clip at a timeline instant, whether it
//! is on screen, where its media source should be positioned, and how
//! loud it is. Actual media playback is the caller's concern; `near`
//! lets the caller warm sources up shortly before they enter frame.

use cliplab_timeline_model::Clip;
use serde::{Deserialize, Serialize};

/// Resolved presentation state for one clip at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipFrameState {
    /// Inside the clip's half-open visibility window.
    pub visible: bool,
    /// Within the warm-up margin of the window.
    pub near: bool,
    /// Seek position in source seconds, clamped to the clip's trimmed
    /// source window.
    pub source_time: f64,
    /// Audio gain including fade ramps and volume; zero off-window.
    pub gain: f64,
    /// Visual opacity to draw with.
    pub opacity: f64,
}

/// Resolve one clip at timeline position `t`.
pub fn resolve_clip(clip: &Clip, t: f64) -> ClipFrameState {
    let visible = clip.contains(t);
    let local = t - clip.start_time;
    let source_time = (clip.source_offset + local)
        .clamp(clip.source_offset, clip.source_offset + clip.duration);

    ClipFrameState {
        visible,
        near: clip.is_near(t),
        source_time,
        gain: if visible { clip.gain_at(local) } else { 0.0 },
        opacity: clip.opacity,
    }
}

/// Resolve every clip at `t`, in composite order: layer descending, so
/// iterating the result and painting in order stacks lower layer
/// numbers on top. Sort is stable for equal layers.
pub fn resolve_frame<'a>(clips: &'a [Clip], t: f64) -> Vec<(&'a Clip, ClipFrameState)> {
    let mut resolved: Vec<(&Clip, ClipFrameState)> =
        clips.iter().map(|c| (c, resolve_clip(c, t))).collect();
    resolved.sort_by(|a, b| b.0.layer.cmp(&a.0.layer));
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use cliplab_timeline_model::{AssetKind, Transform};

    fn make_clip(id: &str, start: f64, duration: f64, layer: i32) -> Clip {
        Clip {
            id: id.to_string(),
            kind: AssetKind::Video,
            source: format!("sources/{id}"),
            start_time: start,
            duration,
            source_offset: 1.0,
            source_duration: duration + 10.0,
            layer,
            transform: Transform::centered(1920.0, 1080.0, 640.0, 360.0),
            opacity: 0.8,
            volume: 1.0,
            fade_in: 0.5,
            fade_out: 0.5,
        }
    }

    #[test]
    fn resolve_maps_timeline_time_to_source_time() {
        let clip = make_clip("a", 2.0, 5.0, 0);

        let state = resolve_clip(&clip, 4.0);
        assert!(state.visible);
        assert!((state.source_time - 3.0).abs() < 1e-9);
        assert!((state.opacity - 0.8).abs() < 1e-9);

        // Before the window the seek position clamps to the trim start.
        let before = resolve_clip(&clip, 0.0);
        assert!(!before.visible);
        assert!((before.source_time - 1.0).abs() < 1e-9);
        assert_eq!(before.gain, 0.0);

        // After the window it clamps to the trim end.
        let after = resolve_clip(&clip, 10.0);
        assert!((after.source_time - 6.0).abs() < 1e-9);
    }

    #[test]
    fn window_is_half_open() {
        let clip = make_clip("a", 2.0, 5.0, 0);
        assert!(resolve_clip(&clip, 2.0).visible);
        assert!(!resolve_clip(&clip, 7.0).visible);
    }

    #[test]
    fn near_extends_past_the_window() {
        let clip = make_clip("a", 5.0, 5.0, 0);
        assert!(resolve_clip(&clip, 3.5).near);
        assert!(!resolve_clip(&clip, 2.5).near);
        assert!(resolve_clip(&clip, 11.5).near);
        assert!(!resolve_clip(&clip, 12.5).near);
    }

    #[test]
    fn gain_includes_fade_ramps() {
        let clip = make_clip("a", 0.0, 5.0, 0);
        assert_eq!(resolve_clip(&clip, 0.0).gain, 0.0);
        assert!((resolve_clip(&clip, 0.5).gain - 1.0).abs() < 1e-9);
        assert!((resolve_clip(&clip, 4.5).gain - 1.0).abs() < 1e-9);
        let mid = resolve_clip(&clip, 0.25).gain;
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn frame_resolution_is_layer_descending() {
        let clips = vec![
            make_clip("top", 0.0, 5.0, 0),
            make_clip("mid", 0.0, 5.0, 3),
            make_clip("bottom", 0.0, 5.0, 7),
        ];
        let frame = resolve_frame(&clips, 1.0);
        let order: Vec<&str> = frame.iter().map(|(c, _)| c.id.as_str()).collect();
        assert_eq!(order, vec!["bottom", "mid", "top"]);
    }
}
