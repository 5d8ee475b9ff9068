//! Timeline clock: the single authority for playback time.
//!
//! High-frequency consumers (playhead, video elements) subscribe for
//! direct per-update callbacks; low-frequency reconciliation (deciding
//! which clips are near their visibility window) sits behind a
//! [`DriftGate`] so it only runs a few times per second.

use serde::{Deserialize, Serialize};

/// Snapshot of playback state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ClockState {
    /// Current timeline position in seconds.
    pub time: f64,
    /// Whether playback is advancing.
    pub playing: bool,
}

/// Handle returned by [`TimelineClock::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(ClockState)>;

/// Broadcast clock for the preview loop.
///
/// Single-threaded by construction: `update` takes `&mut self`, so one
/// update's notifications always complete before the next begins and
/// subscribers never observe reentrant interleaving.
pub struct TimelineClock {
    state: ClockState,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: u64,
}

impl Default for TimelineClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineClock {
    pub fn new() -> Self {
        Self {
            state: ClockState::default(),
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Set the state and synchronously notify every subscriber in
    /// registration order.
    pub fn update(&mut self, time: f64, playing: bool) {
        self.state = ClockState { time, playing };
        for (_, callback) in &mut self.subscribers {
            callback(self.state);
        }
    }

    /// Scrub to a position; scrubbing always pauses playback.
    pub fn seek(&mut self, time: f64) {
        self.update(time, false);
    }

    /// Register a subscriber. The current state is replayed to the new
    /// subscriber immediately, so late registrants never miss the
    /// initial state.
    pub fn subscribe(&mut self, mut callback: impl FnMut(ClockState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        callback(self.state);
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }
}

impl std::fmt::Debug for TimelineClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelineClock")
            .field("state", &self.state)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Pure delta-time advance: one scheduler tick of `elapsed` seconds.
/// Paused clocks do not move.
pub fn tick(state: ClockState, elapsed: f64) -> ClockState {
    if state.playing {
        ClockState {
            time: state.time + elapsed,
            playing: true,
        }
    } else {
        state
    }
}

/// Threshold gate for coarse consumers.
///
/// `check` fires only when the position has moved more than the
/// threshold since the last firing, so visibility-window reconciliation
/// runs a few times per second instead of per frame. The first call
/// always fires.
#[derive(Debug)]
pub struct DriftGate {
    threshold: f64,
    last: Option<f64>,
}

impl DriftGate {
    pub const DEFAULT_THRESHOLD_SECS: f64 = 0.1;

    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            last: None,
        }
    }

    pub fn check(&mut self, time: f64) -> bool {
        match self.last {
            Some(last) if (time - last).abs() <= self.threshold => false,
            _ => {
                self.last = Some(time);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for DriftGate {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn subscribe_replays_current_state_immediately() {
        let mut clock = TimelineClock::new();
        clock.update(3.25, true);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        clock.subscribe(move |s| sink.borrow_mut().push(s));

        assert_eq!(
            *seen.borrow(),
            vec![ClockState {
                time: 3.25,
                playing: true
            }]
        );
    }

    #[test]
    fn updates_notify_in_registration_order() {
        let mut clock = TimelineClock::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let sink = order.clone();
            clock.subscribe(move |_| sink.borrow_mut().push(tag));
        }
        order.borrow_mut().clear();

        clock.update(1.0, true);
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut clock = TimelineClock::new();
        let count = Rc::new(RefCell::new(0u32));
        let sink = count.clone();
        let id = clock.subscribe(move |_| *sink.borrow_mut() += 1);
        assert_eq!(*count.borrow(), 1);

        clock.unsubscribe(id);
        clock.update(5.0, true);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn seek_pauses_playback() {
        let mut clock = TimelineClock::new();
        clock.update(0.0, true);
        clock.seek(12.0);
        assert_eq!(
            clock.state(),
            ClockState {
                time: 12.0,
                playing: false
            }
        );
    }

    #[test]
    fn tick_advances_only_while_playing() {
        let playing = ClockState {
            time: 1.0,
            playing: true,
        };
        assert!((tick(playing, 0.25).time - 1.25).abs() < 1e-12);

        let paused = ClockState {
            time: 1.0,
            playing: false,
        };
        assert_eq!(tick(paused, 0.25), paused);
    }

    #[test]
    fn drift_gate_fires_on_threshold_crossings_only() {
        let mut gate = DriftGate::new(0.1);
        assert!(gate.check(0.0));
        assert!(!gate.check(0.05));
        assert!(!gate.check(0.1));
        assert!(gate.check(0.2));
        // Backward seeks count as drift too.
        assert!(gate.check(0.0));
    }
}
