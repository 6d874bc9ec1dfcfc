//! Multi-finger tracking
//!
//! Every recognizer owns a [`FingerTracker`]: the ordered set of touch
//! identifiers it currently follows, bounded by a [`FingerWindow`], with the
//! down sample, last sample and smoothed velocity of each finger.

use std::collections::BTreeMap;

use tactile_core::{GestureError, Point, Result, Timestamp, TouchEvent, TouchId, TouchIds};

/// Allowed number of simultaneous fingers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FingerWindow {
    pub min: usize,
    pub max: usize,
}

impl FingerWindow {
    /// Create a window; validated against the surface limit on insertion
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Exactly `n` fingers
    pub const fn exact(n: usize) -> Self {
        Self::new(n, n)
    }

    pub const fn single() -> Self {
        Self::exact(1)
    }

    /// Check `1 <= min <= max <= limit`
    pub fn validate(&self, limit: usize) -> Result<()> {
        if self.min == 0 || self.min > self.max || self.max > limit {
            return Err(GestureError::InvalidFingerWindow {
                min: self.min,
                max: self.max,
                limit,
            });
        }
        Ok(())
    }
}

/// Position of a finger at a point in time
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FingerSample {
    pub position: Point,
    pub time: Timestamp,
}

impl From<&TouchEvent> for FingerSample {
    fn from(event: &TouchEvent) -> Self {
        Self {
            position: event.position,
            time: event.time,
        }
    }
}

/// Tracking record for one finger
#[derive(Clone, Debug, PartialEq)]
pub struct FingerTrack {
    pub down: FingerSample,
    pub last: FingerSample,
    /// Smoothed velocity in logical pixels per second
    pub velocity: Point,
}

impl FingerTrack {
    /// Distance travelled since the finger went down
    pub fn travel(&self) -> f32 {
        self.last.position.distance(self.down.position)
    }
}

/// Ordered set of fingers followed by one recognizer
#[derive(Clone, Debug)]
pub struct FingerTracker {
    window: FingerWindow,
    smoothing: f32,
    tracks: BTreeMap<TouchId, FingerTrack>,
    /// Most fingers held at once during this cycle
    peak: usize,
    /// Peak before the latest press
    prior_peak: usize,
    /// Every identifier seen during this cycle
    seen: TouchIds,
}

impl FingerTracker {
    pub fn new(window: FingerWindow, smoothing: f32) -> Self {
        Self {
            window,
            smoothing,
            tracks: BTreeMap::new(),
            peak: 0,
            prior_peak: 0,
            seen: TouchIds::new(),
        }
    }

    pub fn window(&self) -> FingerWindow {
        self.window
    }

    /// Start following a finger; false if already tracked or the window is full
    pub fn press(&mut self, event: &TouchEvent) -> bool {
        if self.tracks.contains_key(&event.id) || self.tracks.len() >= self.window.max {
            return false;
        }
        let sample = FingerSample::from(event);
        self.prior_peak = self.peak;
        self.tracks.insert(
            event.id,
            FingerTrack {
                down: sample,
                last: sample,
                velocity: Point::ZERO,
            },
        );
        self.peak = self.peak.max(self.tracks.len());
        if !self.seen.contains(&event.id) {
            self.seen.push(event.id);
        }
        true
    }

    /// Record a new sample; false if the finger is not tracked
    pub fn update(&mut self, event: &TouchEvent) -> bool {
        let alpha = self.smoothing;
        let Some(track) = self.tracks.get_mut(&event.id) else {
            return false;
        };
        if event.time > track.last.time {
            let dt_seconds = (event.time - track.last.time) as f32 / 1_000_000.0;
            let instant = (event.position - track.last.position).scale(1.0 / dt_seconds);
            track.velocity = track.velocity.scale(1.0 - alpha) + instant.scale(alpha);
        }
        track.last = FingerSample::from(event);
        true
    }

    /// Stop following a finger
    pub fn release(&mut self, id: TouchId) -> Option<FingerTrack> {
        self.tracks.remove(&id)
    }

    /// Undo the latest press of a finger nobody wanted
    pub fn withdraw(&mut self, id: TouchId) {
        if self.tracks.remove(&id).is_some() {
            self.peak = self.prior_peak.max(self.tracks.len());
            self.seen.retain(|seen| *seen != id);
        }
    }

    /// Forget every finger and the cycle history
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.peak = 0;
        self.prior_peak = 0;
        self.seen.clear();
    }

    pub fn contains(&self, id: TouchId) -> bool {
        self.tracks.contains_key(&id)
    }

    pub fn count(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn peak(&self) -> usize {
        self.peak
    }

    /// Identifiers currently held, ascending
    pub fn ids(&self) -> TouchIds {
        self.tracks.keys().copied().collect()
    }

    /// Identifiers seen since the last clear, in arrival order
    pub fn cycle_ids(&self) -> TouchIds {
        self.seen.clone()
    }

    pub fn track(&self, id: TouchId) -> Option<&FingerTrack> {
        self.tracks.get(&id)
    }

    pub fn tracks(&self) -> impl Iterator<Item = (TouchId, &FingerTrack)> {
        self.tracks.iter().map(|(id, track)| (*id, track))
    }

    /// Travel of one finger since down
    pub fn travel(&self, id: TouchId) -> f32 {
        self.tracks.get(&id).map(FingerTrack::travel).unwrap_or(0.0)
    }

    /// Largest travel of any held finger
    pub fn max_travel(&self) -> f32 {
        self.tracks.values().map(FingerTrack::travel).fold(0.0, f32::max)
    }

    /// Mean of the current positions
    pub fn centroid(&self) -> Option<Point> {
        self.mean(|track| track.last.position)
    }

    /// Mean of the down positions of the held fingers
    pub fn down_centroid(&self) -> Option<Point> {
        self.mean(|track| track.down.position)
    }

    /// Offset of the centroid since the held fingers went down
    pub fn centroid_offset(&self) -> Point {
        match (self.centroid(), self.down_centroid()) {
            (Some(now), Some(down)) => now - down,
            _ => Point::ZERO,
        }
    }

    /// Mean distance of the fingers from their centroid
    pub fn spread(&self) -> f32 {
        let Some(center) = self.centroid() else {
            return 0.0;
        };
        let total: f32 = self
            .tracks
            .values()
            .map(|track| track.last.position.distance(center))
            .sum();
        total / self.tracks.len() as f32
    }

    fn mean(&self, pick: impl Fn(&FingerTrack) -> Point) -> Option<Point> {
        if self.tracks.is_empty() {
            return None;
        }
        let sum = self
            .tracks
            .values()
            .fold(Point::ZERO, |acc, track| acc + pick(track));
        Some(sum.scale(1.0 / self.tracks.len() as f32))
    }
}
