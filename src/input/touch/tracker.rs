//! Per-contact press tracking with staged event commit
//!
//! Hardware callbacks only stage events. [`ContactTracker::update`] commits
//! them once per tick, applying at most one release and one press. A
//! release followed by a new press commits both in one update; a press
//! followed by its own release is split across two updates so both edges
//! are observable. Moves and pressure changes queued before a deferred
//! edge are applied in the same commit.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::GestureConfig;

/// Raw touch-point lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TouchEvent {
    Start {
        id: u64,
        pos: Vec2,
        #[serde(default = "default_pressure")]
        pressure: f32,
        #[serde(default)]
        mouse: bool,
    },
    Move {
        id: u64,
        pos: Vec2,
    },
    Pressure {
        id: u64,
        pressure: f32,
    },
    End {
        id: u64,
        #[serde(default)]
        cancel: bool,
    },
}

fn default_pressure() -> f32 {
    1.0
}

impl TouchEvent {
    pub fn id(&self) -> u64 {
        match *self {
            TouchEvent::Start { id, .. }
            | TouchEvent::Move { id, .. }
            | TouchEvent::Pressure { id, .. }
            | TouchEvent::End { id, .. } => id,
        }
    }
}

/// Summary of a press committed as released this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Release {
    pub start_pos: Vec2,
    pub pos: Vec2,
    pub duration: f32,
    pub cancelled: bool,
    /// Still within the tap time and movement limits when released
    pub tap_candidate: bool,
    /// Released within the tap time, regardless of movement
    pub quick: bool,
    pub was_normal: bool,
    pub was_long: bool,
    /// Exceeded the long-press movement threshold at some point
    pub moved: bool,
}

/// Press state machine for a single contact (touch point or mouse)
#[derive(Debug, Clone, Default)]
pub struct ContactTracker {
    queue: VecDeque<TouchEvent>,
    /// Contact that owns the tracker once the queue is drained
    staged_id: Option<u64>,
    id: Option<u64>,
    mouse: bool,

    pressed: bool,
    prev_pressed: bool,
    normal: bool,
    prev_normal: bool,
    long: bool,
    prev_long: bool,

    start_pos: Vec2,
    raw_pos: Vec2,
    pos: Vec2,
    prev_pos: Vec2,
    pressure: f32,

    hold_time: f32,
    max_disp_sq: f32,
    extreme: Vec2,
    tap_candidate: bool,
    moved: bool,
    just_started: bool,

    release: Option<Release>,
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a new contact could be claimed right now
    pub fn can_accept(&self) -> bool {
        self.staged_id.is_none()
    }

    /// Stage any lifecycle event; returns false when it belongs to another contact
    pub fn stage(&mut self, event: TouchEvent) -> bool {
        match event {
            TouchEvent::Start { id, .. } => {
                if self.staged_id.is_some() {
                    trace!("Contact {} ignored: tracker busy", id);
                    return false;
                }
                self.staged_id = Some(id);
            }
            TouchEvent::End { id, .. } => {
                if self.staged_id != Some(id) {
                    return false;
                }
                self.staged_id = None;
            }
            TouchEvent::Move { id, pos } => {
                if self.staged_id != Some(id) {
                    return false;
                }
                // Coalesce consecutive moves
                if let Some(TouchEvent::Move { id: last, pos: last_pos }) = self.queue.back_mut() {
                    if *last == id {
                        *last_pos = pos;
                        return true;
                    }
                }
            }
            TouchEvent::Pressure { id, .. } => {
                if self.staged_id != Some(id) {
                    return false;
                }
            }
        }
        self.queue.push_back(event);
        true
    }

    /// Commit staged events and advance timers
    pub fn update(&mut self, dt: f32, config: &GestureConfig) {
        self.prev_pressed = self.pressed;
        self.prev_normal = self.normal;
        self.prev_long = self.long;
        self.prev_pos = self.pos;
        self.release = None;
        self.just_started = false;

        if self.pressed {
            self.hold_time += dt;
        }

        self.commit_staged(config);

        if !self.pressed {
            return;
        }

        if self.just_started || config.smoothing_time <= 0.0 {
            self.pos = self.raw_pos;
        } else {
            let alpha = (dt / config.smoothing_time).clamp(0.0, 1.0);
            self.pos = self.pos.lerp(self.raw_pos, alpha);
        }
        if self.just_started {
            self.prev_pos = self.pos;
        }

        self.evaluate(config);
    }

    fn commit_staged(&mut self, config: &GestureConfig) {
        let mut started = false;
        let mut ended = false;
        while let Some(event) = self.queue.front().copied() {
            match event {
                TouchEvent::Start { id, pos, pressure, mouse } => {
                    if started {
                        break;
                    }
                    self.queue.pop_front();
                    self.begin(id, pos, pressure, mouse);
                    started = true;
                }
                TouchEvent::End { cancel, .. } => {
                    // A press that started this tick is released next tick
                    if started || ended {
                        break;
                    }
                    self.queue.pop_front();
                    self.finish(cancel, config);
                    ended = true;
                }
                TouchEvent::Move { pos, .. } => {
                    self.queue.pop_front();
                    if self.pressed {
                        self.raw_pos = pos;
                    }
                }
                TouchEvent::Pressure { pressure, .. } => {
                    self.queue.pop_front();
                    if self.pressed {
                        self.pressure = pressure;
                    }
                }
            }
        }
    }

    fn begin(&mut self, id: u64, pos: Vec2, pressure: f32, mouse: bool) {
        self.id = Some(id);
        self.mouse = mouse;
        self.pressed = true;
        self.normal = false;
        self.long = false;
        self.start_pos = pos;
        self.raw_pos = pos;
        self.pos = pos;
        self.pressure = pressure;
        self.hold_time = 0.0;
        self.max_disp_sq = 0.0;
        self.extreme = Vec2::ZERO;
        self.tap_candidate = true;
        self.moved = false;
        self.just_started = true;
    }

    fn finish(&mut self, cancelled: bool, config: &GestureConfig) {
        if !self.pressed {
            return;
        }
        // Fold in the last position before deciding what the press was
        self.pos = self.raw_pos;
        self.track_displacement(config);
        let quick = self.hold_time <= config.tap_max_duration;
        self.release = Some(Release {
            start_pos: self.start_pos,
            pos: self.pos,
            duration: self.hold_time,
            cancelled,
            tap_candidate: self.tap_candidate && quick,
            quick,
            was_normal: self.normal,
            was_long: self.long,
            moved: self.moved,
        });
        self.pressed = false;
        self.normal = false;
        self.long = false;
        self.id = None;
        self.pressure = 0.0;
    }

    fn track_displacement(&mut self, config: &GestureConfig) {
        let disp = self.pos - self.start_pos;
        self.max_disp_sq = self.max_disp_sq.max(disp.length_squared());
        self.extreme = self.extreme.max(disp.abs());
        if self.max_disp_sq > config.tap_move_threshold * config.tap_move_threshold {
            self.tap_candidate = false;
        }
        if self.max_disp_sq > config.long_press_move_threshold * config.long_press_move_threshold {
            self.moved = true;
        }
    }

    fn evaluate(&mut self, config: &GestureConfig) {
        self.track_displacement(config);
        if self.hold_time > config.tap_max_duration {
            self.tap_candidate = false;
        }

        if self.long {
            if self.moved && config.end_long_press_when_moved {
                self.end_long_press();
            }
            return;
        }
        if self.normal {
            return;
        }
        if !self.moved && self.hold_time >= config.long_press_min_time {
            self.long = true;
        } else if !self.tap_candidate && self.moved {
            self.normal = true;
        }
    }

    /// Demote a long press to a normal one (swipe or move ended it)
    pub fn end_long_press(&mut self) {
        if self.long {
            self.long = false;
            self.normal = true;
        }
    }

    /// Drop the contact and anything staged
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn contact_id(&self) -> Option<u64> {
        self.id
    }

    pub fn is_mouse(&self) -> bool {
        self.mouse
    }

    pub fn pressed_raw(&self) -> bool {
        self.pressed
    }

    /// Also set when a new press replaced a released one this tick
    pub fn just_pressed_raw(&self) -> bool {
        self.just_started
    }

    pub fn just_released_raw(&self) -> bool {
        self.release.is_some()
    }

    pub fn pressed_normal(&self) -> bool {
        self.normal
    }

    pub fn just_pressed_normal(&self) -> bool {
        self.normal && !self.prev_normal
    }

    pub fn just_released_normal(&self) -> bool {
        !self.normal && self.prev_normal
    }

    pub fn pressed_long(&self) -> bool {
        self.long
    }

    pub fn just_pressed_long(&self) -> bool {
        self.long && !self.prev_long
    }

    pub fn just_released_long(&self) -> bool {
        !self.long && self.prev_long
    }

    /// Smoothed position
    pub fn position(&self) -> Vec2 {
        self.pos
    }

    pub fn previous_position(&self) -> Vec2 {
        self.prev_pos
    }

    pub fn raw_position(&self) -> Vec2 {
        self.raw_pos
    }

    pub fn start_position(&self) -> Vec2 {
        self.start_pos
    }

    pub fn pressure(&self) -> f32 {
        self.pressure
    }

    pub fn hold_time(&self) -> f32 {
        self.hold_time
    }

    /// Largest per-axis distance from the press origin so far
    pub fn extreme_displacement(&self) -> Vec2 {
        self.extreme
    }

    pub fn is_tap_candidate(&self) -> bool {
        self.pressed && self.tap_candidate
    }

    pub fn has_moved(&self) -> bool {
        self.moved
    }

    /// Set on the tick the press was released
    pub fn release(&self) -> Option<&Release> {
        self.release.as_ref()
    }

    pub fn has_staged_events(&self) -> bool {
        !self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(id: u64, x: f32, y: f32) -> TouchEvent {
        TouchEvent::Start {
            id,
            pos: Vec2::new(x, y),
            pressure: 1.0,
            mouse: false,
        }
    }

    fn end(id: u64) -> TouchEvent {
        TouchEvent::End { id, cancel: false }
    }

    #[test]
    fn test_same_tick_press_release_spans_two_updates() {
        let config = GestureConfig::default();
        let mut tracker = ContactTracker::new();
        assert!(tracker.stage(start(1, 0.0, 0.0)));
        assert!(tracker.stage(end(1)));

        tracker.update(0.016, &config);
        assert!(tracker.just_pressed_raw());
        assert!(tracker.has_staged_events());

        tracker.update(0.016, &config);
        assert!(tracker.just_released_raw());
        let release = tracker.release().expect("release committed");
        assert!(release.tap_candidate);
        assert!(!tracker.has_staged_events());
    }

    #[test]
    fn test_release_then_press_in_one_tick() {
        let config = GestureConfig::default();
        let mut tracker = ContactTracker::new();
        tracker.stage(start(1, 0.0, 0.0));
        tracker.update(0.016, &config);

        assert!(tracker.stage(end(1)));
        assert!(tracker.stage(start(2, 5.0, 5.0)));

        tracker.update(0.016, &config);
        assert!(tracker.just_released_raw());
        assert!(tracker.just_pressed_raw());
        assert!(tracker.pressed_raw());
        assert_eq!(tracker.release().map(|r| r.start_pos), Some(Vec2::ZERO));
        assert_eq!(tracker.contact_id(), Some(2));
        assert_eq!(tracker.start_position(), Vec2::new(5.0, 5.0));
        assert!(!tracker.has_staged_events());
    }

    #[test]
    fn test_contact_churn_every_tick_keeps_up() {
        let config = GestureConfig::default();
        let mut tracker = ContactTracker::new();
        tracker.stage(start(1, 0.0, 0.0));
        tracker.update(0.016, &config);

        for id in 2..12 {
            assert!(tracker.stage(end(id - 1)));
            assert!(tracker.stage(start(id, id as f32, 0.0)));
            tracker.update(0.016, &config);
            assert_eq!(tracker.contact_id(), Some(id));
            assert!(tracker.release().is_some());
            assert!(!tracker.has_staged_events());
        }
    }

    #[test]
    fn test_start_move_end_in_one_tick() {
        let config = GestureConfig::default();
        let mut tracker = ContactTracker::new();
        tracker.stage(start(1, 0.0, 0.0));
        tracker.stage(TouchEvent::Move { id: 1, pos: Vec2::new(3.0, 4.0) });
        tracker.stage(end(1));

        tracker.update(0.016, &config);
        assert!(tracker.just_pressed_raw());
        assert!(!tracker.just_released_raw());
        assert_eq!(tracker.start_position(), Vec2::ZERO);
        assert_eq!(tracker.position(), Vec2::new(3.0, 4.0));
        assert!(tracker.has_staged_events());

        tracker.update(0.016, &config);
        assert!(tracker.just_released_raw());
        assert!(!tracker.pressed_raw());
        let release = tracker.release().expect("release committed");
        assert_eq!(release.pos, Vec2::new(3.0, 4.0));
        assert!(release.tap_candidate);
        assert!(!tracker.has_staged_events());
    }

    #[test]
    fn test_foreign_contacts_rejected() {
        let mut tracker = ContactTracker::new();
        assert!(tracker.stage(start(1, 0.0, 0.0)));
        assert!(!tracker.stage(start(2, 0.0, 0.0)));
        assert!(!tracker.stage(TouchEvent::Move { id: 2, pos: Vec2::ONE }));
        assert!(!tracker.stage(end(2)));
        assert!(!tracker.can_accept());
        assert!(tracker.stage(end(1)));
        assert!(tracker.can_accept());
    }

    #[test]
    fn test_static_press_becomes_long() {
        let config = GestureConfig {
            long_press_min_time: 0.25,
            ..GestureConfig::default()
        };
        let mut tracker = ContactTracker::new();
        tracker.stage(start(1, 10.0, 10.0));
        tracker.update(0.0, &config);

        for _ in 0..2 {
            tracker.update(0.1, &config);
            assert!(!tracker.pressed_long());
            assert!(!tracker.pressed_normal());
        }
        tracker.update(0.1, &config);
        assert!(tracker.just_pressed_long());
        assert!(!tracker.pressed_normal());

        // Moving ends the long press and continues as normal
        tracker.stage(TouchEvent::Move { id: 1, pos: Vec2::new(60.0, 10.0) });
        tracker.update(0.1, &config);
        assert!(tracker.just_released_long());
        assert!(tracker.just_pressed_normal());
    }

    #[test]
    fn test_long_press_survives_move_when_configured() {
        let config = GestureConfig {
            long_press_min_time: 0.2,
            end_long_press_when_moved: false,
            ..GestureConfig::default()
        };
        let mut tracker = ContactTracker::new();
        tracker.stage(start(1, 0.0, 0.0));
        tracker.update(0.0, &config);
        tracker.update(0.25, &config);
        assert!(tracker.pressed_long());

        tracker.stage(TouchEvent::Move { id: 1, pos: Vec2::new(100.0, 0.0) });
        tracker.update(0.05, &config);
        assert!(tracker.pressed_long());
        assert!(!tracker.pressed_normal());
    }

    #[test]
    fn test_moves_are_coalesced_and_smoothed() {
        let config = GestureConfig {
            smoothing_time: 0.1,
            ..GestureConfig::default()
        };
        let mut tracker = ContactTracker::new();
        tracker.stage(start(1, 0.0, 0.0));
        tracker.update(0.016, &config);

        tracker.stage(TouchEvent::Move { id: 1, pos: Vec2::new(10.0, 0.0) });
        tracker.stage(TouchEvent::Move { id: 1, pos: Vec2::new(20.0, 0.0) });
        tracker.update(0.05, &config);
        assert_eq!(tracker.raw_position(), Vec2::new(20.0, 0.0));
        assert!((tracker.position().x - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_pressure_and_cancel() {
        let config = GestureConfig::default();
        let mut tracker = ContactTracker::new();
        tracker.stage(start(7, 0.0, 0.0));
        tracker.stage(TouchEvent::Pressure { id: 7, pressure: 0.4 });
        tracker.update(0.016, &config);
        assert_eq!(tracker.pressure(), 0.4);

        tracker.stage(TouchEvent::End { id: 7, cancel: true });
        tracker.update(0.016, &config);
        assert!(tracker.release().map(|r| r.cancelled).unwrap_or(false));
        assert_eq!(tracker.pressure(), 0.0);
    }
}
