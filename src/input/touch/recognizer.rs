//! Tap, long-tap, swipe and scroll recognition on top of a [`ContactTracker`]

use glam::{IVec2, Vec2};
use tracing::trace;

use super::tracker::{ContactTracker, Release, TouchEvent};
use crate::config::{GestureConfig, ScrollConstraint};
use crate::input::direction::{Dir, DirectionState};

/// Axis lock picked by [`ScrollConstraint::Auto`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisLock {
    Undecided,
    Horizontal,
    Vertical,
}

/// Gesture recognizer for one contact at a time
#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    tracker: ContactTracker,

    // Multi-tap sequence
    tap_count: u32,
    tap_origin: Vec2,
    tap_gap: f32,
    tap_saturated: bool,
    tapped: u32,
    long_tapped: bool,

    // Swipe
    segment_origin: Vec2,
    swipe_dir4: DirectionState,
    swipe_dir8: DirectionState,
    swiped: bool,

    // Scroll
    axis_lock: AxisLock,
    scroll_delta: Vec2,
    scroll_rest: Vec2,
    scroll_steps: IVec2,
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self {
            tracker: ContactTracker::new(),
            tap_count: 0,
            tap_origin: Vec2::ZERO,
            tap_gap: 0.0,
            tap_saturated: false,
            tapped: 0,
            long_tapped: false,
            segment_origin: Vec2::ZERO,
            swipe_dir4: DirectionState::new(),
            swipe_dir8: DirectionState::new(),
            swiped: false,
            axis_lock: AxisLock::Undecided,
            scroll_delta: Vec2::ZERO,
            scroll_rest: Vec2::ZERO,
            scroll_steps: IVec2::ZERO,
        }
    }
}

impl GestureRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_accept(&self) -> bool {
        self.tracker.can_accept()
    }

    /// Stage a raw event for the next update
    pub fn stage(&mut self, event: TouchEvent) -> bool {
        self.tracker.stage(event)
    }

    pub fn on_touch_start(&mut self, id: u64, pos: Vec2, pressure: f32, mouse: bool) -> bool {
        self.stage(TouchEvent::Start { id, pos, pressure, mouse })
    }

    pub fn on_touch_move(&mut self, id: u64, pos: Vec2) -> bool {
        self.stage(TouchEvent::Move { id, pos })
    }

    pub fn on_touch_pressure(&mut self, id: u64, pressure: f32) -> bool {
        self.stage(TouchEvent::Pressure { id, pressure })
    }

    pub fn on_touch_end(&mut self, id: u64, cancel: bool) -> bool {
        self.stage(TouchEvent::End { id, cancel })
    }

    /// Commit this tick's staged events and recognise gestures
    pub fn update(&mut self, dt: f32, config: &GestureConfig) {
        self.tapped = 0;
        self.long_tapped = false;
        self.scroll_delta = Vec2::ZERO;
        self.scroll_steps = IVec2::ZERO;

        let was_pressed = self.tracker.pressed_raw();
        if !was_pressed && self.sequence_open() {
            self.tap_gap += dt;
        }

        self.tracker.update(dt, config);

        // A release and a new press can commit together; the release goes first
        if let Some(release) = self.tracker.release().copied() {
            self.on_release(&release, config);
        }

        if self.tracker.just_pressed_raw() {
            self.on_press(config);
        }

        if self.tracker.pressed_raw() && !self.tracker.just_pressed_raw() {
            self.update_swipe(config);
            self.update_scroll(config);
        } else {
            self.swipe_dir4.set_dir(Dir::Neutral, config.swipe_dir_reset);
            self.swipe_dir8.set_dir(Dir::Neutral, config.swipe_dir_reset);
        }

        // Gap ran out with no follow-up press: the sequence is final
        if !self.tracker.pressed_raw() && self.sequence_open() && self.tap_gap > config.multi_tap_max_time_gap {
            self.close_sequence();
        }
    }

    fn sequence_open(&self) -> bool {
        self.tap_count > 0 || self.tap_saturated
    }

    fn on_press(&mut self, config: &GestureConfig) {
        let pos = self.tracker.start_position();
        self.segment_origin = pos;
        self.swiped = false;
        self.axis_lock = AxisLock::Undecided;
        self.scroll_rest = Vec2::ZERO;

        if self.sequence_open() {
            let far = pos.distance_squared(self.tap_origin) > config.tap_pos_threshold * config.tap_pos_threshold;
            if far || self.tap_gap > config.multi_tap_max_time_gap {
                self.close_sequence();
            }
        }
    }

    fn on_release(&mut self, release: &Release, config: &GestureConfig) {
        if release.cancelled {
            if self.sequence_open() {
                trace!("Tap sequence of {} discarded by cancel", self.tap_count);
            }
            self.tap_count = 0;
            self.tap_saturated = false;
            return;
        }

        if release.was_long && !release.moved {
            self.long_tapped = true;
        }

        let is_tap = if config.clean_taps_only {
            release.tap_candidate && !self.swiped && !release.was_long
        } else {
            release.quick && !release.was_long
        };

        if !is_tap {
            if self.sequence_open() {
                self.close_sequence();
            }
            return;
        }

        self.tap_gap = 0.0;
        if self.tap_saturated {
            return;
        }
        if self.tap_count == 0 {
            self.tap_origin = release.start_pos;
        }
        self.tap_count += 1;
        if self.tap_count >= config.max_tap_count {
            self.tapped = self.tap_count;
            self.tap_count = 0;
            self.tap_saturated = true;
        }
    }

    fn close_sequence(&mut self) {
        if self.tap_count > 0 {
            self.tapped = self.tap_count;
        }
        self.tap_count = 0;
        self.tap_saturated = false;
    }

    fn update_swipe(&mut self, config: &GestureConfig) {
        let pos = self.tracker.position();
        let segment = pos - self.segment_origin;
        if segment.length_squared() >= config.swipe_seg_len * config.swipe_seg_len {
            let dir8 = Dir::from_vector(segment);
            self.swipe_dir8.set_dir(dir8, config.swipe_dir_reset);
            self.swipe_dir4.set_dir(dir8.to_four_way(segment), config.swipe_dir_reset);
            self.segment_origin = pos;
            self.swiped = true;
            if config.end_long_press_when_swiped {
                self.tracker.end_long_press();
            }
        } else {
            let (d4, d8) = (self.swipe_dir4.current(), self.swipe_dir8.current());
            self.swipe_dir4.set_dir(d4, config.swipe_dir_reset);
            self.swipe_dir8.set_dir(d8, config.swipe_dir_reset);
        }
    }

    fn update_scroll(&mut self, config: &GestureConfig) {
        if config.scroll_constraint == ScrollConstraint::Auto && self.axis_lock == AxisLock::Undecided {
            let extreme = self.tracker.extreme_displacement();
            if extreme.max_element() > config.tap_move_threshold {
                self.axis_lock = if extreme.x >= extreme.y {
                    AxisLock::Horizontal
                } else {
                    AxisLock::Vertical
                };
            }
        }

        let delta = self.constrain(self.tracker.position() - self.tracker.previous_position(), config);
        self.scroll_delta = delta;
        self.scroll_rest += delta;

        let step = config.scroll_step_len;
        let steps = (self.scroll_rest / step).trunc();
        self.scroll_rest -= steps * step;
        self.scroll_steps = steps.as_ivec2();
    }

    fn constrain(&self, v: Vec2, config: &GestureConfig) -> Vec2 {
        match config.scroll_constraint {
            ScrollConstraint::Free => v,
            ScrollConstraint::Horizontal => Vec2::new(v.x, 0.0),
            ScrollConstraint::Vertical => Vec2::new(0.0, v.y),
            ScrollConstraint::Auto => match self.axis_lock {
                AxisLock::Undecided => Vec2::ZERO,
                AxisLock::Horizontal => Vec2::new(v.x, 0.0),
                AxisLock::Vertical => Vec2::new(0.0, v.y),
            },
        }
    }

    /// Drop the contact and any open tap sequence
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn tracker(&self) -> &ContactTracker {
        &self.tracker
    }

    pub fn pressed_raw(&self) -> bool {
        self.tracker.pressed_raw()
    }

    pub fn pressed_normal(&self) -> bool {
        self.tracker.pressed_normal()
    }

    pub fn pressed_long(&self) -> bool {
        self.tracker.pressed_long()
    }

    pub fn just_pressed_raw(&self) -> bool {
        self.tracker.just_pressed_raw()
    }

    pub fn just_released_raw(&self) -> bool {
        self.tracker.just_released_raw()
    }

    pub fn just_pressed_normal(&self) -> bool {
        self.tracker.just_pressed_normal()
    }

    pub fn just_released_normal(&self) -> bool {
        self.tracker.just_released_normal()
    }

    pub fn just_pressed_long(&self) -> bool {
        self.tracker.just_pressed_long()
    }

    pub fn just_released_long(&self) -> bool {
        self.tracker.just_released_long()
    }

    /// Confirmed tap count this tick (0 when none)
    pub fn tapped_count(&self) -> u32 {
        self.tapped
    }

    pub fn just_tapped(&self, count: u32) -> bool {
        self.tapped != 0 && self.tapped == count
    }

    pub fn just_long_tapped(&self) -> bool {
        self.long_tapped
    }

    /// Taps in the still-open sequence
    pub fn pending_taps(&self) -> u32 {
        self.tap_count
    }

    pub fn swipe_dir4(&self) -> &DirectionState {
        &self.swipe_dir4
    }

    pub fn swipe_dir8(&self) -> &DirectionState {
        &self.swipe_dir8
    }

    /// Constrained vector from the press origin
    pub fn swipe_vec(&self, config: &GestureConfig) -> Vec2 {
        if !self.tracker.pressed_raw() {
            return Vec2::ZERO;
        }
        self.constrain(self.tracker.position() - self.tracker.start_position(), config)
    }

    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll_delta
    }

    pub fn scroll_steps(&self) -> IVec2 {
        self.scroll_steps
    }

    pub fn position(&self) -> Vec2 {
        self.tracker.position()
    }

    pub fn pressure(&self) -> f32 {
        self.tracker.pressure()
    }
}
