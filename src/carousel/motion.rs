//! Offset controller for the carousel track.
//!
//! Turns discrete steps and live drag gestures into a horizontal offset in
//! `[-max_offset, 0]`. Steps and drag releases settle through a damped
//! spring that is advanced by the caller's frame clock via [`OffsetController::tick`];
//! the controller itself never schedules anything.

use super::bounds::{clamp_offset, sanitize_extent, BoundsUpdate};
use super::fade::{fade_visibility, FadeVisibility};
use crate::config::{CarouselConfig, SpringConfig, SPRING_SUBSTEP};

/// Frame gaps longer than this are treated as a single long frame.
const MAX_FRAME_DT: f64 = 0.1;
/// Distance from the target below which the spring may come to rest.
const REST_DELTA: f64 = 0.25;
/// Speed below which the spring may come to rest (px/s).
const REST_SPEED: f64 = 2.0;
/// A settle that has not come to rest after this long lands on its target.
const SETTLE_DEADLINE: f64 = 2.0;

/// Direction of a discrete step. Forward reveals content to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Forward,
    Backward,
}

impl StepDirection {
    fn sign(self) -> f64 {
        match self {
            StepDirection::Forward => 1.0,
            StepDirection::Backward => -1.0,
        }
    }
}

/// An offset together with the fades derived from it.
///
/// Renderers apply both fields in one go so the fades are never stale
/// relative to the displayed offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub offset: f64,
    pub fade: FadeVisibility,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Dragging { origin: f64 },
    Settling { target: f64 },
}

/// Applies the elastic overrun used while a drag pulls past an edge.
pub fn rubber_band(raw: f64, max_offset: f64, elastic: f64) -> f64 {
    let min = -sanitize_extent(max_offset);
    if raw > 0.0 {
        raw * elastic
    } else if raw < min {
        min + (raw - min) * elastic
    } else {
        raw
    }
}

#[derive(Debug)]
pub struct OffsetController {
    config: CarouselConfig,
    offset: f64,
    velocity: f64,
    max_offset: f64,
    viewport_extent: f64,
    phase: Phase,
    /// Seconds spent in the current settle.
    settle_elapsed: f64,
    /// The current gesture has travelled past the tap threshold.
    drag_engaged: bool,
    /// An engaged drag ended and no new press has happened since.
    drag_recent: bool,
}

impl OffsetController {
    pub fn new(config: CarouselConfig) -> Self {
        Self {
            config,
            offset: 0.0,
            velocity: 0.0,
            max_offset: 0.0,
            viewport_extent: 0.0,
            phase: Phase::Idle,
            settle_elapsed: 0.0,
            drag_engaged: false,
            drag_recent: false,
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    #[cfg(test)]
    pub fn max_offset(&self) -> f64 {
        self.max_offset
    }

    pub fn frame(&self) -> Frame {
        Frame {
            offset: self.offset,
            fade: fade_visibility(self.offset, self.max_offset, self.config.fade_epsilon),
        }
    }

    /// A settle animation is in flight and `tick` should keep being called.
    pub fn is_animating(&self) -> bool {
        matches!(self.phase, Phase::Settling { .. })
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging { .. })
    }

    /// Whether a release right now belongs to a drag rather than a tap.
    pub fn drag_suppresses_tap(&self) -> bool {
        self.drag_engaged || self.drag_recent
    }

    /// The value the offset will end up at once motion stops.
    pub fn resting_offset(&self) -> f64 {
        match self.phase {
            Phase::Settling { target } => target,
            Phase::Dragging { .. } => clamp_offset(self.offset, self.max_offset),
            Phase::Idle => self.offset,
        }
    }

    /// Adopts freshly measured bounds.
    ///
    /// Outside a drag the clamped offset is applied immediately; an
    /// in-flight settle keeps animating towards its target clamped into
    /// the new range.
    pub fn apply_bounds(&mut self, update: &BoundsUpdate) -> Frame {
        self.max_offset = update.bounds.max_offset;
        self.viewport_extent = update.bounds.viewport_extent;

        match self.phase {
            Phase::Dragging { origin } => {
                self.phase = Phase::Dragging {
                    origin: clamp_offset(origin, self.max_offset),
                };
            }
            Phase::Settling { target } => {
                self.offset = clamp_offset(self.offset, self.max_offset);
                self.phase = Phase::Settling {
                    target: clamp_offset(target, self.max_offset),
                };
            }
            Phase::Idle => {
                if update.snapped {
                    tracing::debug!(offset = update.offset, "snapping offset into new bounds");
                }
                self.offset = clamp_offset(update.offset, self.max_offset);
            }
        }
        self.frame()
    }

    pub fn step_forward(&mut self) -> Option<f64> {
        self.step(StepDirection::Forward)
    }

    pub fn step_backward(&mut self) -> Option<f64> {
        self.step(StepDirection::Backward)
    }

    /// Starts a settle towards the next step target.
    ///
    /// Consecutive steps accumulate from the previous target, not from the
    /// mid-flight position. Returns the target, or `None` when there is
    /// nothing to animate (already at that edge, or a drag is active).
    pub fn step(&mut self, direction: StepDirection) -> Option<f64> {
        if self.is_dragging() {
            return None;
        }
        let amount = self.config.step_amount(self.viewport_extent);
        let base = self.resting_offset();
        let target = clamp_offset(base - direction.sign() * amount, self.max_offset);

        if target == self.offset && self.velocity == 0.0 {
            self.phase = Phase::Idle;
            return None;
        }
        tracing::debug!(?direction, from = base, to = target, "carousel step");
        self.start_settle(target);
        Some(target)
    }

    /// Pointer went down on the viewport. Clears the "drag just ended" mark.
    pub fn press(&mut self) {
        self.drag_recent = false;
    }

    /// Starts a live drag. Any running settle is interrupted where it is.
    pub fn begin_drag(&mut self) {
        self.press();
        self.offset = clamp_offset(self.offset, self.max_offset);
        self.velocity = 0.0;
        self.drag_engaged = false;
        self.phase = Phase::Dragging {
            origin: self.offset,
        };
    }

    /// Follows the pointer. `dx`/`dy` are the totals since `begin_drag`.
    pub fn update_drag(&mut self, dx: f64, dy: f64) -> Frame {
        let Phase::Dragging { origin } = self.phase else {
            return self.frame();
        };
        if !dx.is_finite() || !dy.is_finite() {
            return self.frame();
        }
        if dx.abs() + dy.abs() > self.config.tap_threshold {
            self.drag_engaged = true;
        }
        self.offset = rubber_band(origin + dx, self.max_offset, self.config.drag_elastic);
        self.frame()
    }

    /// Releases the drag. Returns true when a settle back into bounds has
    /// been started.
    pub fn end_drag(&mut self) -> bool {
        if !self.is_dragging() {
            return false;
        }
        if self.drag_engaged {
            self.drag_recent = true;
        }
        self.drag_engaged = false;

        let target = clamp_offset(self.offset, self.max_offset);
        if target == self.offset {
            self.phase = Phase::Idle;
            false
        } else {
            self.velocity = 0.0;
            self.start_settle(target);
            true
        }
    }

    /// Advances the settle animation by `dt` seconds.
    ///
    /// Returns false once the offset rests exactly on its target (or when
    /// nothing was animating).
    pub fn tick(&mut self, dt: f64) -> bool {
        let Phase::Settling { target } = self.phase else {
            return false;
        };
        let dt = if dt.is_finite() {
            dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };
        self.settle_elapsed += dt;
        let mut remaining = dt;

        let SpringConfig {
            stiffness,
            damping,
            mass,
        } = self.config.spring;
        while remaining > 0.0 {
            let h = remaining.min(SPRING_SUBSTEP);
            let force = -stiffness * (self.offset - target) - damping * self.velocity;
            self.velocity += force / mass * h;
            self.offset += self.velocity * h;
            remaining -= h;
        }

        if !self.offset.is_finite() || !self.velocity.is_finite() {
            tracing::warn!(to = target, "spring diverged, landing on target");
            self.settle_at(target);
            return false;
        }

        // Overshoot past an edge is not allowed outside a drag.
        let clamped = clamp_offset(self.offset, self.max_offset);
        if clamped != self.offset {
            self.offset = clamped;
            self.velocity = 0.0;
        }

        if (self.offset - target).abs() < REST_DELTA && self.velocity.abs() < REST_SPEED {
            self.settle_at(target);
            return false;
        }
        if self.settle_elapsed >= SETTLE_DEADLINE {
            tracing::debug!(
                offset = self.offset,
                to = target,
                "settle deadline reached, landing on target"
            );
            self.settle_at(target);
            return false;
        }
        true
    }

    /// Stops any animation, leaving the offset on its resting value.
    pub fn cancel(&mut self) {
        match self.phase {
            Phase::Settling { target } => self.settle_at(target),
            Phase::Dragging { .. } => {
                let target = clamp_offset(self.offset, self.max_offset);
                self.drag_engaged = false;
                self.settle_at(target);
            }
            Phase::Idle => {}
        }
    }

    fn start_settle(&mut self, target: f64) {
        self.settle_elapsed = 0.0;
        self.phase = Phase::Settling { target };
    }

    fn settle_at(&mut self, target: f64) {
        self.offset = target;
        self.velocity = 0.0;
        self.phase = Phase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carousel::bounds::BoundsTracker;

    const FRAME: f64 = 1.0 / 60.0;

    fn controller(viewport: f64, track: f64) -> (OffsetController, BoundsTracker) {
        let mut ctrl = OffsetController::new(CarouselConfig::default());
        let mut tracker = BoundsTracker::new();
        let update = tracker
            .observe(Some(viewport), Some(track), ctrl.offset())
            .unwrap();
        ctrl.apply_bounds(&update);
        (ctrl, tracker)
    }

    fn settle(ctrl: &mut OffsetController) -> usize {
        let mut frames = 0;
        while ctrl.tick(FRAME) {
            let offset = ctrl.offset();
            assert!(
                offset <= 0.0 && offset >= -ctrl.max_offset(),
                "offset {offset} left bounds mid-settle"
            );
            frames += 1;
            assert!(frames < 600, "spring did not settle");
        }
        frames
    }

    #[test]
    fn test_step_settles_exactly_on_target() {
        let (mut ctrl, _) = controller(1000.0, 3000.0);
        assert_eq!(ctrl.step_forward(), Some(-850.0));
        assert!(ctrl.is_animating());
        assert!(settle(&mut ctrl) > 0);
        assert_eq!(ctrl.offset(), -850.0);
        assert!(!ctrl.is_animating());
    }

    #[test]
    fn test_forward_then_backward_returns_to_start() {
        let (mut ctrl, _) = controller(1000.0, 3000.0);
        ctrl.step_forward();
        settle(&mut ctrl);
        ctrl.step_backward();
        settle(&mut ctrl);
        assert_eq!(ctrl.offset(), 0.0);
    }

    #[test]
    fn test_backward_at_start_is_noop() {
        let (mut ctrl, _) = controller(1000.0, 3000.0);
        assert_eq!(ctrl.step_backward(), None);
        assert!(!ctrl.is_animating());
        assert_eq!(ctrl.offset(), 0.0);
    }

    #[test]
    fn test_step_clamps_at_end() {
        let (mut ctrl, _) = controller(1000.0, 1500.0);
        assert_eq!(ctrl.step_forward(), Some(-500.0));
        settle(&mut ctrl);
        assert_eq!(ctrl.offset(), -500.0);
        assert_eq!(ctrl.step_forward(), None);
    }

    #[test]
    fn test_consecutive_steps_accumulate_from_target() {
        let (mut ctrl, _) = controller(400.0, 5000.0);
        assert_eq!(ctrl.step_forward(), Some(-340.0));
        ctrl.tick(FRAME);
        assert_eq!(ctrl.step_forward(), Some(-680.0));
        settle(&mut ctrl);
        assert_eq!(ctrl.offset(), -680.0);
    }

    #[test]
    fn test_narrow_viewport_uses_min_step() {
        let (mut ctrl, _) = controller(200.0, 2000.0);
        assert_eq!(ctrl.step_forward(), Some(-320.0));
    }

    #[test]
    fn test_no_scroll_range_never_moves() {
        let (mut ctrl, _) = controller(1200.0, 900.0);
        assert_eq!(ctrl.step_forward(), None);
        assert_eq!(ctrl.step_backward(), None);
        let fade = ctrl.frame().fade;
        assert!(!fade.show_left && !fade.show_right);
    }

    #[test]
    fn test_drag_tracks_pointer_within_bounds() {
        let (mut ctrl, _) = controller(1000.0, 3000.0);
        ctrl.begin_drag();
        let frame = ctrl.update_drag(-300.0, 4.0);
        assert_eq!(frame.offset, -300.0);
        assert!(frame.fade.show_left && frame.fade.show_right);
        assert!(!ctrl.end_drag());
        assert_eq!(ctrl.offset(), -300.0);
    }

    #[test]
    fn test_drag_overrun_is_elastic_and_snaps_back() {
        let (mut ctrl, _) = controller(1000.0, 3000.0);
        ctrl.begin_drag();
        let frame = ctrl.update_drag(200.0, 0.0);
        assert!((frame.offset - 12.0).abs() < 1e-9);

        assert!(ctrl.end_drag());
        settle(&mut ctrl);
        assert_eq!(ctrl.offset(), 0.0);
    }

    #[test]
    fn test_drag_overrun_past_end() {
        let (mut ctrl, _) = controller(1000.0, 3000.0);
        ctrl.begin_drag();
        let frame = ctrl.update_drag(-2500.0, 0.0);
        assert!((frame.offset - (-2030.0)).abs() < 1e-9);
        ctrl.end_drag();
        settle(&mut ctrl);
        assert_eq!(ctrl.offset(), -2000.0);
    }

    #[test]
    fn test_engaged_drag_suppresses_tap_until_next_press() {
        let (mut ctrl, _) = controller(1000.0, 3000.0);
        ctrl.begin_drag();
        ctrl.update_drag(-3.0, 2.0);
        assert!(!ctrl.drag_suppresses_tap());
        ctrl.update_drag(-50.0, 0.0);
        assert!(ctrl.drag_suppresses_tap());
        ctrl.end_drag();
        assert!(ctrl.drag_suppresses_tap());

        ctrl.begin_drag();
        assert!(!ctrl.drag_suppresses_tap());
        ctrl.end_drag();
        assert!(!ctrl.drag_suppresses_tap());
    }

    #[test]
    fn test_step_ignored_while_dragging() {
        let (mut ctrl, _) = controller(1000.0, 3000.0);
        ctrl.begin_drag();
        assert_eq!(ctrl.step_forward(), None);
        assert!(ctrl.is_dragging());
    }

    #[test]
    fn test_drag_interrupts_settle() {
        let (mut ctrl, _) = controller(1000.0, 3000.0);
        ctrl.step_forward();
        ctrl.tick(FRAME);
        ctrl.tick(FRAME);
        let mid = ctrl.offset();
        assert!(mid < 0.0 && mid > -850.0);

        ctrl.begin_drag();
        assert!(!ctrl.is_animating());
        assert_eq!(ctrl.update_drag(0.0, 0.0).offset, mid);
    }

    #[test]
    fn test_resize_during_settle_clamps_target() {
        let (mut ctrl, mut tracker) = controller(1000.0, 3000.0);
        ctrl.step_forward();
        ctrl.tick(FRAME);

        let update = tracker.observe(Some(2800.0), Some(3000.0), ctrl.offset()).unwrap();
        ctrl.apply_bounds(&update);
        settle(&mut ctrl);
        assert_eq!(ctrl.offset(), -200.0);
    }

    #[test]
    fn test_resize_snaps_idle_offset_without_animation() {
        let (mut ctrl, mut tracker) = controller(1000.0, 3000.0);
        ctrl.begin_drag();
        ctrl.update_drag(-1800.0, 0.0);
        ctrl.end_drag();
        assert_eq!(ctrl.offset(), -1800.0);

        let update = tracker.observe(Some(2000.0), Some(3000.0), ctrl.offset()).unwrap();
        assert!(update.snapped);
        let frame = ctrl.apply_bounds(&update);
        assert_eq!(frame.offset, -1000.0);
        assert!(!ctrl.is_animating());
        assert!(!frame.fade.show_right);
    }

    #[test]
    fn test_cancel_lands_on_target() {
        let (mut ctrl, _) = controller(1000.0, 3000.0);
        ctrl.step_forward();
        ctrl.tick(FRAME);
        ctrl.cancel();
        assert_eq!(ctrl.offset(), -850.0);
        assert!(!ctrl.tick(FRAME));
    }

    fn controller_with_spring(stiffness: f64, damping: f64) -> OffsetController {
        let config = CarouselConfig {
            spring: SpringConfig {
                stiffness,
                damping,
                mass: 1.0,
            },
            ..CarouselConfig::default()
        };
        let mut ctrl = OffsetController::new(config);
        let update = BoundsTracker::new()
            .observe(Some(1000.0), Some(3000.0), 0.0)
            .unwrap();
        ctrl.apply_bounds(&update);
        ctrl
    }

    /// Ticks until rest, failing if that takes longer than the deadline.
    fn settle_within_deadline(ctrl: &mut OffsetController) {
        let limit = (SETTLE_DEADLINE / FRAME).ceil() as usize + 2;
        let mut frames = 0;
        while ctrl.tick(FRAME) {
            frames += 1;
            assert!(frames <= limit, "settle ran past its deadline");
        }
    }

    #[test]
    fn test_extreme_valid_springs_land_on_target() {
        for (stiffness, damping) in [(57_000.0, 239.0), (57_000.0, 0.5), (0.5, 239.0), (1.0, 0.01)] {
            let mut ctrl = controller_with_spring(stiffness, damping);
            assert_eq!(ctrl.config.validate(), Ok(()));
            assert_eq!(ctrl.step_forward(), Some(-850.0));
            settle_within_deadline(&mut ctrl);
            assert_eq!(ctrl.offset(), -850.0, "k={stiffness} d={damping}");
            assert!(!ctrl.is_animating());
        }
    }

    #[test]
    fn test_unstable_spring_still_lands_on_target() {
        for (stiffness, damping) in [(1_000_000.0, 26.0), (200.0, 10_000.0), (500_000.0, 2_000.0)] {
            let mut ctrl = controller_with_spring(stiffness, damping);
            assert!(ctrl.config.validate().is_err());
            ctrl.step_forward();
            settle_within_deadline(&mut ctrl);
            assert_eq!(ctrl.offset(), -850.0, "k={stiffness} d={damping}");
        }
    }

    #[test]
    fn test_new_step_restarts_deadline() {
        let mut ctrl = controller_with_spring(0.5, 239.0);
        ctrl.step_forward();
        for _ in 0..100 {
            assert!(ctrl.tick(FRAME));
        }
        ctrl.step_forward();
        // A fresh step gets its own full settle window.
        for _ in 0..100 {
            assert!(ctrl.tick(FRAME));
        }
        settle_within_deadline(&mut ctrl);
        assert_eq!(ctrl.offset(), -1700.0);
    }

    #[test]
    fn test_rubber_band() {
        assert_eq!(rubber_band(-100.0, 500.0, 0.06), -100.0);
        assert!((rubber_band(100.0, 500.0, 0.06) - 6.0).abs() < 1e-9);
        assert!((rubber_band(-600.0, 500.0, 0.06) - (-506.0)).abs() < 1e-9);
        assert_eq!(rubber_band(50.0, 0.0, 0.0), 0.0);
    }
}
