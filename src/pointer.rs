//! Pointer gesture tracking.
//!
//! Abstracts mouse vs. touch input and tells taps apart from drags: a press
//! followed by more than [`DEFAULT_MOVE_THRESHOLD`] pixels of travel marks
//! the gesture as moved until the next press.

use once_cell::sync::Lazy;
use regex::Regex;

/// Distance in pixels a pressed pointer may travel and still count as a tap.
pub const DEFAULT_MOVE_THRESHOLD: f64 = 10.0;

static MOBILE_AGENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Android|webOS|iPhone|iPad|iPod|BlackBerry|IEMobile|Opera Mini")
        .expect("mobile agent regex")
});

/// Whether a user agent string belongs to a mobile browser.
pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    MOBILE_AGENT.is_match(user_agent)
}

/// Input family the host delivers pointer events with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerKind {
    #[default]
    Mouse,
    Touch,
}

/// Phase of a pointer gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Down,
    Move,
    Up,
}

impl PointerKind {
    /// Touch events are only used on mobile hosts that support them.
    pub const fn detect(mobile: bool, touch_capable: bool) -> Self {
        if mobile && touch_capable {
            Self::Touch
        } else {
            Self::Mouse
        }
    }

    /// DOM event name for `action`, e.g. `mousedown` or `touchend`.
    pub const fn event_name(self, action: PointerAction) -> &'static str {
        match (self, action) {
            (Self::Mouse, PointerAction::Down) => "mousedown",
            (Self::Mouse, PointerAction::Move) => "mousemove",
            (Self::Mouse, PointerAction::Up) => "mouseup",
            (Self::Touch, PointerAction::Down) => "touchstart",
            (Self::Touch, PointerAction::Move) => "touchmove",
            (Self::Touch, PointerAction::Up) => "touchend",
        }
    }
}

/// Tracks the current gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerTracker {
    kind: PointerKind,
    threshold: f64,
    is_down: bool,
    has_moved: bool,
    down_position: (f64, f64),
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new(PointerKind::Mouse)
    }
}

impl PointerTracker {
    pub const fn new(kind: PointerKind) -> Self {
        Self {
            kind,
            threshold: DEFAULT_MOVE_THRESHOLD,
            is_down: false,
            has_moved: false,
            down_position: (0.0, 0.0),
        }
    }

    #[must_use]
    pub const fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub const fn kind(&self) -> PointerKind {
        self.kind
    }

    pub const fn is_down(&self) -> bool {
        self.is_down
    }

    /// Whether the pointer travelled past the threshold since the last press.
    pub const fn has_moved(&self) -> bool {
        self.has_moved
    }

    /// A press starts a new gesture.
    pub const fn press(&mut self, x: f64, y: f64) {
        self.is_down = true;
        self.has_moved = false;
        self.down_position = (x, y);
    }

    /// Movement only counts while pressed, and only until it first exceeds
    /// the threshold.
    pub fn move_to(&mut self, x: f64, y: f64) {
        if !self.is_down || self.has_moved {
            return;
        }
        let dx = self.down_position.0 - x;
        let dy = self.down_position.1 - y;
        self.has_moved = dx.hypot(dy) > self.threshold;
    }

    /// Releasing ends the gesture but keeps `has_moved` for release handlers.
    pub const fn release(&mut self) {
        self.is_down = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tap_does_not_move() {
        let mut tracker = PointerTracker::default();
        tracker.press(100.0, 100.0);
        tracker.move_to(103.0, 104.0);
        tracker.release();
        assert!(!tracker.has_moved());
        assert!(!tracker.is_down());
    }

    #[test]
    fn test_drag_past_threshold_moves() {
        let mut tracker = PointerTracker::default();
        tracker.press(0.0, 0.0);
        tracker.move_to(8.0, 8.0);
        assert!(tracker.has_moved(), "distance ~11.3 exceeds 10");
    }

    #[test]
    fn test_moved_flag_sticks_until_next_press() {
        let mut tracker = PointerTracker::default();
        tracker.press(0.0, 0.0);
        tracker.move_to(50.0, 0.0);
        tracker.move_to(0.0, 0.0);
        tracker.release();
        assert!(tracker.has_moved());

        tracker.press(0.0, 0.0);
        assert!(!tracker.has_moved());
    }

    #[test]
    fn test_moves_without_press_are_ignored() {
        let mut tracker = PointerTracker::default();
        tracker.move_to(500.0, 500.0);
        assert!(!tracker.has_moved());
    }

    #[test]
    fn test_custom_threshold() {
        let mut tracker = PointerTracker::new(PointerKind::Touch).with_threshold(2.0);
        tracker.press(0.0, 0.0);
        tracker.move_to(3.0, 0.0);
        assert!(tracker.has_moved());
        assert_eq!(tracker.kind(), PointerKind::Touch);
    }

    #[test]
    fn test_event_names_per_kind() {
        assert_eq!(PointerKind::Mouse.event_name(PointerAction::Down), "mousedown");
        assert_eq!(PointerKind::Touch.event_name(PointerAction::Up), "touchend");
        assert_eq!(PointerKind::Touch.event_name(PointerAction::Move), "touchmove");
    }

    #[test]
    fn test_detect_requires_mobile_and_touch() {
        assert_eq!(PointerKind::detect(true, true), PointerKind::Touch);
        assert_eq!(PointerKind::detect(true, false), PointerKind::Mouse);
        assert_eq!(PointerKind::detect(false, true), PointerKind::Mouse);
    }

    #[test]
    fn test_mobile_user_agents() {
        assert!(is_mobile_user_agent(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)"
        ));
        assert!(is_mobile_user_agent("Mozilla/5.0 (Linux; android 14)"));
        assert!(!is_mobile_user_agent(
            "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/130.0"
        ));
    }
}
