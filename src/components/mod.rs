//! Page widgets and their lifecycle.
//!
//! A component is bound to one element, subscribes to the notifications it
//! needs in [`Component::attach`], and tears everything down again in
//! [`Component::dispose`]. All access to the page goes through a
//! [`Context`] handed in by the runtime for the duration of one callback.

pub mod highlight;
pub mod toggle;

pub use highlight::{AnchorEntry, ScrollHighlighter};
pub use toggle::ToggleControl;

use std::fmt;

use crate::dom::{NodeId, Page};
use crate::pointer::PointerTracker;
use crate::scheduler::{Scheduler, TimerAction};
use crate::viewport::{Viewport, ViewportEvent};

/// Index of a component inside the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub usize);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tunable constants shared by the widgets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timings {
    /// Added to the scroll offset before locating the current section.
    pub scroll_epsilon: f64,
    /// Delay before closing a panel after an in-page link was followed.
    pub dismiss_delay_ms: u64,
    /// Lifetime of the `to-has-*` / `from-has-*` transition classes.
    pub transition_ms: u64,
    /// Pointer travel that turns a tap into a drag.
    pub pointer_move_threshold: f64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            scroll_epsilon: 5.0,
            dismiss_delay_ms: 250,
            transition_ms: 500,
            pointer_move_threshold: crate::pointer::DEFAULT_MOVE_THRESHOLD,
        }
    }
}

/// Which listener a pointer event is delivered to.
///
/// Element listeners see an event before document listeners do, mirroring
/// DOM bubbling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Target,
    Document,
}

/// Pointer input routed to components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { target: NodeId },
    Up { target: NodeId },
    Click { target: NodeId },
}

impl PointerEvent {
    pub const fn target(&self) -> NodeId {
        match self {
            Self::Down { target } | Self::Up { target } | Self::Click { target } => *target,
        }
    }
}

/// Result of delivering an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventOutcome {
    pub default_prevented: bool,
}

impl EventOutcome {
    pub const fn prevented() -> Self {
        Self {
            default_prevented: true,
        }
    }

    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self {
            default_prevented: self.default_prevented || other.default_prevented,
        }
    }
}

/// Everything a component may touch while handling one callback.
pub struct Context<'a> {
    pub id: ComponentId,
    pub page: &'a mut Page,
    pub viewport: &'a mut Viewport,
    pub scheduler: &'a mut Scheduler,
    pub pointer: &'a PointerTracker,
    pub timings: &'a Timings,
}

/// Minimal widget lifecycle.
pub trait Component: fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// The element this component is bound to.
    fn element(&self) -> NodeId;

    /// Subscribe to notifications and compute initial state.
    fn attach(&mut self, ctx: &mut Context<'_>);

    /// A viewport notification this component subscribed to.
    fn on_viewport(&mut self, _event: ViewportEvent, _ctx: &mut Context<'_>) {}

    /// A pointer event, once per [`Phase`].
    fn on_pointer(
        &mut self,
        _event: PointerEvent,
        _phase: Phase,
        _ctx: &mut Context<'_>,
    ) -> EventOutcome {
        EventOutcome::default()
    }

    /// A timer scheduled by this component fired.
    fn on_timer(&mut self, _action: &TimerAction, _ctx: &mut Context<'_>) {}

    /// Undo subscriptions and any classes this component owns.
    fn dispose(&mut self, ctx: &mut Context<'_>);

    /// Downcasting hook for inspection in hosts and tests.
    fn as_any(&self) -> &dyn std::any::Any;
}
