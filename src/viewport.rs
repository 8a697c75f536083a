//! Viewport service.
//!
//! The [`Viewport`] tracks the visible area of the page and which components
//! subscribed to its `resize` and `scroll` notifications. It is owned by the
//! runtime and handed to components, never reached through a global.

use std::fmt;

use crate::components::ComponentId;

/// Notification kinds a component can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Resize,
    Scroll,
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resize => write!(f, "resize"),
            Self::Scroll => write!(f, "scroll"),
        }
    }
}

/// A notification delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportEvent {
    Resize { width: u32, height: u32 },
    Scroll { scroll_top: f64 },
}

impl ViewportEvent {
    pub const fn topic(&self) -> Topic {
        match self {
            Self::Resize { .. } => Topic::Resize,
            Self::Scroll { .. } => Topic::Scroll,
        }
    }
}

/// Handle returned by [`Viewport::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub topic: Topic,
    pub component: ComponentId,
}

/// Visible portion of the page plus its subscriber registry.
///
/// # Example
///
/// ```
/// use docnav::viewport::Viewport;
///
/// let mut vp = Viewport::new(1280, 800);
/// assert_eq!(vp.scroll_top(), 0.0);
///
/// vp.scroll_to(250.0);
/// assert_eq!(vp.scroll_top(), 250.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    width: u32,
    height: u32,
    scroll_top: f64,
    content_height: Option<f64>,
    subscriptions: Vec<Subscription>,
}

impl Viewport {
    /// Create a viewport scrolled to the top.
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scroll_top: 0.0,
            content_height: None,
            subscriptions: Vec::new(),
        }
    }

    /// Limit scrolling to a page of `height` pixels.
    #[must_use]
    pub const fn with_content_height(mut self, height: f64) -> Self {
        self.content_height = Some(height);
        self
    }

    /// Current vertical scroll offset in pixels.
    pub const fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Scroll to `top`, clamped to the scrollable range.
    ///
    /// Returns the scroll notification to deliver.
    pub fn scroll_to(&mut self, top: f64) -> ViewportEvent {
        self.scroll_top = top.clamp(0.0, self.max_offset());
        ViewportEvent::Scroll {
            scroll_top: self.scroll_top,
        }
    }

    /// Resize the viewport. The scroll offset is clamped to the new range.
    pub fn resize(&mut self, width: u32, height: u32) -> ViewportEvent {
        self.width = width;
        self.height = height;
        self.scroll_top = self.scroll_top.min(self.max_offset());
        ViewportEvent::Resize { width, height }
    }

    /// Register `component` for `topic`. Subscribing twice is a no-op.
    pub fn subscribe(&mut self, topic: Topic, component: ComponentId) -> Subscription {
        let sub = Subscription { topic, component };
        if !self.subscriptions.contains(&sub) {
            self.subscriptions.push(sub);
        }
        sub
    }

    pub fn unsubscribe(&mut self, sub: Subscription) {
        self.subscriptions.retain(|s| *s != sub);
    }

    /// Components subscribed to `topic`, in subscription order.
    pub fn subscribers(&self, topic: Topic) -> Vec<ComponentId> {
        self.subscriptions
            .iter()
            .filter(|s| s.topic == topic)
            .map(|s| s.component)
            .collect()
    }

    fn max_offset(&self) -> f64 {
        self.content_height
            .map_or(f64::INFINITY, |h| (h - f64::from(self.height)).max(0.0))
    }
}
