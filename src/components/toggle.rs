//! Open/close toggles for auxiliary panels.
//!
//! A toggle is bound to an `a[data-toggle]` element whose attribute value
//! names a category (`menu`, `options`, ...). While active, the document root
//! carries `has-<category>` and the element carries `active`. Every change
//! also adds a short-lived `to-has-<category>` or `from-has-<category>` class
//! to the root so stylesheets can scope their transitions to the change.

use tracing::debug;

use super::{Component, Context, EventOutcome, Phase, PointerEvent};
use crate::dom::{NodeId, Selector, SelectorList, same_document};
use crate::scheduler::{TaskHandle, TimerAction};

/// Selector toggles are registered on.
pub const SELECTOR: &str = "a[data-toggle]";

/// Attribute holding the toggle's category.
pub const CATEGORY_ATTR: &str = "data-toggle";

/// Class on the bound element while the panel is open.
pub const ACTIVE_CLASS: &str = "active";

/// Column holding the navigation menu.
pub const MENU_COLUMN_CLASS: &str = "col-menu";

/// Filter controls; pressing inside them never dismisses a panel.
pub const FILTER_GROUP_CLASS: &str = "tsd-filter-group";

/// A two-state panel toggle.
#[derive(Debug)]
pub struct ToggleControl {
    element: NodeId,
    category: String,
    active: bool,
    transitions: Vec<(String, TaskHandle)>,
}

impl ToggleControl {
    /// Bind to `element`, reading its category once.
    pub fn new(element: NodeId, category: Option<&str>) -> Self {
        Self {
            element,
            category: category.unwrap_or_default().to_string(),
            active: false,
            transitions: Vec::new(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Class on the document root while active.
    pub fn state_class(&self) -> String {
        format!("has-{}", self.category)
    }

    /// Open or close the panel. Setting the current state again does nothing.
    pub fn set_active(&mut self, value: bool, ctx: &mut Context<'_>) {
        if self.active == value {
            return;
        }
        self.active = value;

        let root = ctx.page.root();
        ctx.page.toggle_class(root, &self.state_class(), value);
        ctx.page.toggle_class(self.element, ACTIVE_CLASS, value);

        let prefix = if value { "to-has-" } else { "from-has-" };
        let transition = format!("{prefix}{}", self.category);
        ctx.page.add_class(root, &transition);

        // A fresh transition class must live its full duration.
        if let Some(pos) = self.transitions.iter().position(|(c, _)| *c == transition) {
            let (_, stale) = self.transitions.remove(pos);
            ctx.scheduler.cancel(stale);
        }
        let handle = ctx.scheduler.schedule(
            ctx.id,
            ctx.timings.transition_ms,
            TimerAction::RemoveClass {
                node: root,
                class: transition.clone(),
            },
        );
        self.transitions.push((transition, handle));

        debug!(category = %self.category, active = value, "toggle changed");
    }

    fn exempt_regions() -> SelectorList {
        SelectorList(vec![
            Selector::class(MENU_COLUMN_CLASS),
            Selector::class(FILTER_GROUP_CLASS),
        ])
    }

    fn on_element_pointer(&mut self, event: PointerEvent, ctx: &mut Context<'_>) -> EventOutcome {
        match event {
            PointerEvent::Up { .. } if !ctx.pointer.has_moved() => {
                self.set_active(true, ctx);
                EventOutcome::prevented()
            }
            PointerEvent::Click { .. } => EventOutcome::prevented(),
            _ => EventOutcome::default(),
        }
    }

    fn on_document_pointer(&mut self, event: PointerEvent, ctx: &mut Context<'_>) {
        if !self.active {
            return;
        }
        match event {
            PointerEvent::Down { target } => {
                if ctx.page.is_inclusive_ancestor(self.element, target)
                    || ctx.page.closest(target, &Self::exempt_regions()).is_some()
                {
                    return;
                }
                self.set_active(false, ctx);
            }
            PointerEvent::Up { target } if !ctx.pointer.has_moved() => {
                let menu: SelectorList = Selector::class(MENU_COLUMN_CLASS).into();
                if ctx.page.closest(target, &menu).is_none() {
                    return;
                }
                let Some(link) = ctx.page.closest(target, &Selector::tag("a").into()) else {
                    return;
                };
                let (Some(href), Some(location)) = (ctx.page.href(link), ctx.page.location())
                else {
                    return;
                };
                if same_document(&href, location) {
                    debug!(category = %self.category, "in-page link followed, closing");
                    ctx.scheduler
                        .schedule(ctx.id, ctx.timings.dismiss_delay_ms, TimerAction::Deactivate);
                }
            }
            _ => {}
        }
    }
}

impl Component for ToggleControl {
    fn name(&self) -> &'static str {
        "toggle"
    }

    fn element(&self) -> NodeId {
        self.element
    }

    fn attach(&mut self, _ctx: &mut Context<'_>) {}

    fn on_pointer(
        &mut self,
        event: PointerEvent,
        phase: Phase,
        ctx: &mut Context<'_>,
    ) -> EventOutcome {
        match phase {
            Phase::Target if ctx.page.is_inclusive_ancestor(self.element, event.target()) => {
                self.on_element_pointer(event, ctx)
            }
            Phase::Target => EventOutcome::default(),
            Phase::Document => {
                self.on_document_pointer(event, ctx);
                EventOutcome::default()
            }
        }
    }

    fn on_timer(&mut self, action: &TimerAction, ctx: &mut Context<'_>) {
        match action {
            TimerAction::RemoveClass { node, class } => {
                ctx.page.remove_class(*node, class);
                self.transitions.retain(|(c, _)| c != class);
            }
            TimerAction::Deactivate => self.set_active(false, ctx),
        }
    }

    fn dispose(&mut self, ctx: &mut Context<'_>) {
        let root = ctx.page.root();
        ctx.page.remove_class(root, &self.state_class());
        ctx.page.remove_class(self.element, ACTIVE_CLASS);
        for (class, handle) in self.transitions.drain(..) {
            ctx.scheduler.cancel(handle);
            ctx.page.remove_class(root, &class);
        }
        ctx.scheduler.cancel_owner(ctx.id);
        self.active = false;
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ComponentId, Timings};
    use crate::dom::Page;
    use crate::pointer::PointerTracker;
    use crate::scheduler::Scheduler;
    use crate::viewport::Viewport;

    struct Harness {
        page: Page,
        viewport: Viewport,
        scheduler: Scheduler,
        pointer: PointerTracker,
        timings: Timings,
        button: NodeId,
    }

    impl Harness {
        fn new() -> Self {
            let mut page = Page::new("https://docs.example.org/index.html");
            let button = page.create_element("a");
            page.set_attr(button, CATEGORY_ATTR, "nav");
            page.append_child(page.root(), button);
            Self {
                page,
                viewport: Viewport::new(1280, 800),
                scheduler: Scheduler::new(),
                pointer: PointerTracker::default(),
                timings: Timings::default(),
                button,
            }
        }

        fn with<R>(&mut self, f: impl FnOnce(&mut Context<'_>) -> R) -> R {
            let mut ctx = Context {
                id: ComponentId(0),
                page: &mut self.page,
                viewport: &mut self.viewport,
                scheduler: &mut self.scheduler,
                pointer: &self.pointer,
                timings: &self.timings,
            };
            f(&mut ctx)
        }

        fn root_classes(&self) -> Vec<String> {
            self.page.classes(self.page.root()).to_vec()
        }
    }

    #[test]
    fn test_category_defaults_to_empty() {
        let h = Harness::new();
        let toggle = ToggleControl::new(h.button, None);
        assert_eq!(toggle.category(), "");
        assert_eq!(toggle.state_class(), "has-");
    }

    #[test]
    fn test_set_active_applies_classes() {
        let mut h = Harness::new();
        let mut toggle = ToggleControl::new(h.button, Some("nav"));
        h.with(|ctx| toggle.set_active(true, ctx));

        assert!(toggle.is_active());
        assert_eq!(h.root_classes(), vec!["has-nav", "to-has-nav"]);
        assert!(h.page.has_class(h.button, ACTIVE_CLASS));
        assert_eq!(h.scheduler.next_due(), Some(500));
    }

    #[test]
    fn test_set_active_is_idempotent() {
        let mut h = Harness::new();
        let mut toggle = ToggleControl::new(h.button, Some("nav"));
        h.with(|ctx| toggle.set_active(true, ctx));
        let classes = h.root_classes();
        let pending = h.scheduler.pending();

        h.with(|ctx| toggle.set_active(true, ctx));
        assert_eq!(h.root_classes(), classes);
        assert_eq!(h.scheduler.pending(), pending);
    }

    #[test]
    fn test_deactivate_swaps_transition_class() {
        let mut h = Harness::new();
        let mut toggle = ToggleControl::new(h.button, Some("nav"));
        h.with(|ctx| toggle.set_active(true, ctx));
        h.with(|ctx| toggle.set_active(false, ctx));

        assert_eq!(h.root_classes(), vec!["to-has-nav", "from-has-nav"]);
        assert!(!h.page.has_class(h.button, ACTIVE_CLASS));
    }

    #[test]
    fn test_retoggle_replaces_pending_transition_removal() {
        let mut h = Harness::new();
        let mut toggle = ToggleControl::new(h.button, Some("nav"));
        h.with(|ctx| toggle.set_active(true, ctx));
        h.scheduler.advance_to(300);
        h.with(|ctx| toggle.set_active(false, ctx));
        h.with(|ctx| toggle.set_active(true, ctx));

        // Only the fresh to-has-nav removal (due 800) and from-has-nav (800) remain.
        assert_eq!(h.scheduler.pending(), 2);
        assert_eq!(h.scheduler.next_due(), Some(800));
    }

    #[test]
    fn test_timer_removes_transition_class() {
        let mut h = Harness::new();
        let mut toggle = ToggleControl::new(h.button, Some("nav"));
        h.with(|ctx| toggle.set_active(true, ctx));

        let task = h.scheduler.take_due(500).unwrap();
        h.with(|ctx| toggle.on_timer(&task.action, ctx));
        assert_eq!(h.root_classes(), vec!["has-nav"]);
    }

    #[test]
    fn test_deactivate_after_element_removed_is_harmless() {
        let mut h = Harness::new();
        let mut toggle = ToggleControl::new(h.button, Some("nav"));
        h.with(|ctx| toggle.set_active(true, ctx));
        h.page.remove(h.button);

        h.with(|ctx| toggle.on_timer(&TimerAction::Deactivate, ctx));
        assert!(!toggle.is_active());
        assert_eq!(h.root_classes(), vec!["to-has-nav", "from-has-nav"]);
    }

    #[test]
    fn test_dispose_removes_owned_classes_and_timers() {
        let mut h = Harness::new();
        let mut toggle = ToggleControl::new(h.button, Some("nav"));
        h.with(|ctx| toggle.set_active(true, ctx));
        h.with(|ctx| toggle.dispose(ctx));

        assert!(h.root_classes().is_empty());
        assert!(!h.page.has_class(h.button, ACTIVE_CLASS));
        assert_eq!(h.scheduler.pending(), 0);
    }
}
