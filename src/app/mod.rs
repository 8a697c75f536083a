//! Widget runtime.
//!
//! [`App`] owns the page and every service the widgets need:
//! - [`Page`]: the document
//! - [`Viewport`]: scroll offset and resize/scroll subscriptions
//! - [`PointerTracker`]: tap vs. drag detection
//! - [`Scheduler`]: deferred callbacks on an explicit clock
//!
//! Hosts feed it [`Message`]s through [`App::dispatch`]; each message runs to
//! completion before the next one is processed.

mod snapshot;
mod update;

pub use snapshot::{Snapshot, element_label};
pub use update::Message;

use tracing::{debug, trace};

use crate::components::{Component, ComponentId, Context, Timings};
use crate::dom::{LoadError, Page, PageSpec};
use crate::pointer::{PointerKind, PointerTracker, is_mobile_user_agent};
use crate::registry::Registry;
use crate::scheduler::Scheduler;
use crate::viewport::Viewport;

/// Runtime hosting the page's widgets.
pub struct App {
    page: Page,
    viewport: Viewport,
    pointer: PointerTracker,
    scheduler: Scheduler,
    timings: Timings,
    registry: Registry,
    components: Vec<Option<Box<dyn Component>>>,
    mobile: bool,
    touch: bool,
    started: bool,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("url", &self.page.url())
            .field("scroll_top", &self.viewport.scroll_top())
            .field("now_ms", &self.scheduler.now_ms())
            .field("components", &self.components.iter().flatten().count())
            .finish_non_exhaustive()
    }
}

impl App {
    /// Create a runtime for `page`. Nothing is instantiated until [`App::start`].
    pub fn new(page: Page, viewport: Viewport) -> Self {
        Self {
            page,
            viewport,
            pointer: PointerTracker::default(),
            scheduler: Scheduler::new(),
            timings: Timings::default(),
            registry: Registry::with_defaults(),
            components: Vec::new(),
            mobile: false,
            touch: false,
            started: false,
        }
    }

    /// Build a runtime from a page description.
    ///
    /// # Errors
    /// Returns [`LoadError`] if the element tree cannot be built.
    pub fn from_spec(spec: &PageSpec) -> Result<Self, LoadError> {
        let page = spec.build()?;
        let mut viewport = Viewport::new(spec.viewport.width, spec.viewport.height);
        if let Some(height) = spec.viewport.content_height {
            viewport = viewport.with_content_height(height);
        }
        viewport.scroll_to(spec.viewport.scroll_top);
        let mobile = spec
            .user_agent
            .as_deref()
            .is_some_and(is_mobile_user_agent);
        Ok(Self::new(page, viewport).with_device(mobile, spec.touch))
    }

    /// Override the widget timings.
    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    /// Describe the host device; decides mouse vs. touch event handling.
    pub fn with_device(mut self, mobile: bool, touch: bool) -> Self {
        self.mobile = mobile;
        self.touch = touch;
        self
    }

    /// Replace the component registry.
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Mark the device class on the root and attach every registered widget.
    /// Calling it again does nothing.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        let kind = PointerKind::detect(self.mobile, self.touch);
        self.pointer = PointerTracker::new(kind).with_threshold(self.timings.pointer_move_threshold);
        let root = self.page.root();
        self.page
            .add_class(root, if self.mobile { "is-mobile" } else { "not-mobile" });

        let created = self.registry.instantiate(&self.page);
        debug!(count = created.len(), ?kind, "starting widgets");
        for component in created {
            let id = ComponentId(self.components.len());
            self.components.push(Some(component));
            self.with_component(id, |component, ctx| component.attach(ctx));
        }
    }

    /// Dispose of one component. Returns `false` if it was already gone.
    pub fn dispose(&mut self, id: ComponentId) -> bool {
        let disposed = self
            .with_component(id, |component, ctx| component.dispose(ctx))
            .is_some();
        if let Some(slot) = self.components.get_mut(id.0) {
            *slot = None;
        }
        disposed
    }

    /// Dispose of every component.
    pub fn shutdown(&mut self) {
        for index in 0..self.components.len() {
            self.dispose(ComponentId(index));
        }
    }

    pub const fn page(&self) -> &Page {
        &self.page
    }

    /// Mutable page access for hosts that change the document between events.
    pub const fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub const fn pointer(&self) -> &PointerTracker {
        &self.pointer
    }

    pub const fn timings(&self) -> &Timings {
        &self.timings
    }

    /// Live components with their ids.
    pub fn components(&self) -> impl Iterator<Item = (ComponentId, &dyn Component)> {
        self.components
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_deref().map(|c| (ComponentId(i), c)))
    }

    /// Live components of a concrete type.
    pub fn components_of<T: Component + 'static>(&self) -> Vec<&T> {
        self.components()
            .filter_map(|(_, c)| c.as_any().downcast_ref::<T>())
            .collect()
    }

    /// Current class state of the page.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }

    fn with_component<R>(
        &mut self,
        id: ComponentId,
        f: impl FnOnce(&mut dyn Component, &mut Context<'_>) -> R,
    ) -> Option<R> {
        let Some(component) = self.components.get_mut(id.0).and_then(Option::as_mut) else {
            trace!(component = %id, "no such component");
            return None;
        };
        let mut ctx = Context {
            id,
            page: &mut self.page,
            viewport: &mut self.viewport,
            scheduler: &mut self.scheduler,
            pointer: &self.pointer,
            timings: &self.timings,
        };
        Some(f(component.as_mut(), &mut ctx))
    }

    fn component_ids(&self) -> Vec<ComponentId> {
        self.components().map(|(id, _)| id).collect()
    }
}
