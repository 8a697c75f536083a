//! Selector → component registry.
//!
//! At page start every registered selector is matched against the document
//! and one component instance is created per matching element.

use tracing::debug;

use crate::components::{Component, ScrollHighlighter, ToggleControl};
use crate::dom::{NodeId, Page, SelectorError, SelectorList};

/// Builds a component for a matched element.
pub type Factory = fn(NodeId, &Page) -> Box<dyn Component>;

struct Registration {
    selectors: SelectorList,
    factory: Factory,
}

/// Ordered list of registrations.
#[derive(Default)]
pub struct Registry {
    registrations: Vec<Registration>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.registrations.iter().map(|r| r.selectors.to_string()))
            .finish()
    }
}

fn scroll_highlighter(node: NodeId, _page: &Page) -> Box<dyn Component> {
    Box::new(ScrollHighlighter::new(node))
}

fn toggle_control(node: NodeId, page: &Page) -> Box<dyn Component> {
    Box::new(ToggleControl::new(
        node,
        page.attr(node, crate::components::toggle::CATEGORY_ATTR),
    ))
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the theme's widgets: `.menu-highlight` and `a[data-toggle]`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (selector, factory) in [
            (crate::components::highlight::SELECTOR, scroll_highlighter as Factory),
            (crate::components::toggle::SELECTOR, toggle_control as Factory),
        ] {
            if let Err(err) = registry.register(selector, factory) {
                tracing::error!(selector, %err, "built-in selector rejected");
            }
        }
        registry
    }

    /// Register `factory` for elements matching `selector`.
    ///
    /// # Errors
    /// Returns [`SelectorError`] if the selector cannot be parsed.
    pub fn register(&mut self, selector: &str, factory: Factory) -> Result<(), SelectorError> {
        let selectors = SelectorList::parse(selector)?;
        self.registrations.push(Registration { selectors, factory });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Create one component per matching element, in registration order and
    /// then document order.
    pub fn instantiate(&self, page: &Page) -> Vec<Box<dyn Component>> {
        let mut components = Vec::new();
        for registration in &self.registrations {
            for node in page.query_all(&registration.selectors) {
                let component = (registration.factory)(node, page);
                debug!(
                    selector = %registration.selectors,
                    component = component.name(),
                    "component created"
                );
                components.push(component);
            }
        }
        components
    }
}
