//! In-memory document model.
//!
//! The widgets only ever query elements and flip CSS classes, so the model is
//! deliberately small:
//! - An arena of elements addressed by generational [`NodeId`]s
//! - Attributes, class lists and an absolute layout offset per element
//! - The page location used to resolve link targets
//!
//! A [`NodeId`] is a weak handle. Once an element is removed every operation
//! on its id becomes a silent no-op, which is what lets deferred callbacks
//! outlive the elements they were scheduled for.

mod link;
mod load;
mod selector;

pub use link::{encode_fragment, parse_location, resolve_href, same_document};
pub use load::{LoadError, NodeSpec, PageSpec, ViewportSpec};
pub use selector::{AttrMatch, Selector, SelectorError, SelectorList};

use std::collections::BTreeMap;

use url::Url;

/// Weak handle to an element of a [`Page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// A single element: tag, attributes, classes and tree links.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: String,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    top: f64,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: BTreeMap::new(),
            classes: Vec::new(),
            parent: None,
            children: Vec::new(),
            top: 0.0,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Absolute offset of the element's top edge from the page top.
    pub const fn top(&self) -> f64 {
        self.top
    }

    fn matches(&self, selector: &Selector) -> bool {
        if selector.tag.as_ref().is_some_and(|tag| *tag != self.tag) {
            return false;
        }
        if selector
            .id
            .as_ref()
            .is_some_and(|id| self.attr("id") != Some(id.as_str()))
        {
            return false;
        }
        if !selector.classes.iter().all(|c| self.has_class(c)) {
            return false;
        }
        selector.attrs.iter().all(|cond| match &cond.value {
            Some(value) => self.attr(&cond.name) == Some(value.as_str()),
            None => self.attrs.contains_key(&cond.name),
        })
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    element: Option<Element>,
}

/// A document: element arena, root element and location.
#[derive(Debug, Clone)]
pub struct Page {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    url: String,
    location: Option<Url>,
}

impl Page {
    /// Create an empty page whose document root is an `<html>` element.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_root_tag(url, "html")
    }

    pub(crate) fn with_root_tag(url: impl Into<String>, tag: &str) -> Self {
        let url = url.into();
        let mut page = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            location: parse_location(&url),
            url,
        };
        page.root = page.create_element(tag);
        page
    }

    /// The document root element (`document.documentElement`).
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Full page URL as given, including any fragment.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The parsed page URL; `None` when it is not absolute.
    pub const fn location(&self) -> Option<&Url> {
        self.location.as_ref()
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
        self.location = parse_location(&self.url);
    }

    /// Allocate a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let element = Some(Element::new(tag));
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.element = element;
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            element,
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Whether `node` still refers to a live element.
    pub fn contains(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        self.slots
            .get(node.index as usize)
            .filter(|slot| slot.generation == node.generation)
            .and_then(|slot| slot.element.as_ref())
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        self.slots
            .get_mut(node.index as usize)
            .filter(|slot| slot.generation == node.generation)
            .and_then(|slot| slot.element.as_mut())
    }

    /// Append `child` to `parent`, detaching it from any previous parent.
    ///
    /// Returns `false` when either handle is stale or the move would create
    /// a cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.contains(parent) || !self.contains(child) {
            return false;
        }
        if self.is_inclusive_ancestor(child, parent) {
            return false;
        }
        self.detach(child);
        if let Some(el) = self.element_mut(child) {
            el.parent = Some(parent);
        }
        if let Some(el) = self.element_mut(parent) {
            el.children.push(child);
        }
        true
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.element(node).and_then(Element::parent) else {
            return;
        };
        if let Some(el) = self.element_mut(parent) {
            el.children.retain(|c| *c != node);
        }
        if let Some(el) = self.element_mut(node) {
            el.parent = None;
        }
    }

    /// Remove `node` and its subtree from the page.
    ///
    /// All handles into the subtree become stale. The document root cannot
    /// be removed.
    pub fn remove(&mut self, node: NodeId) -> bool {
        if node == self.root || !self.contains(node) {
            return false;
        }
        self.detach(node);
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let slot = &mut self.slots[current.index as usize];
            if slot.generation != current.generation {
                continue;
            }
            if let Some(el) = slot.element.take() {
                stack.extend(el.children);
            }
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(current.index);
        }
        true
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(Element::tag)
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|el| el.attr(name))
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        if let Some(el) = self.element_mut(node) {
            el.attrs.insert(name.to_string(), value.into());
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.element(node).and_then(Element::parent)
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node).is_some_and(|el| el.has_class(class))
    }

    /// Add `class` unless already present. No-op on stale handles.
    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element_mut(node) {
            if !el.has_class(class) {
                el.classes.push(class.to_string());
            }
        }
    }

    /// Remove `class` if present. No-op on stale handles.
    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element_mut(node) {
            el.classes.retain(|c| c != class);
        }
    }

    /// `classList.toggle(class, force)`.
    pub fn toggle_class(&mut self, node: NodeId, class: &str, force: bool) {
        if force {
            self.add_class(node, class);
        } else {
            self.remove_class(node, class);
        }
    }

    pub fn classes(&self, node: NodeId) -> &[String] {
        match self.element(node) {
            Some(el) => el.classes(),
            None => &[],
        }
    }

    pub fn set_top(&mut self, node: NodeId, top: f64) {
        if let Some(el) = self.element_mut(node) {
            el.top = top;
        }
    }

    /// Top edge relative to the viewport, like `getBoundingClientRect().top`.
    pub fn client_top(&self, node: NodeId, scroll_top: f64) -> Option<f64> {
        self.element(node).map(|el| el.top - scroll_top)
    }

    /// The element's `href` resolved against the page URL.
    ///
    /// `None` without an `href`, or when the page location is not absolute.
    pub fn href(&self, node: NodeId) -> Option<Url> {
        resolve_href(self.location.as_ref()?, self.attr(node, "href")?)
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if !self.contains(id) {
                return false;
            }
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Descendants of `scope` in document order, excluding `scope` itself.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let Some(el) = self.element(scope) else {
            return out;
        };
        let mut stack: Vec<NodeId> = el.children.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if let Some(el) = self.element(node) {
                out.push(node);
                stack.extend(el.children.iter().rev().copied());
            }
        }
        out
    }

    pub fn matches(&self, node: NodeId, selectors: &SelectorList) -> bool {
        self.element(node)
            .is_some_and(|el| selectors.iter().any(|s| el.matches(s)))
    }

    /// `Element.closest()`: the nearest inclusive ancestor matching `selectors`.
    pub fn closest(&self, node: NodeId, selectors: &SelectorList) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            if self.matches(id, selectors) {
                return Some(id);
            }
            current = self.parent(id);
        }
        None
    }

    /// All descendants of `scope` matching `selectors`, in document order.
    pub fn query_all_in(&self, scope: NodeId, selectors: &SelectorList) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|node| self.matches(*node, selectors))
            .collect()
    }

    /// `document.querySelector()`: first match in document order, root included.
    pub fn query(&self, selectors: &SelectorList) -> Option<NodeId> {
        if self.matches(self.root, selectors) {
            return Some(self.root);
        }
        self.descendants(self.root)
            .into_iter()
            .find(|node| self.matches(*node, selectors))
    }

    /// `document.querySelectorAll()`, root included.
    pub fn query_all(&self, selectors: &SelectorList) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.matches(self.root, selectors) {
            out.push(self.root);
        }
        out.extend(self.query_all_in(self.root, selectors));
        out
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.query(&Selector {
            id: Some(id.to_string()),
            ..Selector::default()
        }
        .into())
    }

    /// The content's named anchor for `name`: `a.tsd-anchor[name=<name>]`.
    pub fn named_anchor(&self, name: &str) -> Option<NodeId> {
        let selector = Selector::tag("a")
            .with_class("tsd-anchor")
            .with_attr("name", Some(name));
        self.query(&selector.into())
    }

    /// The named anchor a resolved link fragment points at.
    ///
    /// Fragments arrive percent-encoded, so names that need encoding are
    /// compared in their encoded form.
    pub fn anchor_for_fragment(&self, fragment: &str) -> Option<NodeId> {
        if let Some(anchor) = self.named_anchor(fragment) {
            return Some(anchor);
        }
        let location = self.location.as_ref()?;
        let anchors = Selector::tag("a")
            .with_class("tsd-anchor")
            .with_attr("name", None);
        self.query_all(&anchors.into()).into_iter().find(|node| {
            self.attr(*node, "name")
                .and_then(|name| encode_fragment(location, name))
                .is_some_and(|encoded| encoded == fragment)
        })
    }

    /// Number of live elements, root included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.element.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
