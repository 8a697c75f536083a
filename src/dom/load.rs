//! Loading pages from JSON descriptions.
//!
//! ```json
//! {
//!   "url": "https://docs.example.org/classes/Widget.html",
//!   "viewport": { "width": 1280, "height": 800, "scroll_top": 0 },
//!   "root": { "tag": "html", "children": [ ... ] }
//! }
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{NodeId, Page};

/// Errors produced when loading a page description.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid page description: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate element id `{0}`")]
    DuplicateId(String),
    #[error("element without a tag name")]
    EmptyTag,
}

/// Initial viewport state of a page description.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSpec {
    pub width: u32,
    pub height: u32,
    pub scroll_top: f64,
    /// Total page height; scrolling is unbounded when absent.
    pub content_height: Option<f64>,
}

impl Default for ViewportSpec {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
            scroll_top: 0.0,
            content_height: None,
        }
    }
}

/// One element of a page description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    /// Absolute offset of the element from the page top, in pixels.
    #[serde(default)]
    pub top: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
}

/// A complete page description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    pub url: String,
    #[serde(default)]
    pub viewport: ViewportSpec,
    /// Host user agent, used for mobile detection.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Whether the host exposes touch events.
    #[serde(default)]
    pub touch: bool,
    pub root: NodeSpec,
}

impl PageSpec {
    /// Parse a JSON page description.
    ///
    /// # Errors
    /// Returns [`LoadError::Json`] when the input is not a valid description.
    pub fn parse(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the element tree.
    ///
    /// # Errors
    /// Returns an error on duplicate ids or empty tag names.
    pub fn build(&self) -> Result<Page, LoadError> {
        if self.root.tag.trim().is_empty() {
            return Err(LoadError::EmptyTag);
        }
        let mut page = Page::with_root_tag(self.url.clone(), &self.root.tag);
        let mut seen = HashSet::new();
        let root = page.root();
        apply_node(&mut page, root, &self.root, &mut seen)?;
        Ok(page)
    }
}

fn apply_node(
    page: &mut Page,
    node: NodeId,
    spec: &NodeSpec,
    seen: &mut HashSet<String>,
) -> Result<(), LoadError> {
    for (name, value) in &spec.attrs {
        page.set_attr(node, name, value.clone());
    }
    if let Some(id) = &spec.id {
        if !seen.insert(id.clone()) {
            return Err(LoadError::DuplicateId(id.clone()));
        }
        page.set_attr(node, "id", id.clone());
    }
    if let Some(id) = spec.attrs.get("id") {
        if spec.id.is_none() && !seen.insert(id.clone()) {
            return Err(LoadError::DuplicateId(id.clone()));
        }
    }
    for class in &spec.classes {
        page.add_class(node, class);
    }
    if let Some(class_attr) = spec.attrs.get("class") {
        for class in class_attr.split_whitespace() {
            page.add_class(node, class);
        }
    }
    page.set_top(node, spec.top);

    for child_spec in &spec.children {
        if child_spec.tag.trim().is_empty() {
            return Err(LoadError::EmptyTag);
        }
        let child = page.create_element(&child_spec.tag);
        page.append_child(node, child);
        apply_node(page, child, child_spec, seen)?;
    }
    Ok(())
}
