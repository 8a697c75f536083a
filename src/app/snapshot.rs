use serde::Serialize;

use crate::app::App;
use crate::components::highlight::FOCUS_CLASS;
use crate::components::toggle::ACTIVE_CLASS;
use crate::dom::{NodeId, Page};

/// Observable class state of a page at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub now_ms: u64,
    pub scroll_top: f64,
    /// Classes on the document root, in insertion order.
    pub root_classes: Vec<String>,
    /// Elements carrying the navigation `focus` class.
    pub focused: Vec<String>,
    /// Elements carrying the toggle `active` class.
    pub active: Vec<String>,
    pub pending_timers: usize,
}

impl Snapshot {
    pub(super) fn capture(app: &App) -> Self {
        let page = app.page();
        let root = page.root();
        let with_class = |class: &str| {
            page.descendants(root)
                .into_iter()
                .filter(|node| page.has_class(*node, class))
                .map(|node| element_label(page, node))
                .collect::<Vec<_>>()
        };
        Self {
            now_ms: app.scheduler().now_ms(),
            scroll_top: app.viewport().scroll_top(),
            root_classes: page.classes(root).to_vec(),
            focused: with_class(FOCUS_CLASS),
            active: with_class(ACTIVE_CLASS),
            pending_timers: app.scheduler().pending(),
        }
    }

    pub fn has_root_class(&self, class: &str) -> bool {
        self.root_classes.iter().any(|c| c == class)
    }
}

impl std::fmt::Display for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "t={}ms scroll={} root=[{}] focus=[{}] active=[{}]",
            self.now_ms,
            self.scroll_top,
            self.root_classes.join(" "),
            self.focused.join(", "),
            self.active.join(", "),
        )?;
        if self.pending_timers > 0 {
            write!(f, " timers={}", self.pending_timers)?;
        }
        Ok(())
    }
}

/// Short human readable name: `#id` when present, else `tag.class.class`.
pub fn element_label(page: &Page, node: NodeId) -> String {
    let Some(element) = page.element(node) else {
        return "<removed>".to_string();
    };
    if let Some(id) = element.attr("id") {
        return format!("#{id}");
    }
    let mut label = element.tag().to_string();
    for class in element.classes() {
        label.push('.');
        label.push_str(class);
    }
    label
}
