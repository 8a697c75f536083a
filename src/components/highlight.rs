//! Scroll position highlighting for the navigation menu.
//!
//! The highlighter keeps a list of the in-page anchors its navigation links
//! point at, sorted by their offset on the page, and marks the link of the
//! last anchor the viewport has scrolled past with [`FOCUS_CLASS`].

use tracing::{debug, trace};

use super::{Component, Context};
use crate::dom::{NodeId, Page, Selector, resolve_href, same_document};
use crate::viewport::{Subscription, Topic, ViewportEvent};

/// Class marking the navigation entry of the section currently in view.
pub const FOCUS_CLASS: &str = "focus";

/// Selector the highlighter is registered on.
pub const SELECTOR: &str = ".menu-highlight";

/// One in-page anchor paired with its navigation entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorEntry {
    /// The named anchor in the content (`a.tsd-anchor[name=...]`).
    pub target: Option<NodeId>,
    /// Parent element of the navigation link pointing at the anchor.
    pub link: Option<NodeId>,
    /// Offset of the anchor from the page top.
    pub offset: f64,
}

impl AnchorEntry {
    /// "Above every section": always first, offset 0, no elements.
    pub const SENTINEL: Self = Self {
        target: None,
        link: None,
        offset: 0.0,
    };

    pub const fn is_sentinel(&self) -> bool {
        self.target.is_none()
    }
}

/// Marks the navigation entry of the section currently scrolled into view.
#[derive(Debug)]
pub struct ScrollHighlighter {
    root: NodeId,
    entries: Vec<AnchorEntry>,
    active_index: usize,
    subscriptions: Vec<Subscription>,
}

impl ScrollHighlighter {
    /// Bind to the navigation container `root`.
    pub fn new(root: NodeId) -> Self {
        Self {
            root,
            entries: vec![AnchorEntry::SENTINEL],
            active_index: 0,
            subscriptions: Vec::new(),
        }
    }

    /// Anchors sorted by offset, sentinel first.
    pub fn entries(&self) -> &[AnchorEntry] {
        &self.entries
    }

    pub const fn active_index(&self) -> usize {
        self.active_index
    }

    /// The navigation element currently carrying [`FOCUS_CLASS`].
    pub fn active_link(&self) -> Option<NodeId> {
        self.entries.get(self.active_index).and_then(|e| e.link)
    }

    /// Rediscover every anchor linked from the navigation.
    ///
    /// Links must point at the current page (fragment ignored) and carry a
    /// fragment naming an existing `a.tsd-anchor`; anything else is skipped.
    /// Offsets are recomputed right away.
    pub fn rebuild_anchors(&mut self, page: &mut Page, scroll_top: f64, epsilon: f64) {
        self.clear_focus(page);
        self.active_index = 0;
        self.entries = vec![AnchorEntry::SENTINEL];

        let Some(base) = page.location().cloned() else {
            debug!(url = page.url(), "page url is not absolute, no anchors tracked");
            self.recompute_offsets(page, scroll_top, epsilon);
            return;
        };
        let links = page.query_all_in(self.root, &Selector::tag("a").into());
        for link in links {
            let Some(href) = page.attr(link, "href").and_then(|raw| resolve_href(&base, raw))
            else {
                continue;
            };
            let Some(name) = href.fragment().filter(|name| !name.is_empty()) else {
                continue;
            };
            if !same_document(&href, &base) {
                continue;
            }
            let Some(target) = page.anchor_for_fragment(name) else {
                trace!(anchor = name, "no named anchor for navigation link");
                continue;
            };
            let Some(parent) = page.parent(link) else {
                continue;
            };
            self.entries.push(AnchorEntry {
                target: Some(target),
                link: Some(parent),
                offset: 0.0,
            });
        }

        debug!(anchors = self.entries.len() - 1, "anchors rebuilt");
        self.recompute_offsets(page, scroll_top, epsilon);
    }

    /// Recompute every anchor's page offset, re-sort, and rescan.
    pub fn recompute_offsets(&mut self, page: &mut Page, scroll_top: f64, epsilon: f64) {
        let current = self.entries.get(self.active_index).copied();

        for entry in self.entries.iter_mut().skip(1) {
            // Anchors removed from the page keep their last known offset.
            if let Some(top) = entry.target.and_then(|t| page.client_top(t, scroll_top)) {
                entry.offset = (top + scroll_top).max(0.0);
            }
        }
        self.entries.sort_by(|a, b| a.offset.total_cmp(&b.offset));

        // Keep the index on the same entry so the focus class follows it.
        self.active_index = current
            .and_then(|cur| {
                self.entries
                    .iter()
                    .position(|e| e.target == cur.target && e.link == cur.link)
            })
            .unwrap_or(0);

        self.on_scroll(page, scroll_top, epsilon);
    }

    /// Move the highlight to the section at `scroll_top`.
    ///
    /// Walks from the current index, so small scroll steps cost O(1).
    pub fn on_scroll(&mut self, page: &mut Page, scroll_top: f64, epsilon: f64) {
        let position = scroll_top + epsilon;
        let last = self.entries.len() - 1;
        let mut index = self.active_index.min(last);

        while index > 0 && self.entries[index].offset > position {
            index -= 1;
        }
        while index < last && self.entries[index + 1].offset < position {
            index += 1;
        }

        if index == self.active_index {
            return;
        }
        self.clear_focus(page);
        self.active_index = index;
        if index > 0 {
            if let Some(link) = self.entries[index].link {
                page.add_class(link, FOCUS_CLASS);
            }
        }
        debug!(index, scroll_top, "highlight moved");
    }

    fn clear_focus(&self, page: &mut Page) {
        if self.active_index == 0 {
            return;
        }
        if let Some(link) = self.entries.get(self.active_index).and_then(|e| e.link) {
            page.remove_class(link, FOCUS_CLASS);
        }
    }
}

impl Component for ScrollHighlighter {
    fn name(&self) -> &'static str {
        "scroll-highlighter"
    }

    fn element(&self) -> NodeId {
        self.root
    }

    fn attach(&mut self, ctx: &mut Context<'_>) {
        self.subscriptions = vec![
            ctx.viewport.subscribe(Topic::Resize, ctx.id),
            ctx.viewport.subscribe(Topic::Scroll, ctx.id),
        ];
        self.rebuild_anchors(
            ctx.page,
            ctx.viewport.scroll_top(),
            ctx.timings.scroll_epsilon,
        );
    }

    fn on_viewport(&mut self, event: ViewportEvent, ctx: &mut Context<'_>) {
        let epsilon = ctx.timings.scroll_epsilon;
        match event {
            ViewportEvent::Resize { .. } => {
                self.rebuild_anchors(ctx.page, ctx.viewport.scroll_top(), epsilon);
            }
            ViewportEvent::Scroll { scroll_top } => {
                self.on_scroll(ctx.page, scroll_top, epsilon);
            }
        }
    }

    fn dispose(&mut self, ctx: &mut Context<'_>) {
        for sub in self.subscriptions.drain(..) {
            ctx.viewport.unsubscribe(sub);
        }
        self.clear_focus(ctx.page);
        self.active_index = 0;
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://docs.example.org/classes/Widget.html";
    const EPSILON: f64 = 5.0;

    struct Fixture {
        page: Page,
        nav: NodeId,
        items: Vec<NodeId>,
        anchors: Vec<NodeId>,
    }

    /// A page with one navigation item and one content anchor per offset.
    fn fixture(offsets: &[f64]) -> Fixture {
        let mut page = Page::new(URL);
        let nav = page.create_element("ul");
        page.add_class(nav, "menu-highlight");
        page.append_child(page.root(), nav);
        let content = page.create_element("div");
        page.append_child(page.root(), content);

        let mut items = Vec::new();
        let mut anchors = Vec::new();
        for (i, offset) in offsets.iter().enumerate() {
            let name = format!("section-{i}");
            let li = page.create_element("li");
            let link = page.create_element("a");
            page.set_attr(link, "href", format!("#{name}"));
            page.append_child(li, link);
            page.append_child(nav, li);

            let anchor = page.create_element("a");
            page.add_class(anchor, "tsd-anchor");
            page.set_attr(anchor, "name", name);
            page.set_top(anchor, *offset);
            page.append_child(content, anchor);

            items.push(li);
            anchors.push(anchor);
        }
        Fixture {
            page,
            nav,
            items,
            anchors,
        }
    }

    fn focused(fx: &Fixture) -> Vec<NodeId> {
        fx.items
            .iter()
            .copied()
            .filter(|li| fx.page.has_class(*li, FOCUS_CLASS))
            .collect()
    }

    #[test]
    fn test_rebuild_prepends_sentinel_and_sorts() {
        let mut fx = fixture(&[300.0, 0.0, 100.0]);
        let mut hl = ScrollHighlighter::new(fx.nav);
        hl.rebuild_anchors(&mut fx.page, 0.0, EPSILON);

        let offsets: Vec<f64> = hl.entries().iter().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![0.0, 0.0, 100.0, 300.0]);
        assert!(hl.entries()[0].is_sentinel());
        assert_eq!(hl.entries()[3].target, Some(fx.anchors[0]));
        assert_eq!(hl.entries()[3].link, Some(fx.items[0]));
    }

    #[test]
    fn test_scroll_scenario_moves_highlight() {
        // Entries after the sentinel at 0: anchors at 100 and 300.
        let mut fx = fixture(&[100.0, 300.0]);
        let mut hl = ScrollHighlighter::new(fx.nav);
        hl.rebuild_anchors(&mut fx.page, 0.0, EPSILON);
        assert_eq!(hl.active_index(), 0);

        hl.on_scroll(&mut fx.page, 150.0, EPSILON);
        assert_eq!(hl.entries()[hl.active_index()].offset, 100.0);
        assert_eq!(focused(&fx), vec![fx.items[0]]);

        hl.on_scroll(&mut fx.page, 50.0, EPSILON);
        assert_eq!(hl.active_index(), 0);
        assert!(focused(&fx).is_empty());

        hl.on_scroll(&mut fx.page, 310.0, EPSILON);
        assert_eq!(hl.entries()[hl.active_index()].offset, 300.0);
        assert_eq!(focused(&fx), vec![fx.items[1]]);
    }

    #[test]
    fn test_anchor_at_page_top_is_selected_immediately() {
        let mut fx = fixture(&[0.0, 200.0]);
        let mut hl = ScrollHighlighter::new(fx.nav);
        hl.rebuild_anchors(&mut fx.page, 0.0, EPSILON);
        assert_eq!(hl.active_index(), 1);
        assert_eq!(focused(&fx), vec![fx.items[0]]);

        hl.on_scroll(&mut fx.page, 50.0, EPSILON);
        assert_eq!(focused(&fx), vec![fx.items[0]]);
    }

    #[test]
    fn test_epsilon_selects_section_just_before_boundary() {
        let mut fx = fixture(&[100.0]);
        let mut hl = ScrollHighlighter::new(fx.nav);
        hl.rebuild_anchors(&mut fx.page, 0.0, EPSILON);

        hl.on_scroll(&mut fx.page, 94.0, EPSILON);
        assert_eq!(hl.active_index(), 0);
        hl.on_scroll(&mut fx.page, 96.0, EPSILON);
        assert_eq!(hl.active_index(), 1);
    }

    #[test]
    fn test_links_to_other_pages_are_ignored() {
        let mut fx = fixture(&[100.0]);
        let li = fx.page.create_element("li");
        let link = fx.page.create_element("a");
        fx.page.set_attr(link, "href", "Other.html#section-0");
        fx.page.append_child(li, link);
        fx.page.append_child(fx.nav, li);

        let mut hl = ScrollHighlighter::new(fx.nav);
        hl.rebuild_anchors(&mut fx.page, 0.0, EPSILON);
        assert_eq!(hl.entries().len(), 2);
    }

    #[test]
    fn test_missing_anchor_and_bare_links_are_skipped() {
        let mut fx = fixture(&[100.0]);
        for href in ["#does-not-exist", "#", "Widget.html"] {
            let li = fx.page.create_element("li");
            let link = fx.page.create_element("a");
            fx.page.set_attr(link, "href", href);
            fx.page.append_child(li, link);
            fx.page.append_child(fx.nav, li);
        }
        let mut hl = ScrollHighlighter::new(fx.nav);
        hl.rebuild_anchors(&mut fx.page, 0.0, EPSILON);
        assert_eq!(hl.entries().len(), 2);
    }

    #[test]
    fn test_absolute_link_with_uppercase_host_is_tracked() {
        let mut fx = fixture(&[100.0]);
        let li = fx.page.create_element("li");
        let link = fx.page.create_element("a");
        fx.page.set_attr(
            link,
            "href",
            "HTTPS://Docs.Example.ORG/classes/Widget.html#section-0",
        );
        fx.page.append_child(li, link);
        fx.page.append_child(fx.nav, li);

        let mut hl = ScrollHighlighter::new(fx.nav);
        hl.rebuild_anchors(&mut fx.page, 0.0, EPSILON);
        assert_eq!(hl.entries().len(), 3);
        assert_eq!(hl.entries()[2].link, Some(li));
    }

    #[test]
    fn test_percent_encoded_fragment_finds_anchor() {
        let mut fx = fixture(&[]);
        let li = fx.page.create_element("li");
        let link = fx.page.create_element("a");
        fx.page.set_attr(link, "href", "#two%20words");
        fx.page.append_child(li, link);
        fx.page.append_child(fx.nav, li);
        let anchor = fx.page.create_element("a");
        fx.page.add_class(anchor, "tsd-anchor");
        fx.page.set_attr(anchor, "name", "two words");
        fx.page.set_top(anchor, 80.0);
        let root = fx.page.root();
        fx.page.append_child(root, anchor);

        let mut hl = ScrollHighlighter::new(fx.nav);
        hl.rebuild_anchors(&mut fx.page, 0.0, EPSILON);
        assert_eq!(hl.entries().len(), 2);
        assert_eq!(hl.entries()[1].target, Some(anchor));
    }

    #[test]
    fn test_relative_page_url_tracks_nothing() {
        let mut fx = fixture(&[100.0, 200.0]);
        fx.page.set_url("classes/Widget.html");
        let mut hl = ScrollHighlighter::new(fx.nav);
        hl.rebuild_anchors(&mut fx.page, 0.0, EPSILON);
        assert_eq!(hl.entries().len(), 1);
        assert!(hl.entries()[0].is_sentinel());
    }

    #[test]
    fn test_page_url_fragment_is_ignored() {
        let mut fx = fixture(&[100.0]);
        fx.page.set_url(format!("{URL}#section-0"));
        let mut hl = ScrollHighlighter::new(fx.nav);
        hl.rebuild_anchors(&mut fx.page, 0.0, EPSILON);
        assert_eq!(hl.entries().len(), 2);
    }

    #[test]
    fn test_offsets_include_scroll_position() {
        let mut fx = fixture(&[800.0]);
        let mut hl = ScrollHighlighter::new(fx.nav);
        hl.rebuild_anchors(&mut fx.page, 600.0, EPSILON);
        assert_eq!(hl.entries()[1].offset, 800.0);
        assert_eq!(hl.active_index(), 0);
    }

    #[test]
    fn test_focus_follows_entry_across_resort() {
        let mut fx = fixture(&[100.0, 300.0]);
        let mut hl = ScrollHighlighter::new(fx.nav);
        hl.rebuild_anchors(&mut fx.page, 0.0, EPSILON);
        hl.on_scroll(&mut fx.page, 150.0, EPSILON);
        assert_eq!(focused(&fx), vec![fx.items[0]]);

        // Reflow swaps the two sections.
        fx.page.set_top(fx.anchors[0], 500.0);
        fx.page.set_top(fx.anchors[1], 120.0);
        hl.recompute_offsets(&mut fx.page, 150.0, EPSILON);

        assert_eq!(focused(&fx), vec![fx.items[1]]);
        assert_eq!(hl.active_link(), Some(fx.items[1]));
    }

    #[test]
    fn test_rebuild_clears_previous_focus() {
        let mut fx = fixture(&[100.0, 300.0]);
        let mut hl = ScrollHighlighter::new(fx.nav);
        hl.rebuild_anchors(&mut fx.page, 0.0, EPSILON);
        hl.on_scroll(&mut fx.page, 350.0, EPSILON);
        assert_eq!(focused(&fx), vec![fx.items[1]]);

        hl.rebuild_anchors(&mut fx.page, 150.0, EPSILON);
        assert_eq!(focused(&fx), vec![fx.items[0]]);
    }

    #[test]
    fn test_removed_anchor_keeps_last_offset() {
        let mut fx = fixture(&[100.0, 300.0]);
        let mut hl = ScrollHighlighter::new(fx.nav);
        hl.rebuild_anchors(&mut fx.page, 0.0, EPSILON);
        fx.page.remove(fx.anchors[1]);
        hl.recompute_offsets(&mut fx.page, 0.0, EPSILON);
        assert_eq!(hl.entries()[2].offset, 300.0);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn entries_stay_sorted_with_sentinel_first(
                offsets in prop::collection::vec(-200.0..5000.0f64, 0..20),
                scroll in 0.0..5000.0f64,
            ) {
                let mut fx = fixture(&offsets);
                let mut hl = ScrollHighlighter::new(fx.nav);
                hl.rebuild_anchors(&mut fx.page, scroll, EPSILON);

                let entries = hl.entries();
                prop_assert!(entries[0].is_sentinel());
                prop_assert_eq!(entries[0].offset, 0.0);
                for pair in entries.windows(2) {
                    prop_assert!(pair[0].offset <= pair[1].offset);
                }
            }

            #[test]
            fn scan_invariant_holds_from_any_start(
                offsets in prop::collection::vec(0.0..5000.0f64, 1..20),
                scrolls in prop::collection::vec(0.0..6000.0f64, 1..30),
            ) {
                let mut fx = fixture(&offsets);
                let mut hl = ScrollHighlighter::new(fx.nav);
                hl.rebuild_anchors(&mut fx.page, 0.0, EPSILON);

                for scroll in scrolls {
                    hl.on_scroll(&mut fx.page, scroll, EPSILON);
                    let i = hl.active_index();
                    let entries = hl.entries();
                    let position = scroll + EPSILON;
                    prop_assert!(entries[i].offset <= position);
                    prop_assert!(i == entries.len() - 1 || entries[i + 1].offset >= position);

                    let marked = fx.items.iter().filter(|li| fx.page.has_class(**li, FOCUS_CLASS)).count();
                    if i == 0 {
                        prop_assert_eq!(marked, 0);
                    } else {
                        prop_assert_eq!(marked, 1);
                        prop_assert!(entries[i].link.is_some_and(|l| fx.page.has_class(l, FOCUS_CLASS)));
                    }
                }
            }
        }
    }
}
