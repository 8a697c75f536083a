//! Benchmarks for locating the section under the scroll position.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use docnav::components::ScrollHighlighter;
use docnav::dom::{NodeId, Page};

const SECTIONS: usize = 500;
const SECTION_HEIGHT: f64 = 240.0;

fn create_page() -> (Page, NodeId) {
    let mut page = Page::new("https://docs.example.org/classes/Widget.html");
    let root = page.root();
    let nav = page.create_element("ul");
    page.add_class(nav, "menu-highlight");
    page.append_child(root, nav);
    for i in 0..SECTIONS {
        let anchor = page.create_element("a");
        page.add_class(anchor, "tsd-anchor");
        page.set_attr(anchor, "name", format!("member-{i}"));
        page.set_top(anchor, i as f64 * SECTION_HEIGHT);
        page.append_child(root, anchor);

        let item = page.create_element("li");
        let link = page.create_element("a");
        page.set_attr(link, "href", format!("#member-{i}"));
        page.append_child(item, link);
        page.append_child(nav, item);
    }
    (page, nav)
}

fn bench_small_scroll_steps(c: &mut Criterion) {
    let (mut page, nav) = create_page();
    let mut highlighter = ScrollHighlighter::new(nav);
    highlighter.rebuild_anchors(&mut page, 0.0, 5.0);
    let end = SECTIONS as f64 * SECTION_HEIGHT;
    c.bench_function("scroll_small_steps", |b| {
        b.iter(|| {
            let mut top = 0.0;
            while top < end {
                highlighter.on_scroll(&mut page, black_box(top), 5.0);
                top += 40.0;
            }
        });
    });
}

fn bench_jump_scroll(c: &mut Criterion) {
    let (mut page, nav) = create_page();
    let mut highlighter = ScrollHighlighter::new(nav);
    highlighter.rebuild_anchors(&mut page, 0.0, 5.0);
    let end = SECTIONS as f64 * SECTION_HEIGHT;
    c.bench_function("scroll_jump_end_to_end", |b| {
        b.iter(|| {
            highlighter.on_scroll(&mut page, black_box(end), 5.0);
            highlighter.on_scroll(&mut page, black_box(0.0), 5.0);
        });
    });
}

fn bench_rebuild(c: &mut Criterion) {
    let (mut page, nav) = create_page();
    let mut highlighter = ScrollHighlighter::new(nav);
    c.bench_function("rebuild_anchors", |b| {
        b.iter(|| highlighter.rebuild_anchors(&mut page, black_box(1200.0), 5.0));
    });
}

criterion_group!(benches, bench_small_scroll_steps, bench_jump_scroll, bench_rebuild);
criterion_main!(benches);
