//! Page store behavior shared by both strategies

use blueprint_editor::engine::memory::MemoryEngine;
use blueprint_editor::pages::page_store_for;
use blueprint_editor::persistence::render_pages;
use blueprint_editor::{CanvasEngine, ContainerId, PageStore};
use blueprint_markup::render_document;
use proptest::prelude::*;

fn setup(native_pages: bool) -> (MemoryEngine, Box<dyn PageStore>) {
    let mut engine = MemoryEngine::new(native_pages);
    engine
        .init(&ContainerId("canvas".to_string()))
        .expect("memory engine initializes");
    let store = page_store_for(&mut engine, None);
    (engine, store)
}

fn write(engine: &mut MemoryEngine, html: &str, css: &str) {
    engine.set_components(html).unwrap();
    engine.set_style(css).unwrap();
}

#[derive(Debug, Clone)]
enum Op {
    Add,
    Delete(usize),
    Select(usize),
    MoveUp(usize),
    MoveDown(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Add),
        (0usize..8).prop_map(Op::Delete),
        (0usize..8).prop_map(Op::Select),
        (0usize..8).prop_map(Op::MoveUp),
        (0usize..8).prop_map(Op::MoveDown),
    ]
}

fn apply(store: &mut dyn PageStore, engine: &mut MemoryEngine, op: &Op) {
    let ids = store.list(engine);
    let pick = |index: &usize| ids[index % ids.len()].clone();
    match op {
        Op::Add => {
            store.add(engine).unwrap();
        }
        Op::Delete(index) => store.delete(engine, &pick(index)).unwrap(),
        Op::Select(index) => store.select(engine, &pick(index)).unwrap(),
        Op::MoveUp(index) => store.move_up(engine, &pick(index)).unwrap(),
        Op::MoveDown(index) => store.move_down(engine, &pick(index)).unwrap(),
    }
}

proptest! {
    #[test]
    fn page_count_never_drops_to_zero(native in any::<bool>(), ops in prop::collection::vec(op(), 1..40)) {
        let (mut engine, mut store) = setup(native);

        for op in &ops {
            apply(store.as_mut(), &mut engine, op);

            let ids = store.list(&mut engine);
            prop_assert!(!ids.is_empty());
            let active = store.active(&mut engine);
            prop_assert!(active.map(|id| ids.contains(&id)).unwrap_or(false));

            let mut unique = ids.clone();
            unique.sort();
            unique.dedup();
            prop_assert_eq!(unique.len(), ids.len());
        }
    }
}

#[test]
fn test_switching_pages_does_not_mix_content() {
    for native in [true, false] {
        let (mut engine, mut store) = setup(native);
        write(&mut engine, "<p>a</p>", ".a{color:red}");
        let a = store.active(&mut engine).unwrap();
        let b = store.add(&mut engine).unwrap();
        write(&mut engine, "<p>b</p>", ".b{color:blue}");

        store.select(&mut engine, &a).unwrap();
        let (html_a, css_a) = (engine.html(), engine.css());
        store.select(&mut engine, &b).unwrap();
        assert!(engine.html().contains(">b</p>"));
        assert!(engine.css().ends_with(".b{color:blue}"));
        store.select(&mut engine, &a).unwrap();

        assert!(html_a.contains(">a</p>"));
        assert!(css_a.ends_with(".a{color:red}"));
        assert_eq!(engine.html(), html_a);
        assert_eq!(engine.css(), css_a);
    }
}

#[test]
fn test_render_preserves_page_order_and_active_page() {
    for native in [true, false] {
        let (mut engine, mut store) = setup(native);
        write(&mut engine, "<h1>one</h1>", "h1{margin:0}");
        store.add(&mut engine).unwrap();
        write(&mut engine, "<h1>two</h1>", "");
        store.add(&mut engine).unwrap();
        write(&mut engine, "<h1>three</h1>", "");
        store.select(&mut engine, "page-2").unwrap();

        let pages = render_pages(store.as_mut(), &mut engine).unwrap();

        let ids: Vec<_> = pages.iter().map(|p| p.page_id.as_str()).collect();
        assert_eq!(ids, vec!["page-1", "page-2", "page-3"]);
        for (page, text) in pages.iter().zip(["one", "two", "three"]) {
            assert!(page.html.contains(&format!(">{}</h1>", text)));
        }
        assert!(pages[0].html.starts_with("<html><head><style>h1{margin:0}</style>"));
        assert_eq!(store.active(&mut engine), Some("page-2".to_string()));
        assert!(engine.html().contains(">two</h1>"));
    }
}

#[test]
fn test_reordered_pages_render_in_new_order() {
    for native in [true, false] {
        let (mut engine, mut store) = setup(native);
        store.add(&mut engine).unwrap();
        write(&mut engine, "<p>second</p>", "");
        store.move_up(&mut engine, "page-2").unwrap();

        let pages = render_pages(store.as_mut(), &mut engine).unwrap();
        assert_eq!(pages[0].page_id, "page-2");
        assert_eq!(pages[1].html, render_document("", ""));
    }
}

#[test]
fn test_added_ids_skip_existing() {
    for native in [true, false] {
        let (mut engine, mut store) = setup(native);
        store.add(&mut engine).unwrap();
        store.add(&mut engine).unwrap();
        store.delete(&mut engine, "page-1").unwrap();

        // Two pages left (page-2, page-3): page-3 is taken, so page-4
        assert_eq!(store.add(&mut engine).unwrap(), "page-4");
        assert_eq!(
            store.list(&mut engine),
            vec!["page-2", "page-3", "page-4"]
        );
    }
}

#[test]
fn test_unknown_pages_are_errors() {
    for native in [true, false] {
        let (mut engine, mut store) = setup(native);
        assert!(store.select(&mut engine, "nope").is_err());
        assert!(store.delete(&mut engine, "nope").is_err());
        assert_eq!(store.list(&mut engine).len(), 1);
    }
}
