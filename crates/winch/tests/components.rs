//! Placeholder lifecycle and mount tests

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use winch::*;

fn page() -> (WinchContext, Document) {
    let ctx = WinchContext::new(Config::default());
    let doc = Document::new("https://example.com/");
    ctx.viewport().set_window_view(doc.inner_height(), doc.inner_width());
    (ctx, doc)
}

fn placeholder(doc: &Document, src: Option<&str>, top: f64) -> NodeId {
    let node = doc.create_element("winch-img");
    if let Some(src) = src {
        doc.set_attribute(node, "src", src);
    }
    doc.set_bounding_rect(node, DOMRect::from_xywh(0.0, top, 300.0, 200.0));
    doc.append_child(doc.body(), node);
    node
}

// ============================================================================
// REGISTRATION RETRY
// ============================================================================

#[test]
fn test_five_refusals_then_force_load() {
    let (ctx, doc) = page();
    let node = placeholder(&doc, None, 5000.0);

    let image = LazyImage::create(&ctx, &doc, node, LazyImageOptions::default());
    assert_eq!(image.attempts(), 1);

    for attempt in 2..=5 {
        assert!(!image.is_loaded());
        ctx.event_loop().tick(1000);
        assert_eq!(image.attempts(), attempt);
    }
    assert!(image.is_loaded());
    assert!(doc.has_class(node, LOADED_CLASS));

    // No sixth attempt
    ctx.event_loop().tick(5000);
    assert_eq!(image.attempts(), 5);
    assert!(ctx.registry().is_empty());
}

#[test]
fn test_dropped_handle_still_force_loads() {
    let (ctx, doc) = page();
    let node = placeholder(&doc, None, 5000.0);

    drop(LazyImage::create(&ctx, &doc, node, LazyImageOptions::default()));
    ctx.event_loop().tick(4000);
    assert!(doc.has_class(node, LOADED_CLASS));
    assert!(!doc.has_class(node, NOT_LOADED_CLASS));

    ctx.event_loop().tick(100);
    assert_eq!(ctx.event_loop().pending_count(), 0);
}

#[test]
fn test_late_url_registers_without_leftover_timers() {
    let (ctx, doc) = page();
    let node = placeholder(&doc, None, 5000.0);
    let url = Rc::new(RefCell::new(None::<String>));

    let source = url.clone();
    let image = LazyImage::create(&ctx, &doc, node, LazyImageOptions {
        source: Some(Rc::new(move || source.borrow().clone())),
        ..Default::default()
    });
    assert_eq!(ctx.event_loop().pending_count(), 1);

    *url.borrow_mut() = Some("late.png".to_string());
    ctx.event_loop().tick(1000);

    assert_eq!(image.attempts(), 2);
    assert!(!image.is_loaded());
    assert_eq!(ctx.registry().pending_count("https://example.com/late.png"), 1);
    assert_eq!(ctx.event_loop().pending_count(), 0);
}

// ============================================================================
// LOADING
// ============================================================================

#[test]
fn test_sweep_loads_only_visible() {
    let (ctx, doc) = page();
    let near = LazyImage::create(&ctx, &doc, placeholder(&doc, Some("near.png"), 100.0), LazyImageOptions::default());
    let far = LazyImage::create(&ctx, &doc, placeholder(&doc, Some("far.png"), 4000.0), LazyImageOptions::default());

    ctx.trigger_validation();
    ctx.event_loop().tick(100);

    assert!(near.is_loaded());
    assert!(!far.is_loaded());
    assert_eq!(ctx.registry().is_loaded("https://example.com/near.png"), Some(true));
    assert_eq!(ctx.registry().is_loaded("https://example.com/far.png"), Some(false));
}

#[test]
fn test_dropped_handle_loads_when_swept() {
    let (ctx, doc) = page();
    let node = placeholder(&doc, Some("a.png"), 0.0);

    drop(LazyImage::create(&ctx, &doc, node, LazyImageOptions::default()));
    assert_eq!(ctx.registry().pending_count("https://example.com/a.png"), 1);

    ctx.trigger_validation();
    ctx.event_loop().tick(100);
    assert!(doc.has_class(node, LOADED_CLASS));
    assert_eq!(ctx.registry().pending_count("https://example.com/a.png"), 0);
    assert_eq!(ctx.registry().is_loaded("https://example.com/a.png"), Some(true));
}

#[test]
fn test_hook_errors_are_swallowed() {
    let (ctx, doc) = page();
    let calls = Rc::new(Cell::new(0));

    let counter = calls.clone();
    let image = LazyImage::create(&ctx, &doc, placeholder(&doc, Some("a.png"), 0.0), LazyImageOptions {
        on_loaded: Some(Rc::new(move || -> anyhow::Result<()> {
            counter.set(counter.get() + 1);
            anyhow::bail!("hook exploded")
        })),
        ..Default::default()
    });

    assert!(image.load_self());
    assert!(!image.load_self());
    assert!(image.is_loaded());
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_teardown_after_load() {
    let (ctx, doc) = page();
    let image = LazyImage::create(&ctx, &doc, placeholder(&doc, Some("a.png"), 0.0), LazyImageOptions::default());
    assert_eq!(ctx.bus().subscriber_count(), 1);

    image.load_self();
    ctx.event_loop().tick(99);
    assert!(!image.is_disposed());

    ctx.event_loop().tick(1);
    assert!(image.is_disposed());
    assert_eq!(ctx.bus().subscriber_count(), 0);
    assert_eq!(ctx.event_loop().pending_count(), 0);
}

#[test]
fn test_broadcast_fires_shared_url() {
    let (ctx, doc) = page();
    let visible = LazyImage::create(&ctx, &doc, placeholder(&doc, Some("same.png"), 0.0), LazyImageOptions::default());
    let hidden = LazyImage::create(&ctx, &doc, placeholder(&doc, Some("same.png"), 9000.0), LazyImageOptions::default());

    assert_eq!(ctx.bus().publish(), 2);
    assert!(visible.is_loaded());
    assert!(hidden.is_loaded());
}

#[test]
fn test_loaded_key_loads_new_placeholder_immediately() {
    let (ctx, doc) = page();
    ctx.registry().register("https://example.com/b.png", Rc::new(|| {}), Rc::new(|| true));
    ctx.registry().fire("https://example.com/b.png");

    let image = LazyImage::create(&ctx, &doc, placeholder(&doc, Some("b.png"), 9000.0), LazyImageOptions::default());
    assert!(image.is_loaded());
}

#[test]
fn test_disposed_placeholder_ignores_sweeps() {
    let (ctx, doc) = page();
    let image = LazyImage::create(&ctx, &doc, placeholder(&doc, Some("a.png"), 0.0), LazyImageOptions::default());

    image.dispose();
    ctx.trigger_validation();
    ctx.event_loop().flush();
    assert!(!image.is_loaded());
}

// ============================================================================
// MOUNT
// ============================================================================

#[test]
fn test_mount_builds_marked_components() {
    let (ctx, doc) = page();

    let master = doc.create_element("div");
    doc.set_attribute(master, "data-winch-master", "");
    doc.append_child(doc.body(), master);

    let scroller = doc.create_element("section");
    doc.set_attribute(scroller, "winch-scroll-trigger", ".inner");
    doc.append_child(doc.body(), scroller);

    let tagged = placeholder(&doc, Some("one.png"), 0.0);
    doc.set_attribute(tagged, "winch-img-class", "fade");
    doc.set_attribute(tagged, "img-loaded", "count");

    let attr = doc.create_element("div");
    doc.set_attribute(attr, "data-winch-img", "");
    doc.set_attribute(attr, "data-src", "two.png");
    doc.set_bounding_rect(attr, DOMRect::from_xywh(0.0, 5000.0, 300.0, 200.0));
    doc.append_child(scroller, attr);

    let loads = Rc::new(Cell::new(0));
    let counter = loads.clone();
    let hook: LoadedHook = Rc::new(move || -> anyhow::Result<()> {
        counter.set(counter.get() + 1);
        Ok(())
    });
    let hooks = HashMap::from([("count".to_string(), hook)]);

    let mount = Mount::scan(&ctx, &doc, &hooks);
    assert_eq!(mount.masters().len(), 1);
    assert_eq!(mount.triggers().len(), 1);
    // Document order: the attribute form sits inside the scroller
    let nodes: Vec<NodeId> = mount.images().iter().map(|image| image.node()).collect();
    assert_eq!(nodes, vec![attr, tagged]);

    // Initial validation from the global coordinator
    ctx.event_loop().tick(200);
    assert!(!mount.images()[0].is_loaded());
    assert!(mount.images()[1].is_loaded());
    assert_eq!(loads.get(), 1);

    let img = doc.children(tagged)[0];
    assert!(doc.has_class(img, "fade"));
    assert!(doc.has_class(img, IMAGE_CLASS));

    mount.dispose();
    assert_eq!(ctx.event_loop().pending_count(), 0);
}
