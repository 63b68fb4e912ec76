//! End-to-end scenarios for winch-core
//!
//! Registry, viewport and throttle working together through a context.

use std::cell::Cell;
use std::rc::Rc;

use winch_core::*;

fn load_counter() -> (Rc<Cell<usize>>, LoadCallback) {
    let count = Rc::new(Cell::new(0));
    let handle = count.clone();
    (count, Rc::new(move || handle.set(handle.get() + 1)))
}

// ============================================================================
// REGISTRY SCENARIOS
// ============================================================================

#[test]
fn test_register_then_fire() {
    let registry = VisibilityRegistry::new();
    let (load1, on_load) = load_counter();

    assert!(registry.register("a.png", on_load, Rc::new(|| false)));
    assert_eq!(registry.fire("a.png"), 1);

    assert_eq!(load1.get(), 1);
    assert_eq!(registry.is_loaded("a.png"), Some(true));
    assert_eq!(registry.pending_count("a.png"), 0);
}

#[test]
fn test_shared_key_fires_every_registrant_once() {
    let registry = VisibilityRegistry::new();
    let (load1, first) = load_counter();
    let (load2, second) = load_counter();
    let second_checked = Rc::new(Cell::new(false));

    registry.register("b.png", first, Rc::new(|| true));
    let checked = second_checked.clone();
    registry.register("b.png", second, Rc::new(move || {
        checked.set(true);
        true
    }));

    assert_eq!(registry.validate_and_fire(Some("b.png")), 1);
    assert_eq!(load1.get(), 1);
    assert_eq!(load2.get(), 1);
    // The first passing validator empties the list
    assert!(!second_checked.get());
}

#[test]
fn test_n_registrations_one_fire() {
    let registry = VisibilityRegistry::new();
    let (count, on_load) = load_counter();

    for _ in 0..5 {
        assert!(registry.register("c.png", on_load.clone(), Rc::new(|| false)));
    }
    assert_eq!(registry.pending_count("c.png"), 5);

    registry.fire("c.png");
    registry.fire("c.png");
    assert_eq!(count.get(), 5);
}

#[test]
fn test_failing_validator_does_not_fire() {
    let registry = VisibilityRegistry::new();
    let (count, on_load) = load_counter();

    registry.register("d.png", on_load, Rc::new(|| false));
    assert_eq!(registry.validate_and_fire(Some("d.png")), 0);
    assert_eq!(registry.validate_and_fire(None), 0);
    assert_eq!(count.get(), 0);
    assert_eq!(registry.is_loaded("d.png"), Some(false));
}

// ============================================================================
// VIEWPORT + CLASSIFIER
// ============================================================================

#[test]
fn test_master_box_after_window_view() {
    let ctx = WinchContext::default();
    ctx.viewport().set_window_view(123.0, 456.0);

    let frame = ctx.viewport().master_box();
    assert_eq!(frame.top, 0.0);
    assert_eq!(frame.left, 0.0);
    assert_eq!(frame.bottom, 123.0);
    assert_eq!(frame.right, 456.0);
    assert_eq!(frame.v_offset, 100.0);
    assert_eq!(frame.h_offset, 100.0);
}

#[test]
fn test_validator_tracks_live_geometry() {
    let ctx = WinchContext::default();
    ctx.viewport().set_window_view(600.0, 800.0);

    let position = Rc::new(Cell::new(ElementBox::from_xywh(0.0, 2000.0, 100.0, 100.0)));
    let (count, on_load) = load_counter();

    let viewport = ctx.viewport().clone();
    let element = position.clone();
    ctx.registry().register(
        "far.png",
        on_load,
        Rc::new(move || is_visible(&element.get(), &viewport.master_box())),
    );

    ctx.trigger_validation();
    ctx.event_loop().tick(100);
    assert_eq!(count.get(), 0);

    // Scrolled into the overscan band
    position.set(ElementBox::from_xywh(0.0, 650.0, 100.0, 100.0));
    ctx.trigger_validation();
    ctx.event_loop().tick(100);
    assert_eq!(count.get(), 1);
}

// ============================================================================
// THROTTLE
// ============================================================================

#[test]
fn test_burst_of_triggers_runs_one_sweep() {
    let ctx = WinchContext::default();
    let sweeps = Rc::new(Cell::new(0));

    let counter = sweeps.clone();
    ctx.registry().register("e.png", Rc::new(|| {}), Rc::new(move || {
        counter.set(counter.get() + 1);
        false
    }));

    let first = ctx.trigger_validation();
    for _ in 0..20 {
        ctx.event_loop().tick(4);
        assert!(ctx.trigger_validation().ptr_eq(&first));
    }
    ctx.event_loop().tick(20);

    assert_eq!(sweeps.get(), 1);
    assert_eq!(smol::block_on(first), Ok(()));
}

#[test]
fn test_undefined_operation_never_runs() {
    let event_loop = EventLoop::new();
    let throttle = Throttle::new(event_loop.clone(), DEFAULT_DELAY_MS);

    let rejected = throttle.throttle("nothing-here", 100);
    assert_eq!(smol::block_on(rejected), Err(WinchError::NotAFunction));
    assert_eq!(event_loop.pending_count(), 0);
}
