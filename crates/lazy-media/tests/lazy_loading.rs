//! End-to-end behavior of `<lazy-image-loader>` on a page
//!
//! The page viewport is 1024x768 and images settle 100ms after their
//! source is assigned. Elements are laid out at y=3000, so they enter the
//! 200px lookahead once the page scrolls past 2032.

use lazy_dom::{DOMRect, NodeId, Shadowable};
use lazy_media::{
    DetachPolicy, LazyMedia, LazyMediaEvent, LazyMediaOptions, LoadState, DEFAULT_INDICATOR_COLOR,
    IMAGE_TRANSITION, TAG_NAME,
};
use lazy_runtime::{Page, RuntimeConfig};
use std::time::Duration;

const ON_SCREEN: f64 = 2100.0;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn page_with(options: LazyMediaOptions) -> Page {
    let config = RuntimeConfig { image_latency_ms: 100, ..Default::default() };
    let mut page = Page::new(config).unwrap();
    LazyMedia::define(&mut page, options).unwrap();
    page
}

fn page() -> Page {
    page_with(LazyMediaOptions::default())
}

fn mount(page: &mut Page, attributes: &[(&str, &str)]) -> NodeId {
    let id = page.create_element(TAG_NAME, attributes).unwrap();
    page.set_layout(id, DOMRect::from_xywh(0.0, 3000.0, 400.0, 300.0)).unwrap();
    let body = page.body();
    page.append_child(body, id).unwrap();
    id
}

fn media(page: &Page, id: NodeId) -> &LazyMedia {
    page.element::<LazyMedia>(id).unwrap()
}

fn events(page: &mut Page, id: NodeId) -> Vec<LazyMediaEvent> {
    page.element_mut::<LazyMedia>(id).unwrap().take_events()
}

#[test]
fn test_never_visible_never_loads() {
    let mut page = page();
    let id = mount(&mut page, &[("data-src", "a.png")]);

    page.advance(Duration::from_secs(30));
    page.scroll_to(1000.0);
    page.advance(Duration::from_secs(30));

    let el = media(&page, id);
    let snap = el.snapshot();
    assert_eq!(el.load_state(), LoadState::Idle);
    assert_eq!(snap.image_src, "");
    assert!(snap.indicator_visible());
    assert!(el.observer_handle().is_observing(id));
    assert_eq!(page.pending_tasks(), 0);
    assert!(events(&mut page, id).is_empty());
}

#[test]
fn test_initial_render() {
    let mut page = page();
    let id = mount(&mut page, &[("data-src", "a.png")]);
    let el = media(&page, id);
    let snap = el.snapshot();

    assert_eq!(snap.image_opacity, "0");
    assert_eq!(snap.image_transition, IMAGE_TRANSITION);
    assert_eq!(snap.indicator_color, DEFAULT_INDICATOR_COLOR);
    assert_eq!(snap.indicator_display, "block");
    // Closed shadow root
    assert!(el.shadow_root().is_none());
}

#[test]
fn test_indicator_color_override() {
    let mut page = page();
    let id = mount(&mut page, &[("data-src", "a.png"), ("indicator-color", "crimson")]);
    assert_eq!(media(&page, id).snapshot().indicator_color, "crimson");
}

#[test]
fn test_single_load_per_visibility() {
    let mut page = page();
    let id = mount(&mut page, &[("data-src", "a.png")]);

    page.scroll_to(ON_SCREEN);
    assert_eq!(media(&page, id).load_state(), LoadState::Pending);
    assert!(!media(&page, id).observer_handle().is_observing(id));

    page.advance(ms(200));
    assert_eq!(media(&page, id).load_state(), LoadState::Loaded);

    // Scrolling out and back in does nothing further
    page.scroll_to(0.0);
    page.scroll_to(ON_SCREEN);
    page.advance(ms(500));

    assert_eq!(
        events(&mut page, id),
        vec![
            LazyMediaEvent::LoadStarted { delay: Duration::ZERO },
            LazyMediaEvent::SourceAssigned { src: "a.png".into() },
            LazyMediaEvent::Loaded { src: "a.png".into() },
        ]
    );
    assert_eq!(page.pending_tasks(), 0);
}

#[test]
fn test_network_profile_delays() {
    for (speed, delay) in [("slow3g", 2000), ("2g", 5000)] {
        let mut page = page();
        let id = mount(&mut page, &[("data-src", "a.png"), ("data-network-speed", speed)]);
        page.scroll_to(ON_SCREEN);

        page.advance(ms(delay - 1));
        assert_eq!(media(&page, id).snapshot().image_src, "", "{} assigned early", speed);

        page.advance(ms(1));
        assert_eq!(media(&page, id).snapshot().image_src, "a.png", "{} not assigned at {}ms", speed, delay);
    }
}

#[test]
fn test_unknown_profile_means_no_delay() {
    for speed in ["4g", "", "SLOW3G"] {
        let mut page = page();
        let id = mount(&mut page, &[("data-src", "a.png"), ("data-network-speed", speed)]);
        page.scroll_to(ON_SCREEN);
        page.advance(Duration::ZERO);
        assert_eq!(media(&page, id).snapshot().image_src, "a.png", "profile {:?}", speed);
    }
}

#[test]
fn test_blur_up_on_2g() {
    let mut page = page();
    let id = mount(&mut page, &[("data-src", "a.png"), ("data-network-speed", "2g"), ("apply-blur", "")]);
    assert_eq!(page.style(id, "filter"), None);

    page.scroll_to(ON_SCREEN);
    assert_eq!(page.style(id, "filter").as_deref(), Some("blur(10px)"));
    assert_eq!(media(&page, id).snapshot().image_src, "");

    page.advance(ms(4999));
    assert_eq!(media(&page, id).snapshot().image_src, "");

    page.advance(ms(1));
    let snap = media(&page, id).snapshot();
    assert_eq!(snap.image_src, "a.png");
    assert_eq!(snap.image_opacity, "0");
    assert_eq!(page.style(id, "filter").as_deref(), Some("blur(10px)"));

    page.advance(ms(99));
    assert_eq!(media(&page, id).snapshot().image_opacity, "0");

    page.advance(ms(1));
    let snap = media(&page, id).snapshot();
    assert_eq!(snap.image_opacity, "1");
    assert!(!snap.indicator_visible());
    assert_eq!(page.style(id, "filter").as_deref(), Some("blur(0)"));
    assert_eq!(media(&page, id).load_state(), LoadState::Loaded);
}

#[test]
fn test_no_blur_without_attribute() {
    let mut page = page();
    let id = mount(&mut page, &[("data-src", "a.png"), ("data-network-speed", "slow3g")]);
    page.scroll_to(ON_SCREEN);
    assert_eq!(page.style(id, "filter"), None);

    page.advance(ms(2100));
    assert_eq!(media(&page, id).load_state(), LoadState::Loaded);
    // Filter is released on load either way
    assert_eq!(page.style(id, "filter").as_deref(), Some("blur(0)"));
}

#[test]
fn test_source_attributes_read_when_load_starts() {
    let mut page = page();
    let id = mount(&mut page, &[("data-src", "a.png"), ("data-network-speed", "normal")]);
    page.set_attribute(id, "data-src", "b.png").unwrap();
    page.set_attribute(id, "data-network-speed", "slow3g").unwrap();

    page.scroll_to(ON_SCREEN);
    page.advance(ms(1999));
    assert_eq!(media(&page, id).snapshot().image_src, "");

    page.advance(ms(1));
    assert_eq!(media(&page, id).snapshot().image_src, "b.png");
}

#[test]
fn test_removed_network_speed_means_no_delay() {
    let mut page = page();
    let id = mount(&mut page, &[("data-src", "a.png"), ("data-network-speed", "2g")]);
    page.remove_attribute(id, "data-network-speed").unwrap();

    page.scroll_to(ON_SCREEN);
    assert_eq!(events(&mut page, id), vec![LazyMediaEvent::LoadStarted { delay: Duration::ZERO }]);

    page.advance(Duration::ZERO);
    assert_eq!(media(&page, id).snapshot().image_src, "a.png");
}

#[test]
fn test_removed_source_fails_load() {
    let mut page = page();
    let id = mount(&mut page, &[("data-src", "a.png")]);
    page.remove_attribute(id, "data-src").unwrap();

    page.scroll_to(ON_SCREEN);
    page.advance(ms(500));

    let el = media(&page, id);
    assert_eq!(el.load_state(), LoadState::Pending);
    assert_eq!(el.snapshot().image_src, "");
    assert!(el.snapshot().indicator_visible());
    let failed = events(&mut page, id).into_iter().find_map(|e| match e {
        LazyMediaEvent::LoadFailed { src, reason } => Some((src, reason)),
        _ => None,
    });
    assert_eq!(failed, Some((String::new(), "Empty image source".to_string())));
}

#[test]
fn test_reset_from_every_state() {
    // (scroll into view?, time advanced afterwards)
    for (visible, elapsed) in [(false, 0), (true, 1000), (true, 5050), (true, 6000)] {
        let mut page = page();
        let id = mount(&mut page, &[("data-src", "a.png"), ("data-network-speed", "2g")]);
        if visible {
            page.scroll_to(ON_SCREEN);
        }
        page.advance(ms(elapsed));

        page.element_mut::<LazyMedia>(id).unwrap().reset();

        let el = media(&page, id);
        let snap = el.snapshot();
        assert_eq!(el.load_state(), LoadState::Idle);
        assert_eq!(snap.image_src, "");
        assert_eq!(snap.image_opacity, "0");
        assert_eq!(snap.image_display.as_deref(), Some("block"));
        assert!(snap.indicator_visible());
    }
}

#[test]
fn test_reset_ignores_abandoned_load() {
    let mut page = page();
    let id = mount(&mut page, &[("data-src", "a.png"), ("data-network-speed", "2g")]);
    page.scroll_to(ON_SCREEN);
    page.advance(ms(1000));

    page.element_mut::<LazyMedia>(id).unwrap().reset();
    page.advance(Duration::from_secs(10));

    let el = media(&page, id);
    assert_eq!(el.load_state(), LoadState::Idle);
    assert_eq!(el.snapshot().image_src, "");
}

#[test]
fn test_reset_does_not_restart_observation() {
    let mut page = page();
    let id = mount(&mut page, &[("data-src", "a.png")]);
    page.scroll_to(ON_SCREEN);
    page.advance(ms(200));

    page.element_mut::<LazyMedia>(id).unwrap().reset();
    page.scroll_to(0.0);
    page.scroll_to(ON_SCREEN);
    page.advance(ms(200));
    assert_eq!(media(&page, id).load_state(), LoadState::Idle);
    assert!(!media(&page, id).observer_handle().is_observing(id));

    // A fresh detach/attach cycle observes again
    page.remove(id).unwrap();
    let body = page.body();
    page.append_child(body, id).unwrap();
    page.advance(ms(200));
    assert_eq!(media(&page, id).load_state(), LoadState::Loaded);
}

#[test]
fn test_border_radius_is_live() {
    let mut page = page();
    let id = mount(&mut page, &[("data-src", "a.png"), ("border-radius", "4px")]);
    assert_eq!(media(&page, id).snapshot().image_border_radius.as_deref(), Some("4px"));

    page.set_attribute(id, "border-radius", "50%").unwrap();
    let el = media(&page, id);
    assert_eq!(el.snapshot().image_border_radius.as_deref(), Some("50%"));
    assert_eq!(el.load_state(), LoadState::Idle);
    assert_eq!(page.pending_tasks(), 0);
    assert!(events(&mut page, id).is_empty());

    page.remove_attribute(id, "border-radius").unwrap();
    assert_eq!(media(&page, id).snapshot().image_border_radius, None);
}

#[test]
fn test_border_radius_after_load_keeps_state() {
    let mut page = page();
    let id = mount(&mut page, &[("data-src", "a.png")]);
    page.scroll_to(ON_SCREEN);
    page.advance(ms(200));

    page.set_attribute(id, "border-radius", "12px").unwrap();
    let el = media(&page, id);
    assert_eq!(el.load_state(), LoadState::Loaded);
    assert_eq!(el.snapshot().image_border_radius.as_deref(), Some("12px"));
    assert_eq!(el.snapshot().image_opacity, "1");
}

#[test]
fn test_other_attributes_not_reactive() {
    let mut page = page();
    let id = mount(&mut page, &[("data-src", "a.png"), ("indicator-color", "red")]);
    page.set_attribute(id, "indicator-color", "green").unwrap();
    page.set_attribute(id, "apply-blur", "").unwrap();

    assert_eq!(media(&page, id).snapshot().indicator_color, "red");
    page.scroll_to(ON_SCREEN);
    assert_eq!(page.style(id, "filter"), None);
}

#[test]
fn test_missing_image_stalls_silently() {
    let mut page = page();
    page.network_mut().mark_missing("missing.png").unwrap();
    let id = mount(&mut page, &[("data-src", "missing.png")]);

    page.scroll_to(ON_SCREEN);
    page.advance(Duration::from_secs(10));

    let el = media(&page, id);
    let snap = el.snapshot();
    assert_eq!(el.load_state(), LoadState::Pending);
    assert_eq!(snap.image_src, "missing.png");
    assert_eq!(snap.image_opacity, "0");
    assert!(snap.indicator_visible());
    assert!(events(&mut page, id).iter().any(|e| matches!(e, LazyMediaEvent::LoadFailed { .. })));
    // No retry
    assert_eq!(page.pending_tasks(), 0);
}

#[test]
fn test_missing_source_attribute() {
    let mut page = page();
    let id = mount(&mut page, &[]);
    page.scroll_to(ON_SCREEN);
    page.advance(ms(100));

    assert!(media(&page, id).snapshot().indicator_visible());
    let failed = events(&mut page, id).into_iter().find_map(|e| match e {
        LazyMediaEvent::LoadFailed { reason, .. } => Some(reason),
        _ => None,
    });
    assert_eq!(failed.as_deref(), Some("Empty image source"));
}

#[test]
fn test_detach_cancels_pending_delay() {
    let mut page = page();
    let id = mount(&mut page, &[("data-src", "a.png"), ("data-network-speed", "2g")]);
    page.scroll_to(ON_SCREEN);
    page.advance(ms(1000));

    page.remove(id).unwrap();
    assert_eq!(page.pending_tasks(), 0);
    page.advance(Duration::from_secs(10));
    assert_eq!(media(&page, id).snapshot().image_src, "");
    assert!(events(&mut page, id).contains(&LazyMediaEvent::LoadInterrupted));

    // Re-attached while in view: the load starts over
    let body = page.body();
    page.append_child(body, id).unwrap();
    page.advance(ms(5100));
    assert_eq!(media(&page, id).load_state(), LoadState::Loaded);
}

#[test]
fn test_detach_cancels_in_flight_fetch() {
    let mut page = page();
    let id = mount(&mut page, &[("data-src", "a.png")]);
    page.scroll_to(ON_SCREEN);
    page.advance(ms(50));
    assert_eq!(page.in_flight_fetches(), 1);

    page.remove(id).unwrap();
    assert_eq!(page.in_flight_fetches(), 0);
    page.advance(ms(500));
    assert_eq!(media(&page, id).snapshot().image_opacity, "0");
}

#[test]
fn test_keep_pending_policy_finishes_detached() {
    let options = LazyMediaOptions { detach_policy: DetachPolicy::KeepPending, ..Default::default() };
    let mut page = page_with(options);
    let id = mount(&mut page, &[("data-src", "a.png"), ("data-network-speed", "slow3g")]);
    page.scroll_to(ON_SCREEN);
    page.advance(ms(500));

    page.remove(id).unwrap();
    assert!(!page.document().is_connected(id));
    page.advance(ms(2000));

    let el = media(&page, id);
    assert_eq!(el.load_state(), LoadState::Loaded);
    assert_eq!(el.snapshot().image_src, "a.png");
}

#[test]
fn test_detach_before_visible_then_reattach() {
    let mut page = page();
    let id = mount(&mut page, &[("data-src", "a.png")]);
    page.remove(id).unwrap();
    assert!(!media(&page, id).observer_handle().is_observing(id));

    page.scroll_to(ON_SCREEN);
    page.advance(ms(200));
    assert_eq!(media(&page, id).load_state(), LoadState::Idle);

    let body = page.body();
    page.append_child(body, id).unwrap();
    page.advance(ms(200));
    assert_eq!(media(&page, id).load_state(), LoadState::Loaded);
}

#[test]
fn test_observer_handle() {
    let mut page = page();
    let id = mount(&mut page, &[("data-src", "a.png")]);

    let handle = media(&page, id).observer_handle().clone();
    assert_eq!(handle.callback_target(), id);
    assert_eq!(handle.thresholds(), vec![0.0]);
    let margin = handle.root_margin();
    assert_eq!((margin.top, margin.right, margin.bottom, margin.left), (0.0, 0.0, 200.0, 0.0));
    assert_eq!(handle.observed_targets(), vec![id]);
    assert_eq!(page.registered_observers(), 1);
}

#[test]
fn test_attach_is_idempotent() {
    let mut page = page();
    let id = mount(&mut page, &[("data-src", "a.png")]);

    page.with_element::<LazyMedia, _>(id, |el, host| el.on_attach(host));
    page.with_element::<LazyMedia, _>(id, |el, host| el.on_attach(host));

    assert_eq!(page.registered_observers(), 1);
    assert_eq!(media(&page, id).observer_handle().observed_targets(), vec![id]);

    // Detaching twice is harmless
    page.with_element::<LazyMedia, _>(id, |el, host| el.on_detach(host));
    page.with_element::<LazyMedia, _>(id, |el, host| el.on_detach(host));
    assert!(!media(&page, id).observer_handle().is_observing(id));
}

#[test]
fn test_instances_are_independent() {
    let mut page = page();
    let near = mount(&mut page, &[("data-src", "near.png")]);
    let far = page.create_element(TAG_NAME, &[("data-src", "far.png")]).unwrap();
    page.set_layout(far, DOMRect::from_xywh(0.0, 9000.0, 400.0, 300.0)).unwrap();
    let body = page.body();
    page.append_child(body, far).unwrap();

    page.scroll_to(ON_SCREEN);
    page.advance(ms(200));

    assert_eq!(media(&page, near).load_state(), LoadState::Loaded);
    assert_eq!(media(&page, far).load_state(), LoadState::Idle);
    assert_eq!(media(&page, far).snapshot().image_src, "");
}
