//! Lazy Demo - Main Entry Point
//!
//! Builds a home page (navbar + a column of `<lazy-image-loader>`s),
//! scrolls it one viewport at a time on a virtual clock and logs when each
//! image starts, is assigned and finishes loading.
//!
//! Usage: `lazy-demo [config.json]`

mod config;

use anyhow::{Context, Result};
use config::DemoConfig;
use lazy_dom::{DOMRect, NodeId};
use lazy_media::{LazyMedia, LazyMediaEvent, LoadState, TAG_NAME};
use lazy_runtime::Page;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const NAVBAR_HEIGHT: f64 = 64.0;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => DemoConfig::load(&path)?,
        None => DemoConfig::default(),
    };
    tracing::info!("Starting lazy demo with {} images", config.images.len());

    let mut page = Page::new(config.runtime.clone()).context("creating page")?;
    LazyMedia::define(&mut page, config.lazy_media.clone()).context("defining <lazy-image-loader>")?;

    let images = build_home_page(&mut page, &config)?;
    let page_height = images
        .last()
        .map(|(_, rect)| rect.bottom())
        .unwrap_or(NAVBAR_HEIGHT);

    let step = config.scroll_step.unwrap_or(config.runtime.viewport_height);
    let dwell = Duration::from_millis(config.dwell_ms);
    loop {
        page.advance(dwell);
        report(&mut page, &images);

        let viewport = page.viewport();
        if viewport.bottom() >= page_height {
            break;
        }
        page.scroll_by(step);
    }

    page.advance(Duration::from_millis(config.settle_ms));
    report(&mut page, &images);
    summarize(&page, &images);
    Ok(())
}

/// Navbar followed by one lazy image per configured entry
fn build_home_page(page: &mut Page, config: &DemoConfig) -> Result<Vec<(NodeId, DOMRect)>> {
    let body = page.body();
    let width = config.runtime.viewport_width;

    let navbar = page.create_element("nav", &[("class", "navbar")])?;
    page.set_layout(navbar, DOMRect::from_xywh(0.0, 0.0, width, NAVBAR_HEIGHT))?;
    page.append_child(body, navbar)?;

    for src in &config.missing {
        page.network_mut()
            .mark_missing(src)
            .with_context(|| format!("marking {:?} missing", src))?;
    }

    let mut images = Vec::with_capacity(config.images.len());
    let mut y = NAVBAR_HEIGHT + config.gap;
    for image in &config.images {
        let id = page.create_element(TAG_NAME, &image.attributes())?;
        let rect = DOMRect::from_xywh(0.0, y, width, image.height);
        page.set_layout(id, rect)?;
        page.append_child(body, id)?;
        tracing::debug!("Placed {} ({}) at y={}", id, image.src, y);

        images.push((id, rect));
        y += image.height + config.gap;
    }
    Ok(images)
}

fn report(page: &mut Page, images: &[(NodeId, DOMRect)]) {
    let now = page.now();
    for (id, _) in images {
        let Some(media) = page.element_mut::<LazyMedia>(*id) else {
            continue;
        };
        for event in media.take_events() {
            match event {
                LazyMediaEvent::LoadStarted { delay } => {
                    tracing::info!("[{:?}] {} visible, source in {:?}", now, id, delay)
                }
                LazyMediaEvent::SourceAssigned { src } => {
                    tracing::info!("[{:?}] {} fetching {}", now, id, src)
                }
                LazyMediaEvent::Loaded { src } => tracing::info!("[{:?}] {} loaded {}", now, id, src),
                LazyMediaEvent::LoadFailed { src, reason } => {
                    tracing::warn!("[{:?}] {} failed {:?}: {}", now, id, src, reason)
                }
                LazyMediaEvent::LoadInterrupted => tracing::info!("[{:?}] {} interrupted", now, id),
            }
        }
    }
}

fn summarize(page: &Page, images: &[(NodeId, DOMRect)]) {
    let mut loaded = 0;
    for (id, _) in images {
        let Some(media) = page.element::<LazyMedia>(*id) else {
            continue;
        };
        let snapshot = media.snapshot();
        if media.load_state() == LoadState::Loaded {
            loaded += 1;
        }
        tracing::info!(
            "{} {:?} src={:?} spinner={} filter={:?}",
            id,
            media.load_state(),
            snapshot.image_src,
            snapshot.indicator_visible(),
            page.style(*id, "filter"),
        );
    }
    tracing::info!("{}/{} images loaded after {:?}", loaded, images.len(), page.now());
}
