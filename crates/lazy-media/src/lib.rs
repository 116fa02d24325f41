//! Lazy Media
//!
//! `<lazy-image-loader>`: an image element that waits until it is about
//! to scroll into view before fetching, shows a spinner meanwhile and can
//! blur its box until the image has loaded.
//!
//! # Example
//! ```rust,ignore
//! use lazy_media::{LazyMedia, LazyMediaOptions};
//! use lazy_runtime::{Page, RuntimeConfig};
//!
//! let mut page = Page::new(RuntimeConfig::default())?;
//! LazyMedia::define(&mut page, LazyMediaOptions::default())?;
//! let img = page.create_element("lazy-image-loader", &[("data-src", "a.png"), ("apply-blur", "")])?;
//! page.append_child(page.body(), img)?;
//! ```

mod config;
mod element;
mod presentation;

pub use config::{
    DetachPolicy, LazyMediaConfig, LazyMediaOptions, NetworkProfile, ATTR_APPLY_BLUR,
    ATTR_BORDER_RADIUS, ATTR_INDICATOR_COLOR, ATTR_NETWORK_SPEED, ATTR_SRC,
};
pub use element::{LazyMedia, LazyMediaEvent, LoadState, OBSERVED_ATTRIBUTES, ROOT_MARGIN, TAG_NAME};
pub use presentation::{
    RenderSnapshot, DEFAULT_INDICATOR_COLOR, IMAGE_TRANSITION, SPINNER_CLASS, STYLE_SHEET,
};
