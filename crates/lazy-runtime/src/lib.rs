//! Lazy Runtime
//!
//! Host side of lazily loading elements: a virtual-clock event loop, a
//! simulated image network and a [`Page`] that dispatches lifecycle,
//! intersection, timer and fetch callbacks to custom elements.

mod config;
mod event_loop;
mod host;
mod network;
mod page;

pub use config::RuntimeConfig;
pub use event_loop::{EventLoop, TimerId};
pub use host::{CustomElement, ElementConstructor, ElementHost};
pub use network::{FetchError, FetchOutcome, ImageNetwork, RequestId};
pub use page::{Page, PageError};

// Re-export the DOM crate for element authors
pub use lazy_dom as dom;
