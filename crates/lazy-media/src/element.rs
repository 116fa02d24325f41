//! The `<lazy-image-loader>` element
//!
//! Observes its own box against the viewport (with a 200px lookahead
//! below the fold). The first time it intersects it stops observing,
//! optionally blurs its host box, waits out the simulated network delay,
//! assigns the image source and reveals the image once it has loaded.
//!
//! ```text
//!   Idle ──visible──▶ Pending ──delay──▶ (src assigned) ──load──▶ Loaded
//!    ▲                   │                                          │
//!    └───────────────────┴──────────────── reset() ─────────────────┘
//! ```

use crate::config::{ATTR_BORDER_RADIUS, ATTR_NETWORK_SPEED, ATTR_SRC};
use crate::presentation::{RenderScope, RenderSnapshot};
use crate::{DetachPolicy, LazyMediaConfig, LazyMediaOptions, NetworkProfile};
use lazy_dom::{
    DomError, ElementData, IntersectionObserverEntry, IntersectionObserverHandle,
    IntersectionObserverInit, NodeId, ShadowRoot, Shadowable,
};
use lazy_runtime::{CustomElement, ElementHost, FetchOutcome, Page, PageError, RequestId, TimerId};
use std::any::Any;
use std::time::Duration;

/// Registered element name
pub const TAG_NAME: &str = "lazy-image-loader";

/// Attributes whose changes reach the element after mount
pub const OBSERVED_ATTRIBUTES: &[&str] = &[ATTR_BORDER_RADIUS];

/// Lookahead region: 200px below the viewport
pub const ROOT_MARGIN: &str = "0px 0px 200px 0px";

/// Load progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Pending,
    Loaded,
}

/// Observable progress and failures, drained with [`LazyMedia::take_events`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LazyMediaEvent {
    /// Became visible; the source is assigned after `delay`
    LoadStarted { delay: Duration },
    /// Source assigned to the image, fetch in flight
    SourceAssigned { src: String },
    Loaded { src: String },
    /// The image did not load; the indicator stays up
    LoadFailed { src: String, reason: String },
    /// Pending work dropped because the element left the document
    LoadInterrupted,
}

/// Suspended step of the load sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InFlight {
    Delay(TimerId),
    Fetch(RequestId),
}

/// Lazily loading image element
#[derive(Debug)]
pub struct LazyMedia {
    host: NodeId,
    config: LazyMediaConfig,
    options: LazyMediaOptions,
    scope: RenderScope,
    observer: IntersectionObserverHandle,
    state: LoadState,
    in_flight: Option<InFlight>,
    attached: bool,
    /// A detach cancelled the load; the next attach observes again
    interrupted: bool,
    events: Vec<LazyMediaEvent>,
}

impl LazyMedia {
    /// Build the element for `host` from its attributes
    pub fn mount(host: NodeId, element: &ElementData) -> Result<Self, DomError> {
        Self::mount_with(host, element, LazyMediaOptions::default())
    }

    pub fn mount_with(host: NodeId, element: &ElementData, options: LazyMediaOptions) -> Result<Self, DomError> {
        let config = LazyMediaConfig::from_element(element);
        let scope = RenderScope::build(host, &config)?;
        let observer = IntersectionObserverHandle::new(host, IntersectionObserverInit {
            root_margin: ROOT_MARGIN.to_string(),
            threshold: vec![0.0],
        })?;

        tracing::debug!("Mounted <{}> at {}", TAG_NAME, host);
        Ok(Self {
            host,
            config,
            options,
            scope,
            observer,
            state: LoadState::Idle,
            in_flight: None,
            attached: false,
            interrupted: false,
            events: Vec::new(),
        })
    }

    /// Register `<lazy-image-loader>` on a page
    pub fn define(page: &mut Page, options: LazyMediaOptions) -> Result<(), PageError> {
        page.define(
            TAG_NAME,
            OBSERVED_ATTRIBUTES,
            Box::new(move |host: NodeId, element: &ElementData| -> Result<Box<dyn CustomElement>, DomError> {
                Ok(Box::new(LazyMedia::mount_with(host, element, options.clone())?))
            }),
        )
    }

    /// Start observing visibility. Repeated calls while attached do nothing.
    pub fn on_attach(&mut self, host: &mut dyn ElementHost) {
        if self.attached {
            return;
        }
        self.attached = true;
        host.register_observer(&self.observer);

        if self.state == LoadState::Idle || self.interrupted {
            self.interrupted = false;
            self.observer.observe(self.host);
            tracing::debug!("{} observing with margin {}", self.host, self.observer.root_margin());
        }
    }

    /// Stop observing and, unless configured otherwise, cancel pending work
    pub fn on_detach(&mut self, host: &mut dyn ElementHost) {
        self.attached = false;
        self.observer.unobserve(self.host);

        if self.options.detach_policy == DetachPolicy::KeepPending {
            return;
        }
        if let Some(step) = self.in_flight.take() {
            match step {
                InFlight::Delay(timer) => {
                    host.clear_timeout(timer);
                }
                InFlight::Fetch(request) => {
                    host.abort_fetch(request);
                }
            }
            self.interrupted = true;
            tracing::debug!("{} detached mid-load, cancelled {:?}", self.host, step);
            self.events.push(LazyMediaEvent::LoadInterrupted);
        }
    }

    /// Reflect a new corner radius into the image; load state is untouched
    pub fn on_corner_radius_changed(&mut self, value: Option<&str>) {
        self.scope.set_corner_radius(value);
    }

    /// Back to the placeholder: no source, transparent image, indicator
    /// shown. Does not restart observation. Callbacks still queued for the
    /// abandoned load are ignored when they arrive.
    pub fn reset(&mut self) {
        self.scope.set_image_src("");
        self.scope.set_image_opacity("0");
        self.scope.set_image_display("block");
        self.scope.set_indicator_visible(true);
        self.state = LoadState::Idle;
        self.in_flight = None;
        self.interrupted = false;
    }

    /// The element's intersection observer
    pub fn observer_handle(&self) -> &IntersectionObserverHandle {
        &self.observer
    }

    pub fn load_state(&self) -> LoadState {
        self.state
    }

    pub fn config(&self) -> &LazyMediaConfig {
        &self.config
    }

    pub fn host(&self) -> NodeId {
        self.host
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        self.scope.snapshot()
    }

    pub fn take_events(&mut self) -> Vec<LazyMediaEvent> {
        std::mem::take(&mut self.events)
    }

    fn handle_intersection(&mut self, entries: &[IntersectionObserverEntry], host: &mut dyn ElementHost) {
        for entry in entries {
            if entry.target != self.host || !entry.is_intersecting {
                continue;
            }
            // Unsubscribe before anything is scheduled
            let was_observing = self.observer.is_observing(self.host);
            self.observer.unobserve(self.host);
            if was_observing && self.in_flight.is_none() && self.state != LoadState::Loaded {
                self.start_load(host);
            }
        }
    }

    fn start_load(&mut self, host: &mut dyn ElementHost) {
        let speed = host.attribute(self.host, ATTR_NETWORK_SPEED);
        let delay = NetworkProfile::from_attribute(speed.as_deref()).delay();

        if self.config.apply_blur {
            let filter = format!("blur({})", self.options.blur_radius);
            host.set_style(self.host, "filter", &filter);
        }

        self.state = LoadState::Pending;
        let timer = host.set_timeout(self.host, delay);
        self.in_flight = Some(InFlight::Delay(timer));
        tracing::debug!("{} visible, source in {:?}", self.host, delay);
        self.events.push(LazyMediaEvent::LoadStarted { delay });
    }

    fn on_delay_elapsed(&mut self, timer: TimerId, host: &mut dyn ElementHost) {
        if self.in_flight != Some(InFlight::Delay(timer)) {
            return;
        }
        let src = host.attribute(self.host, ATTR_SRC).unwrap_or_default();

        self.scope.set_image_src(&src);
        let request = host.fetch_image(self.host, &src);
        self.in_flight = Some(InFlight::Fetch(request));
        self.events.push(LazyMediaEvent::SourceAssigned { src });
    }

    fn on_image_settled(&mut self, request: RequestId, outcome: FetchOutcome, host: &mut dyn ElementHost) {
        if self.in_flight != Some(InFlight::Fetch(request)) {
            return;
        }
        self.in_flight = None;
        let src = self.scope.image_src().to_string();

        match outcome {
            Ok(url) => {
                self.scope.set_image_opacity("1");
                host.set_style(self.host, "filter", "blur(0)");
                self.scope.set_indicator_visible(false);
                self.state = LoadState::Loaded;
                tracing::debug!("{} loaded {}", self.host, url);
                self.events.push(LazyMediaEvent::Loaded { src });
            }
            Err(e) => {
                tracing::warn!("{} failed to load {:?}: {}", self.host, src, e);
                self.events.push(LazyMediaEvent::LoadFailed { src, reason: e.to_string() });
            }
        }
    }
}

impl CustomElement for LazyMedia {
    fn connected(&mut self, host: &mut dyn ElementHost) {
        self.on_attach(host);
    }

    fn disconnected(&mut self, host: &mut dyn ElementHost) {
        self.on_detach(host);
    }

    fn attribute_changed(&mut self, name: &str, _old: Option<&str>, new: Option<&str>, _host: &mut dyn ElementHost) {
        if name == ATTR_BORDER_RADIUS {
            self.on_corner_radius_changed(new);
        }
    }

    fn intersection_changed(&mut self, entries: &[IntersectionObserverEntry], host: &mut dyn ElementHost) {
        self.handle_intersection(entries, host);
    }

    fn timer_fired(&mut self, timer: TimerId, host: &mut dyn ElementHost) {
        self.on_delay_elapsed(timer, host);
    }

    fn fetch_settled(&mut self, request: RequestId, outcome: FetchOutcome, host: &mut dyn ElementHost) {
        self.on_image_settled(request, outcome, host);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Shadowable for LazyMedia {
    fn shadow_root(&self) -> Option<&ShadowRoot> {
        self.scope.shadow().exposed()
    }
}
