//! Page - document, layout boxes, viewport and the event loop
//!
//! The page owns every custom element instance and dispatches lifecycle,
//! intersection, timer and fetch callbacks to them in order.

use crate::{
    CustomElement, ElementConstructor, ElementHost, EventLoop, FetchOutcome, ImageNetwork,
    RequestId, RuntimeConfig, TimerId,
};
use lazy_dom::{
    CustomElementError, CustomElementRegistry, DOMRect, Document, DomError,
    IntersectionObserverHandle, NodeId,
};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Page error
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Registry(#[from] CustomElementError),

    #[error("Invalid base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Work queued on the page's event loop
#[derive(Debug)]
enum HostTask {
    Timer { target: NodeId },
    FetchSettled { target: NodeId, request: RequestId, outcome: FetchOutcome },
}

/// Everything an element may touch, split from the element map so both
/// can be borrowed during dispatch
struct HostEnv {
    document: Document,
    event_loop: EventLoop<HostTask>,
    network: ImageNetwork,
    observers: Vec<IntersectionObserverHandle>,
    layout: HashMap<NodeId, DOMRect>,
    viewport: DOMRect,
    in_flight: HashMap<RequestId, TimerId>,
    next_request: u64,
}

impl HostEnv {
    /// Box of a rendered element; detached elements have none
    fn rect_of(&self, id: NodeId) -> Option<DOMRect> {
        if self.document.is_connected(id) {
            self.layout.get(&id).copied()
        } else {
            None
        }
    }
}

impl ElementHost for HostEnv {
    fn now(&self) -> Duration {
        self.event_loop.now()
    }

    fn attribute(&self, element: NodeId, name: &str) -> Option<String> {
        self.document.attribute(element, name).map(str::to_string)
    }

    fn set_style(&mut self, element: NodeId, property: &str, value: &str) {
        match self.document.tree.element_mut(element) {
            Ok(el) => el.style.set(property, value),
            Err(e) => tracing::debug!("Ignoring style {} on {}: {}", property, element, e),
        }
    }

    fn register_observer(&mut self, observer: &IntersectionObserverHandle) {
        if !self.observers.iter().any(|o| o.ptr_eq(observer)) {
            tracing::debug!("Registered {} for {}", observer.id(), observer.callback_target());
            self.observers.push(observer.clone());
        }
    }

    fn set_timeout(&mut self, element: NodeId, delay: Duration) -> TimerId {
        let id = self.event_loop.set_timeout(delay, HostTask::Timer { target: element });
        tracing::debug!("{} scheduled {} in {:?}", element, id, delay);
        id
    }

    fn clear_timeout(&mut self, timer: TimerId) -> bool {
        self.event_loop.clear_timeout(timer)
    }

    fn fetch_image(&mut self, element: NodeId, src: &str) -> RequestId {
        let request = RequestId(self.next_request);
        self.next_request += 1;

        let (latency, outcome) = self.network.request(src);
        tracing::debug!("{} fetching {:?} for {} ({:?})", request, src, element, latency);
        let timer = self.event_loop.set_timeout(latency, HostTask::FetchSettled {
            target: element,
            request,
            outcome,
        });
        self.in_flight.insert(request, timer);
        request
    }

    fn abort_fetch(&mut self, request: RequestId) -> bool {
        match self.in_flight.remove(&request) {
            Some(timer) => {
                tracing::debug!("Aborted {}", request);
                self.event_loop.clear_timeout(timer)
            }
            None => false,
        }
    }
}

/// A page hosting custom elements
pub struct Page {
    env: HostEnv,
    registry: CustomElementRegistry,
    constructors: HashMap<String, ElementConstructor>,
    elements: HashMap<NodeId, Box<dyn CustomElement>>,
    frame: Duration,
}

impl Page {
    /// Create an empty page
    pub fn new(config: RuntimeConfig) -> Result<Self, PageError> {
        let base = Url::parse(&config.base_url).map_err(|source| PageError::InvalidBaseUrl {
            url: config.base_url.clone(),
            source,
        })?;
        tracing::info!("Creating page {} ({}x{})", base, config.viewport_width, config.viewport_height);

        Ok(Self {
            env: HostEnv {
                document: Document::new(base.as_str()),
                event_loop: EventLoop::new(),
                network: ImageNetwork::new(base, config.image_latency()),
                observers: Vec::new(),
                layout: HashMap::new(),
                viewport: DOMRect::from_xywh(0.0, 0.0, config.viewport_width, config.viewport_height),
                in_flight: HashMap::new(),
                next_request: 1,
            },
            registry: CustomElementRegistry::new(),
            constructors: HashMap::new(),
            elements: HashMap::new(),
            frame: config.frame(),
        })
    }

    /// Define a custom element name
    pub fn define(
        &mut self,
        name: &str,
        observed_attributes: &[&str],
        constructor: ElementConstructor,
    ) -> Result<(), PageError> {
        self.registry.define(name, observed_attributes)?;
        self.constructors.insert(name.to_string(), constructor);
        Ok(())
    }

    pub fn registry(&self) -> &CustomElementRegistry {
        &self.registry
    }

    /// Create a detached element with initial attributes. Defined custom
    /// elements are constructed immediately from those attributes.
    pub fn create_element(&mut self, tag: &str, attributes: &[(&str, &str)]) -> Result<NodeId, PageError> {
        let id = self.env.document.create_element(tag);
        for (name, value) in attributes {
            self.env.document.set_attribute(id, name, value)?;
        }

        let tag = self.env.document.tree.element(id)?.local_name.clone();
        if let Some(constructor) = self.constructors.get(&tag) {
            let data = self.env.document.tree.element(id)?;
            let instance = constructor(id, data)?;
            tracing::debug!("Constructed <{}> at {}", tag, id);
            self.elements.insert(id, instance);
        }
        Ok(id)
    }

    /// Append `child` under `parent`, firing connected callbacks for custom
    /// elements that enter the document
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), PageError> {
        let was_connected = self.env.document.is_connected(child);
        self.env.document.tree.append_child(parent, child)?;

        if was_connected {
            self.notify_disconnected(child);
        }
        if self.env.document.is_connected(child) {
            self.notify_connected(child);
        }
        self.update_intersections();
        Ok(())
    }

    /// Remove `child` from its parent, firing disconnected callbacks
    pub fn remove(&mut self, child: NodeId) -> Result<(), PageError> {
        let was_connected = self.env.document.is_connected(child);
        self.env.document.tree.detach(child)?;
        if was_connected {
            self.notify_disconnected(child);
        }
        self.update_intersections();
        Ok(())
    }

    fn custom_elements_in(&self, root: NodeId) -> Vec<NodeId> {
        self.env.document.tree
            .descendants(root)
            .into_iter()
            .filter(|id| self.elements.contains_key(id))
            .collect()
    }

    fn notify_connected(&mut self, root: NodeId) {
        for id in self.custom_elements_in(root) {
            if let Some(element) = self.elements.get_mut(&id) {
                element.connected(&mut self.env);
            }
        }
    }

    fn notify_disconnected(&mut self, root: NodeId) {
        for id in self.custom_elements_in(root) {
            if let Some(element) = self.elements.get_mut(&id) {
                element.disconnected(&mut self.env);
            }
        }
    }

    /// Set an attribute; observed attributes of custom elements are forwarded
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), PageError> {
        let old = self.env.document.set_attribute(id, name, value)?;
        self.notify_attribute(id, name, old.as_deref(), Some(value))?;
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), PageError> {
        let old = self.env.document.remove_attribute(id, name)?;
        if old.is_some() {
            self.notify_attribute(id, name, old.as_deref(), None)?;
        }
        Ok(())
    }

    fn notify_attribute(&mut self, id: NodeId, name: &str, old: Option<&str>, new: Option<&str>) -> Result<(), PageError> {
        let tag = &self.env.document.tree.element(id)?.local_name;
        let observed = self.registry.get(tag).is_some_and(|def| def.observes(name));
        if !observed {
            return Ok(());
        }
        if let Some(element) = self.elements.get_mut(&id) {
            element.attribute_changed(name, old, new, &mut self.env);
        }
        Ok(())
    }

    /// Place an element's box in document coordinates
    pub fn set_layout(&mut self, id: NodeId, rect: DOMRect) -> Result<(), PageError> {
        self.env.document.tree.element(id)?;
        self.env.layout.insert(id, rect);
        self.update_intersections();
        Ok(())
    }

    /// Scroll the viewport to a vertical offset
    pub fn scroll_to(&mut self, y: f64) {
        self.env.viewport.y = y.max(0.0);
        tracing::debug!("Scrolled to {}", self.env.viewport.y);
        self.update_intersections();
    }

    pub fn scroll_by(&mut self, dy: f64) {
        self.scroll_to(self.env.viewport.y + dy);
    }

    pub fn viewport(&self) -> DOMRect {
        self.env.viewport
    }

    /// Advance page time, firing due timers and fetch completions in order
    /// and checking intersections once per frame. Saturates at the end of
    /// the clock's millisecond range.
    pub fn advance(&mut self, delta: Duration) {
        let limit = Duration::from_millis(u64::MAX);
        let target = self.env.event_loop.now().checked_add(delta).unwrap_or(limit).min(limit);
        loop {
            // Nothing scheduled: remaining frames would see the same viewport
            let frame_end = if self.env.event_loop.has_pending_work() {
                self.env.event_loop.now().saturating_add(self.frame).min(target)
            } else {
                target
            };
            let frame_end_ms = u64::try_from(frame_end.as_millis()).unwrap_or(u64::MAX);

            while let Some((timer, task)) = self.env.event_loop.pop_due(frame_end_ms) {
                self.dispatch(timer, task);
            }
            self.env.event_loop.advance_to(frame_end_ms);
            self.update_intersections();

            if frame_end >= target {
                break;
            }
        }
    }

    fn dispatch(&mut self, timer: TimerId, task: HostTask) {
        match task {
            HostTask::Timer { target } => {
                if let Some(element) = self.elements.get_mut(&target) {
                    element.timer_fired(timer, &mut self.env);
                }
            }
            HostTask::FetchSettled { target, request, outcome } => {
                self.env.in_flight.remove(&request);
                if let Some(element) = self.elements.get_mut(&target) {
                    element.fetch_settled(request, outcome, &mut self.env);
                }
            }
        }
    }

    /// Run every registered observer against the current viewport and
    /// deliver non-empty entry lists to their callback targets
    pub fn update_intersections(&mut self) {
        // Dead (no other holder) or idle (no targets) registrations are
        // dropped; elements register again when they start observing
        self.env.observers.retain(|o| o.holders() > 1 && !o.observed_targets().is_empty());

        let observers = self.env.observers.clone();
        let time = self.env.event_loop.now_ms() as f64;
        for observer in observers {
            let env = &self.env;
            let entries = observer.check_intersections(env.viewport, |id| env.rect_of(id), time);
            if entries.is_empty() {
                continue;
            }
            if let Some(element) = self.elements.get_mut(&observer.callback_target()) {
                element.intersection_changed(&entries, &mut self.env);
            }
        }
    }

    /// Typed access to a custom element instance
    pub fn element<E: CustomElement>(&self, id: NodeId) -> Option<&E> {
        self.elements.get(&id)?.as_any().downcast_ref::<E>()
    }

    pub fn element_mut<E: CustomElement>(&mut self, id: NodeId) -> Option<&mut E> {
        self.elements.get_mut(&id)?.as_any_mut().downcast_mut::<E>()
    }

    /// Call into an element with access to its host
    pub fn with_element<E, R>(&mut self, id: NodeId, f: impl FnOnce(&mut E, &mut dyn ElementHost) -> R) -> Option<R>
    where
        E: CustomElement,
    {
        let element = self.elements.get_mut(&id)?.as_any_mut().downcast_mut::<E>()?;
        Some(f(element, &mut self.env))
    }

    pub fn document(&self) -> &Document {
        &self.env.document
    }

    pub fn body(&self) -> NodeId {
        self.env.document.body()
    }

    /// Inline style property of an element in the document
    pub fn style(&self, id: NodeId, property: &str) -> Option<String> {
        let element = self.env.document.tree.element(id).ok()?;
        element.style.get(property).map(str::to_string)
    }

    pub fn network_mut(&mut self) -> &mut ImageNetwork {
        &mut self.env.network
    }

    pub fn now(&self) -> Duration {
        self.env.event_loop.now()
    }

    /// Timers and fetches not yet settled
    pub fn pending_tasks(&self) -> usize {
        self.env.event_loop.pending_timers()
    }

    pub fn in_flight_fetches(&self) -> usize {
        self.env.in_flight.len()
    }

    pub fn registered_observers(&self) -> usize {
        self.env.observers.len()
    }
}
