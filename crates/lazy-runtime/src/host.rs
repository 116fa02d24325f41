//! Element host interface
//!
//! Custom elements never see the page directly. Everything they may do to
//! the outside world (read their own attributes, style their host box,
//! schedule timers, fetch images, register observers) goes through
//! [`ElementHost`], and the page calls back through [`CustomElement`].

use crate::{FetchOutcome, RequestId, TimerId};
use lazy_dom::{DomError, ElementData, IntersectionObserverEntry, IntersectionObserverHandle, NodeId};
use std::any::Any;
use std::time::Duration;

/// Capabilities a page grants to the custom elements it hosts
pub trait ElementHost {
    /// Current page time
    fn now(&self) -> Duration;

    /// Attribute of an element in the document
    fn attribute(&self, element: NodeId, name: &str) -> Option<String>;

    /// Set an inline style property on an element in the document
    fn set_style(&mut self, element: NodeId, property: &str, value: &str);

    /// Let the page drive this observer's checks. Registering twice is a no-op.
    fn register_observer(&mut self, observer: &IntersectionObserverHandle);

    /// Schedule `timer_fired` on `element` after `delay`
    fn set_timeout(&mut self, element: NodeId, delay: Duration) -> TimerId;

    /// Cancel a timer. Returns whether it was still pending.
    fn clear_timeout(&mut self, timer: TimerId) -> bool;

    /// Start an image fetch; `fetch_settled` is delivered to `element`
    fn fetch_image(&mut self, element: NodeId, src: &str) -> RequestId;

    /// Abort an in-flight fetch. Returns whether it was still in flight.
    fn abort_fetch(&mut self, request: RequestId) -> bool;
}

/// Lifecycle callbacks of an autonomous custom element
pub trait CustomElement: Any {
    /// Inserted into a document
    fn connected(&mut self, host: &mut dyn ElementHost);

    /// Removed from its document
    fn disconnected(&mut self, host: &mut dyn ElementHost);

    /// An observed attribute changed
    fn attribute_changed(
        &mut self,
        _name: &str,
        _old: Option<&str>,
        _new: Option<&str>,
        _host: &mut dyn ElementHost,
    ) {
    }

    /// Entries from an observer whose callback target is this element
    fn intersection_changed(&mut self, _entries: &[IntersectionObserverEntry], _host: &mut dyn ElementHost) {}

    fn timer_fired(&mut self, _timer: TimerId, _host: &mut dyn ElementHost) {}

    fn fetch_settled(&mut self, _request: RequestId, _outcome: FetchOutcome, _host: &mut dyn ElementHost) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Builds an element instance from its host node and initial attributes
pub type ElementConstructor = Box<dyn Fn(NodeId, &ElementData) -> Result<Box<dyn CustomElement>, DomError>>;
