//! Intersection Observer API
//!
//! Observe element visibility against a viewport expanded by a root margin.

use crate::{DOMRect, DomError, NodeId};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OBSERVER_ID: AtomicU64 = AtomicU64::new(1);

/// Observer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

/// Root margin in pixels, CSS `top right bottom left` order
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RootMargin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl RootMargin {
    /// Apply the margin to a root rectangle
    pub fn expand(&self, root: &DOMRect) -> DOMRect {
        root.outset(self.top, self.right, self.bottom, self.left)
    }
}

impl FromStr for RootMargin {
    type Err = DomError;

    /// Parse 1-4 pixel lengths with CSS shorthand expansion
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomError::InvalidRootMargin(s.to_string());

        let values = s.split_whitespace()
            .map(|token| {
                let number = token.strip_suffix("px").unwrap_or(token);
                // Only a bare zero may drop its unit
                if number.len() == token.len() && token != "0" {
                    return Err(invalid());
                }
                number.parse::<f64>().map_err(|_| invalid())
            })
            .collect::<Result<Vec<f64>, DomError>>()?;

        let (top, right, bottom, left) = match values.as_slice() {
            [all] => (*all, *all, *all, *all),
            [v, h] => (*v, *h, *v, *h),
            [t, h, b] => (*t, *h, *b, *h),
            [t, r, b, l] => (*t, *r, *b, *l),
            _ => return Err(invalid()),
        };
        Ok(Self { top, right, bottom, left })
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px {}px {}px {}px", self.top, self.right, self.bottom, self.left)
    }
}

/// Intersection observer options
#[derive(Debug, Clone)]
pub struct IntersectionObserverInit {
    /// Root margin (CSS shorthand)
    pub root_margin: String,
    /// Thresholds to trigger callback
    pub threshold: Vec<f64>,
}

impl Default for IntersectionObserverInit {
    fn default() -> Self {
        Self {
            root_margin: "0px".to_string(),
            threshold: vec![0.0],
        }
    }
}

/// Intersection observer entry
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionObserverEntry {
    pub target: NodeId,
    pub bounding_client_rect: DOMRect,
    pub intersection_rect: DOMRect,
    pub root_bounds: DOMRect,
    pub is_intersecting: bool,
    pub intersection_ratio: f64,
    pub time: f64,
}

#[derive(Debug)]
struct Observation {
    target: NodeId,
    /// Last reported (is_intersecting, threshold index)
    last: Option<(bool, usize)>,
}

/// Intersection observer
#[derive(Debug)]
pub struct IntersectionObserver {
    id: ObserverId,
    callback_target: NodeId,
    root_margin: RootMargin,
    thresholds: Vec<f64>,
    observed: Vec<Observation>,
}

impl IntersectionObserver {
    /// Create an observer whose callback is delivered to `callback_target`
    pub fn new(callback_target: NodeId, init: IntersectionObserverInit) -> Result<Self, DomError> {
        let root_margin = init.root_margin.parse()?;
        let mut thresholds = if init.threshold.is_empty() { vec![0.0] } else { init.threshold };
        if let Some(bad) = thresholds.iter().find(|t| !(0.0..=1.0).contains(*t)) {
            return Err(DomError::InvalidThreshold(*bad));
        }
        thresholds.sort_by(f64::total_cmp);

        Ok(Self {
            id: ObserverId(NEXT_OBSERVER_ID.fetch_add(1, Ordering::Relaxed)),
            callback_target,
            root_margin,
            thresholds,
            observed: Vec::new(),
        })
    }

    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Element that receives this observer's entries
    pub fn callback_target(&self) -> NodeId {
        self.callback_target
    }

    pub fn root_margin(&self) -> RootMargin {
        self.root_margin
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Observe an element; the next check always reports it once
    pub fn observe(&mut self, target: NodeId) {
        if !self.is_observing(target) {
            self.observed.push(Observation { target, last: None });
        }
    }

    /// Stop observing
    pub fn unobserve(&mut self, target: NodeId) {
        self.observed.retain(|o| o.target != target);
    }

    /// Disconnect all
    pub fn disconnect(&mut self) {
        self.observed.clear();
    }

    pub fn is_observing(&self, target: NodeId) -> bool {
        self.observed.iter().any(|o| o.target == target)
    }

    pub fn observed_targets(&self) -> Vec<NodeId> {
        self.observed.iter().map(|o| o.target).collect()
    }

    /// Compute entries whose intersection state changed since the last check.
    ///
    /// `rect_of` returns the target's box in document coordinates, or `None`
    /// when the target is not rendered (never intersecting).
    pub fn check_intersections<F>(&mut self, viewport: DOMRect, rect_of: F, time: f64) -> Vec<IntersectionObserverEntry>
    where
        F: Fn(NodeId) -> Option<DOMRect>,
    {
        let root_bounds = self.root_margin.expand(&viewport);
        let mut entries = Vec::new();

        for observation in self.observed.iter_mut() {
            let bounds = rect_of(observation.target);
            let intersection = bounds.and_then(|rect| rect.intersection(&root_bounds));
            let is_intersecting = intersection.is_some();

            let ratio = match (bounds, intersection) {
                (Some(rect), Some(hit)) if rect.area() > 0.0 => hit.area() / rect.area(),
                (_, Some(_)) => 1.0,
                _ => 0.0,
            };
            let threshold_index = if is_intersecting {
                self.thresholds.iter().filter(|t| **t <= ratio).count()
            } else {
                0
            };

            let state = (is_intersecting, threshold_index);
            if observation.last == Some(state) {
                continue;
            }
            observation.last = Some(state);

            entries.push(IntersectionObserverEntry {
                target: observation.target,
                bounding_client_rect: bounds.unwrap_or_default(),
                intersection_rect: intersection.unwrap_or_default(),
                root_bounds,
                is_intersecting,
                intersection_ratio: ratio,
                time,
            });
        }

        entries
    }
}

/// Shared handle to an observer.
///
/// The owning element and the page's update loop both hold one; the page
/// drives checks while the element observes and unobserves.
#[derive(Debug, Clone)]
pub struct IntersectionObserverHandle(Rc<RefCell<IntersectionObserver>>);

impl IntersectionObserverHandle {
    pub fn new(callback_target: NodeId, init: IntersectionObserverInit) -> Result<Self, DomError> {
        Ok(Self(Rc::new(RefCell::new(IntersectionObserver::new(callback_target, init)?))))
    }

    pub fn id(&self) -> ObserverId {
        self.0.borrow().id()
    }

    pub fn callback_target(&self) -> NodeId {
        self.0.borrow().callback_target()
    }

    pub fn root_margin(&self) -> RootMargin {
        self.0.borrow().root_margin()
    }

    pub fn thresholds(&self) -> Vec<f64> {
        self.0.borrow().thresholds().to_vec()
    }

    pub fn observe(&self, target: NodeId) {
        self.0.borrow_mut().observe(target);
    }

    pub fn unobserve(&self, target: NodeId) {
        self.0.borrow_mut().unobserve(target);
    }

    pub fn disconnect(&self) {
        self.0.borrow_mut().disconnect();
    }

    pub fn is_observing(&self, target: NodeId) -> bool {
        self.0.borrow().is_observing(target)
    }

    pub fn observed_targets(&self) -> Vec<NodeId> {
        self.0.borrow().observed_targets()
    }

    pub fn check_intersections<F>(&self, viewport: DOMRect, rect_of: F, time: f64) -> Vec<IntersectionObserverEntry>
    where
        F: Fn(NodeId) -> Option<DOMRect>,
    {
        self.0.borrow_mut().check_intersections(viewport, rect_of, time)
    }

    /// Number of live handles (owner + registrations)
    pub fn holders(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
