//! Element configuration
//!
//! Presentation attributes are read once at mount; only `border-radius`
//! stays live. `data-src` and `data-network-speed` are read from the host
//! when a load starts.

use lazy_dom::ElementData;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Final image URL
pub const ATTR_SRC: &str = "data-src";
/// Spinner top border color
pub const ATTR_INDICATOR_COLOR: &str = "indicator-color";
/// Presence flag enabling the blur-up reveal
pub const ATTR_APPLY_BLUR: &str = "apply-blur";
/// `slow3g` | `2g`
pub const ATTR_NETWORK_SPEED: &str = "data-network-speed";
/// Image corner radius (live)
pub const ATTR_BORDER_RADIUS: &str = "border-radius";

/// Simulated network profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NetworkProfile {
    #[default]
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "slow3g")]
    Slow3g,
    #[serde(rename = "2g")]
    TwoG,
}

impl NetworkProfile {
    /// Map an attribute value; unknown or missing values mean `Normal`
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value {
            Some("slow3g") => Self::Slow3g,
            Some("2g") => Self::TwoG,
            _ => Self::Normal,
        }
    }

    /// Artificial delay before the source is assigned
    pub fn delay(self) -> Duration {
        match self {
            Self::Normal => Duration::ZERO,
            Self::Slow3g => Duration::from_millis(2000),
            Self::TwoG => Duration::from_millis(5000),
        }
    }
}

/// Presentation configuration read from the host element's attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LazyMediaConfig {
    pub indicator_color: Option<String>,
    pub apply_blur: bool,
    pub corner_radius: Option<String>,
}

impl LazyMediaConfig {
    pub fn from_element(element: &ElementData) -> Self {
        Self {
            indicator_color: element.get_attr(ATTR_INDICATOR_COLOR)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            apply_blur: element.has_attr(ATTR_APPLY_BLUR),
            corner_radius: element.get_attr(ATTR_BORDER_RADIUS).map(str::to_string),
        }
    }
}

/// What happens to a pending delay timer or fetch when the element leaves
/// the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetachPolicy {
    /// Cancel both; loading restarts on the next attach once visible
    #[default]
    CancelPending,
    /// Let them run and apply their results to the detached element
    KeepPending,
}

/// Embedder options, not exposed as attributes
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct LazyMediaOptions {
    pub detach_policy: DetachPolicy,
    /// CSS length for the host `blur()` filter while loading
    pub blur_radius: String,
}

impl Default for LazyMediaOptions {
    fn default() -> Self {
        Self {
            detach_policy: DetachPolicy::CancelPending,
            blur_radius: "10px".to_string(),
        }
    }
}
