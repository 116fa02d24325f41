//! Demo configuration, optionally loaded from a JSON file

use anyhow::{Context, Result};
use lazy_media::LazyMediaOptions;
use lazy_runtime::RuntimeConfig;
use serde::Deserialize;

/// One image on the home page
#[derive(Debug, Clone, Deserialize)]
pub struct ImageSpec {
    pub src: String,
    #[serde(default)]
    pub network_speed: Option<String>,
    #[serde(default)]
    pub apply_blur: bool,
    #[serde(default)]
    pub indicator_color: Option<String>,
    #[serde(default)]
    pub border_radius: Option<String>,
    #[serde(default = "default_height")]
    pub height: f64,
}

fn default_height() -> f64 {
    400.0
}

impl ImageSpec {
    fn new(src: &str) -> Self {
        Self {
            src: src.to_string(),
            network_speed: None,
            apply_blur: false,
            indicator_color: None,
            border_radius: None,
            height: default_height(),
        }
    }

    /// Host attributes for the `<lazy-image-loader>`
    pub fn attributes(&self) -> Vec<(&str, &str)> {
        let mut attrs = vec![("data-src", self.src.as_str())];
        if let Some(speed) = &self.network_speed {
            attrs.push(("data-network-speed", speed.as_str()));
        }
        if self.apply_blur {
            attrs.push(("apply-blur", ""));
        }
        if let Some(color) = &self.indicator_color {
            attrs.push(("indicator-color", color.as_str()));
        }
        if let Some(radius) = &self.border_radius {
            attrs.push(("border-radius", radius.as_str()));
        }
        attrs
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub runtime: RuntimeConfig,
    pub lazy_media: LazyMediaOptions,
    pub images: Vec<ImageSpec>,
    /// Sources the simulated network answers with "not found"
    pub missing: Vec<String>,
    /// Vertical space between images (px)
    pub gap: f64,
    /// Scroll distance per step; one viewport when unset
    pub scroll_step: Option<f64>,
    /// Time spent at each scroll position (ms)
    pub dwell_ms: u64,
    /// Time allowed for outstanding loads after the last scroll (ms)
    pub settle_ms: u64,
}

impl DemoConfig {
    pub fn load(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path))
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        let images = vec![
            ImageSpec::new("images/hero.jpg"),
            ImageSpec { border_radius: Some("12px".into()), ..ImageSpec::new("images/gallery-1.jpg") },
            ImageSpec { network_speed: Some("slow3g".into()), ..ImageSpec::new("images/gallery-2.jpg") },
            ImageSpec {
                network_speed: Some("2g".into()),
                apply_blur: true,
                ..ImageSpec::new("images/gallery-3.jpg")
            },
            ImageSpec { indicator_color: Some("crimson".into()), ..ImageSpec::new("images/gallery-4.jpg") },
            ImageSpec::new("images/missing.jpg"),
            ImageSpec {
                network_speed: Some("slow3g".into()),
                apply_blur: true,
                border_radius: Some("50%".into()),
                ..ImageSpec::new("images/footer.jpg")
            },
        ];

        Self {
            runtime: RuntimeConfig::default(),
            lazy_media: LazyMediaOptions::default(),
            images,
            missing: vec!["images/missing.jpg".to_string()],
            gap: 24.0,
            scroll_step: None,
            dwell_ms: 500,
            settle_ms: 6000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: DemoConfig = serde_json::from_str(
            r#"{ "runtime": { "viewport_height": 600 }, "images": [{ "src": "a.png", "apply_blur": true }] }"#,
        )
        .unwrap();

        assert_eq!(config.runtime.viewport_height, 600.0);
        assert_eq!(config.runtime.viewport_width, 1024.0);
        assert_eq!(config.images.len(), 1);
        assert!(config.images[0].apply_blur);
        assert_eq!(config.images[0].height, 400.0);
        assert_eq!(config.dwell_ms, 500);
    }

    #[test]
    fn test_default_page_mixes_profiles() {
        let config = DemoConfig::default();
        let speeds: Vec<_> = config.images.iter().filter_map(|i| i.network_speed.as_deref()).collect();
        assert!(speeds.contains(&"slow3g"));
        assert!(speeds.contains(&"2g"));
        assert!(config.images.iter().any(|i| config.missing.contains(&i.src)));
    }
}
