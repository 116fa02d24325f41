//! Private render tree: scoped style sheet, spinner and image

use crate::LazyMediaConfig;
use lazy_dom::{DomError, InlineStyle, NodeId, ShadowRoot, ShadowRootMode};

/// Class of the spinner element
pub const SPINNER_CLASS: &str = "loader";

/// Spinner top border color unless `indicator-color` overrides it
pub const DEFAULT_INDICATOR_COLOR: &str = "blue";

/// Image opacity fade
pub const IMAGE_TRANSITION: &str = "opacity 1s ease-in-out";

/// Style sheet scoped to the element's shadow root
pub const STYLE_SHEET: &str = "
.loader {
  border: 16px solid #f3f3f3;
  border-top: 16px solid blue;
  border-radius: 50%;
  width: 50px;
  height: 50px;
  animation: spin 2s linear infinite;
}

@keyframes spin {
  0% { transform: rotate(0deg); }
  100% { transform: rotate(360deg); }
}
";

/// Read-only copy of what the element currently renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSnapshot {
    pub image_src: String,
    pub image_opacity: String,
    pub image_transition: String,
    pub image_display: Option<String>,
    pub image_border_radius: Option<String>,
    pub indicator_display: String,
    pub indicator_color: String,
}

impl RenderSnapshot {
    pub fn indicator_visible(&self) -> bool {
        self.indicator_display != "none"
    }
}

/// Closed shadow root holding `<style>`, the spinner and the image
#[derive(Debug)]
pub(crate) struct RenderScope {
    shadow: ShadowRoot,
    spinner: NodeId,
    image: NodeId,
}

impl RenderScope {
    pub(crate) fn build(host: NodeId, config: &LazyMediaConfig) -> Result<Self, DomError> {
        let mut shadow = ShadowRoot::new(host, ShadowRootMode::Closed);
        shadow.adopt_style_sheet(STYLE_SHEET)?;

        let spinner = shadow.append_element("div")?;
        {
            let el = shadow.tree_mut().element_mut(spinner)?;
            el.set_attr("class", SPINNER_CLASS);
            el.style.set("display", "block");
            if let Some(color) = &config.indicator_color {
                el.style.set("border-top-color", color.as_str());
            }
        }

        let image = shadow.append_element("img")?;
        {
            let el = shadow.tree_mut().element_mut(image)?;
            el.style.set("opacity", "0");
            el.style.set("transition", IMAGE_TRANSITION);
        }

        let mut scope = Self { shadow, spinner, image };
        scope.set_corner_radius(config.corner_radius.as_deref());
        Ok(scope)
    }

    pub(crate) fn shadow(&self) -> &ShadowRoot {
        &self.shadow
    }

    fn style_mut(&mut self, id: NodeId) -> Option<&mut InlineStyle> {
        self.shadow.tree_mut().element_mut(id).ok().map(|el| &mut el.style)
    }

    pub(crate) fn image_src(&self) -> &str {
        self.shadow.tree()
            .element(self.image)
            .ok()
            .and_then(|el| el.get_attr("src"))
            .unwrap_or("")
    }

    pub(crate) fn set_image_src(&mut self, src: &str) {
        if let Ok(el) = self.shadow.tree_mut().element_mut(self.image) {
            el.set_attr("src", src);
        }
    }

    pub(crate) fn set_image_opacity(&mut self, opacity: &str) {
        if let Some(style) = self.style_mut(self.image) {
            style.set("opacity", opacity);
        }
    }

    pub(crate) fn set_image_display(&mut self, display: &str) {
        if let Some(style) = self.style_mut(self.image) {
            style.set("display", display);
        }
    }

    pub(crate) fn set_indicator_visible(&mut self, visible: bool) {
        if let Some(style) = self.style_mut(self.spinner) {
            style.set("display", if visible { "block" } else { "none" });
        }
    }

    pub(crate) fn set_corner_radius(&mut self, radius: Option<&str>) {
        if let Some(style) = self.style_mut(self.image) {
            match radius {
                Some(value) => style.set("border-radius", value),
                None => {
                    style.remove("border-radius");
                }
            }
        }
    }

    pub(crate) fn snapshot(&self) -> RenderSnapshot {
        let tree = self.shadow.tree();
        let image = tree.element(self.image).ok();
        let spinner = tree.element(self.spinner).ok();
        let image_style = |p: &str| image.and_then(|el| el.style.get(p)).map(str::to_string);

        RenderSnapshot {
            image_src: self.image_src().to_string(),
            image_opacity: image_style("opacity").unwrap_or_default(),
            image_transition: image_style("transition").unwrap_or_default(),
            image_display: image_style("display"),
            image_border_radius: image_style("border-radius"),
            indicator_display: spinner
                .and_then(|el| el.style.get("display"))
                .unwrap_or("block")
                .to_string(),
            indicator_color: spinner
                .and_then(|el| el.style.get("border-top-color"))
                .unwrap_or(DEFAULT_INDICATOR_COLOR)
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazy_dom::DomTree;

    fn host() -> NodeId {
        DomTree::new().create_element("lazy-image-loader")
    }

    #[test]
    fn test_initial_render() {
        let scope = RenderScope::build(host(), &LazyMediaConfig::default()).unwrap();
        let snap = scope.snapshot();

        assert_eq!(snap.image_src, "");
        assert_eq!(snap.image_opacity, "0");
        assert_eq!(snap.image_transition, IMAGE_TRANSITION);
        assert!(snap.indicator_visible());
        assert_eq!(snap.indicator_color, DEFAULT_INDICATOR_COLOR);
        assert_eq!(snap.image_border_radius, None);

        // <style>, spinner, image
        assert_eq!(scope.shadow().children().len(), 3);
        assert_eq!(scope.shadow().style_sheets(), &[STYLE_SHEET.to_string()]);
        assert!(scope.shadow().exposed().is_none());
    }

    #[test]
    fn test_configured_render() {
        let config = LazyMediaConfig {
            indicator_color: Some("tomato".into()),
            corner_radius: Some("12px".into()),
            ..Default::default()
        };
        let scope = RenderScope::build(host(), &config).unwrap();
        let snap = scope.snapshot();
        assert_eq!(snap.indicator_color, "tomato");
        assert_eq!(snap.image_border_radius.as_deref(), Some("12px"));
    }

    #[test]
    fn test_spinner_stylesheet_values() {
        for rule in ["width: 50px", "height: 50px", "animation: spin 2s linear infinite", "border-top: 16px solid blue"] {
            assert!(STYLE_SHEET.contains(rule), "missing {}", rule);
        }
    }
}
