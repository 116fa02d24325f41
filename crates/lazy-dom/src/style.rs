//! Inline style declarations (`element.style`)

use std::fmt;

/// Ordered list of `property: value` declarations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    declarations: Vec<(String, String)>,
}

impl InlineStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a property value
    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations.iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    /// Set a property, keeping its original position if already present
    pub fn set(&mut self, property: &str, value: impl Into<String>) {
        let value = value.into();
        match self.declarations.iter_mut().find(|(p, _)| p == property) {
            Some((_, v)) => *v = value,
            None => self.declarations.push((property.to_string(), value)),
        }
    }

    /// Remove a property
    pub fn remove(&mut self, property: &str) -> Option<String> {
        let pos = self.declarations.iter().position(|(p, _)| p == property)?;
        Some(self.declarations.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Serialized `style` attribute text
    pub fn css_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for InlineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (property, value)) in self.declarations.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}: {};", property, value)?;
        }
        Ok(())
    }
}
