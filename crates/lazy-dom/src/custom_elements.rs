//! Custom Elements
//!
//! Registry of autonomous custom element names and the attributes each
//! one wants change notifications for.

use std::collections::HashMap;

/// Custom elements registry
#[derive(Debug, Default)]
pub struct CustomElementRegistry {
    definitions: HashMap<String, CustomElementDefinition>,
}

/// Custom element definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomElementDefinition {
    pub name: String,
    pub observed_attributes: Vec<String>,
}

impl CustomElementDefinition {
    /// Whether changes to `attribute` are delivered to the element
    pub fn observes(&self, attribute: &str) -> bool {
        self.observed_attributes.iter().any(|a| a == attribute)
    }
}

impl CustomElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a custom element
    pub fn define(&mut self, name: &str, observed_attributes: &[&str]) -> Result<(), CustomElementError> {
        if !Self::is_valid_name(name) {
            return Err(CustomElementError::InvalidName(name.to_string()));
        }
        if self.definitions.contains_key(name) {
            return Err(CustomElementError::AlreadyDefined(name.to_string()));
        }

        let definition = CustomElementDefinition {
            name: name.to_string(),
            observed_attributes: observed_attributes.iter().map(|a| a.to_string()).collect(),
        };
        tracing::debug!("Defined custom element <{}>", name);
        self.definitions.insert(name.to_string(), definition);
        Ok(())
    }

    /// Get element definition
    pub fn get(&self, name: &str) -> Option<&CustomElementDefinition> {
        self.definitions.get(name)
    }

    /// Check if element is defined
    pub fn is_defined(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Validate custom element name
    fn is_valid_name(name: &str) -> bool {
        // Must contain hyphen
        if !name.contains('-') {
            return false;
        }

        // Must start with lowercase letter
        if !name.chars().next().is_some_and(|c| c.is_ascii_lowercase()) {
            return false;
        }

        if name.chars().any(|c| c.is_ascii_uppercase() || c.is_whitespace()) {
            return false;
        }

        let reserved = ["annotation-xml", "color-profile", "font-face",
                       "font-face-src", "font-face-uri", "font-face-format",
                       "font-face-name", "missing-glyph"];
        !reserved.contains(&name)
    }
}

/// Custom element errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CustomElementError {
    #[error("Invalid custom element name: {0:?}")]
    InvalidName(String),

    #[error("Custom element already defined: {0}")]
    AlreadyDefined(String),
}
