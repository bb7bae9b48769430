//! Profile mapper.
//!
//! Turns identity-provider attributes into the application-facing profile
//! using a per-deployment `field → template` mapping, e.g.
//! `{"authenticated_userid": "{{email}}"}`. Templates are handlebars;
//! rendering is pure and deterministic for a fixed attribute set.

use std::collections::HashMap;

use handlebars::Handlebars;

use crate::error::{BridgeError, BridgeResult};

/// Profile emitted when a deployment has no mapping configured.
const MISSING_CONFIG_MESSAGE: &str = "Profile configuration missing";

/// Renders the application profile from assertion attributes.
pub struct ProfileMapper {
    registry: Handlebars<'static>,
    configured: bool,
}

impl ProfileMapper {
    /// Builds a mapper from `field → template` pairs.
    ///
    /// Templates are compiled up front so a broken mapping fails at startup
    /// instead of on the first login.
    pub fn new(mapping: &HashMap<String, String>) -> BridgeResult<Self> {
        let mut registry = base_registry();
        for (field, template) in mapping {
            registry.register_template_string(field, template).map_err(|e| {
                BridgeError::internal(format!("invalid profile template for `{field}`: {e}"))
            })?;
        }
        Ok(Self { registry, configured: true })
    }

    /// Mapper for deployments without a profile mapping.
    ///
    /// Renders a single diagnostic field instead of failing, so the flow
    /// proceeds and the configuration gap is visible to the client.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self { registry: base_registry(), configured: false }
    }

    /// Builds from an optional mapping, falling back to [`unconfigured`](Self::unconfigured).
    pub fn from_mapping(mapping: Option<&HashMap<String, String>>) -> BridgeResult<Self> {
        match mapping {
            Some(mapping) => Self::new(mapping),
            None => Ok(Self::unconfigured()),
        }
    }

    /// Renders every configured field against the attribute set.
    ///
    /// Never fails the caller: templates referencing absent attributes
    /// render them as empty (non-strict mode), and a field whose template
    /// errors out is logged and skipped.
    #[must_use]
    pub fn render(&self, attributes: &HashMap<String, String>) -> HashMap<String, String> {
        if !self.configured {
            return HashMap::from([(
                "message".to_string(),
                MISSING_CONFIG_MESSAGE.to_string(),
            )]);
        }

        let mut profile = HashMap::with_capacity(self.registry.get_templates().len());
        for field in self.registry.get_templates().keys() {
            match self.registry.render(field, attributes) {
                Ok(value) => {
                    profile.insert(field.clone(), value);
                }
                Err(error) => {
                    tracing::warn!(field = %field, %error, "profile template failed to render");
                }
            }
        }
        profile
    }
}

impl std::fmt::Debug for ProfileMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileMapper")
            .field("configured", &self.configured)
            .field("fields", &self.registry.get_templates().len())
            .finish()
    }
}

/// Registry defaults shared by both constructors. Profile values are plain
/// strings handed to the authorization server, not markup, so HTML escaping
/// is disabled.
fn base_registry() -> Handlebars<'static> {
    let mut registry = Handlebars::new();
    registry.register_escape_fn(handlebars::no_escape);
    registry
}
