//! Step parameter templating.
//!
//! Every parameter value of a step record is a Handlebars template rendered
//! against the union of the flattened [`Settings`](crate::settings::Settings)
//! and the current [`State`](crate::state::State) snapshot (state wins on a
//! key collision). This is a real templating language — conditionals and
//! helpers, not bare substitution — because step parameters legitimately
//! embed logic:
//!
//! ```yaml
//! shell: "mkdir -p {{#if cache_dir}}{{ cache_dir }}{{else}}/tmp/cache{{/if}}"
//! ```
//!
//! Expansion is pure: it never writes to settings or state. Strict mode is
//! on, so referencing an undefined variable fails that one step with a
//! template error instead of silently rendering nothing.

use handlebars::{Handlebars, handlebars_helper};
use serde_json::Value;
use std::path::Path;

use crate::error::{ImgForgeError, Result};
use crate::settings::Settings;
use crate::spec_file::StepSpec;
use crate::state::State;

handlebars_helper!(uppercase: |s: String| s.to_uppercase());
handlebars_helper!(lowercase: |s: String| s.to_lowercase());
handlebars_helper!(basename: |p: String| {
    Path::new(&p)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
});
handlebars_helper!(json: |v: Json| serde_json::to_string(v).unwrap_or_default());

/// Renders step parameters against settings + state
pub struct TemplateExpander {
    registry: Handlebars<'static>,
}

impl TemplateExpander {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);

        registry.register_helper("uppercase", Box::new(uppercase));
        registry.register_helper("lowercase", Box::new(lowercase));
        registry.register_helper("basename", Box::new(basename));
        registry.register_helper("json", Box::new(json));

        Self { registry }
    }

    /// Expand every parameter value of `step`.
    ///
    /// Returns a new record with the same keys in the same order. A render
    /// failure anywhere in the record fails the whole step with a template
    /// error naming it; other steps' expansions are unaffected.
    pub fn expand_step(
        &self,
        step: &StepSpec,
        settings: &Settings,
        state: &State,
    ) -> Result<StepSpec> {
        let context = Self::template_context(settings, state);

        let mut expanded = StepSpec::new();
        for (key, value) in step.iter() {
            let rendered = self
                .registry
                .render_template(value, &context)
                .map_err(|e| ImgForgeError::template(step.to_string(), e.to_string()))?;
            expanded.insert(key, rendered);
        }
        Ok(expanded)
    }

    // Settings first, then the state snapshot — state overrides settings.
    fn template_context(settings: &Settings, state: &State) -> Value {
        let mut vars = settings.template_vars();
        vars.extend(state.snapshot());
        Value::Object(vars)
    }
}

impl Default for TemplateExpander {
    fn default() -> Self {
        Self::new()
    }
}
