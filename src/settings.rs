//! Read-only run settings.
//!
//! `Settings` carries the values fixed at invocation time: the spec file
//! path, the output image path, and the verbosity toggle. The core never
//! mutates it; it travels by reference into every handler and expander
//! call, and its fields are flattened into the template context so step
//! parameters can reference them (e.g. `{{ image }}`).

use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::cli::Cli;

/// Settings fixed for the duration of one build
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Path of the build specification file
    pub spec: PathBuf,
    /// Output image path, if requested on the command line
    pub image: Option<PathBuf>,
    /// Verbose progress output
    pub verbose: bool,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            spec: cli.spec.clone(),
            image: cli.image.clone(),
            verbose: cli.verbose,
        }
    }

    /// Flatten the settings into template variables.
    ///
    /// `image` is always present — the empty string when no `--image` was
    /// given — so specs can reference `{{ image }}` without tripping the
    /// expander's strict mode.
    pub fn template_vars(&self) -> Map<String, Value> {
        let mut vars = Map::new();
        vars.insert(
            "spec".to_string(),
            Value::from(self.spec.display().to_string()),
        );
        vars.insert(
            "image".to_string(),
            Value::from(
                self.image
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            ),
        );
        vars.insert("verbose".to_string(), Value::from(self.verbose));
        vars
    }
}
