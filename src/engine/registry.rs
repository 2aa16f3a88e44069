//! Step runner registry.
//!
//! Holds the full set of step runners as an ordered collection. Resolution
//! scans in registration order and the first runner whose `matches`
//! predicate accepts the record wins; a record no runner accepts is an
//! unknown-step error. [`HandlerRegistry::validate`] is the pre-flight pass
//! the engine runs before anything executes.

use crate::error::{ImgForgeError, Result};
use crate::spec_file::StepSpec;
use crate::steps::StepHandler;

/// Ordered collection of step runners
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn StepHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a runner. Registration order is resolution order.
    pub fn register(&mut self, handler: Box<dyn StepHandler>) {
        self.handlers.push(handler);
    }

    /// Resolve a step record to its runner: first match wins.
    pub fn find(&self, step: &StepSpec) -> Result<&dyn StepHandler> {
        self.handlers
            .iter()
            .find(|h| h.matches(step))
            .map(|h| h.as_ref())
            .ok_or_else(|| ImgForgeError::unknown_step(step.to_string()))
    }

    /// Pre-flight check: every step must resolve to a runner before any
    /// step is allowed to execute.
    pub fn validate(&self, steps: &[StepSpec]) -> Result<()> {
        for step in steps {
            self.find(step)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
