//! Built-in step runners.
//!
//! A step runner is the pluggable implementation behind one step type. The
//! engine only ever talks to the capability interface below: `matches` for
//! resolution, `skip` for per-phase opt-out, `run` for the forward pass and
//! `teardown` for the reverse pass. Everything a runner learns that later
//! steps (or its own teardown) need goes into [`State`].
//!
//! Runners receive the *unexpanded* record in `matches` and `skip`, and the
//! *expanded* record in `run` and `teardown`.

pub mod mkfs;
pub mod mkimg;
pub mod mount;
pub mod parted;
pub mod shell;

use crate::engine::registry::HandlerRegistry;
use crate::error::Result;
use crate::settings::Settings;
use crate::spec_file::StepSpec;
use crate::state::State;

/// Capability interface implemented by every step runner
pub trait StepHandler {
    /// The type discriminator key this runner answers to.
    fn name(&self) -> &'static str;

    /// Whether this runner handles the given step record.
    fn matches(&self, step: &StepSpec) -> bool {
        step.contains_key(self.name())
    }

    /// Whether the step should be skipped in the current phase.
    ///
    /// Evaluated independently before `run` and again before `teardown`;
    /// a runner consulting [`State`] here may legitimately answer
    /// differently per phase.
    fn skip(&self, _step: &StepSpec, _settings: &Settings, _state: &State) -> Result<bool> {
        Ok(false)
    }

    /// Execute the step. May record facts in `state`.
    fn run(&self, step: &StepSpec, settings: &Settings, state: &mut State) -> Result<()>;

    /// Undo the step during the reverse pass. Default: nothing to undo.
    fn teardown(&self, _step: &StepSpec, _settings: &Settings, _state: &mut State) -> Result<()> {
        Ok(())
    }
}

/// Registry with every built-in step runner, in resolution order.
pub fn builtin_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.register(Box::new(mkimg::MkimgHandler));
    registry.register(Box::new(parted::MklabelHandler));
    registry.register(Box::new(parted::MkpartHandler));
    registry.register(Box::new(mkfs::MkfsHandler));
    registry.register(Box::new(mount::MountHandler));
    registry.register(Box::new(shell::ShellHandler));
    registry
}
