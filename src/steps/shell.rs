//! `shell` step: run an arbitrary command through `sh -c`.
//!
//! ```yaml
//! - shell: "cp seed.conf {{ image }}.conf"
//!   teardown: "rm -f {{ image }}.conf"
//!   unless: seeded
//! ```
//!
//! The optional `teardown` parameter names a command for the reverse pass.
//! The optional `unless` parameter names a state key: when that key holds a
//! truthy value the step is skipped — evaluated fresh in each phase, so a
//! fact recorded during the forward pass can suppress the teardown (or the
//! other way around).

use tracing::info;

use super::StepHandler;
use crate::command::run_checked;
use crate::error::Result;
use crate::settings::Settings;
use crate::spec_file::StepSpec;
use crate::state::State;

pub struct ShellHandler;

impl StepHandler for ShellHandler {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn skip(&self, step: &StepSpec, _settings: &Settings, state: &State) -> Result<bool> {
        match step.get("unless") {
            Some(key) => Ok(state.is_truthy(key)),
            None => Ok(false),
        }
    }

    fn run(&self, step: &StepSpec, _settings: &Settings, _state: &mut State) -> Result<()> {
        let command = step.require("shell")?;
        info!("shell: {}", command);
        run_checked("sh", &["-c", command])?;
        Ok(())
    }

    fn teardown(&self, step: &StepSpec, _settings: &Settings, _state: &mut State) -> Result<()> {
        if let Some(command) = step.get("teardown") {
            info!("shell teardown: {}", command);
            run_checked("sh", &["-c", command])?;
        }
        Ok(())
    }
}
