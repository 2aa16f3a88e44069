//! `mount` step: mount a device, unmount it again on teardown.
//!
//! ```yaml
//! - mount: "{{ rootdev }}"
//!   dirname: /mnt/imgforge
//! ```
//!
//! A successful mount is recorded in state under `mounted:<dirname>`. The
//! teardown consults that record: a step whose `run` never got as far as
//! mounting (or that already unmounted) has nothing to undo, so the reverse
//! pass stays safe even for steps that failed mid-run.

use std::fs;
use tracing::{debug, info};

use super::StepHandler;
use crate::command::run_checked;
use crate::error::Result;
use crate::settings::Settings;
use crate::spec_file::StepSpec;
use crate::state::State;

pub struct MountHandler;

fn mounted_key(dirname: &str) -> String {
    format!("mounted:{dirname}")
}

impl StepHandler for MountHandler {
    fn name(&self) -> &'static str {
        "mount"
    }

    fn run(&self, step: &StepSpec, _settings: &Settings, state: &mut State) -> Result<()> {
        let device = step.require("mount")?;
        let dirname = step.require("dirname")?;

        fs::create_dir_all(dirname)?;
        run_checked("mount", &[device, dirname])?;
        info!("Mounted {} on {}", device, dirname);

        state.set(mounted_key(dirname), true);
        Ok(())
    }

    fn teardown(&self, step: &StepSpec, _settings: &Settings, state: &mut State) -> Result<()> {
        let dirname = step.require("dirname")?;
        let key = mounted_key(dirname);

        if !state.is_truthy(&key) {
            debug!("{} was never mounted, nothing to unmount", dirname);
            return Ok(());
        }

        run_checked("umount", &[dirname])?;
        info!("Unmounted {}", dirname);

        // State entries are never deleted; flip the record instead.
        state.set(key, false);
        Ok(())
    }
}
