//! `mkfs` step: create a filesystem on a device.
//!
//! ```yaml
//! - mkfs: ext4
//!   device: "{{ rootdev }}"
//!   label: rootfs
//! ```

use tracing::info;

use super::StepHandler;
use crate::command::run_checked;
use crate::error::Result;
use crate::settings::Settings;
use crate::spec_file::StepSpec;
use crate::state::State;

pub struct MkfsHandler;

impl StepHandler for MkfsHandler {
    fn name(&self) -> &'static str {
        "mkfs"
    }

    fn run(&self, step: &StepSpec, _settings: &Settings, _state: &mut State) -> Result<()> {
        let fstype = step.require("mkfs")?;
        let device = step.require("device")?;

        let program = format!("mkfs.{fstype}");
        let mut args: Vec<&str> = Vec::new();
        if let Some(label) = step.get("label") {
            // vfat spells the label flag differently from the ext family
            args.push(label_flag(fstype));
            args.push(label);
        }
        args.push(device);

        run_checked(&program, &args)?;
        info!("Created {} filesystem on {}", fstype, device);
        Ok(())
    }
}

fn label_flag(fstype: &str) -> &'static str {
    match fstype {
        "vfat" | "fat" | "fat32" | "msdos" => "-n",
        _ => "-L",
    }
}
