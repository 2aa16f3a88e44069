//! Partitioning steps backed by `parted -s`.
//!
//! ```yaml
//! - mklabel: gpt
//!   device: "{{ image }}"
//! - mkpart: primary
//!   device: "{{ image }}"
//!   start: 1MiB
//!   end: 100%
//!   part-tag: rootdev
//! ```
//!
//! `mkpart` keeps a per-device partition counter in state and, when the
//! step carries a `part-tag`, records the new partition's device path under
//! that tag so later steps can reference it (`{{ rootdev }}`).

use serde_json::Value;
use tracing::info;

use super::StepHandler;
use crate::command::run_checked;
use crate::error::Result;
use crate::settings::Settings;
use crate::spec_file::StepSpec;
use crate::state::State;

pub struct MklabelHandler;

impl StepHandler for MklabelHandler {
    fn name(&self) -> &'static str {
        "mklabel"
    }

    fn run(&self, step: &StepSpec, _settings: &Settings, _state: &mut State) -> Result<()> {
        let label_type = step.require("mklabel")?;
        let device = step.require("device")?;

        run_checked("parted", &["-s", device, "mklabel", label_type])?;
        info!("Created {} partition table on {}", label_type, device);
        Ok(())
    }
}

pub struct MkpartHandler;

impl StepHandler for MkpartHandler {
    fn name(&self) -> &'static str {
        "mkpart"
    }

    fn run(&self, step: &StepSpec, _settings: &Settings, state: &mut State) -> Result<()> {
        let part_type = step.require("mkpart")?;
        let device = step.require("device")?;
        let start = step.require("start")?;
        let end = step.require("end")?;

        run_checked("parted", &["-s", device, "mkpart", part_type, start, end])?;

        // Partition numbers are per device and 1-based; the counter lives
        // in state so several mkpart steps on the same device stay in sync.
        let counter_key = format!("partitions:{device}");
        let number = state
            .get(&counter_key)
            .and_then(Value::as_u64)
            .unwrap_or(0)
            + 1;
        state.set(counter_key, number);

        let partition = partition_path(device, number);
        info!("Created partition {} on {}", partition, device);

        if let Some(tag) = step.get("part-tag") {
            state.set(tag, partition);
        }
        Ok(())
    }
}

/// Generate a partition device path from a disk path and partition number.
///
/// Handles both `/dev/sdX` -> `/dev/sdX1` and `/dev/nvme0n1` -> `/dev/nvme0n1p1`
/// patterns (NVMe and loop devices use a 'p' separator).
fn partition_path(device: &str, number: u64) -> String {
    if device.ends_with(|c: char| c.is_ascii_digit()) {
        format!("{device}p{number}")
    } else {
        format!("{device}{number}")
    }
}
