//! `mkimg` step: create the target image file.
//!
//! ```yaml
//! - mkimg: "{{ image }}"
//!   size: 4G
//! ```
//!
//! Creates a sparse file truncated to the requested size and records its
//! path in state under `image_file`.

use std::fs;
use tracing::info;

use super::StepHandler;
use crate::error::{ImgForgeError, Result};
use crate::settings::Settings;
use crate::spec_file::StepSpec;
use crate::state::State;

pub struct MkimgHandler;

impl StepHandler for MkimgHandler {
    fn name(&self) -> &'static str {
        "mkimg"
    }

    fn run(&self, step: &StepSpec, _settings: &Settings, state: &mut State) -> Result<()> {
        let filename = step.require("mkimg")?;
        let size = step.require("size")?;
        let bytes = parse_size(size)?;

        let file = fs::File::create(filename)?;
        file.set_len(bytes)?;
        info!("Created image {} ({} bytes)", filename, bytes);

        state.set("image_file", filename);
        Ok(())
    }
}

/// Parse a size like `4096`, `512K`, `256M`, `4G`, or `1T` into bytes.
fn parse_size(spec: &str) -> Result<u64> {
    let spec = spec.trim();
    let (digits, multiplier) = match spec.chars().last() {
        Some(c) if c.is_ascii_digit() => (spec, 1u64),
        Some('K') | Some('k') => (&spec[..spec.len() - 1], 1u64 << 10),
        Some('M') | Some('m') => (&spec[..spec.len() - 1], 1u64 << 20),
        Some('G') | Some('g') => (&spec[..spec.len() - 1], 1u64 << 30),
        Some('T') | Some('t') => (&spec[..spec.len() - 1], 1u64 << 40),
        _ => {
            return Err(ImgForgeError::handler(format!(
                "invalid image size '{spec}'"
            )));
        }
    };

    let count: u64 = digits
        .trim()
        .parse()
        .map_err(|_| ImgForgeError::handler(format!("invalid image size '{spec}'")))?;

    count
        .checked_mul(multiplier)
        .ok_or_else(|| ImgForgeError::handler(format!("image size '{spec}' overflows")))
}
