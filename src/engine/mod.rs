//! Build engine — the control loop that turns a step list into a build.
//!
//! The engine owns the run lifecycle:
//!
//! ```text
//! Idle
//!     ↓
//! Validating      every step must resolve to a runner, or nothing runs
//!     ↓
//! Running         forward, in list order, fail-fast
//!     ↓
//! Succeeded / Failed
//!     ↓
//! TearingDown     reverse ledger order, best-effort, keep-going
//!     ↓
//! Done            meltdown flag decides the overall outcome
//! ```
//!
//! The attempted-steps ledger is the one source of truth for teardown: a
//! step is appended *before* it executes, so the step that failed — even
//! one whose parameters never expanded — is still torn down. Any failure
//! in either phase flips the meltdown flag; only the Running phase stops
//! at the first failure.

pub mod registry;

use tracing::{debug, info};

use crate::error::Result;
use crate::reporter::Reporter;
use crate::settings::Settings;
use crate::spec_file::StepSpec;
use crate::state::State;
use crate::steps::StepHandler;
use crate::template::TemplateExpander;
use registry::HandlerRegistry;

/// Which of the two step operations a phase invokes.
///
/// Selection is always an explicit match on this enum — never a lookup of
/// a method by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Run,
    Teardown,
}

/// Engine lifecycle stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStage {
    Idle,
    Validating,
    Running,
    Succeeded,
    Failed,
    TearingDown,
    Done,
}

impl EngineStage {
    pub const fn description(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating steps",
            Self::Running => "running steps",
            Self::Succeeded => "all steps succeeded",
            Self::Failed => "a step failed",
            Self::TearingDown => "tearing down",
            Self::Done => "done",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }
}

impl std::fmt::Display for EngineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Outcome of one engine run
#[derive(Debug, Clone, Copy)]
pub struct RunReport {
    /// True when any failure was reported in either phase.
    pub meltdown: bool,
    /// How many steps entered the Running phase (the ledger length).
    pub steps_attempted: usize,
}

impl RunReport {
    pub fn success(&self) -> bool {
        !self.meltdown
    }
}

/// The build engine: validates, runs forward, always tears down
pub struct Engine<'a> {
    registry: &'a HandlerRegistry,
    reporter: &'a dyn Reporter,
    expander: TemplateExpander,
    stage: EngineStage,
}

impl<'a> Engine<'a> {
    pub fn new(registry: &'a HandlerRegistry, reporter: &'a dyn Reporter) -> Self {
        Self {
            registry,
            reporter,
            expander: TemplateExpander::new(),
            stage: EngineStage::Idle,
        }
    }

    pub fn stage(&self) -> EngineStage {
        self.stage
    }

    /// Execute a build: validate, run forward, tear down in reverse.
    ///
    /// Returns `Err` only when pre-flight validation fails — in that case
    /// zero steps were attempted and there is nothing to tear down. Every
    /// later failure is folded into the report's meltdown flag instead.
    pub fn execute(&mut self, steps: &[StepSpec], settings: &Settings) -> Result<RunReport> {
        self.transition(EngineStage::Validating);
        self.registry.validate(steps)?;

        self.transition(EngineStage::Running);
        let mut state = State::new();
        let (ledger, mut meltdown) = self.run_forward(steps, settings, &mut state);

        self.transition(if meltdown {
            EngineStage::Failed
        } else {
            EngineStage::Succeeded
        });
        if meltdown {
            self.reporter.progress("Something went wrong, cleaning up!");
        } else {
            self.reporter.progress("All went fine, cleaning up.");
        }

        self.transition(EngineStage::TearingDown);
        meltdown |= self.run_teardowns(&ledger, settings, &mut state);

        self.transition(EngineStage::Done);
        Ok(RunReport {
            meltdown,
            steps_attempted: ledger.len(),
        })
    }

    // Forward pass: list order, fail-fast. Returns the ledger of attempted
    // steps together with the meltdown flag.
    fn run_forward(
        &self,
        steps: &[StepSpec],
        settings: &Settings,
        state: &mut State,
    ) -> (Vec<StepSpec>, bool) {
        let mut ledger: Vec<StepSpec> = Vec::new();

        for step in steps {
            info!("Running step: {}", step);
            // Appended before execution: a failing step still gets its
            // teardown.
            ledger.push(step.clone());

            if let Err(err) = self.run_one(step, settings, state, Phase::Run) {
                self.reporter.error(&err.to_string());
                return (ledger, true);
            }
        }

        (ledger, false)
    }

    // Reverse pass: exact reverse of the ledger, keep-going. Returns true
    // when any teardown failed.
    fn run_teardowns(&self, ledger: &[StepSpec], settings: &Settings, state: &mut State) -> bool {
        let mut meltdown = false;

        for step in ledger.iter().rev() {
            info!("Running teardown: {}", step);
            if let Err(err) = self.run_one(step, settings, state, Phase::Teardown) {
                self.reporter.error(&err.to_string());
                meltdown = true;
            }
        }

        meltdown
    }

    // One step in one phase: expand, resolve, skip-check, then the phase
    // operation. Skip sees the unexpanded record; run/teardown see the
    // expanded one.
    fn run_one(
        &self,
        step: &StepSpec,
        settings: &Settings,
        state: &mut State,
        phase: Phase,
    ) -> Result<()> {
        let expanded = self.expander.expand_step(step, settings, state)?;
        let handler: &dyn StepHandler = self.registry.find(step)?;

        if handler.skip(step, settings, state)? {
            info!("Skipping as requested");
            return Ok(());
        }

        match phase {
            Phase::Run => handler.run(&expanded, settings, state),
            Phase::Teardown => handler.teardown(&expanded, settings, state),
        }
    }

    fn transition(&mut self, stage: EngineStage) {
        debug!("engine: {} -> {}", self.stage, stage);
        self.stage = stage;
    }
}
