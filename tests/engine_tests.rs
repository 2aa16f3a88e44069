//! Tests for the build engine's orchestration guarantees
//!
//! These tests verify:
//! - Fail-fast forward execution and best-effort reverse teardown
//! - The attempted-steps ledger (appended before execution)
//! - Pre-flight validation aborting before anything runs
//! - Per-phase skip evaluation
//! - State visibility during template expansion

use imgforge::engine::Engine;
use imgforge::engine::registry::HandlerRegistry;
use imgforge::error::{ImgForgeError, Result};
use imgforge::reporter::Reporter;
use imgforge::settings::Settings;
use imgforge::spec_file::StepSpec;
use imgforge::state::State;
use imgforge::steps::StepHandler;

use std::cell::RefCell;
use std::rc::Rc;

// =============================================================================
// Test doubles
// =============================================================================

type EventLog = Rc<RefCell<Vec<String>>>;

/// Reporter capturing progress and error messages
#[derive(Default)]
struct CollectingReporter {
    progress: RefCell<Vec<String>>,
    errors: RefCell<Vec<String>>,
}

impl Reporter for CollectingReporter {
    fn progress(&self, message: &str) {
        self.progress.borrow_mut().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.borrow_mut().push(message.to_string());
    }
}

/// Handler for `step` records that logs every call and fails on demand.
///
/// Step records look like `{step: "a"}`; the value is the step's id. The
/// optional `dev` parameter is recorded after expansion, which lets tests
/// observe exactly what the expander produced.
struct ScriptedHandler {
    events: EventLog,
    fail_runs: Vec<String>,
    fail_teardowns: Vec<String>,
}

impl ScriptedHandler {
    fn new(events: EventLog) -> Self {
        Self {
            events,
            fail_runs: Vec::new(),
            fail_teardowns: Vec::new(),
        }
    }

    fn failing_runs(events: EventLog, ids: &[&str]) -> Self {
        Self {
            events,
            fail_runs: ids.iter().map(|s| s.to_string()).collect(),
            fail_teardowns: Vec::new(),
        }
    }

    fn failing_teardowns(events: EventLog, ids: &[&str]) -> Self {
        Self {
            events,
            fail_runs: Vec::new(),
            fail_teardowns: ids.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl StepHandler for ScriptedHandler {
    fn name(&self) -> &'static str {
        "step"
    }

    fn run(&self, step: &StepSpec, _settings: &Settings, _state: &mut State) -> Result<()> {
        let id = step.require("step")?.to_string();
        self.events.borrow_mut().push(format!("run:{id}"));
        if let Some(dev) = step.get("dev") {
            self.events.borrow_mut().push(format!("dev:{id}:{dev}"));
        }
        if self.fail_runs.contains(&id) {
            return Err(ImgForgeError::handler(format!("step {id} exploded")));
        }
        Ok(())
    }

    fn teardown(&self, step: &StepSpec, _settings: &Settings, _state: &mut State) -> Result<()> {
        let id = step.require("step")?.to_string();
        self.events.borrow_mut().push(format!("teardown:{id}"));
        if self.fail_teardowns.contains(&id) {
            return Err(ImgForgeError::handler(format!("teardown {id} exploded")));
        }
        Ok(())
    }
}

/// Handler for `set` records: writes one state entry during run
struct SetterHandler;

impl StepHandler for SetterHandler {
    fn name(&self) -> &'static str {
        "set"
    }

    fn run(&self, step: &StepSpec, _settings: &Settings, state: &mut State) -> Result<()> {
        state.set(step.require("key")?, step.require("value")?);
        Ok(())
    }
}

/// Handler for `toggle` records: skips itself once its state key is set
struct TogglingHandler {
    events: EventLog,
}

impl StepHandler for TogglingHandler {
    fn name(&self) -> &'static str {
        "toggle"
    }

    fn skip(&self, _step: &StepSpec, _settings: &Settings, state: &State) -> Result<bool> {
        Ok(state.is_truthy("toggled"))
    }

    fn run(&self, _step: &StepSpec, _settings: &Settings, state: &mut State) -> Result<()> {
        self.events.borrow_mut().push("run:toggle".to_string());
        state.set("toggled", true);
        Ok(())
    }

    fn teardown(&self, _step: &StepSpec, _settings: &Settings, _state: &mut State) -> Result<()> {
        self.events.borrow_mut().push("teardown:toggle".to_string());
        Ok(())
    }
}

/// Handler for `noop` records: always asks to be skipped
struct AlwaysSkipHandler {
    events: EventLog,
}

impl StepHandler for AlwaysSkipHandler {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn skip(&self, _step: &StepSpec, _settings: &Settings, _state: &State) -> Result<bool> {
        Ok(true)
    }

    fn run(&self, _step: &StepSpec, _settings: &Settings, _state: &mut State) -> Result<()> {
        self.events.borrow_mut().push("run:noop".to_string());
        Ok(())
    }

    fn teardown(&self, _step: &StepSpec, _settings: &Settings, _state: &mut State) -> Result<()> {
        self.events.borrow_mut().push("teardown:noop".to_string());
        Ok(())
    }
}

fn events() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

fn step_list(ids: &[&str]) -> Vec<StepSpec> {
    ids.iter()
        .map(|id| StepSpec::from_pairs([("step", *id)]))
        .collect()
}

// =============================================================================
// Forward execution and teardown ordering
// =============================================================================

#[test]
fn test_clean_run_tears_down_in_reverse() {
    let log = events();
    let mut registry = HandlerRegistry::new();
    registry.register(Box::new(ScriptedHandler::new(log.clone())));
    let reporter = CollectingReporter::default();

    let mut engine = Engine::new(&registry, &reporter);
    let report = engine
        .execute(&step_list(&["a", "b", "c"]), &Settings::default())
        .unwrap();

    assert!(report.success());
    assert_eq!(report.steps_attempted, 3);
    assert_eq!(
        *log.borrow(),
        vec![
            "run:a",
            "run:b",
            "run:c",
            "teardown:c",
            "teardown:b",
            "teardown:a",
        ]
    );
    assert!(
        reporter
            .progress
            .borrow()
            .iter()
            .any(|m| m.contains("All went fine"))
    );
}

#[test]
fn test_run_failure_is_fail_fast_with_reverse_teardown() {
    let log = events();
    let mut registry = HandlerRegistry::new();
    registry.register(Box::new(ScriptedHandler::failing_runs(log.clone(), &["b"])));
    let reporter = CollectingReporter::default();

    let mut engine = Engine::new(&registry, &reporter);
    let report = engine
        .execute(&step_list(&["a", "b", "c"]), &Settings::default())
        .unwrap();

    // b failed: attempted a and b, c never touched, teardown b then a
    assert!(report.meltdown);
    assert_eq!(report.steps_attempted, 2);
    assert_eq!(
        *log.borrow(),
        vec!["run:a", "run:b", "teardown:b", "teardown:a"]
    );
    assert!(
        reporter
            .progress
            .borrow()
            .iter()
            .any(|m| m.contains("Something went wrong"))
    );
    assert_eq!(reporter.errors.borrow().len(), 1);
}

#[test]
fn test_first_step_failure_still_gets_torn_down() {
    let log = events();
    let mut registry = HandlerRegistry::new();
    registry.register(Box::new(ScriptedHandler::failing_runs(log.clone(), &["a"])));
    let reporter = CollectingReporter::default();

    let mut engine = Engine::new(&registry, &reporter);
    let report = engine
        .execute(&step_list(&["a", "b"]), &Settings::default())
        .unwrap();

    assert!(report.meltdown);
    assert_eq!(report.steps_attempted, 1);
    assert_eq!(*log.borrow(), vec!["run:a", "teardown:a"]);
}

#[test]
fn test_empty_step_list_succeeds() {
    let log = events();
    let mut registry = HandlerRegistry::new();
    registry.register(Box::new(ScriptedHandler::new(log.clone())));
    let reporter = CollectingReporter::default();

    let mut engine = Engine::new(&registry, &reporter);
    let report = engine.execute(&[], &Settings::default()).unwrap();

    assert!(report.success());
    assert_eq!(report.steps_attempted, 0);
    assert!(log.borrow().is_empty());
}

// =============================================================================
// Pre-flight validation
// =============================================================================

#[test]
fn test_unknown_step_aborts_before_anything_runs() {
    let log = events();
    let mut registry = HandlerRegistry::new();
    registry.register(Box::new(ScriptedHandler::new(log.clone())));
    let reporter = CollectingReporter::default();

    // Unknown type in the middle: even step 1 must not run
    let steps = vec![
        StepSpec::from_pairs([("step", "a")]),
        StepSpec::from_pairs([("frobnicate", "x")]),
        StepSpec::from_pairs([("step", "c")]),
    ];

    let mut engine = Engine::new(&registry, &reporter);
    let err = engine.execute(&steps, &Settings::default()).unwrap_err();

    assert!(matches!(err, ImgForgeError::UnknownStep(_)));
    assert!(err.is_spec_error());
    assert!(log.borrow().is_empty(), "no run or teardown may happen");
}

// =============================================================================
// Teardown is best-effort
// =============================================================================

#[test]
fn test_teardown_failure_keeps_going() {
    let log = events();
    let mut registry = HandlerRegistry::new();
    registry.register(Box::new(ScriptedHandler::failing_teardowns(
        log.clone(),
        &["c"],
    )));
    let reporter = CollectingReporter::default();

    let mut engine = Engine::new(&registry, &reporter);
    let report = engine
        .execute(&step_list(&["a", "b", "c"]), &Settings::default())
        .unwrap();

    // teardown(c) fails first, b and a are still torn down
    assert!(report.meltdown);
    assert_eq!(
        *log.borrow(),
        vec![
            "run:a",
            "run:b",
            "run:c",
            "teardown:c",
            "teardown:b",
            "teardown:a",
        ]
    );
    assert_eq!(reporter.errors.borrow().len(), 1);
}

#[test]
fn test_every_teardown_failure_is_reported() {
    let log = events();
    let mut registry = HandlerRegistry::new();
    registry.register(Box::new(ScriptedHandler::failing_teardowns(
        log.clone(),
        &["b", "c"],
    )));
    let reporter = CollectingReporter::default();

    let mut engine = Engine::new(&registry, &reporter);
    let report = engine
        .execute(&step_list(&["a", "b", "c"]), &Settings::default())
        .unwrap();

    assert!(report.meltdown);
    assert_eq!(reporter.errors.borrow().len(), 2);
    assert!(log.borrow().contains(&"teardown:a".to_string()));
}

// =============================================================================
// Template expansion against accumulated state
// =============================================================================

#[test]
fn test_expansion_sees_state_from_earlier_steps() {
    let log = events();
    let mut registry = HandlerRegistry::new();
    registry.register(Box::new(ScriptedHandler::new(log.clone())));
    registry.register(Box::new(SetterHandler));
    let reporter = CollectingReporter::default();

    let steps = vec![
        StepSpec::from_pairs([("set", "x"), ("key", "mydev"), ("value", "/dev/sda1")]),
        StepSpec::from_pairs([("step", "b"), ("dev", "{{ mydev }}")]),
    ];

    let mut engine = Engine::new(&registry, &reporter);
    let report = engine.execute(&steps, &Settings::default()).unwrap();

    assert!(report.success());
    assert!(log.borrow().contains(&"dev:b:/dev/sda1".to_string()));
}

#[test]
fn test_forward_reference_fails_that_step_only() {
    let log = events();
    let mut registry = HandlerRegistry::new();
    registry.register(Box::new(ScriptedHandler::new(log.clone())));
    registry.register(Box::new(SetterHandler));
    let reporter = CollectingReporter::default();

    // Step a references state that only step 2 would have produced: its
    // expansion fails, it is still in the ledger, and its teardown is
    // attempted (and fails to expand again, keep-going).
    let steps = vec![
        StepSpec::from_pairs([("step", "a"), ("dev", "{{ later }}")]),
        StepSpec::from_pairs([("set", "x"), ("key", "later"), ("value", "v")]),
    ];

    let mut engine = Engine::new(&registry, &reporter);
    let report = engine.execute(&steps, &Settings::default()).unwrap();

    assert!(report.meltdown);
    assert_eq!(report.steps_attempted, 1);
    assert!(log.borrow().is_empty(), "step a never ran");
    // One template error from the run phase, one from the teardown phase
    assert_eq!(reporter.errors.borrow().len(), 2);
    assert!(reporter.errors.borrow()[0].contains("Template error"));
}

// =============================================================================
// Skip semantics
// =============================================================================

#[test]
fn test_skip_is_evaluated_per_phase() {
    let log = events();
    let mut registry = HandlerRegistry::new();
    registry.register(Box::new(TogglingHandler { events: log.clone() }));
    let reporter = CollectingReporter::default();

    let steps = vec![StepSpec::from_pairs([("toggle", "x")])];
    let mut engine = Engine::new(&registry, &reporter);
    let report = engine.execute(&steps, &Settings::default()).unwrap();

    // run set the `toggled` fact, so the teardown-phase skip fires
    assert!(report.success());
    assert_eq!(*log.borrow(), vec!["run:toggle"]);
}

#[test]
fn test_skipped_steps_still_enter_the_ledger() {
    let log = events();
    let mut registry = HandlerRegistry::new();
    registry.register(Box::new(ScriptedHandler::new(log.clone())));
    registry.register(Box::new(AlwaysSkipHandler { events: log.clone() }));
    let reporter = CollectingReporter::default();

    let steps = vec![
        StepSpec::from_pairs([("step", "a")]),
        StepSpec::from_pairs([("noop", "x")]),
        StepSpec::from_pairs([("step", "c")]),
    ];

    let mut engine = Engine::new(&registry, &reporter);
    let report = engine.execute(&steps, &Settings::default()).unwrap();

    assert!(report.success());
    assert_eq!(report.steps_attempted, 3);
    assert_eq!(
        *log.borrow(),
        vec!["run:a", "run:c", "teardown:c", "teardown:a"]
    );
}
