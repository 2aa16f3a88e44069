//! imgforge - main entry point
//!
//! Parses the command line, loads the build specification, and hands the
//! step list to the engine. The process exits non-zero when the spec fails
//! to load or validate, or when the meltdown flag was set by any step
//! during the run or the teardown pass.

use tracing::{debug, error, info};

use imgforge::cli::Cli;
use imgforge::engine::Engine;
use imgforge::reporter::{ConsoleReporter, Reporter};
use imgforge::settings::Settings;
use imgforge::spec_file::BuildSpec;
use imgforge::steps::builtin_registry;

/// Initialize the logger with appropriate settings
fn init_logger() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            // RUST_LOG overrides the default level
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logger();
    info!("imgforge starting up");

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    match run(cli) {
        Ok(true) => {}
        Ok(false) => {
            error!("An error occurred, exiting with non-zero exit code");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("✗ {e:#}");
            std::process::exit(1);
        }
    }
}

/// Run one build. `Ok(true)` means a clean run, `Ok(false)` a meltdown;
/// `Err` covers everything that stopped the build from starting.
fn run(cli: Cli) -> anyhow::Result<bool> {
    let settings = Settings::from_cli(&cli);
    let reporter = ConsoleReporter::new(settings.verbose);

    reporter.progress(&format!("Load spec file {}", settings.spec.display()));
    let spec = BuildSpec::load_from_file(&settings.spec)?;

    let registry = builtin_registry();
    let mut engine = Engine::new(&registry, &reporter);
    let report = engine.execute(&spec.steps, &settings)?;

    if report.success() {
        info!("Build finished: {} steps", report.steps_attempted);
    }
    Ok(report.success())
}
