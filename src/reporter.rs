//! Progress and error reporting.
//!
//! The engine narrates a build through a [`Reporter`]: plain informational
//! strings and error strings. The contract is deliberately narrow — a
//! reporter accepts a message, never fails, and returns nothing the engine
//! consumes — so the engine's control flow can never depend on how output
//! is rendered.

use tracing::{error, info};

/// Sink for progress and error messages
pub trait Reporter {
    /// Report an informational progress message.
    fn progress(&self, message: &str);

    /// Report an error message.
    fn error(&self, message: &str);
}

/// Reporter writing to the terminal.
///
/// Progress lines go to stdout only when verbose output was requested;
/// they are always logged. Errors go to stderr unconditionally.
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Reporter for ConsoleReporter {
    fn progress(&self, message: &str) {
        info!("{message}");
        if self.verbose {
            println!("{message}");
        }
    }

    fn error(&self, message: &str) {
        error!("{message}");
        eprintln!("ERROR: {message}");
    }
}
