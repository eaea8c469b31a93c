//! Diagnostic output on stderr
//!
//! Stdout is reserved for JSON results, so every human-readable line the
//! pipeline prints goes through a [`Reporter`].

use console::style;
use std::fmt::Display;

/// Verbosity-aware printer for stderr diagnostics
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    quiet: bool,
    verbose: bool,
}

impl Reporter {
    pub fn new(quiet: bool, verbose: bool) -> Self {
        Self { quiet, verbose }
    }

    /// Reporter that prints nothing except errors
    pub fn silent() -> Self {
        Self {
            quiet: true,
            verbose: false,
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose && !self.quiet
    }

    /// Progress and summary lines
    pub fn info(&self, message: impl Display) {
        if !self.quiet {
            eprintln!("{} {}", style("→").blue(), message);
        }
    }

    /// Data-quality problems worth a look, recovered locally
    pub fn warn(&self, message: impl Display) {
        if !self.quiet {
            eprintln!("{} {}", style("!").yellow(), message);
        }
    }

    /// Per-record detail, shown only with --verbose
    pub fn detail(&self, message: impl Display) {
        if self.is_verbose() {
            eprintln!("  {} {}", style("·").dim(), message);
        }
    }

    /// Record-level failures that were skipped
    pub fn error(&self, message: impl Display) {
        eprintln!("{} {}", style("✗").red(), message);
    }
}
