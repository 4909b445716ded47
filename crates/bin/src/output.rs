//! Console output for command reports.

use userdao::commands::{ReportLevel, Reporter};

/// Prints reports for a human at a terminal.
///
/// Results go to stdout so they can be piped; errors go to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&self, level: ReportLevel, message: &str) {
        match level {
            ReportLevel::Info => println!("{message}"),
            ReportLevel::SubInfo => println!("  {message}"),
            ReportLevel::Error => eprintln!("error: {message}"),
        }
    }
}
