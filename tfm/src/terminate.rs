//! The "abort the pipeline" capability used by strict-mode failures.
//!
//! Production code exits the process; tests swap in an implementation that
//! records the requested exit code and returns.

use std::io::Write;

pub trait Terminate: Send + Sync {
    /// Ends the program with `exit_code`. Implementations other than
    /// [`ExitProcess`] may return, in which case callers continue as if the
    /// failure were non-strict.
    fn terminate(&self, exit_code: i32);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExitProcess;

impl Terminate for ExitProcess {
    fn terminate(&self, exit_code: i32) {
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
        std::process::exit(exit_code);
    }
}
