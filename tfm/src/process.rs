use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::command_line::{CommandLineError, parse_command_line};
use crate::console;
use crate::format::{ansi, status};
use crate::streaming::run_pipe_capture;
use crate::terminate::{ExitProcess, Terminate};

pub const STRICT_MESSAGE: &str = "aborting...";
pub const NO_STRICT_MESSAGE: &str = "continuing...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionFlags {
    /// Terminate the program when the result is unsuccessful.
    pub strict: bool,
    pub print_cmd: bool,
    /// Capture through pipes and relay lines with a `[cmd]`/`[err]` tag.
    /// Leave off for anything that may prompt: the child then owns the terminal.
    pub decorate_output: bool,
    pub print_output: bool,
    pub print_message: bool,
    pub print_status: bool,
    pub print_outcome: bool,
    pub strict_message: String,
    pub no_strict_message: String,
    pub valid_exit_codes: BTreeSet<i32>,
}

impl Default for ExecutionFlags {
    fn default() -> Self {
        Self {
            strict: false,
            print_cmd: false,
            decorate_output: false,
            print_output: true,
            print_message: true,
            print_status: true,
            print_outcome: false,
            strict_message: STRICT_MESSAGE.to_string(),
            no_strict_message: NO_STRICT_MESSAGE.to_string(),
            valid_exit_codes: BTreeSet::from([0]),
        }
    }
}

impl ExecutionFlags {
    pub fn silent() -> Self {
        Self {
            print_output: false,
            print_message: false,
            print_status: false,
            print_outcome: false,
            ..Self::default()
        }
    }

    pub fn strict() -> Self {
        Self {
            strict: true,
            print_output: false,
            print_message: false,
            print_outcome: false,
            ..Self::default()
        }
    }

    pub fn silent_strict() -> Self {
        Self {
            strict: true,
            ..Self::silent()
        }
    }

    pub fn interactive() -> Self {
        Self {
            decorate_output: false,
            print_output: true,
            ..Self::default()
        }
    }

    /// Pipe-capture without relaying anything: for commands whose output the
    /// caller wants to parse.
    pub fn captured() -> Self {
        Self {
            decorate_output: true,
            ..Self::silent()
        }
    }

    pub fn with_valid_exit_codes(mut self, codes: impl IntoIterator<Item = i32>) -> Self {
        self.valid_exit_codes = codes.into_iter().collect();
        self
    }

    pub fn is_valid_exit_code(&self, exit_code: i32) -> bool {
        self.valid_exit_codes.contains(&exit_code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    exit_code: i32,
    success: bool,
    captured_stdout: String,
    captured_stderr: String,
    error_detail: String,
}

impl ExecutionResult {
    pub fn completed(
        exit_code: i32,
        flags: &ExecutionFlags,
        captured_stdout: String,
        captured_stderr: String,
    ) -> Self {
        Self {
            exit_code,
            success: flags.is_valid_exit_code(exit_code),
            captured_stdout,
            captured_stderr,
            error_detail: String::new(),
        }
    }

    /// The command never started: bad command line, missing executable, ...
    pub fn launch_failure(error_detail: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            success: false,
            captured_stdout: String::new(),
            captured_stderr: String::new(),
            error_detail: error_detail.into(),
        }
    }

    /// Outcome of an in-process check; `detail` lands on stdout when it
    /// passed and on stderr when it did not.
    pub fn native(passed: bool, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let (captured_stdout, captured_stderr) = if passed {
            (detail, String::new())
        } else {
            (String::new(), detail)
        };
        Self {
            exit_code: if passed { 0 } else { 1 },
            success: passed,
            captured_stdout,
            captured_stderr,
            error_detail: String::new(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn captured_stdout(&self) -> &str {
        &self.captured_stdout
    }

    pub fn captured_stderr(&self) -> &str {
        &self.captured_stderr
    }

    pub fn error_detail(&self) -> &str {
        &self.error_detail
    }

    pub fn is_launch_failure(&self) -> bool {
        !self.error_detail.is_empty()
    }
}

/// Launches command lines and reports on them. Each `run` owns its own child,
/// pipes and threads; a `Runner` can be shared across threads.
#[derive(Clone)]
pub struct Runner {
    working_dir: Option<PathBuf>,
    envs: Vec<(String, String)>,
    terminator: Arc<dyn Terminate>,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            working_dir: None,
            envs: vec![],
            terminator: Arc::new(ExitProcess),
        }
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("working_dir", &self.working_dir)
            .field("envs", &self.envs)
            .finish_non_exhaustive()
    }
}

impl Runner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.envs.retain(|(existing, _)| *existing != key);
        self.envs.push((key, value.into()));
        self
    }

    pub fn terminator(mut self, terminator: Arc<dyn Terminate>) -> Self {
        self.terminator = terminator;
        self
    }

    pub fn run(
        &self,
        command_line: &str,
        message: &str,
        flags: &ExecutionFlags,
        fail_message: Option<&str>,
    ) -> ExecutionResult {
        if flags.print_message {
            console::info(message);
        }
        if flags.print_cmd {
            console::info(&ansi::magenta(command_line));
        }
        let result = self.execute(command_line, flags);
        self.conclude(message, &result, flags, fail_message);
        result
    }

    pub fn run_native(
        &self,
        check: impl FnOnce() -> ExecutionResult,
        message: &str,
        flags: &ExecutionFlags,
        fail_message: Option<&str>,
    ) -> ExecutionResult {
        if flags.print_message {
            console::info(message);
        }
        let result = check();
        self.conclude(message, &result, flags, fail_message);
        result
    }

    fn conclude(
        &self,
        message: &str,
        result: &ExecutionResult,
        flags: &ExecutionFlags,
        fail_message: Option<&str>,
    ) {
        status::emit_status(message, result, flags, fail_message);
        if flags.strict && !result.success() {
            self.terminator.terminate(result.exit_code());
        }
    }

    fn execute(&self, command_line: &str, flags: &ExecutionFlags) -> ExecutionResult {
        console::debug(&format!("Executing command: {command_line}"));
        let parsed = match parse_command_line(command_line) {
            Ok(parsed) => parsed,
            Err(CommandLineError::Empty) => return ExecutionResult::launch_failure("empty command"),
            Err(err) => return ExecutionResult::launch_failure(err.to_string()),
        };
        console::debug(&format!(
            "Parsed command: {} {:?}",
            parsed.program, parsed.args
        ));

        let mut command = Command::new(&parsed.program);
        command.args(&parsed.args);
        if let Some(dir) = self.working_dir.as_deref() {
            command.current_dir(dir);
        }
        command.envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        if flags.decorate_output {
            run_captured(command, &parsed.program, flags)
        } else {
            run_pass_through(command, &parsed.program, flags)
        }
    }
}

fn launch_failure_for(program: &str, err: &std::io::Error) -> ExecutionResult {
    ExecutionResult::launch_failure(format!("failed to start {program}: {err}"))
}

fn exit_code_of(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

fn run_pass_through(mut command: Command, program: &str, flags: &ExecutionFlags) -> ExecutionResult {
    command
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    match command.status() {
        Ok(status) => {
            ExecutionResult::completed(exit_code_of(status), flags, String::new(), String::new())
        }
        Err(err) => launch_failure_for(program, &err),
    }
}

fn run_captured(command: Command, program: &str, flags: &ExecutionFlags) -> ExecutionResult {
    match run_pipe_capture(command, flags.print_output) {
        Ok(captured) => ExecutionResult::completed(
            exit_code_of(captured.status),
            flags,
            captured.stdout,
            captured.stderr,
        ),
        Err(err) => launch_failure_for(program, &err),
    }
}

pub fn run(
    command_line: &str,
    message: &str,
    flags: &ExecutionFlags,
    fail_message: Option<&str>,
) -> ExecutionResult {
    Runner::default().run(command_line, message, flags, fail_message)
}

pub fn run_native(
    check: impl FnOnce() -> ExecutionResult,
    message: &str,
    flags: &ExecutionFlags,
    fail_message: Option<&str>,
) -> ExecutionResult {
    Runner::default().run_native(check, message, flags, fail_message)
}

pub fn check_dir(path: &Path) -> ExecutionResult {
    console::debug(&format!("Native directory check: {}", path.display()));
    if path.is_dir() {
        ExecutionResult::native(true, format!("Directory exists: {}", path.display()))
    } else {
        ExecutionResult::native(false, format!("Directory does not exist: {}", path.display()))
    }
}

pub fn check_file(path: &Path) -> ExecutionResult {
    console::debug(&format!("Native file check: {}", path.display()));
    if path.is_file() {
        ExecutionResult::native(true, format!("File exists: {}", path.display()))
    } else {
        ExecutionResult::native(false, format!("File does not exist: {}", path.display()))
    }
}

pub fn check_not_empty(value: &str) -> ExecutionResult {
    console::debug(&format!("Native non-empty check: '{value}'"));
    if value.is_empty() {
        ExecutionResult::native(false, "String is empty")
    } else {
        ExecutionResult::native(true, format!("String is not empty: '{value}'"))
    }
}
