//! Runs a single command line through the tfm runner, e.g.
//! `tfm-exec --decorate --outcome "terraform fmt -check"`.

use clap::Parser;

use tfm::process::{ExecutionFlags, Runner};

#[derive(Debug, Parser)]
#[command(name = "tfm-exec", version, about = "Run one command through the tfm runner")]
struct ExecCli {
    /// Terminate with the command's exit code when it fails
    #[arg(long)]
    strict: bool,

    /// Capture output through pipes and tag each relayed line
    #[arg(long)]
    decorate: bool,

    /// Do not relay the command's output
    #[arg(long)]
    no_output: bool,

    /// Do not print the status line
    #[arg(long)]
    no_status: bool,

    /// Append the outcome after the status glyph
    #[arg(long)]
    outcome: bool,

    /// Echo the command line before running it
    #[arg(long)]
    print_cmd: bool,

    #[arg(long, default_value = "Running command")]
    message: String,

    #[arg(long)]
    fail_message: Option<String>,

    /// Exit codes treated as success (repeatable; default 0)
    #[arg(long = "valid-exit-code")]
    valid_exit_codes: Vec<i32>,

    #[arg(long)]
    cwd: Option<std::path::PathBuf>,

    /// Print `exit_code=<n> success=<bool>` once the runner returns
    #[arg(long)]
    report: bool,

    command_line: String,
}

fn main() {
    let cli = ExecCli::parse();
    let mut flags = ExecutionFlags {
        strict: cli.strict,
        print_cmd: cli.print_cmd,
        decorate_output: cli.decorate,
        print_output: !cli.no_output,
        print_status: !cli.no_status,
        print_outcome: cli.outcome,
        ..ExecutionFlags::default()
    };
    if !cli.valid_exit_codes.is_empty() {
        flags = flags.with_valid_exit_codes(cli.valid_exit_codes.iter().copied());
    }

    let mut runner = Runner::new();
    if let Some(dir) = cli.cwd {
        runner = runner.working_dir(dir);
    }
    let result = runner.run(
        &cli.command_line,
        &cli.message,
        &flags,
        cli.fail_message.as_deref(),
    );
    if cli.report {
        println!(
            "exit_code={} success={}",
            result.exit_code(),
            result.success()
        );
    }
    if !result.error_detail().is_empty() {
        eprintln!("tfm-exec: {}", result.error_detail());
    }
    std::process::exit(result.exit_code());
}
