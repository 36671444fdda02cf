use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::config::TfmConfig;
use crate::console;
use crate::error::TfmError;
use crate::exec_mode::{ExecMode, detect_exec_mode};
use crate::format::ansi;
use crate::process::{
    ExecutionFlags, ExecutionResult, Runner, check_dir, check_file, check_not_empty,
};

/// One fully parsed `tf` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command {
    pub product: String,
    pub module: String,
    pub env: String,
    pub module_instance: String,
    pub action: String,
    /// Appended verbatim to the terraform command line.
    pub action_flags: String,
    pub workspace: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Init,
    Plan,
    Apply,
    ApplyPlan,
    Destroy,
    Output,
    Get,
    Workspace,
    Providers,
    Import,
    Taint,
    Untaint,
    State,
    Refresh,
    Validate,
    Format,
    Show,
}

impl FromStr for Action {
    type Err = TfmError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(match raw {
            "init" => Action::Init,
            "plan" => Action::Plan,
            "apply" => Action::Apply,
            "apply_plan" => Action::ApplyPlan,
            "destroy" => Action::Destroy,
            "output" => Action::Output,
            "get" => Action::Get,
            "workspace" => Action::Workspace,
            "providers" => Action::Providers,
            "import" => Action::Import,
            "taint" => Action::Taint,
            "untaint" => Action::Untaint,
            "state" => Action::State,
            "refresh" => Action::Refresh,
            "validate" => Action::Validate,
            "fmt" | "format" => Action::Format,
            "show" => Action::Show,
            other => return Err(TfmError::UnsupportedAction(other.to_string())),
        })
    }
}

impl Action {
    pub const ALL: [Action; 17] = [
        Action::Init,
        Action::Plan,
        Action::Apply,
        Action::ApplyPlan,
        Action::Destroy,
        Action::Output,
        Action::Get,
        Action::Workspace,
        Action::Providers,
        Action::Import,
        Action::Taint,
        Action::Untaint,
        Action::State,
        Action::Refresh,
        Action::Validate,
        Action::Format,
        Action::Show,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Action::Init => "init",
            Action::Plan => "plan",
            Action::Apply => "apply",
            Action::ApplyPlan => "apply_plan",
            Action::Destroy => "destroy",
            Action::Output => "output",
            Action::Get => "get",
            Action::Workspace => "workspace",
            Action::Providers => "providers",
            Action::Import => "import",
            Action::Taint => "taint",
            Action::Untaint => "untaint",
            Action::State => "state",
            Action::Refresh => "refresh",
            Action::Validate => "validate",
            Action::Format => "fmt",
            Action::Show => "show",
        }
    }

    /// Workspace handling is skipped for actions that run before a workspace
    /// can exist or that manage workspaces themselves.
    pub fn needs_workspace(self) -> bool {
        !matches!(self, Action::Workspace | Action::Init | Action::Format)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub module_path: PathBuf,
    pub env_path: PathBuf,
    pub module_env_path: PathBuf,
    pub var_file: PathBuf,
    pub plan_file: PathBuf,
}

impl Paths {
    pub fn compute(config: &TfmConfig, cmd: &Command) -> Self {
        let module_path = config.module_path().join(&cmd.module);
        let env_path = config.env_path().join(&cmd.product).join(&cmd.env);
        let module_env_path = env_path.join(&cmd.module);
        let var_file = module_env_path.join(format!("{}.tfvars", cmd.module_instance));
        let plan_file = module_env_path.join(format!("{}.tfvars.tfplan", cmd.module_instance));
        Self {
            module_path,
            env_path,
            module_env_path,
            var_file,
            plan_file,
        }
    }
}

/// `<product>.<repo>.<module>.<env>.<instance>`, with `/` in the env written as
/// `__`. An explicit workspace on the command wins.
pub fn workspace_name(config: &TfmConfig, cmd: &Command) -> String {
    if let Some(workspace) = cmd.workspace.as_deref().filter(|w| !w.is_empty()) {
        return workspace.to_string();
    }
    format!(
        "{}.{}.{}.{}.{}",
        cmd.product,
        config.repo_name,
        cmd.module,
        cmd.env.replace('/', "__"),
        cmd.module_instance
    )
}

pub fn tfm_extra_vars(config: &TfmConfig, cmd: &Command) -> String {
    format!(
        "-var 'tfm_product={}' -var 'tfm_repo={}' -var 'tfm_module={}' -var 'tfm_env={}' -var 'tfm_module_instance={}'",
        cmd.product, config.repo_name, cmd.module, cmd.env, cmd.module_instance
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPlan {
    pub command_line: String,
    pub message: &'static str,
    pub fail_message: &'static str,
    pub flags: ExecutionFlags,
    /// Printed before launching, for actions that touch infrastructure.
    pub notices: Vec<&'static str>,
}

pub struct ActionContext<'a> {
    pub config: &'a TfmConfig,
    pub cmd: &'a Command,
    pub paths: &'a Paths,
    pub mode: ExecMode,
    pub plan_file_exists: bool,
}

fn quiet_flags() -> ExecutionFlags {
    ExecutionFlags {
        print_message: false,
        ..ExecutionFlags::default()
    }
}

/// Flags for actions that may prompt: an operator answers the prompt, CI runs
/// auto-approved and quietly.
fn prompting_flags(mode: ExecMode) -> ExecutionFlags {
    match mode {
        ExecMode::Unattended => quiet_flags(),
        ExecMode::Operator => ExecutionFlags::interactive(),
    }
}

const AFFECTS_NOTICE: &str = "This will affect infrastructure resources.";
const DESTROYS_NOTICE: &str = "This will DESTROY infrastructure resources.";

pub fn plan_action(action: Action, ctx: &ActionContext<'_>) -> ActionPlan {
    let var_file = ctx.paths.var_file.display();
    let plan_file = ctx.paths.plan_file.display();
    let extra_vars = tfm_extra_vars(ctx.config, ctx.cmd);
    let unattended = ctx.mode == ExecMode::Unattended;

    let simple = |sub: &str, message: &'static str, fail_message: &'static str| ActionPlan {
        command_line: format!("terraform {sub}"),
        message,
        fail_message,
        flags: ExecutionFlags::default(),
        notices: vec![],
    };

    let mut plan = match action {
        Action::Init => simple("init", "Initializing terraform", "Terraform init failed"),
        Action::Plan => ActionPlan {
            command_line: format!(
                "terraform plan -var-file=\"{var_file}\" -out=\"{plan_file}\" {extra_vars}"
            ),
            ..simple("plan", "Planning terraform changes", "Terraform plan failed")
        },
        Action::Apply => {
            let mut command_line = format!("terraform apply -var-file=\"{var_file}\" {extra_vars}");
            if unattended {
                command_line.push_str(" -input=false -auto-approve");
            }
            ActionPlan {
                command_line,
                message: "Applying terraform changes",
                fail_message: "Terraform apply failed",
                flags: prompting_flags(ctx.mode),
                notices: vec!["Executing terraform apply", AFFECTS_NOTICE],
            }
        }
        Action::ApplyPlan => {
            let mut command_line = format!("terraform apply \"{plan_file}\"");
            if unattended {
                command_line.push_str(" -input=false");
            }
            ActionPlan {
                command_line,
                message: "Applying terraform changes",
                fail_message: "Terraform apply failed",
                flags: quiet_flags(),
                notices: vec!["Executing terraform apply", AFFECTS_NOTICE],
            }
        }
        Action::Destroy => {
            let mut command_line =
                format!("terraform destroy -var-file=\"{var_file}\" {extra_vars}");
            if unattended {
                command_line.push_str(" -auto-approve");
            }
            ActionPlan {
                command_line,
                message: "Destroying terraform resources",
                fail_message: "Terraform destroy failed",
                flags: prompting_flags(ctx.mode),
                notices: vec!["Executing terraform destroy", DESTROYS_NOTICE],
            }
        }
        Action::Output => simple("output", "Getting terraform outputs", "Terraform output failed"),
        Action::Get => simple("get", "Getting terraform modules", "Terraform get failed"),
        Action::Workspace => simple(
            "workspace",
            "Managing terraform workspace",
            "Terraform workspace command failed",
        ),
        Action::Providers => simple(
            "providers",
            "Managing terraform providers",
            "Terraform providers command failed",
        ),
        Action::Import => {
            let mut command_line =
                format!("terraform import -var-file=\"{var_file}\" {extra_vars}");
            if unattended {
                command_line.push_str(" -input=false -auto-approve");
            }
            ActionPlan {
                command_line,
                message: "Importing terraform resource",
                fail_message: "Terraform import failed",
                flags: prompting_flags(ctx.mode),
                notices: vec!["Executing terraform import", AFFECTS_NOTICE],
            }
        }
        Action::Taint => simple("taint", "Tainting terraform resource", "Terraform taint failed"),
        Action::Untaint => simple(
            "untaint",
            "Untainting terraform resource",
            "Terraform untaint failed",
        ),
        Action::State => simple(
            "state",
            "Managing terraform state",
            "Terraform state command failed",
        ),
        Action::Refresh => ActionPlan {
            command_line: format!("terraform refresh -var-file=\"{var_file}\" {extra_vars}"),
            ..simple("refresh", "Refreshing terraform state", "Terraform refresh failed")
        },
        Action::Validate => simple(
            "validate",
            "Validating terraform configuration",
            "Terraform validate failed",
        ),
        Action::Format => simple("fmt", "Formatting terraform files", "Terraform fmt failed"),
        Action::Show => {
            let sub = if ctx.plan_file_exists {
                format!("show \"{plan_file}\"")
            } else {
                "show".to_string()
            };
            simple(&sub, "Showing terraform state/plan", "Terraform show failed")
        }
    };

    let action_flags = ctx.cmd.action_flags.trim();
    if !action_flags.is_empty() {
        plan.command_line.push(' ');
        plan.command_line.push_str(action_flags);
    }
    plan
}

/// Names from `terraform workspace list`; the current one is marked with `*`.
pub fn parse_workspace_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('*').map(str::trim).unwrap_or(line)
        })
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Deserialize)]
struct VersionPayload {
    terraform_version: Option<String>,
}

pub fn parse_version_json(output: &str) -> Option<String> {
    serde_json::from_str::<VersionPayload>(output)
        .ok()
        .and_then(|payload| payload.terraform_version)
        .filter(|v| !v.is_empty())
}

/// First `v`-prefixed token of the first line, e.g. `Terraform v1.9.5 on ...`.
pub fn parse_version_text(output: &str) -> Option<String> {
    output
        .trim()
        .lines()
        .next()?
        .split_whitespace()
        .find(|tok| {
            tok.strip_prefix('v')
                .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
        })
        .map(|tok| tok.trim_end_matches(',').to_string())
}

pub fn display_version(raw: &str) -> String {
    if raw == "unknown" || raw.starts_with('v') {
        raw.to_string()
    } else {
        format!("v{raw}")
    }
}

pub struct Manager {
    config: TfmConfig,
    runner: Runner,
    mode: ExecMode,
}

impl Manager {
    pub fn new(config: TfmConfig) -> Self {
        Self::with_runner(config, Runner::default(), detect_exec_mode())
    }

    pub fn with_runner(config: TfmConfig, runner: Runner, mode: ExecMode) -> Self {
        Self {
            config,
            runner,
            mode,
        }
    }

    /// Validates, selects the workspace and runs the terraform action. The
    /// returned code is terraform's exit code.
    pub fn execute(&self, cmd: &Command) -> Result<i32, TfmError> {
        console::info(&format!(
            "Detected exec mode: {}",
            self.mode.colored_label()
        ));
        let action: Action = cmd.action.parse()?;
        self.validate_command(cmd)?;

        let paths = Paths::compute(&self.config, cmd);
        let workspace = workspace_name(&self.config, cmd);

        let version = display_version(&self.terraform_version());
        console::info(&format!("*** Terraform {version} ***"));
        console::info(&format!(
            "Running from \"{}\"",
            paths.module_path.display()
        ));
        console::info(&format!("Executing terraform {}", action.name()));

        let mut runner = self.runner.clone().working_dir(&paths.module_path);
        if action.needs_workspace() {
            runner = self.ensure_workspace(runner, &workspace)?;
        }

        let plan = plan_action(
            action,
            &ActionContext {
                config: &self.config,
                cmd,
                paths: &paths,
                mode: self.mode,
                plan_file_exists: paths.plan_file.is_file(),
            },
        );
        plan.notices.iter().for_each(|notice| console::info(notice));
        let result = runner.run(
            &plan.command_line,
            plan.message,
            &plan.flags,
            Some(plan.fail_message),
        );
        Ok(result.exit_code())
    }

    fn check(
        &self,
        check: impl FnOnce() -> ExecutionResult,
        message: String,
        fail_message: String,
        what: &str,
    ) -> Result<(), TfmError> {
        let flags = ExecutionFlags {
            print_output: false,
            print_message: false,
            ..ExecutionFlags::default()
        };
        let result = self
            .runner
            .run_native(check, &message, &flags, Some(fail_message.as_str()));
        if result.success() {
            Ok(())
        } else {
            Err(TfmError::Validation {
                what: what.to_string(),
            })
        }
    }

    pub fn validate_command(&self, cmd: &Command) -> Result<(), TfmError> {
        let product_path = self.config.env_path().join(&cmd.product);
        self.check(
            || check_dir(&product_path),
            format!("Checking product {} is valid", ansi::blue(&cmd.product)),
            format!(
                "Product path \"{}\" was not found!",
                ansi::blue(&product_path.display().to_string())
            ),
            "product",
        )?;

        self.check(
            || check_not_empty(&self.config.repo_name),
            format!("Checking repo {} is valid", ansi::blue(&self.config.repo_name)),
            "Repo name is empty. Set repo_name in the tfm config".to_string(),
            "repo",
        )?;

        let paths = Paths::compute(&self.config, cmd);
        self.check_dir_exists(&paths.module_path, "module", &cmd.module)?;
        self.check_dir_exists(&paths.env_path, "environment", &cmd.env)?;

        let var_file_label = format!("{}.tfvars", cmd.module_instance);
        self.check(
            || check_file(&paths.var_file),
            format!("Checking config {} exists", ansi::blue(&var_file_label)),
            format!(
                "Config file \"{}\" was not found!",
                ansi::blue(&paths.var_file.display().to_string())
            ),
            "config",
        )
    }

    fn check_dir_exists(&self, path: &Path, what: &str, name: &str) -> Result<(), TfmError> {
        let message = format!("Checking {what} {} exists", ansi::blue(name));
        let fail_message = format!(
            "{} path \"{}\" was not found!",
            capitalize(what),
            ansi::blue(&path.display().to_string())
        );
        self.check(|| check_dir(path), message, fail_message, what)
    }

    pub fn terraform_version(&self) -> String {
        let flags = ExecutionFlags::captured();
        let json = self.runner.run(
            "terraform version -json",
            "Detecting Terraform version",
            &flags,
            None,
        );
        if json.success() {
            if let Some(version) = parse_version_json(json.captured_stdout()) {
                return version;
            }
        }
        let text = self
            .runner
            .run("terraform version", "Detecting Terraform version", &flags, None);
        text.success()
            .then(|| parse_version_text(text.captured_stdout()))
            .flatten()
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Creates `workspace` if `terraform workspace list` does not show it and
    /// returns a runner that selects it through `TF_WORKSPACE`.
    pub fn ensure_workspace(&self, runner: Runner, workspace: &str) -> Result<Runner, TfmError> {
        let list_flags = ExecutionFlags {
            print_status: true,
            ..ExecutionFlags::captured()
        };
        let listing = runner.run(
            "terraform workspace list",
            &format!("Checking workspace {} exists", ansi::blue(workspace)),
            &list_flags,
            None,
        );
        let exists = parse_workspace_list(listing.captured_stdout())
            .iter()
            .any(|name| name == workspace);

        if !exists {
            let create_flags = ExecutionFlags::default();
            let created = runner.run(
                &format!("terraform workspace new {workspace}"),
                &format!("Creating workspace {}", ansi::red(workspace)),
                &create_flags,
                Some("Could not create workspace!"),
            );
            if !created.success() {
                return Err(TfmError::WorkspaceCreate {
                    workspace: workspace.to_string(),
                });
            }
        }

        console::info(&format!("Selecting workspace {}", ansi::blue(workspace)));
        Ok(runner.env("TF_WORKSPACE", workspace))
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
