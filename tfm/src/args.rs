use std::ffi::OsString;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::ConfigFormat;
use crate::manager::Command;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "tf",
    version,
    about = "Terraform workspace manager",
    after_help = "EXAMPLES:\n    tf product1 sample_module dev instance_x init\n    tf product1 sample_module dev instance_x plan\n    tf product1 sample_module dev instance_x \"apply -parallelism=2\"\n    tf product1 sample_module dev instance_x plan workspace=custom\n\nCONFIG:\n    tf config init <yaml|legacy>\n    tf config validate\n    tf config convert\n\nENVIRONMENT:\n    TF_EXEC_MODE_OVERRIDE=1    Force unattended mode (auto-approve)\n    TFM_DEBUG=1                Print debug diagnostics"
)]
pub struct TfmCli {
    /// Product name
    pub product: String,
    /// Terraform module name
    pub module: String,
    /// Environment (dev, staging, prod, ...)
    pub env: String,
    /// Module instance identifier
    pub module_instance: String,
    /// Terraform action, optionally followed by extra terraform flags
    pub action: String,
    /// Workspace override (`workspace=<name>`)
    pub workspace: Option<String>,
}

impl TfmCli {
    pub fn into_command(self) -> Command {
        let mut action_parts = self.action.split_whitespace();
        let action = action_parts.next().unwrap_or_default().to_string();
        let action_flags = action_parts.collect::<Vec<_>>().join(" ");
        let workspace = self
            .workspace
            .map(|w| w.strip_prefix("workspace=").unwrap_or(&w).to_string())
            .filter(|w| !w.is_empty());
        Command {
            product: self.product,
            module: self.module,
            env: self.env,
            module_instance: self.module_instance,
            action,
            action_flags,
            workspace,
        }
    }
}

pub fn parse_command<I, T>(argv: I) -> Result<Command, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    TfmCli::try_parse_from(argv).map(TfmCli::into_command)
}

#[derive(Debug, Clone, Parser)]
#[command(name = "tf config", about = "Manage the tfm configuration file")]
pub struct ConfigCli {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ConfigCommand {
    /// Convert a legacy .tfm.conf into .tfm.yaml
    Convert,
    /// Create a new configuration file
    Init {
        #[arg(value_enum)]
        format: InitFormat,
    },
    /// Validate the current configuration
    Validate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InitFormat {
    Yaml,
    Legacy,
}

impl From<InitFormat> for ConfigFormat {
    fn from(format: InitFormat) -> Self {
        match format {
            InitFormat::Yaml => ConfigFormat::Yaml,
            InitFormat::Legacy => ConfigFormat::Legacy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Run(Command),
    Config(ConfigCommand),
}

/// `tf config ...` manages the config file; anything else is a terraform run.
pub fn parse_invocation<I, T>(argv: I) -> Result<Invocation, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let argv = argv.into_iter().map(Into::into).collect::<Vec<OsString>>();
    if argv.get(1).is_some_and(|token| token == "config") {
        let config_argv = std::iter::once(OsString::from("tf config")).chain(argv.into_iter().skip(2));
        return ConfigCli::try_parse_from(config_argv).map(|cli| Invocation::Config(cli.command));
    }
    parse_command(argv).map(Invocation::Run)
}
