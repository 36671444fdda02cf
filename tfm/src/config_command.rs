use std::path::Path;

use crate::args::ConfigCommand;
use crate::config::{
    ConfigFormat, LEGACY_CONFIG_NAME, convert_legacy_to_yaml, describe_config, find_repo_root,
    init_config, load_config_from_project_dir,
};
use crate::console;
use crate::error::TfmError;

fn print_config_summary(lines: &[(&'static str, String)]) {
    let label_width = lines.iter().map(|(label, _)| label.len() + 1).max().unwrap_or(0);
    lines
        .iter()
        .for_each(|(label, value)| println!("   {:<label_width$}  {value}", format!("{label}:")));
}

/// Runs one `tf config` subcommand against the repository containing `start`.
pub fn run_config_command(command: &ConfigCommand, start: &Path) -> Result<(), TfmError> {
    let project_dir = find_repo_root(start)?;
    match command {
        ConfigCommand::Init { format } => {
            let format = ConfigFormat::from(*format);
            let config = init_config(&project_dir, format)?;
            match format {
                ConfigFormat::Yaml => println!(
                    "Created YAML configuration at {}",
                    config.config_path.display()
                ),
                ConfigFormat::Legacy => {
                    println!(
                        "Created legacy configuration at {}",
                        config.config_path.display()
                    );
                    console::warn("the legacy format is deprecated; prefer `tf config init yaml`");
                }
            }
        }
        ConfigCommand::Convert => {
            let config = convert_legacy_to_yaml(&project_dir)?;
            let legacy_path = project_dir.join(LEGACY_CONFIG_NAME);
            println!("Converted configuration to YAML format");
            println!("   Legacy: {}", legacy_path.display());
            println!("   New:    {}", config.config_path.display());
            println!(
                "Check it with `tf config validate`, then remove {}",
                legacy_path.display()
            );
        }
        ConfigCommand::Validate => {
            let config = load_config_from_project_dir(&project_dir)?;
            println!("Configuration is valid");
            print_config_summary(&describe_config(&config));
        }
    }
    Ok(())
}
