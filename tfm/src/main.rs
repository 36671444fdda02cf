use tfm::args::{Invocation, parse_invocation};
use tfm::config::load_config;
use tfm::config_command::run_config_command;
use tfm::console;
use tfm::manager::Manager;

fn main() {
    let invocation = match parse_invocation(std::env::args_os()) {
        Ok(invocation) => invocation,
        Err(err) => err.exit(),
    };
    let cwd = std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
    let command = match invocation {
        Invocation::Run(command) => command,
        Invocation::Config(config_command) => {
            let code = match run_config_command(&config_command, &cwd) {
                Ok(()) => 0,
                Err(err) => {
                    console::error(&err.to_string());
                    1
                }
            };
            std::process::exit(code);
        }
    };
    let config = match load_config(&cwd) {
        Ok(config) => config,
        Err(err) => {
            console::error(&err.to_string());
            std::process::exit(1);
        }
    };
    console::debug(&format!(
        "config={} project_dir={}",
        config.config_path.display(),
        config.project_dir.display()
    ));

    let code = match Manager::new(config).execute(&command) {
        Ok(code) => code,
        Err(err) => {
            console::error(&err.to_string());
            1
        }
    };
    std::process::exit(code);
}
