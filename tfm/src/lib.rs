pub mod args;
pub mod command_line;
pub mod config;
pub mod config_command;
pub mod console;
pub mod error;
pub mod exec_mode;
pub mod format;
pub mod manager;
pub mod process;
pub mod streaming;
pub mod terminate;

#[cfg(test)]
mod status_test;
