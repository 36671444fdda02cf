pub mod ansi;
pub mod status;
