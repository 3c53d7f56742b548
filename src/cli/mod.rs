mod command;
mod runner;

pub use command::Command;
pub use runner::{OutputMode, build_backend, run};
