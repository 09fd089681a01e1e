pub mod actions;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod files;
pub mod forge;
pub mod orchestrator;

pub use error::{ReleaseError, Result};
pub use orchestrator::{Orchestrator, RunOutputs};

#[cfg(test)]
pub mod test_helpers;
