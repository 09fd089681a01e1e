//! Reporting results back to a workflow runner.
use log::*;
use serde_json::Value;
use std::{
    env,
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use uuid::Uuid;

use crate::{ReleaseError, Result, orchestrator::RunOutputs};

/// Env var naming the file step outputs are appended to.
pub const OUTPUT_FILE_VAR: &str = "GITHUB_OUTPUT";

/// Write the run outputs for later workflow steps. Without an output file
/// the values are only logged.
pub fn write_outputs(outputs: &RunOutputs) -> Result<()> {
    let output_file = env::var(OUTPUT_FILE_VAR)
        .ok()
        .filter(|p| !p.is_empty())
        .map(PathBuf::from);

    for (name, value) in output_pairs(outputs) {
        match &output_file {
            Some(path) => write_output_file(path, name, &value)?,
            None => info!("output {name}: {value}"),
        }
    }

    Ok(())
}

/// Output names and values in the order they are reported.
fn output_pairs(outputs: &RunOutputs) -> Vec<(&'static str, String)> {
    let mut pairs = vec![];

    if let Some(assets) = &outputs.assets {
        pairs.push(("assets", Value::from(assets.clone()).to_string()));
    }

    pairs.push(("url", outputs.url.clone()));
    pairs.push(("id", outputs.id.clone()));
    pairs.push(("upload_url", outputs.upload_url.clone()));

    pairs
}

/// Append `name` to the output file using the multiline heredoc form.
pub fn write_output_file(path: &Path, name: &str, value: &str) -> Result<()> {
    let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());

    if name.contains(&delimiter) || value.contains(&delimiter) {
        return Err(ReleaseError::invalid_config(format!(
            "output {name} contains the delimiter {delimiter}"
        )));
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    writeln!(file, "{name}<<{delimiter}")?;
    writeln!(file, "{value}")?;
    writeln!(file, "{delimiter}")?;

    debug!("wrote output {name} to {}", path.display());

    Ok(())
}

/// Report a failure as a workflow error annotation.
pub fn set_failed(message: &str) {
    println!("::error::{}", escape_data(message));
}

fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
