//! File helpers shared by the command handlers.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use decort_core::{AttrMap, ResourceData};

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::output;

/// What `apply` and `read` persist between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    #[serde(rename = "type")]
    pub type_name: String,
    pub id: Option<String>,
    #[serde(default)]
    pub attributes: AttrMap,
}

impl StateFile {
    pub fn capture(type_name: &str, d: &ResourceData) -> Self {
        Self {
            type_name: type_name.to_owned(),
            id: d.id().map(str::to_owned),
            attributes: d.state(),
        }
    }
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a state file and check it belongs to `type_name`.
pub fn read_state(path: &Path, type_name: &str) -> Result<StateFile, CliError> {
    let state: StateFile = read_json(path)?;
    if state.type_name != type_name {
        return Err(CliError::Validation {
            message: format!(
                "{} holds state for {}, not {type_name}",
                path.display(),
                state.type_name
            ),
        });
    }
    Ok(state)
}

/// Write the state to `out`, or print it.
pub fn emit_state(
    state: &StateFile,
    out: Option<&Path>,
    format: OutputFormat,
) -> Result<(), CliError> {
    match out {
        Some(path) => std::fs::write(path, output::render_json(state)).map_err(|source| {
            CliError::Io {
                path: path.to_path_buf(),
                source,
            }
        }),
        None => {
            output::print_output(&output::render_document(format, state));
            Ok(())
        }
    }
}
