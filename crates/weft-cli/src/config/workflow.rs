//! Workflow and job parameter configuration.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result as AnyhowResult, anyhow};
use clap::Args;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use weft_runtime::graph::Workflow;
use weft_runtime::job::RunRequest;

use crate::TRACING_TARGET_CONFIG;

/// Workflow source and job parameters.
///
/// # Environment Variables
///
/// - `WEFT_WORKFLOW` - Path to the workflow graph (JSON)
/// - `WEFT_PARAMS` - Path to a JSON object of job parameters
/// - `WEFT_USER_ID` - User the job runs on behalf of
/// - `WEFT_WORKFLOW_ID` - Identifier recorded on the job
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct WorkflowConfig {
    /// Path to the workflow graph in JSON.
    #[arg(short = 'w', long, env = "WEFT_WORKFLOW")]
    pub workflow: PathBuf,

    /// Path to a JSON object of job parameters.
    #[arg(long, env = "WEFT_PARAMS")]
    pub params: Option<PathBuf>,

    /// A single job parameter as `NAME=VALUE`.
    ///
    /// VALUE is parsed as JSON and falls back to a plain string. Overrides
    /// the same name from `--params`.
    #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
    #[serde(default)]
    pub param: Vec<(String, Value)>,

    /// User the job runs on behalf of.
    #[arg(long, env = "WEFT_USER_ID", default_value = "local")]
    pub user_id: String,

    /// Identifier recorded on the job; defaults to the workflow file stem.
    #[arg(long, env = "WEFT_WORKFLOW_ID")]
    pub workflow_id: Option<String>,
}

impl WorkflowConfig {
    /// Reads the workflow and parameters into a run request.
    pub fn load(&self) -> AnyhowResult<RunRequest> {
        let graph: Workflow = read_json(&self.workflow)
            .with_context(|| format!("failed to read workflow {}", self.workflow.display()))?;
        let workflow_id = self.workflow_id.clone().unwrap_or_else(|| {
            self.workflow
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        let mut request = RunRequest::new(graph)
            .with_user_id(self.user_id.as_str())
            .with_workflow_id(workflow_id);
        request.params = self.load_params()?;
        Ok(request)
    }

    /// Merges the parameter file with the `--param` overrides.
    pub fn load_params(&self) -> AnyhowResult<Map<String, Value>> {
        let mut params = match &self.params {
            Some(path) => {
                let value: Value = read_json(path)
                    .with_context(|| format!("failed to read params {}", path.display()))?;
                match value {
                    Value::Object(params) => params,
                    _ => return Err(anyhow!("params file {} is not a JSON object", path.display())),
                }
            }
            None => Map::new(),
        };

        for (name, value) in &self.param {
            params.insert(name.clone(), value.clone());
        }
        Ok(params)
    }

    /// Logs the workflow source.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            workflow = %self.workflow.display(),
            params = ?self.params,
            overrides = self.param.len(),
            user_id = %self.user_id,
            "Workflow configuration"
        );
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> AnyhowResult<T> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Parses a `NAME=VALUE` job parameter.
fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    if name.is_empty() {
        return Err("parameter name must not be empty".into());
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((name.to_owned(), value))
}
