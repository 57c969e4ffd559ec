use std::path::PathBuf;

use autoinject_instrumentation::{error::InjectionError, profile::ProfileError};
use miette::Diagnostic;
use thiserror::Error;

pub(crate) type CliResult<T, E = CliError> = core::result::Result<T, E>;

#[derive(Debug, Error, Diagnostic)]
pub(crate) enum CliError {
    #[error("Failed to read `{}`: {}", .0.display(), .1)]
    #[diagnostic(help("Check that the file exists and is readable, or pass `-` to read stdin."))]
    ReadInput(PathBuf, std::io::Error),

    #[error("Failed to parse `{}`: {}", .0.display(), .1)]
    #[diagnostic(help("Inputs are read as YAML, which also accepts JSON."))]
    ParseInput(PathBuf, serde_yaml::Error),

    #[error("Runtime profile `{}` is invalid: {}", .0.display(), .1)]
    #[diagnostic(help(
        "The home marker must be written by a `replace-if-absent` row and every variable may \
         appear only once. Run `autoinject schema` for the file format."
    ))]
    InvalidProfile(PathBuf, ProfileError),

    #[error(transparent)]
    #[diagnostic(help(
        "An already instrumented container should be skipped, not retried. A `valueFrom` on a \
         search path variable has to be replaced with a plain value."
    ))]
    Injection(#[from] InjectionError),

    #[error("{0} container(s) were not instrumented")]
    #[diagnostic(help("Drop `--strict` to print the pod anyway, skipped containers are logged."))]
    ContainersSkipped(usize),

    #[error("Failed to write YAML output: {0}")]
    WriteYaml(serde_yaml::Error),

    #[error("Failed to write JSON output: {0}")]
    WriteJson(#[from] serde_json::Error),

    #[error("Failed to write output: {0}")]
    WriteOutput(#[from] std::io::Error),
}
