use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use thiserror::Error;

/// Environment variable that points `inject` at a runtime profile file.
pub(crate) const PROFILE_ENV: &str = "AUTOINJECT_PROFILE";

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(super) struct Cli {
    #[command(subcommand)]
    pub(super) commands: Commands,
}

#[derive(Debug, Subcommand)]
pub(super) enum Commands {
    /// Instrument containers of a pod manifest and print the mutated pod.
    Inject(Box<InjectArgs>),

    /// Print the allocator hash of a scrape target.
    TargetHash(TargetHashArgs),

    /// Print the JSON schema of a runtime profile file.
    Schema,
}

#[derive(Args, Debug)]
pub(super) struct InjectArgs {
    /// Pod manifest, YAML or JSON. `-` reads it from stdin.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub pod: PathBuf,

    /// Instrumentation settings for the runtime (image and env), YAML or JSON.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub instrumentation: PathBuf,

    /// Name of a container to instrument, may be repeated.
    ///
    /// When not given, only the first container of the pod is instrumented.
    #[arg(short, long = "container")]
    pub containers: Vec<String>,

    /// Runtime profile to use instead of the built-in .NET one.
    #[arg(long, env = PROFILE_ENV, value_hint = ValueHint::FilePath)]
    pub profile: Option<PathBuf>,

    /// Format of the printed pod.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub output: OutputFormat,

    /// Fail if any requested container was not instrumented.
    #[arg(long, default_value_t = false)]
    pub strict: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(super) enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

#[derive(Args, Debug)]
pub(super) struct TargetHashArgs {
    /// Scrape job name.
    #[arg(short, long)]
    pub job: String,

    /// Target URL, e.g. `10.0.0.1:8080`.
    #[arg(short, long)]
    pub url: String,

    /// Target label as `name=value`, may be repeated.
    #[arg(short, long = "label", value_parser = parse_label)]
    pub labels: Vec<(String, String)>,

    /// Collector the target is assigned to, not part of the hash.
    #[arg(short, long, default_value = "")]
    pub collector: String,

    /// Print the whole target as JSON instead of only its hash.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("label `{0}` is not in `name=value` form")]
pub(super) struct LabelParseError(String);

fn parse_label(raw: &str) -> Result<(String, String), LabelParseError> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_owned(), value.to_owned())),
        _ => Err(LabelParseError(raw.to_owned())),
    }
}
