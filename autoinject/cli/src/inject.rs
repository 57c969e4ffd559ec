use std::io::Write;

use autoinject_instrumentation::{
    descriptor::InstrumentationDescriptor,
    mutator::{InjectionReport, PodMutator},
    profile::{RuntimeProfile, DOTNET},
};
use k8s_openapi::api::core::v1::Pod;
use tracing::info;

use crate::{
    config::{InjectArgs, OutputFormat},
    error::{CliError, CliResult},
    input::read_input,
};

/// Runs the mutation described by `args`, without printing anything.
pub(crate) fn instrument(args: &InjectArgs) -> CliResult<(Pod, InjectionReport)> {
    let custom_profile;
    let profile: &RuntimeProfile = match args.profile.as_deref() {
        Some(path) => {
            let profile: RuntimeProfile = read_input(path)?;
            profile
                .validate()
                .map_err(|fail| CliError::InvalidProfile(path.to_owned(), fail))?;
            custom_profile = profile;
            &custom_profile
        }
        None => &DOTNET,
    };

    let mut pod: Pod = read_input(&args.pod)?;
    let descriptor: InstrumentationDescriptor = read_input(&args.instrumentation)?;

    let report =
        PodMutator::new(profile).inject_containers(&descriptor, &mut pod, &args.containers)?;

    info!(
        profile = %profile.name,
        instrumented = ?report.instrumented,
        skipped = report.skipped.len(),
        "pod mutated"
    );

    Ok((pod, report))
}

pub(crate) fn inject(args: &InjectArgs) -> CliResult<()> {
    let (pod, report) = instrument(args)?;

    if args.strict && !report.skipped.is_empty() {
        return Err(CliError::ContainersSkipped(report.skipped.len()));
    }

    let mut stdout = std::io::stdout().lock();
    match args.output {
        OutputFormat::Yaml => {
            serde_yaml::to_writer(&mut stdout, &pod).map_err(CliError::WriteYaml)?
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut stdout, &pod)?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}
