//! Per-runtime constant tables.
//!
//! A [`RuntimeProfile`] holds every name and path the mutator writes for one runtime. The .NET
//! table is built once in [`DOTNET`], other runtimes are added by building (or deserializing)
//! another profile, not by branching in the mutator.

use std::{collections::HashSet, sync::LazyLock};

use k8s_openapi::api::core::v1::{Container, EmptyDirVolumeSource, Volume, VolumeMount};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::{EnvPolicy, InjectedEnv};

/// Name shared by the payload volume and the init container that fills it.
pub const AUTO_INSTRUMENTATION_NAME: &str = "opentelemetry-auto-instrumentation";

/// Where the payload volume is mounted, in both the init container and the workload.
pub const AUTO_INSTRUMENTATION_MOUNT_PATH: &str = "/otel-auto-instrumentation";

/// Directory inside the instrumentation image that holds the agent payload.
pub const AUTO_INSTRUMENTATION_SOURCE_DIR: &str = "/autoinstrumentation";

/// Variable names and values for the .NET CLR profiler agent.
pub mod dotnet {
    pub const CORECLR_ENABLE_PROFILING: &str = "CORECLR_ENABLE_PROFILING";
    pub const CORECLR_PROFILER: &str = "CORECLR_PROFILER";
    pub const CORECLR_PROFILER_PATH: &str = "CORECLR_PROFILER_PATH";
    pub const DOTNET_ADDITIONAL_DEPS: &str = "DOTNET_ADDITIONAL_DEPS";
    pub const DOTNET_SHARED_STORE: &str = "DOTNET_SHARED_STORE";
    pub const DOTNET_STARTUP_HOOKS: &str = "DOTNET_STARTUP_HOOKS";

    /// Home marker, its presence means the container was already instrumented.
    pub const OTEL_DOTNET_AUTO_HOME: &str = "OTEL_DOTNET_AUTO_HOME";

    pub const PROFILING_ENABLED: &str = "1";

    /// CLSID of the OpenTelemetry CLR profiler.
    pub const PROFILER_ID: &str = "{918728DD-259F-4A6A-AC2B-B85E1B658318}";

    pub const PROFILER_LIBRARY: &str = "OpenTelemetry.AutoInstrumentation.Native.so";
    pub const ADDITIONAL_DEPS_DIR: &str = "AdditionalDeps";
    pub const SHARED_STORE_DIR: &str = "store";
    pub const STARTUP_HOOK_ASSEMBLY: &str = "net/OpenTelemetry.AutoInstrumentation.StartupHook.dll";
}

/// The .NET profile, built on first use and shared for the rest of the process.
pub static DOTNET: LazyLock<RuntimeProfile> = LazyLock::new(RuntimeProfile::dotnet);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("profile `{profile}` never sets its home marker `{marker}`")]
    MissingHomeMarker { profile: String, marker: String },

    #[error("home marker `{0}` must use the `replace-if-absent` policy")]
    JoinedHomeMarker(String),

    #[error("variable `{0}` appears more than once in the profile")]
    DuplicateVariable(String),
}

/// The empty-dir volume the agent payload is copied into.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SharedVolume {
    pub name: String,
    pub mount_path: String,
}

/// Init container copying the payload out of the instrumentation image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayloadCopy {
    pub name: String,
    pub source_dir: String,
}

/// Everything the mutator needs to know about one runtime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeProfile {
    /// Short name used in logs, e.g. `dotnet`.
    pub name: String,

    /// Variable whose presence marks a container as already instrumented.
    pub home_marker: String,

    /// Rows applied to each container, in this order.
    pub env: Vec<InjectedEnv>,

    pub volume: SharedVolume,

    pub init_container: PayloadCopy,
}

impl RuntimeProfile {
    /// Builds the .NET profile, prefer [`DOTNET`] over calling this.
    pub fn dotnet() -> Self {
        let home = AUTO_INSTRUMENTATION_MOUNT_PATH;

        RuntimeProfile {
            name: "dotnet".to_owned(),
            home_marker: dotnet::OTEL_DOTNET_AUTO_HOME.to_owned(),
            env: vec![
                InjectedEnv::replace_if_absent(
                    dotnet::CORECLR_ENABLE_PROFILING,
                    dotnet::PROFILING_ENABLED,
                ),
                InjectedEnv::replace_if_absent(dotnet::CORECLR_PROFILER, dotnet::PROFILER_ID),
                InjectedEnv::replace_if_absent(
                    dotnet::CORECLR_PROFILER_PATH,
                    format!("{home}/{}", dotnet::PROFILER_LIBRARY),
                ),
                InjectedEnv::append_colon_joined(
                    dotnet::DOTNET_STARTUP_HOOKS,
                    format!("{home}/{}", dotnet::STARTUP_HOOK_ASSEMBLY),
                ),
                InjectedEnv::append_colon_joined(
                    dotnet::DOTNET_ADDITIONAL_DEPS,
                    format!("{home}/{}", dotnet::ADDITIONAL_DEPS_DIR),
                ),
                InjectedEnv::replace_if_absent(dotnet::OTEL_DOTNET_AUTO_HOME, home),
                InjectedEnv::append_colon_joined(
                    dotnet::DOTNET_SHARED_STORE,
                    format!("{home}/{}", dotnet::SHARED_STORE_DIR),
                ),
            ],
            volume: SharedVolume {
                name: AUTO_INSTRUMENTATION_NAME.to_owned(),
                mount_path: home.to_owned(),
            },
            init_container: PayloadCopy {
                name: AUTO_INSTRUMENTATION_NAME.to_owned(),
                source_dir: AUTO_INSTRUMENTATION_SOURCE_DIR.to_owned(),
            },
        }
    }

    /// Checks the invariants the mutator relies on.
    ///
    /// The home marker has to be written by a `replace-if-absent` row, otherwise the guard can
    /// never see a container as instrumented and joined rows grow on every call.
    pub fn validate(&self) -> Result<(), ProfileError> {
        let mut seen = HashSet::new();
        for row in &self.env {
            if !seen.insert(row.name.as_str()) {
                return Err(ProfileError::DuplicateVariable(row.name.clone()));
            }
        }

        match self.env.iter().find(|row| row.name == self.home_marker) {
            None => Err(ProfileError::MissingHomeMarker {
                profile: self.name.clone(),
                marker: self.home_marker.clone(),
            }),
            Some(row) if row.policy == EnvPolicy::AppendColonJoined => {
                Err(ProfileError::JoinedHomeMarker(row.name.clone()))
            }
            Some(_) => Ok(()),
        }
    }

    /// Variables the engine appends to, these cannot be defined through `valueFrom`.
    pub fn reserved_variables(&self) -> impl Iterator<Item = &str> {
        self.env
            .iter()
            .filter(|row| row.policy == EnvPolicy::AppendColonJoined)
            .map(|row| row.name.as_str())
    }

    pub fn volume_mount(&self) -> VolumeMount {
        VolumeMount {
            name: self.volume.name.clone(),
            mount_path: self.volume.mount_path.clone(),
            ..Default::default()
        }
    }

    pub fn volume(&self) -> Volume {
        Volume {
            name: self.volume.name.clone(),
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..Default::default()
        }
    }

    /// `cp -a <source>/. <mount>/`, copies the payload contents, not the directory itself.
    pub fn copy_command(&self) -> Vec<String> {
        vec![
            "cp".to_owned(),
            "-a".to_owned(),
            format!("{}/.", self.init_container.source_dir.trim_end_matches('/')),
            format!("{}/", self.volume.mount_path.trim_end_matches('/')),
        ]
    }

    /// The init container that fills the shared volume, running `image`.
    pub fn init_container(&self, image: &str) -> Container {
        Container {
            name: self.init_container.name.clone(),
            image: Some(image.to_owned()),
            command: Some(self.copy_command()),
            volume_mounts: Some(vec![self.volume_mount()]),
            ..Default::default()
        }
    }
}
