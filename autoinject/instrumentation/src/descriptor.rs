use k8s_openapi::api::core::v1::EnvVar;
use serde::{Deserialize, Serialize};

/// Instrumentation settings for one runtime, as written by the user in the `Instrumentation`
/// resource (e.g. its `spec.dotnet` section).
///
/// ```yaml
/// image: ghcr.io/open-telemetry/autoinstrumentation-dotnet:1.0.0
/// env:
///   - name: OTEL_DOTNET_AUTO_TRACES_CONSOLE_EXPORTER_ENABLED
///     value: "true"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentationDescriptor {
    /// Image holding the agent payload, used by the init container.
    pub image: String,

    /// Defaults for the workload's env, the container's own values take precedence.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
}

impl InstrumentationDescriptor {
    pub fn new(image: impl Into<String>) -> Self {
        InstrumentationDescriptor {
            image: image.into(),
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, env: impl IntoIterator<Item = EnvVar>) -> Self {
        self.env.extend(env);
        self
    }
}
