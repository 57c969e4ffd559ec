use thiserror::Error;

pub type Result<T, E = InjectionError> = std::result::Result<T, E>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InjectionError {
    /// The home marker is already set in the container, it has been instrumented before.
    #[error("`{variable}` environment variable is already set in container `{container}`")]
    AlreadyInstrumented { container: String, variable: String },

    /// The home marker is set in the instrumentation descriptor itself.
    #[error("`{variable}` environment variable is already set in the instrumentation spec")]
    AlreadyInstrumentedInSpec { variable: String },

    /// A variable we append to is defined through `valueFrom` and cannot be concatenated.
    #[error("container `{container}` defines env var `{variable}` via `valueFrom`")]
    ReservedVariableConflict { container: String, variable: String },

    #[error("Failed to get `Spec` for Pod!")]
    PodSpecNotFound,

    #[error("Container index {index} is out of range, pod has {len} containers")]
    ContainerIndexOutOfRange { index: usize, len: usize },

    #[error("Container not found: `{0}`")]
    ContainerNotFound(String),
}

impl InjectionError {
    /// Whether the container was skipped because it already carries the agent.
    ///
    /// Callers should not retry on these.
    pub fn is_already_instrumented(&self) -> bool {
        matches!(
            self,
            InjectionError::AlreadyInstrumented { .. }
                | InjectionError::AlreadyInstrumentedInSpec { .. }
        )
    }
}
