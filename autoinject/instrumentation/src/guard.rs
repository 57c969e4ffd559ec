//! Checks that run before the container is touched.
//!
//! [`EnvPolicy::AppendColonJoined`](crate::policy::EnvPolicy::AppendColonJoined) rows are not
//! safe to apply twice, so the home marker is what keeps repeated webhook calls from stacking
//! duplicate segments.

use k8s_openapi::api::core::v1::Container;
use tracing::trace;

use crate::{
    descriptor::InstrumentationDescriptor,
    env,
    error::{InjectionError, Result},
    profile::RuntimeProfile,
};

/// Rejects containers that can't be instrumented, without side effects.
///
/// Order of checks:
/// 1. a reserved variable defined through `valueFrom`, either in the container or in the
///    descriptor entry the merge would copy in;
/// 2. the home marker in the container;
/// 3. the home marker in the descriptor.
pub fn check(
    profile: &RuntimeProfile,
    container: &Container,
    descriptor: &InstrumentationDescriptor,
) -> Result<()> {
    let container_env = container.env.as_deref().unwrap_or_default();

    for reserved in profile.reserved_variables() {
        let merged = env::find(container_env, reserved)
            .or_else(|| env::find(&descriptor.env, reserved));

        if merged.is_some_and(|var| var.value_from.is_some()) {
            return Err(InjectionError::ReservedVariableConflict {
                container: container.name.clone(),
                variable: reserved.to_owned(),
            });
        }
    }

    if env::contains(container_env, &profile.home_marker) {
        return Err(InjectionError::AlreadyInstrumented {
            container: container.name.clone(),
            variable: profile.home_marker.clone(),
        });
    }

    if env::contains(&descriptor.env, &profile.home_marker) {
        return Err(InjectionError::AlreadyInstrumentedInSpec {
            variable: profile.home_marker.clone(),
        });
    }

    trace!(container = %container.name, profile = %profile.name, "guard passed");

    Ok(())
}
