use k8s_openapi::api::core::v1::EnvVar;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::env;

/// How an engine-owned variable is written when the container may already define it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum EnvPolicy {
    /// Only set the variable when it is missing. A value set by the user (or by an earlier run)
    /// is left untouched.
    ReplaceIfAbsent,

    /// The variable is a `:` separated search path, our value is appended to whatever is there.
    ///
    /// Applying this twice duplicates the segment, see [`crate::guard`].
    AppendColonJoined,
}

/// One row of a runtime's injection table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InjectedEnv {
    pub name: String,
    pub value: String,
    pub policy: EnvPolicy,
}

impl InjectedEnv {
    pub fn replace_if_absent(name: impl Into<String>, value: impl Into<String>) -> Self {
        InjectedEnv {
            name: name.into(),
            value: value.into(),
            policy: EnvPolicy::ReplaceIfAbsent,
        }
    }

    pub fn append_colon_joined(name: impl Into<String>, value: impl Into<String>) -> Self {
        InjectedEnv {
            name: name.into(),
            value: value.into(),
            policy: EnvPolicy::AppendColonJoined,
        }
    }

    /// Writes this row into `container_env` according to its [`EnvPolicy`].
    pub fn apply(&self, container_env: &mut Vec<EnvVar>) {
        match self.policy {
            EnvPolicy::ReplaceIfAbsent => {
                env::insert_if_absent(container_env, &self.name, &self.value);
            }
            EnvPolicy::AppendColonJoined => {
                env::concat_or_insert(container_env, &self.name, &self.value)
            }
        }
    }
}
