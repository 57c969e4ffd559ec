use k8s_openapi::api::core::v1::{Container, Pod, PodSpec};
use tracing::{debug, trace, warn};

use crate::{
    descriptor::InstrumentationDescriptor,
    env,
    error::{InjectionError, Result},
    guard,
    profile::{RuntimeProfile, DOTNET},
};

/// Outcome of [`PodMutator::inject_containers`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InjectionReport {
    /// Containers that now carry the agent.
    pub instrumented: Vec<String>,

    /// Containers left as they were, with the reason.
    pub skipped: Vec<(String, InjectionError)>,
}

/// Mutates pods so their containers start with a runtime's agent preloaded.
///
/// Steps for each call to [`PodMutator::inject`]:
/// 1. [`guard::check`], on failure nothing has been written;
/// 2. descriptor env is merged, container values take precedence;
/// 3. each row of [`RuntimeProfile::env`] is applied in order;
/// 4. the shared volume is mounted into the container;
/// 5. the shared volume and the init container are added to the pod, once per pod.
///
/// Calls for different containers of the same pod must not run concurrently, the pod is taken
/// as `&mut`.
#[derive(Clone, Copy, Debug)]
pub struct PodMutator<'p> {
    profile: &'p RuntimeProfile,
}

impl<'p> PodMutator<'p> {
    pub fn new(profile: &'p RuntimeProfile) -> Self {
        PodMutator { profile }
    }

    pub fn dotnet() -> PodMutator<'static> {
        PodMutator::new(&DOTNET)
    }

    pub fn profile(&self) -> &'p RuntimeProfile {
        self.profile
    }

    /// Instruments the container at `index`.
    ///
    /// On error `pod` is left unchanged. Calling this again for the same container fails with
    /// [`InjectionError::AlreadyInstrumented`].
    #[tracing::instrument(
        level = "trace",
        skip(self, descriptor, pod),
        fields(profile = %self.profile.name, image = %descriptor.image),
        err
    )]
    pub fn inject(
        &self,
        descriptor: &InstrumentationDescriptor,
        pod: &mut Pod,
        index: usize,
    ) -> Result<()> {
        let spec = pod.spec.as_mut().ok_or(InjectionError::PodSpecNotFound)?;
        let len = spec.containers.len();
        let container = spec
            .containers
            .get_mut(index)
            .ok_or(InjectionError::ContainerIndexOutOfRange { index, len })?;

        guard::check(self.profile, container, descriptor)?;

        self.inject_container(descriptor, container);

        if self.attach_shared_payload(spec, &descriptor.image) {
            debug!("init container attached");
        }

        Ok(())
    }

    /// Instruments every container named in `names`, or the first container when `names` is
    /// empty.
    ///
    /// Containers that can't be instrumented are skipped and reported, only a pod without a
    /// spec fails the whole call.
    #[tracing::instrument(level = "trace", skip(self, descriptor, pod), ret, err)]
    pub fn inject_containers(
        &self,
        descriptor: &InstrumentationDescriptor,
        pod: &mut Pod,
        names: &[String],
    ) -> Result<InjectionReport> {
        let containers = &pod
            .spec
            .as_ref()
            .ok_or(InjectionError::PodSpecNotFound)?
            .containers;

        let targets = if names.is_empty() {
            containers
                .first()
                .map(|container| vec![(container.name.clone(), Some(0))])
                .unwrap_or_default()
        } else {
            names
                .iter()
                .map(|name| {
                    let index = containers.iter().position(|container| &container.name == name);
                    (name.clone(), index)
                })
                .collect::<Vec<_>>()
        };

        let mut report = InjectionReport::default();

        for (name, index) in targets {
            let result = match index {
                Some(index) => self.inject(descriptor, pod, index),
                None => Err(InjectionError::ContainerNotFound(name.clone())),
            };

            match result {
                Ok(()) => report.instrumented.push(name),
                Err(fail) => {
                    warn!(
                        container = %name,
                        reason = %fail,
                        "skipping {} injection",
                        self.profile.name
                    );
                    report.skipped.push((name, fail));
                }
            }
        }

        Ok(report)
    }

    fn inject_container(&self, descriptor: &InstrumentationDescriptor, container: &mut Container) {
        let container_env = container.env.get_or_insert_with(Vec::new);

        for var in &descriptor.env {
            env::push_if_absent(container_env, var.clone());
        }
        trace!(container = %container.name, "descriptor env merged");

        for row in &self.profile.env {
            row.apply(container_env);
        }
        trace!(container = %container.name, "injection policy applied");

        container
            .volume_mounts
            .get_or_insert_with(Vec::new)
            .push(self.profile.volume_mount());
        trace!(container = %container.name, "volume mounted");
    }

    /// Adds the shared volume and the init container to `spec`, each keyed by its name so the
    /// pod never ends up with more than one of either.
    ///
    /// Returns `true` if the init container was added by this call.
    pub fn attach_shared_payload(&self, spec: &mut PodSpec, image: &str) -> bool {
        let volumes = spec.volumes.get_or_insert_with(Vec::new);
        if !volumes
            .iter()
            .any(|volume| volume.name == self.profile.volume.name)
        {
            volumes.push(self.profile.volume());
        }

        let init_containers = spec.init_containers.get_or_insert_with(Vec::new);
        if init_containers
            .iter()
            .any(|container| container.name == self.profile.init_container.name)
        {
            return false;
        }

        init_containers.push(self.profile.init_container(image));
        true
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::{EnvVar, Volume};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::env::literal;

    fn container(name: &str, env: &[(&str, &str)]) -> Container {
        Container {
            name: name.to_owned(),
            env: Some(env.iter().map(|(name, value)| literal(name, value)).collect()),
            ..Default::default()
        }
    }

    fn pod(containers: Vec<Container>) -> Pod {
        Pod {
            spec: Some(PodSpec {
                containers,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn env_value<'a>(pod: &'a Pod, index: usize, name: &str) -> Option<&'a str> {
        let env = pod.spec.as_ref()?.containers.get(index)?.env.as_deref()?;
        env::find(env, name)?.value.as_deref()
    }

    #[fixture]
    fn descriptor() -> InstrumentationDescriptor {
        InstrumentationDescriptor::new("agent:1.0")
    }

    #[rstest]
    fn second_call_is_rejected(descriptor: InstrumentationDescriptor) {
        let mut pod = pod(vec![container("app", &[("DOTNET_STARTUP_HOOKS", "/a")])]);
        let mutator = PodMutator::dotnet();

        mutator.inject(&descriptor, &mut pod, 0).unwrap();
        let after_first = pod.clone();

        assert_eq!(
            mutator.inject(&descriptor, &mut pod, 0),
            Err(InjectionError::AlreadyInstrumented {
                container: "app".to_owned(),
                variable: "OTEL_DOTNET_AUTO_HOME".to_owned(),
            })
        );
        assert_eq!(pod, after_first);
        assert_eq!(
            env_value(&pod, 0, "DOTNET_STARTUP_HOOKS"),
            Some("/a:/otel-auto-instrumentation/net/OpenTelemetry.AutoInstrumentation.StartupHook.dll")
        );
    }

    #[rstest]
    fn container_value_beats_descriptor(descriptor: InstrumentationDescriptor) {
        let descriptor = descriptor.with_env([
            literal("OTEL_SERVICE_NAME", "from-descriptor"),
            literal("OTEL_TRACES_SAMPLER", "always_on"),
        ]);
        let mut pod = pod(vec![container("app", &[("OTEL_SERVICE_NAME", "from-user")])]);

        PodMutator::dotnet().inject(&descriptor, &mut pod, 0).unwrap();

        assert_eq!(env_value(&pod, 0, "OTEL_SERVICE_NAME"), Some("from-user"));
        assert_eq!(env_value(&pod, 0, "OTEL_TRACES_SAMPLER"), Some("always_on"));
    }

    #[rstest]
    fn descriptor_can_preset_replaced_rows(descriptor: InstrumentationDescriptor) {
        let descriptor = descriptor.with_env([literal("CORECLR_ENABLE_PROFILING", "0")]);
        let mut pod = pod(vec![container("app", &[])]);

        PodMutator::dotnet().inject(&descriptor, &mut pod, 0).unwrap();

        assert_eq!(env_value(&pod, 0, "CORECLR_ENABLE_PROFILING"), Some("0"));
    }

    #[rstest]
    #[case::absent(&[], "1")]
    #[case::user_value(&[("CORECLR_ENABLE_PROFILING", "0")], "0")]
    fn replaced_row_first_writer_wins(
        descriptor: InstrumentationDescriptor,
        #[case] env: &[(&str, &str)],
        #[case] expected: &str,
    ) {
        let mut pod = pod(vec![container("app", env)]);

        PodMutator::dotnet().inject(&descriptor, &mut pod, 0).unwrap();

        assert_eq!(env_value(&pod, 0, "CORECLR_ENABLE_PROFILING"), Some(expected));
    }

    #[rstest]
    #[case::in_order(&[0, 1])]
    #[case::reversed(&[1, 0])]
    fn shared_payload_attached_once(
        descriptor: InstrumentationDescriptor,
        #[case] order: &[usize],
    ) {
        let mut pod = pod(vec![container("web", &[]), container("worker", &[])]);
        let mutator = PodMutator::dotnet();

        for index in order {
            mutator.inject(&descriptor, &mut pod, *index).unwrap();
        }

        let spec = pod.spec.as_ref().unwrap();
        assert_eq!(spec.volumes.as_ref().map(Vec::len), Some(1));
        assert_eq!(spec.init_containers.as_ref().map(Vec::len), Some(1));
        for container in &spec.containers {
            assert_eq!(container.volume_mounts.as_ref().map(Vec::len), Some(1));
        }
    }

    #[rstest]
    fn existing_user_volume_and_init_container_are_kept(descriptor: InstrumentationDescriptor) {
        let mut pod = pod(vec![container("app", &[])]);
        if let Some(spec) = pod.spec.as_mut() {
            spec.volumes = Some(vec![Volume {
                name: "data".to_owned(),
                ..Default::default()
            }]);
            spec.init_containers = Some(vec![container("migrate", &[])]);
        }

        PodMutator::dotnet().inject(&descriptor, &mut pod, 0).unwrap();

        let spec = pod.spec.unwrap();
        let volumes = spec.volumes.unwrap_or_default();
        let init_containers = spec.init_containers.unwrap_or_default();
        assert_eq!(
            volumes.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
            ["data", "opentelemetry-auto-instrumentation"]
        );
        assert_eq!(
            init_containers
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>(),
            ["migrate", "opentelemetry-auto-instrumentation"]
        );
    }

    #[rstest]
    fn attach_shared_payload_is_idempotent() {
        let mutator = PodMutator::dotnet();
        let mut spec = PodSpec::default();

        assert!(mutator.attach_shared_payload(&mut spec, "agent:1.0"));
        assert!(!mutator.attach_shared_payload(&mut spec, "agent:2.0"));

        let init_containers = spec.init_containers.unwrap_or_default();
        assert_eq!(init_containers.len(), 1);
        assert_eq!(init_containers[0].image.as_deref(), Some("agent:1.0"));
        assert_eq!(spec.volumes.map(|volumes| volumes.len()), Some(1));
    }

    #[rstest]
    fn reserved_conflict_leaves_pod_untouched(descriptor: InstrumentationDescriptor) {
        let mut pod = pod(vec![Container {
            name: "app".to_owned(),
            env: Some(vec![EnvVar {
                name: "DOTNET_ADDITIONAL_DEPS".to_owned(),
                value_from: Some(Default::default()),
                ..Default::default()
            }]),
            ..Default::default()
        }]);
        let before = pod.clone();

        let result = PodMutator::dotnet().inject(&descriptor, &mut pod, 0);

        assert!(matches!(
            result,
            Err(InjectionError::ReservedVariableConflict { .. })
        ));
        assert_eq!(pod, before);
    }

    #[rstest]
    fn descriptor_value_source_on_joined_row_leaves_pod_untouched(
        descriptor: InstrumentationDescriptor,
    ) {
        let descriptor = descriptor.with_env([EnvVar {
            name: "DOTNET_STARTUP_HOOKS".to_owned(),
            value_from: Some(Default::default()),
            ..Default::default()
        }]);
        let mut pod = pod(vec![container("app", &[])]);
        let before = pod.clone();

        let result = PodMutator::dotnet().inject(&descriptor, &mut pod, 0);

        assert!(matches!(
            result,
            Err(InjectionError::ReservedVariableConflict { .. })
        ));
        assert_eq!(pod, before);
    }

    #[rstest]
    fn missing_spec(descriptor: InstrumentationDescriptor) {
        let mut pod = Pod::default();

        assert_eq!(
            PodMutator::dotnet().inject(&descriptor, &mut pod, 0),
            Err(InjectionError::PodSpecNotFound)
        );
    }

    #[rstest]
    fn index_out_of_range(descriptor: InstrumentationDescriptor) {
        let mut pod = pod(vec![container("app", &[])]);

        assert_eq!(
            PodMutator::dotnet().inject(&descriptor, &mut pod, 3),
            Err(InjectionError::ContainerIndexOutOfRange { index: 3, len: 1 })
        );
    }

    #[rstest]
    fn inject_containers_defaults_to_first(descriptor: InstrumentationDescriptor) {
        let mut pod = pod(vec![container("app", &[]), container("sidecar", &[])]);

        let report = PodMutator::dotnet()
            .inject_containers(&descriptor, &mut pod, &[])
            .unwrap();

        assert_eq!(report.instrumented, ["app"]);
        assert!(report.skipped.is_empty());
        assert_eq!(env_value(&pod, 1, "OTEL_DOTNET_AUTO_HOME"), None);
    }

    #[rstest]
    fn inject_containers_skips_and_reports(descriptor: InstrumentationDescriptor) {
        let mut pod = pod(vec![
            container("web", &[]),
            container("legacy", &[("OTEL_DOTNET_AUTO_HOME", "/opt/otel")]),
            container("worker", &[]),
        ]);
        let names = ["worker", "legacy", "missing", "web"].map(str::to_owned);

        let report = PodMutator::dotnet()
            .inject_containers(&descriptor, &mut pod, &names)
            .unwrap();

        assert_eq!(report.instrumented, ["worker", "web"]);
        assert_eq!(
            report.skipped,
            [
                (
                    "legacy".to_owned(),
                    InjectionError::AlreadyInstrumented {
                        container: "legacy".to_owned(),
                        variable: "OTEL_DOTNET_AUTO_HOME".to_owned(),
                    }
                ),
                (
                    "missing".to_owned(),
                    InjectionError::ContainerNotFound("missing".to_owned())
                ),
            ]
        );
        assert_eq!(
            pod.spec.and_then(|spec| spec.init_containers).map(|c| c.len()),
            Some(1)
        );
    }
}
