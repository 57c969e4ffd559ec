//! Helpers over an ordered list of [`EnvVar`]s.
//!
//! None of these remove or reorder entries, they either append a new entry or rewrite the value
//! of an existing one.

use k8s_openapi::api::core::v1::EnvVar;

/// Separator for variables that hold a search path (startup hooks, dependency stores).
pub const PATH_SEPARATOR: char = ':';

/// Builds an [`EnvVar`] with a plain value.
pub fn literal(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_owned(),
        value: Some(value.to_owned()),
        value_from: None,
    }
}

/// Index of the first variable called `name`.
pub fn position(env: &[EnvVar], name: &str) -> Option<usize> {
    env.iter().position(|var| var.name == name)
}

pub fn find<'a>(env: &'a [EnvVar], name: &str) -> Option<&'a EnvVar> {
    env.iter().find(|var| var.name == name)
}

pub fn contains(env: &[EnvVar], name: &str) -> bool {
    position(env, name).is_some()
}

/// Appends `var` unless a variable with the same name is already there.
///
/// Returns `true` if `var` was appended.
pub fn push_if_absent(env: &mut Vec<EnvVar>, var: EnvVar) -> bool {
    if contains(env, &var.name) {
        false
    } else {
        env.push(var);
        true
    }
}

/// Sets `name` to `value` only when `name` is not defined yet, first writer wins.
pub fn insert_if_absent(env: &mut Vec<EnvVar>, name: &str, value: &str) -> bool {
    push_if_absent(env, literal(name, value))
}

/// Appends `value` to an existing `name` with [`PATH_SEPARATOR`], or inserts it.
///
/// Segments are not deduplicated, calling this twice for the same `value` repeats it.
pub fn concat_or_insert(env: &mut Vec<EnvVar>, name: &str, value: &str) {
    match env.iter_mut().find(|var| var.name == name) {
        Some(var) => {
            let existing = var.value.as_deref().unwrap_or_default();
            var.value = Some(format!("{existing}{PATH_SEPARATOR}{value}"));
        }
        None => env.push(literal(name, value)),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<EnvVar> {
        pairs
            .iter()
            .map(|(name, value)| literal(name, value))
            .collect()
    }

    #[rstest]
    #[case(&[], "FOO", None)]
    #[case(&[("FOO", "1")], "FOO", Some(0))]
    #[case(&[("BAR", "1"), ("FOO", "2")], "FOO", Some(1))]
    #[case(&[("FOO", "1"), ("FOO", "2")], "FOO", Some(0))]
    #[case(&[("foo", "1")], "FOO", None)]
    fn position_by_name(
        #[case] env: &[(&str, &str)],
        #[case] name: &str,
        #[case] expected: Option<usize>,
    ) {
        assert_eq!(position(&vars(env), name), expected);
    }

    #[test]
    fn insert_if_absent_keeps_first_writer() {
        let mut env = vars(&[("FOO", "user")]);

        assert!(!insert_if_absent(&mut env, "FOO", "engine"));
        assert!(insert_if_absent(&mut env, "BAR", "engine"));

        assert_eq!(env, vars(&[("FOO", "user"), ("BAR", "engine")]));
    }

    #[rstest]
    #[case(&[("PATHS", "/a")], "/a:/b")]
    #[case(&[("PATHS", "/a:/x")], "/a:/x:/b")]
    #[case(&[("PATHS", "")], ":/b")]
    #[case(&[], "/b")]
    fn concat_or_insert_joins_with_colon(#[case] env: &[(&str, &str)], #[case] expected: &str) {
        let mut env = vars(env);

        concat_or_insert(&mut env, "PATHS", "/b");

        assert_eq!(env.len(), 1);
        assert_eq!(find(&env, "PATHS").and_then(|var| var.value.as_deref()), Some(expected));
    }

    #[test]
    fn concat_or_insert_treats_missing_value_as_empty() {
        let mut env = vec![EnvVar {
            name: "PATHS".to_owned(),
            ..Default::default()
        }];

        concat_or_insert(&mut env, "PATHS", "/b");

        assert_eq!(env[0].value.as_deref(), Some(":/b"));
    }

    #[test]
    fn concat_or_insert_does_not_deduplicate() {
        let mut env = Vec::new();

        concat_or_insert(&mut env, "PATHS", "/b");
        concat_or_insert(&mut env, "PATHS", "/b");

        assert_eq!(env, vars(&[("PATHS", "/b:/b")]));
    }

    #[test]
    fn existing_entries_keep_their_order() {
        let mut env = vars(&[("A", "1"), ("B", "2"), ("C", "3")]);

        concat_or_insert(&mut env, "B", "x");
        insert_if_absent(&mut env, "D", "4");

        let names = env.iter().map(|var| var.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["A", "B", "C", "D"]);
    }
}
