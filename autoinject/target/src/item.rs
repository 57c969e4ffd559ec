use serde::{Deserialize, Serialize};

use crate::labels::LabelSet;

/// Link to the allocator endpoint listing a job's targets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkJson {
    #[serde(rename = "_link")]
    pub link: String,
}

impl LinkJson {
    /// `/jobs/<job>/targets`, with `job_name` query-escaped.
    pub fn for_job(job_name: &str) -> Self {
        LinkJson {
            link: format!("/jobs/{}/targets", query_escape(job_name)),
        }
    }
}

/// A single scrape target assigned (or to be assigned) to a collector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TargetItem {
    pub job_name: String,
    pub link: LinkJson,
    #[serde(rename = "TargetURL")]
    pub target_url: String,
    #[serde(rename = "Label")]
    pub labels: LabelSet,
    pub collector_name: String,
}

impl TargetItem {
    pub fn new(
        job_name: impl Into<String>,
        target_url: impl Into<String>,
        labels: LabelSet,
        collector_name: impl Into<String>,
    ) -> Self {
        let job_name = job_name.into();

        TargetItem {
            link: LinkJson::for_job(&job_name),
            job_name,
            target_url: target_url.into(),
            labels,
            collector_name: collector_name.into(),
        }
    }

    /// Identity used by the allocator to deduplicate targets.
    ///
    /// `job_name + target_url + fingerprint(labels)`, the collector is not part of it.
    pub fn hash(&self) -> String {
        format!(
            "{}{}{}",
            self.job_name,
            self.target_url,
            self.labels.fingerprint()
        )
    }
}

/// Escapes `value` for use in a URL query component, a space becomes `+`.
pub fn query_escape(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}
