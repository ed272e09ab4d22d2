use super::model::Job;

/// Active skill, location and text criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub skills: Vec<String>,
    pub locations: Vec<String>,
    pub query: String,
}

impl JobFilter {
    /// Empty criteria match everything. Skills match on any overlap.
    pub fn matches(&self, job: &Job) -> bool {
        let skill_ok =
            self.skills.is_empty() || job.skills.iter().any(|s| self.skills.contains(s));
        let location_ok = self.locations.is_empty() || self.locations.contains(&job.location);
        skill_ok && location_ok && self.matches_query(job)
    }

    fn matches_query(&self, job: &Job) -> bool {
        if self.query.is_empty() {
            return true;
        }
        let needle = self.query.to_lowercase();
        [&job.title, &job.description, &job.company_name]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

pub fn compute_filtered_jobs(jobs: &[Job], filter: &JobFilter) -> Vec<Job> {
    jobs.iter().filter(|j| filter.matches(j)).cloned().collect()
}

/// Drops repeated entries, keeping the first occurrence.
pub fn unique(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

/// Adds `value` when absent, removes it when present.
pub fn toggle(values: &[String], value: &str) -> Vec<String> {
    if values.iter().any(|v| v == value) {
        values.iter().filter(|v| *v != value).cloned().collect()
    } else {
        let mut out = values.to_vec();
        out.push(value.to_string());
        out
    }
}

/// Case-insensitive substring search over a facet list.
pub fn search_facets(values: &[String], needle: &str) -> Vec<String> {
    let needle = needle.to_lowercase();
    values
        .iter()
        .filter(|v| v.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}
