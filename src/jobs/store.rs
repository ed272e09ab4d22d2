use std::sync::Arc;

use serde_json::json;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, instrument, warn};

use super::filter::{compute_filtered_jobs, unique, JobFilter};
use super::model::{Facets, Job};
use crate::error::StoreResult;
use crate::lifecycle::Lifecycle;
use crate::storage::{decode, encode, DocumentStore, FACETS_KEY, JOBS};
use crate::users::Role;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobsState {
    pub jobs: Vec<Job>,
    pub filtered_jobs: Vec<Job>,
    pub selected_skills: Vec<String>,
    pub selected_locations: Vec<String>,
    pub search_query: String,
    pub global_skills: Vec<String>,
    pub global_locations: Vec<String>,
    pub lifecycle: Lifecycle,
}

impl JobsState {
    pub fn initialized(&self) -> bool {
        self.lifecycle.is_ready()
    }

    pub fn filter(&self) -> JobFilter {
        JobFilter {
            skills: self.selected_skills.clone(),
            locations: self.selected_locations.clone(),
            query: self.search_query.clone(),
        }
    }

    fn recompute(&mut self) {
        self.filtered_jobs = compute_filtered_jobs(&self.jobs, &self.filter());
    }
}

/// Job collection, its filtered view and the facet aggregate.
///
/// Every filter mutation recomputes `filtered_jobs` from all three criteria.
pub struct JobsStore {
    documents: Arc<dyn DocumentStore>,
    state: watch::Sender<JobsState>,
    init_lock: Mutex<()>,
    facet_lock: Mutex<()>,
}

impl JobsStore {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        let (state, _rx) = watch::channel(JobsState::default());
        Self {
            documents,
            state,
            init_lock: Mutex::new(()),
            facet_lock: Mutex::new(()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<JobsState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> JobsState {
        self.state.borrow().clone()
    }

    pub(crate) fn documents(&self) -> &dyn DocumentStore {
        self.documents.as_ref()
    }

    /// Every posting except the facet aggregate. Malformed documents are skipped.
    async fn fetch_jobs(&self) -> StoreResult<Vec<Job>> {
        let docs = self.documents.get_all(JOBS).await?;
        let jobs = docs
            .into_iter()
            .filter(|d| d.key != FACETS_KEY)
            .filter_map(|d| {
                let key = d.key.clone();
                match Job::from_document(d) {
                    Ok(job) => Some(job),
                    Err(e) => {
                        warn!(key = %key, error = %e, "skipping malformed job");
                        None
                    }
                }
            })
            .collect();
        Ok(jobs)
    }

    #[instrument(skip(self))]
    pub async fn initialize(&self) -> StoreResult<()> {
        let _guard = self.init_lock.lock().await;
        if self.state.borrow().initialized() {
            return Ok(());
        }

        self.state.send_modify(|s| s.lifecycle = Lifecycle::Loading);
        let jobs = match self.fetch_jobs().await {
            Ok(jobs) => jobs,
            Err(e) => {
                error!(error = %e, "job fetch failed");
                self.state.send_modify(|s| s.lifecycle = Lifecycle::Failed);
                return Err(e);
            }
        };

        let count = jobs.len();
        self.state.send_modify(|s| {
            s.filtered_jobs = jobs.clone();
            s.jobs = jobs;
            s.lifecycle = Lifecycle::Ready;
        });
        info!(count, "jobs loaded");
        Ok(())
    }

    pub fn set_filter(&self, skills: Vec<String>, locations: Vec<String>) {
        self.state.send_modify(|s| {
            s.selected_skills = skills;
            s.selected_locations = locations;
            s.recompute();
        });
    }

    pub fn set_search_query(&self, query: &str) {
        self.state.send_modify(|s| {
            s.search_query = query.to_string();
            s.recompute();
        });
    }

    pub fn employer_jobs(&self, employer_id: &str) -> Vec<Job> {
        self.state
            .borrow()
            .jobs
            .iter()
            .filter(|j| j.employer_id == employer_id)
            .cloned()
            .collect()
    }

    pub fn job(&self, job_id: &str) -> Option<Job> {
        self.state
            .borrow()
            .jobs
            .iter()
            .find(|j| j.id == job_id)
            .cloned()
    }

    /// What the explore screen lists: an employer's own postings in
    /// "my jobs" mode, the filtered view otherwise.
    pub fn displayed_jobs(&self, role: Role, employer_view: bool, uid: &str) -> Vec<Job> {
        if role == Role::Employer && employer_view {
            self.employer_jobs(uid)
        } else {
            self.state.borrow().filtered_jobs.clone()
        }
    }

    /// Local-only insert at the head of both lists, filters notwithstanding.
    pub fn add_job(&self, job: Job) {
        let job = Job {
            candidates: Vec::new(),
            ..job
        };
        debug!(job_id = %job.id, "job added locally");
        self.state.send_modify(|s| {
            s.filtered_jobs.insert(0, job.clone());
            s.jobs.insert(0, job);
        });
    }

    /// Records `user_id` as a candidate remotely, then locally. Repeated calls
    /// leave a single entry on both sides.
    #[instrument(skip(self))]
    pub async fn apply_to_job(&self, job_id: &str, user_id: &str) -> StoreResult<()> {
        if let Err(e) = self
            .documents
            .union_append(JOBS, job_id, "candidates", json!(user_id))
            .await
        {
            error!(error = %e, job_id, user_id, "apply failed");
            return Err(e);
        }

        self.state.send_modify(|s| {
            for job in s.jobs.iter_mut().chain(s.filtered_jobs.iter_mut()) {
                if job.id == job_id && !job.candidates.iter().any(|c| c == user_id) {
                    job.candidates.push(user_id.to_string());
                }
            }
        });
        info!(job_id, user_id, "applied to job");
        Ok(())
    }

    /// Replaces the local facets with the stored aggregate, when one exists.
    #[instrument(skip(self))]
    pub async fn fetch_global_skills_and_locations(&self) -> StoreResult<()> {
        let Some(fields) = self.documents.get_one(JOBS, FACETS_KEY).await? else {
            debug!("no facet aggregate stored");
            return Ok(());
        };
        let facets: Facets = decode(JOBS, FACETS_KEY, fields)?;
        self.state.send_modify(|s| {
            s.global_skills = facets.skills;
            s.global_locations = facets.locations;
        });
        Ok(())
    }

    /// Grows the facet aggregate; entries are never removed.
    ///
    /// The union starts from the stored record, so entries written by other
    /// clients (or before this store was created) survive.
    #[instrument(skip(self))]
    pub async fn update_global_skills_and_locations(
        &self,
        new_skills: &[String],
        new_location: &str,
    ) -> StoreResult<()> {
        let _guard = self.facet_lock.lock().await;
        let stored = match self.documents.get_one(JOBS, FACETS_KEY).await? {
            Some(fields) => decode::<Facets>(JOBS, FACETS_KEY, fields)?,
            None => Facets::default(),
        };
        let facets = {
            let s = self.state.borrow();
            let skills = unique(
                stored
                    .skills
                    .iter()
                    .chain(&s.global_skills)
                    .chain(new_skills)
                    .cloned(),
            );
            let locations = unique(
                stored
                    .locations
                    .iter()
                    .chain(&s.global_locations)
                    .cloned()
                    .chain(std::iter::once(new_location.to_string())),
            );
            Facets { skills, locations }
        };

        if let Err(e) = self
            .documents
            .set_one(JOBS, FACETS_KEY, encode(&facets)?)
            .await
        {
            error!(error = %e, "facet update failed");
            return Err(e);
        }

        self.state.send_modify(|s| {
            s.global_skills = facets.skills;
            s.global_locations = facets.locations;
        });
        Ok(())
    }

    /// Re-reads the collection and re-applies the current filter.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> StoreResult<()> {
        let jobs = match self.fetch_jobs().await {
            Ok(jobs) => jobs,
            Err(e) => {
                error!(error = %e, "job refresh failed");
                return Err(e);
            }
        };
        let count = jobs.len();
        self.state.send_modify(|s| {
            s.jobs = jobs;
            s.recompute();
        });
        info!(count, "jobs refreshed");
        Ok(())
    }
}
