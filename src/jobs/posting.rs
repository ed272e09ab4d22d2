use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{error, info, instrument};

use super::model::{Job, JobDraft};
use crate::error::{StoreError, StoreResult};
use crate::state::AppState;
use crate::storage::{encode, JOBS};

fn split_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Publishes a new posting for the signed-in employer.
///
/// The facet aggregate and the job document are written first; the local
/// store only sees the job once both writes have succeeded.
#[instrument(skip(st, draft), fields(title = %draft.title))]
pub async fn post_job(st: &AppState, draft: JobDraft) -> StoreResult<Job> {
    let required = [
        &draft.title,
        &draft.description,
        &draft.salary,
        &draft.location,
        &draft.skills,
    ];
    if required.iter().any(|f| f.trim().is_empty()) {
        return Err(StoreError::Validation("Please fill all fields".into()));
    }
    let skills = split_skills(&draft.skills);
    if skills.is_empty() {
        return Err(StoreError::Validation("Please fill all fields".into()));
    }
    let Some(session) = st.identity.current_session() else {
        return Err(StoreError::Validation(
            "You must be signed in to post a job".into(),
        ));
    };

    let location = draft.location.trim().to_string();
    st.jobs
        .update_global_skills_and_locations(&skills, &location)
        .await?;

    let created_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| StoreError::Validation(e.to_string()))?;
    let mut job = Job {
        id: String::new(),
        title: draft.title,
        description: draft.description,
        salary: draft.salary,
        location,
        skills,
        employer_id: session.uid,
        company_name: st.users.snapshot().name,
        candidates: Vec::new(),
        created_at: Some(created_at),
    };

    job.id = match st.jobs.documents().insert(JOBS, encode(&job)?).await {
        Ok(key) => key,
        Err(e) => {
            error!(error = %e, "job insert failed");
            return Err(e);
        }
    };

    st.jobs.add_job(job.clone());
    info!(job_id = %job.id, employer_id = %job.employer_id, "job posted");
    Ok(job)
}

#[cfg(test)]
mod posting_tests {
    use super::*;
    use crate::jobs::Facets;
    use crate::storage::{decode, DocumentStore, MemoryDocumentStore, FACETS_KEY};
    use crate::users::{Role, UserProfile};
    use std::sync::Arc;

    fn draft() -> JobDraft {
        JobDraft {
            title: "Mobile Developer".into(),
            description: "Build the app".into(),
            salary: "₹80,000 - ₹1,20,000".into(),
            location: "  Mumbai ".into(),
            skills: "React Native, TypeScript , ,Firebase".into(),
        }
    }

    async fn employer_state() -> (AppState, Arc<MemoryDocumentStore>, String) {
        let documents = Arc::new(MemoryDocumentStore::new());
        let st = AppState::fake_with_store(documents.clone());
        let session = st.identity.sign_up("hr@acme.io", "secret1").await.unwrap();
        let profile = UserProfile::new("Acme", "hr@acme.io", Role::Employer);
        documents
            .set_one(crate::storage::USERS, &session.uid, encode(&profile).unwrap())
            .await
            .unwrap();
        st.users.initialize().await.unwrap();
        (st, documents, session.uid)
    }

    #[test]
    fn skills_are_split_and_trimmed() {
        assert_eq!(
            split_skills("Go, Rust ,, SQL"),
            vec!["Go".to_string(), "Rust".to_string(), "SQL".to_string()]
        );
    }

    #[tokio::test]
    async fn posting_writes_remote_then_local() {
        let (st, documents, uid) = employer_state().await;
        st.jobs.initialize().await.unwrap();

        let job = post_job(&st, draft()).await.unwrap();
        assert_eq!(job.location, "Mumbai");
        assert_eq!(job.employer_id, uid);
        assert_eq!(job.company_name, "Acme");
        assert_eq!(job.skills.len(), 3);
        assert!(job.created_at.is_some());

        let stored = documents.get_one(JOBS, &job.id).await.unwrap().unwrap();
        assert_eq!(stored.get("companyName"), Some(&serde_json::json!("Acme")));

        let state = st.jobs.snapshot();
        assert_eq!(state.jobs[0].id, job.id);
        assert_eq!(state.global_locations, vec!["Mumbai".to_string()]);
        assert!(documents.get_one(JOBS, FACETS_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn posting_merges_into_the_stored_facets() {
        let (st, documents, _uid) = employer_state().await;
        let seeded = Facets {
            skills: vec!["Go".into(), "Rust".into()],
            locations: vec!["NYC".into(), "SF".into()],
        };
        documents
            .set_one(JOBS, FACETS_KEY, encode(&seeded).unwrap())
            .await
            .unwrap();

        let mut figma = draft();
        figma.skills = "Figma".into();
        figma.location = "Pune".into();
        post_job(&st, figma).await.unwrap();

        let stored: Facets = decode(
            JOBS,
            FACETS_KEY,
            documents.get_one(JOBS, FACETS_KEY).await.unwrap().unwrap(),
        )
        .unwrap();
        assert_eq!(stored.skills, vec!["Go", "Rust", "Figma"]);
        assert_eq!(stored.locations, vec!["NYC", "SF", "Pune"]);
    }

    #[tokio::test]
    async fn incomplete_draft_is_rejected_before_any_write() {
        let (st, documents, _uid) = employer_state().await;
        let mut incomplete = draft();
        incomplete.salary = "   ".into();
        let err = post_job(&st, incomplete).await.unwrap_err();
        assert_eq!(err.user_message(), "Please fill all fields");

        let mut no_skills = draft();
        no_skills.skills = " , ".into();
        assert!(post_job(&st, no_skills).await.is_err());

        assert!(documents.get_all(JOBS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn posting_requires_a_session() {
        let (st, _documents, _uid) = employer_state().await;
        st.identity.sign_out().await.unwrap();
        let err = post_job(&st, draft()).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn failed_write_keeps_job_out_of_the_store() {
        let (st, documents, _uid) = employer_state().await;
        st.jobs.initialize().await.unwrap();
        documents.set_fail_writes(true);
        assert!(post_job(&st, draft()).await.is_err());
        assert!(st.jobs.snapshot().jobs.is_empty());
    }
}
