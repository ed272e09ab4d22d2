use std::sync::Arc;

use serde_json::json;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, instrument, warn};

use super::model::{Role, UserProfile};
use crate::error::StoreResult;
use crate::identity::Identity;
use crate::jobs::unique;
use crate::lifecycle::Lifecycle;
use crate::storage::{decode, DocumentStore, Fields, USERS};

/// Signed-in user's profile as seen by the screens.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserState {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub skills: Vec<String>,
    pub locations: Vec<String>,
    pub lifecycle: Lifecycle,
}

impl UserState {
    pub fn initialized(&self) -> bool {
        self.lifecycle.is_ready()
    }
}

pub struct UserStore {
    documents: Arc<dyn DocumentStore>,
    identity: Arc<dyn Identity>,
    state: watch::Sender<UserState>,
    init_lock: Mutex<()>,
}

impl UserStore {
    pub fn new(documents: Arc<dyn DocumentStore>, identity: Arc<dyn Identity>) -> Self {
        let (state, _rx) = watch::channel(UserState::default());
        Self {
            documents,
            identity,
            state,
            init_lock: Mutex::new(()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<UserState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> UserState {
        self.state.borrow().clone()
    }

    /// Loads the profile of the current session once.
    ///
    /// A missing profile document leaves the store uninitialized so a later
    /// call can try again.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> StoreResult<()> {
        let _guard = self.init_lock.lock().await;
        if self.state.borrow().initialized() {
            return Ok(());
        }
        let Some(session) = self.identity.current_session() else {
            debug!("no active session; profile not loaded");
            return Ok(());
        };

        self.state.send_modify(|s| s.lifecycle = Lifecycle::Loading);
        let fields = match self.documents.get_one(USERS, &session.uid).await {
            Ok(f) => f,
            Err(e) => {
                error!(error = %e, uid = %session.uid, "profile fetch failed");
                self.state.send_modify(|s| s.lifecycle = Lifecycle::Failed);
                return Err(e);
            }
        };

        let Some(fields) = fields else {
            warn!(uid = %session.uid, "profile document missing");
            self.state.send_modify(|s| s.lifecycle = Lifecycle::Uninitialized);
            return Ok(());
        };

        let profile: UserProfile = match decode(USERS, &session.uid, fields) {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, uid = %session.uid, "profile document malformed");
                self.state.send_modify(|s| s.lifecycle = Lifecycle::Failed);
                return Err(e);
            }
        };

        self.state.send_modify(|s| {
            s.name = profile.name;
            s.email = profile.email;
            s.role = profile.role;
            s.skills = profile.skills;
            s.locations = profile.locations;
            s.lifecycle = Lifecycle::Ready;
        });
        info!(uid = %session.uid, "profile loaded");
        Ok(())
    }

    /// Persists new preferences, then mirrors them locally.
    #[instrument(skip(self))]
    pub async fn update_skills_and_locations(
        &self,
        skills: Vec<String>,
        locations: Vec<String>,
    ) -> StoreResult<()> {
        let Some(session) = self.identity.current_session() else {
            debug!("no active session; preferences not saved");
            return Ok(());
        };

        let skills = unique(skills);
        let locations = unique(locations);
        let mut fields = Fields::new();
        fields.insert("skills".into(), json!(skills));
        fields.insert("locations".into(), json!(locations));

        if let Err(e) = self
            .documents
            .update_fields(USERS, &session.uid, fields)
            .await
        {
            error!(error = %e, uid = %session.uid, "preference update failed");
            return Err(e);
        }

        self.state.send_modify(|s| {
            s.skills = skills;
            s.locations = locations;
        });
        info!(uid = %session.uid, "preferences updated");
        Ok(())
    }

    /// Back to defaults; used on sign-out.
    pub fn reset(&self) {
        self.state.send_replace(UserState::default());
    }
}

/// Reads another user's profile, e.g. an applicant shown to an employer.
pub async fn fetch_candidate_profile(
    documents: &dyn DocumentStore,
    candidate_id: &str,
) -> StoreResult<Option<UserProfile>> {
    if candidate_id.is_empty() {
        return Ok(None);
    }
    match documents.get_one(USERS, candidate_id).await? {
        Some(fields) => decode(USERS, candidate_id, fields).map(Some),
        None => Ok(None),
    }
}
