use tracing::{error, info, instrument, warn};

use super::dto::{AuthErrors, SignInRequest, SignUpRequest};
use crate::error::StoreError;
use crate::identity::Session;
use crate::state::AppState;
use crate::storage::{encode, USERS};
use crate::users::UserProfile;
use crate::validation::field_error_message;

fn local_errors(email: &str, password: &str) -> Option<AuthErrors> {
    let errors = AuthErrors {
        email: field_error_message("email", email),
        password: field_error_message("password", password),
        general: String::new(),
    };
    (!errors.is_empty()).then_some(errors)
}

/// Maps a backend failure onto the form. `email_code` and `password_code`
/// select which field repeats the general message.
fn remote_errors(err: &StoreError, email_code: &str, password_code: &str) -> AuthErrors {
    let message = err.user_message();
    let code = err.code().unwrap_or_default();
    AuthErrors {
        email: if code == email_code { message.clone() } else { String::new() },
        password: if code == password_code { message.clone() } else { String::new() },
        general: message,
    }
}

/// Creates the account, then its profile document with empty preferences.
///
/// When the profile cannot be written the new session is closed again, so
/// the caller is never left signed in without a profile. The account itself
/// stays registered.
#[instrument(skip(st, req), fields(email = %req.email, role = ?req.role))]
pub async fn sign_up(st: &AppState, req: SignUpRequest) -> Result<Session, AuthErrors> {
    if let Some(errors) = local_errors(&req.email, &req.password) {
        return Err(errors);
    }

    let session = match st.identity.sign_up(&req.email, &req.password).await {
        Ok(session) => session,
        Err(e) => {
            warn!(error = %e, "sign up failed");
            return Err(remote_errors(
                &e,
                "auth/email-already-in-use",
                "auth/weak-password",
            ));
        }
    };

    let profile = UserProfile::new(&req.name, &session.email, req.role);
    let written = match encode(&profile) {
        Ok(fields) => st.documents.set_one(USERS, &session.uid, fields).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        error!(uid = %session.uid, error = %e, "profile write failed; closing session");
        if let Err(e) = st.identity.sign_out().await {
            warn!(error = %e, "sign out after failed sign up");
        }
        return Err(AuthErrors {
            general: e.user_message(),
            ..AuthErrors::default()
        });
    }

    info!(uid = %session.uid, "user registered");
    Ok(session)
}

#[instrument(skip(st, req), fields(email = %req.email))]
pub async fn sign_in(st: &AppState, req: SignInRequest) -> Result<Session, AuthErrors> {
    if let Some(errors) = local_errors(&req.email, &req.password) {
        return Err(errors);
    }

    match st.identity.sign_in(&req.email, &req.password).await {
        Ok(session) => {
            info!(uid = %session.uid, "user logged in");
            Ok(session)
        }
        Err(e) => {
            warn!(error = %e, "sign in failed");
            Err(remote_errors(&e, "auth/user-not-found", "auth/wrong-password"))
        }
    }
}

/// Clears the profile store before ending the session.
#[instrument(skip(st))]
pub async fn sign_out(st: &AppState) -> Result<(), AuthErrors> {
    st.users.reset();
    st.identity.sign_out().await.map_err(|e| AuthErrors {
        general: e.user_message(),
        ..AuthErrors::default()
    })
}

#[cfg(test)]
mod flow_tests {
    use super::*;
    use crate::storage::MemoryDocumentStore;
    use crate::users::Role;
    use std::sync::Arc;

    fn signup(email: &str, password: &str) -> SignUpRequest {
        SignUpRequest {
            name: "Ann".into(),
            email: email.into(),
            password: password.into(),
            role: Role::Employer,
        }
    }

    fn signin(email: &str, password: &str) -> SignInRequest {
        SignInRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn sign_up_creates_profile_document() {
        let st = AppState::fake();
        let session = sign_up(&st, signup("ann@example.com", "secret1"))
            .await
            .unwrap();

        st.users.initialize().await.unwrap();
        let user = st.users.snapshot();
        assert_eq!(user.name, "Ann");
        assert_eq!(user.role, Role::Employer);
        assert!(user.skills.is_empty());
        assert_eq!(st.identity.current_session(), Some(session));
    }

    #[tokio::test]
    async fn local_validation_short_circuits() {
        let st = AppState::fake();
        let errors = sign_up(&st, signup("", "123")).await.unwrap_err();
        assert_eq!(errors.email, "Email is required");
        assert_eq!(errors.password, "Password must be at least 6 characters");
        assert!(errors.general.is_empty());
        assert!(st.identity.current_session().is_none());

        let errors = sign_in(&st, signin("bad", "123456")).await.unwrap_err();
        assert_eq!(errors.email, "Invalid email format");
        assert!(errors.password.is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_is_reported_on_the_email_field() {
        let st = AppState::fake();
        sign_up(&st, signup("ann@example.com", "secret1"))
            .await
            .unwrap();
        let errors = sign_up(&st, signup("ann@example.com", "secret1"))
            .await
            .unwrap_err();
        assert_eq!(errors.general, "Email is already registered");
        assert_eq!(errors.email, "Email is already registered");
        assert!(errors.password.is_empty());
    }

    #[tokio::test]
    async fn sign_in_errors_target_fields() {
        let st = AppState::fake();
        let errors = sign_in(&st, signin("nobody@example.com", "secret1"))
            .await
            .unwrap_err();
        assert_eq!(errors.email, "No account found with this email");

        sign_up(&st, signup("ann@example.com", "secret1"))
            .await
            .unwrap();
        let errors = sign_in(&st, signin("ann@example.com", "secret2"))
            .await
            .unwrap_err();
        assert_eq!(errors.password, "Incorrect password");
        assert_eq!(errors.general, "Incorrect password");
        assert!(errors.email.is_empty());
    }

    #[tokio::test]
    async fn failed_profile_write_closes_the_session() {
        let documents = Arc::new(MemoryDocumentStore::new());
        let st = AppState::fake_with_store(documents.clone());
        documents.set_fail_writes(true);

        let errors = sign_up(&st, signup("ann@example.com", "secret1"))
            .await
            .unwrap_err();
        assert!(!errors.general.is_empty());
        assert!(errors.email.is_empty());
        assert!(st.identity.current_session().is_none());
    }

    #[tokio::test]
    async fn sign_out_resets_profile() {
        let st = AppState::fake();
        sign_up(&st, signup("ann@example.com", "secret1"))
            .await
            .unwrap();
        st.users.initialize().await.unwrap();
        assert!(st.users.snapshot().initialized());

        sign_out(&st).await.unwrap();
        assert!(!st.users.snapshot().initialized());
        assert!(st.users.snapshot().name.is_empty());
        assert!(st.identity.current_session().is_none());
    }
}
