use crate::users::Role;

/// Sign-up form.
#[derive(Debug, Clone)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Sign-in form.
#[derive(Debug, Clone)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Per-field messages shown under an auth form. Empty means no error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthErrors {
    pub email: String,
    pub password: String,
    pub general: String,
}

impl AuthErrors {
    pub fn is_empty(&self) -> bool {
        self.email.is_empty() && self.password.is_empty() && self.general.is_empty()
    }
}
