use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Employee,
    Employer,
}

/// Profile document stored under `users/<uid>`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
}

impl UserProfile {
    /// Profile written at sign-up: no skills or locations yet.
    pub fn new(name: &str, email: &str, role: Role) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            role,
            skills: Vec::new(),
            locations: Vec::new(),
        }
    }
}

#[cfg(test)]
mod profile_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_uses_lowercase_names() {
        let profile = UserProfile::new("Ann", "ann@example.com", Role::Employer);
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["role"], json!("employer"));
        assert_eq!(value["skills"], json!([]));
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let profile: UserProfile =
            serde_json::from_value(json!({ "name": "Bo", "email": "bo@x.io", "role": "employee" }))
                .unwrap();
        assert!(profile.skills.is_empty());
        assert!(profile.locations.is_empty());
        assert_eq!(profile.role, Role::Employee);
    }
}
