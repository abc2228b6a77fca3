use serde::{Deserialize, Serialize};

/// Account record returned alongside tokens by the login and refresh
/// endpoints. The backend omits most fields outside the full profile view,
/// so everything but the email is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
}

impl UserProfile {
    /// Display name, falling back to the email's local part
    pub fn display_name(&self) -> &str {
        if let Some(ref name) = self.username {
            if !name.is_empty() {
                return name;
            }
        }
        self.email.split('@').next().unwrap_or(&self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_username() {
        let user = UserProfile {
            email: "a@b.com".to_string(),
            id: Some(1),
            username: Some("reader".to_string()),
            profile_image: None,
        };
        assert_eq!(user.display_name(), "reader");
    }

    #[test]
    fn test_display_name_falls_back_to_email_local_part() {
        let user: UserProfile = serde_json::from_str(r#"{"email": "a@b.com"}"#)
            .expect("minimal user JSON should parse");
        assert_eq!(user.display_name(), "a");
    }
}
