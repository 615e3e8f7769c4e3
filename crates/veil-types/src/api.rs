use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Auth --

/// Field presence is validated in the handler (empty string counts as
/// missing, mirroring the 400 contract) rather than by serde, so the error
/// body stays in the `{error}` shape.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Identity as returned by signup, login and `/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

// -- Preferences --

/// Partial update: only supplied fields overwrite the stored record.
/// `theme` stays a raw string here; the handler validates it against
/// [`Theme`] so a bad value comes back as a 400 rather than a body
/// rejection.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdatePrefsRequest {
    pub theme: Option<String>,
    pub is_anonymous: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_request_defaults_missing_fields_to_empty() {
        let req: SignupRequest = serde_json::from_str(r#"{"name":"Alice"}"#).unwrap();
        assert_eq!(req.name, "Alice");
        assert_eq!(req.email, "");
        assert_eq!(req.password, "");
    }

    #[test]
    fn update_prefs_accepts_partial_bodies() {
        let req: UpdatePrefsRequest = serde_json::from_str(r#"{"isAnonymous":false}"#).unwrap();
        assert_eq!(req.is_anonymous, Some(false));
        assert!(req.theme.is_none());

        let req: UpdatePrefsRequest = serde_json::from_str(r#"{"theme":"dark"}"#).unwrap();
        assert_eq!(req.theme.as_deref(), Some("dark"));
        assert!(req.is_anonymous.is_none());
    }

    #[test]
    fn update_prefs_rejects_unknown_fields() {
        let req: Result<UpdatePrefsRequest, _> =
            serde_json::from_str(r#"{"theme":"dark","userId":"someone-else"}"#);
        assert!(req.is_err());
    }
}
