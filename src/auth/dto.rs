use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Request body for user registration.
///
/// Absent or `null` keys deserialize as empty strings so they fail field validation
/// with the regular envelope instead of a JSON rejection.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct RegisterRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub username: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub password: String,
}

/// Request body for login.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub password: String,
}

/// `null` counts as a missing field, same as an absent key.
fn null_as_empty<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(d).map(Option::unwrap_or_default)
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub auth: i32,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            username: u.username,
            email: u.email,
            auth: u.auth,
        }
    }
}

/// Payload returned after register or login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    #[serde(flatten)]
    pub user: PublicUser,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_flat() {
        let payload = AuthPayload {
            user: PublicUser {
                id: Uuid::new_v4(),
                name: "Ada".into(),
                username: "ada1".into(),
                email: "ada@x.com".into(),
                auth: 0,
            },
            token: "t".into(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["username"], "ada1");
        assert_eq!(json["auth"], 0);
        assert_eq!(json["token"], "t");
        assert!(json.get("user").is_none());
    }

    #[test]
    fn missing_keys_default_to_empty() {
        let req: LoginRequest = serde_json::from_str(r#"{"email":"a@b.co"}"#).unwrap();
        assert_eq!(req.email, "a@b.co");
        assert!(req.password.is_empty());
    }

    #[test]
    fn null_fields_default_to_empty() {
        let raw = r#"{"name":null,"username":"ada1","email":"ada@x.com","password":null}"#;
        let req: RegisterRequest = serde_json::from_str(raw).unwrap();
        assert!(req.name.is_empty());
        assert_eq!(req.username, "ada1");
        assert!(req.password.is_empty());
    }

    #[test]
    fn non_string_field_is_still_rejected() {
        assert!(serde_json::from_str::<LoginRequest>(r#"{"email":42}"#).is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let req = RegisterRequest {
            password: "hunter22".into(),
            ..Default::default()
        };
        assert!(!format!("{req:?}").contains("hunter22"));
    }
}
