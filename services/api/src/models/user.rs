//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// First and last name joined, empty when neither is set
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Full name, falling back to the username
    pub fn display_name(&self) -> String {
        let full_name = self.full_name();
        if full_name.is_empty() {
            self.username.clone()
        } else {
            full_name
        }
    }
}

/// New user creation payload, password still in clear text
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// Public view of a user
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            date_joined: user.date_joined,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_user() -> User {
    User {
        id: 7,
        username: "jperez".to_string(),
        email: "jperez@example.com".to_string(),
        first_name: "Juan".to_string(),
        last_name: "Pérez".to_string(),
        password_hash: "$argon2id$unused".to_string(),
        date_joined: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_full_name() {
        let user = sample_user();
        assert_eq!(user.display_name(), "Juan Pérez");
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let user = User {
            first_name: String::new(),
            last_name: String::new(),
            ..sample_user()
        };
        assert_eq!(user.full_name(), "");
        assert_eq!(user.display_name(), "jperez");
    }

    #[test]
    fn test_response_omits_password_hash() {
        let json = serde_json::to_value(UserResponse::from(&sample_user())).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "jperez");
    }
}
