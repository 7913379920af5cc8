use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::validation::{FieldErrors, Validate};

/// Public view of an account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Account row including the password hash; never serialized
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
        }
    }
}

/// Account data ready for insertion, password already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Body of `POST /api/users/signup`
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl Validate for SignupRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.length("username", self.username.trim(), 3, Some(20));
        errors.length("password", &self.password, 3, None);
        errors.email("email", &self.email);
        errors.length("email", &self.email, 0, Some(50));
        errors.require("first_name", &self.first_name);
        errors.length("first_name", &self.first_name, 0, Some(30));
        errors.require("last_name", &self.last_name);
        errors.length("last_name", &self.last_name, 0, Some(30));
        errors.into_result()
    }
}

/// Body of `POST /api/users/login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.length("username", self.username.trim(), 3, None);
        errors.length("password", &self.password, 3, None);
        errors.into_result()
    }
}

/// Body of `PATCH /api/users/me`; `password` re-authenticates the caller
#[derive(Debug, Clone, Deserialize)]
pub struct UsernameUpdate {
    pub username: String,
    pub password: String,
}

impl Validate for UsernameUpdate {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.length("username", self.username.trim(), 3, Some(20));
        errors.length("password", &self.password, 3, None);
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup() -> SignupRequest {
        SignupRequest {
            username: "test1".to_string(),
            password: "testing".to_string(),
            email: "test1@test.com".to_string(),
            first_name: "Test1".to_string(),
            last_name: "User".to_string(),
        }
    }

    #[test]
    fn test_full_name() {
        let user = User {
            id: 1,
            username: "test1".to_string(),
            email: "test1@test.com".to_string(),
            first_name: "Test1".to_string(),
            last_name: "User".to_string(),
        };
        assert_eq!(user.full_name(), "Test1 User");
    }

    #[test]
    fn test_signup_validation() {
        assert!(signup().validate().is_ok());

        let bad = SignupRequest {
            username: "ab".to_string(),
            email: "nope".to_string(),
            last_name: " ".to_string(),
            ..signup()
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.get("username").is_some());
        assert!(errors.get("email").is_some());
        assert!(errors.get("last_name").is_some());
        assert!(errors.get("password").is_none());
    }

    #[test]
    fn test_user_record_hides_password() {
        let record = UserRecord {
            id: 7,
            username: "test1".to_string(),
            password: "$argon2id$hash".to_string(),
            email: "test1@test.com".to_string(),
            first_name: "Test1".to_string(),
            last_name: "User".to_string(),
        };
        let json = serde_json::to_string(&User::from(record)).unwrap();
        assert!(!json.contains("argon2"));
    }
}
