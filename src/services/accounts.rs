use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{Commit, Store, UserStore},
    error::{AppError, AppResult},
    models::{
        LoginRequest, NewUser, NewsCategory, SavedArticle, SignupRequest, User, UsernameUpdate,
        Validate,
    },
};

/// A signed-in user and the bearer token of the new session
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: User,
    pub token: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user: User,
    pub saved: Vec<SavedArticle>,
    pub categories: Vec<NewsCategory>,
}

/// Hashes with a fresh salt on the blocking pool
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?
}

pub async fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || match PasswordHash::new(&hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "Stored password hash is malformed");
            false
        }
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))
}

/// Creates the account and signs it in
pub async fn register<S: UserStore + ?Sized>(
    store: &S,
    request: SignupRequest,
) -> AppResult<Session> {
    request.validate()?;

    let new_user = NewUser {
        username: request.username.trim().to_string(),
        password_hash: hash_password(&request.password).await?,
        email: request.email.trim().to_string(),
        first_name: request.first_name.trim().to_string(),
        last_name: request.last_name.trim().to_string(),
    };

    let user = match store.create_user(new_user).await {
        Commit::Committed(user) => user,
        Commit::Duplicate => {
            return Err(AppError::Conflict(
                "Username or email already taken".to_string(),
            ))
        }
        Commit::Failed => return Err(AppError::Internal("Failed to create user".to_string())),
    };

    tracing::info!(user_id = user.id, "User signed up");
    open_session(store, user).await
}

/// Signs in with username and password
pub async fn authenticate<S: UserStore + ?Sized>(
    store: &S,
    request: LoginRequest,
) -> AppResult<Session> {
    request.validate()?;

    let record = store.find_user_record(request.username.trim()).await?;
    let Some(record) = record else {
        return Err(invalid_credentials());
    };
    if !verify_password(&request.password, &record.password).await? {
        tracing::info!(user_id = record.id, "Rejected login with wrong password");
        return Err(invalid_credentials());
    }

    open_session(store, record.into()).await
}

pub async fn logout<S: UserStore + ?Sized>(store: &S, token: Uuid) -> AppResult<()> {
    store.delete_session(token).await
}

/// Renames the user after re-checking their current password
pub async fn change_username<S: UserStore + ?Sized>(
    store: &S,
    user: &User,
    request: UsernameUpdate,
) -> AppResult<User> {
    request.validate()?;

    let record = store
        .find_user_record(&user.username)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;
    if !verify_password(&request.password, &record.password).await? {
        return Err(AppError::Unauthorized("Invalid password".to_string()));
    }

    match store.update_username(user.id, request.username.trim()).await {
        Commit::Committed(updated) => {
            tracing::info!(user_id = updated.id, "Username changed");
            Ok(updated)
        }
        Commit::Duplicate => Err(AppError::Conflict("Username already taken".to_string())),
        Commit::Failed => Err(AppError::Internal("Failed to update username".to_string())),
    }
}

pub async fn profile<S: Store + ?Sized>(store: &S, user: User) -> AppResult<Profile> {
    let saved = store.saved_articles(user.id).await?;
    let categories = store.user_categories(user.id).await?;
    Ok(Profile {
        user,
        saved,
        categories,
    })
}

async fn open_session<S: UserStore + ?Sized>(store: &S, user: User) -> AppResult<Session> {
    let token = store.create_session(user.id).await?;
    Ok(Session { user, token })
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid username or password".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn signup(username: &str, email: &str) -> SignupRequest {
        SignupRequest {
            username: username.to_string(),
            password: "testing".to_string(),
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
        }
    }

    fn login(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("testing").await.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("testing", &hash).await.unwrap());
        assert!(!verify_password("wrong", &hash).await.unwrap());
        assert!(!verify_password("testing", "not a hash").await.unwrap());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryStore::new();
        let session = register(&store, signup("test1", "test1@test.com"))
            .await
            .unwrap();
        assert_eq!(
            store.session_user(session.token).await.unwrap(),
            Some(session.user.clone())
        );

        let again = authenticate(&store, login("test1", "testing")).await.unwrap();
        assert_eq!(again.user, session.user);
        assert_ne!(again.token, session.token);
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_and_duplicate() {
        let store = MemoryStore::new();
        let invalid = register(&store, signup("t", "not-an-email")).await;
        match invalid {
            Err(AppError::Validation(errors)) => {
                assert!(errors.get("username").is_some());
                assert!(errors.get("email").is_some());
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        register(&store, signup("test1", "test1@test.com"))
            .await
            .unwrap();
        let duplicate = register(&store, signup("test1", "other@test.com")).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let store = MemoryStore::new();
        register(&store, signup("test1", "test1@test.com"))
            .await
            .unwrap();

        let wrong = authenticate(&store, login("test1", "wrongpass")).await;
        assert!(matches!(wrong, Err(AppError::Unauthorized(_))));
        let unknown = authenticate(&store, login("nobody", "testing")).await;
        assert!(matches!(unknown, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_change_username() {
        let store = MemoryStore::new();
        let session = register(&store, signup("test1", "test1@test.com"))
            .await
            .unwrap();
        register(&store, signup("test2", "test2@test.com"))
            .await
            .unwrap();

        let update = |username: &str, password: &str| UsernameUpdate {
            username: username.to_string(),
            password: password.to_string(),
        };

        let wrong = change_username(&store, &session.user, update("renamed", "nope")).await;
        assert!(matches!(wrong, Err(AppError::Unauthorized(_))));

        let taken = change_username(&store, &session.user, update("test2", "testing")).await;
        assert!(matches!(taken, Err(AppError::Conflict(_))));

        let renamed = change_username(&store, &session.user, update("renamed", "testing"))
            .await
            .unwrap();
        assert_eq!(renamed.username, "renamed");
        assert!(authenticate(&store, login("renamed", "testing")).await.is_ok());
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let store = MemoryStore::new();
        let session = register(&store, signup("test1", "test1@test.com"))
            .await
            .unwrap();
        logout(&store, session.token).await.unwrap();
        assert_eq!(store.session_user(session.token).await.unwrap(), None);
    }
}
