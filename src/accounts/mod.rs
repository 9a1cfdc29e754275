use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{NewUser, User, UserId};

mod password;

pub use password::{hash_password, verify_password};

/// Registration and credential checks. Sessions live in the routing layer;
/// everything downstream only sees the resulting user id.
pub struct Accounts {
    repo: Repository,
}

impl Accounts {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AppError::InvalidInput(
                "username, email and password are required".to_string(),
            ));
        }

        let password_hash =
            hash_password(password).map_err(|e| AppError::PasswordHash(e.to_string()))?;

        let user = self
            .repo
            .insert_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;
        tracing::info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let Some((user, hash)) = self.repo.find_credentials(username.trim().to_string()).await?
        else {
            return Err(AppError::InvalidCredentials);
        };

        if verify_password(password, &hash) {
            Ok(user)
        } else {
            tracing::debug!("Failed login for {}", user.username);
            Err(AppError::InvalidCredentials)
        }
    }

    pub async fn get(&self, user: Option<UserId>) -> Result<User> {
        let id = user.ok_or(AppError::Unauthorized)?;
        self.repo.get_user(id).await?.ok_or(AppError::Unauthorized)
    }

    /// Remove the account along with all of its favorites, ratings, search
    /// history and shopping lists.
    pub async fn delete(&self, user: Option<UserId>) -> Result<()> {
        let id = user.ok_or(AppError::Unauthorized)?;
        if !self.repo.delete_user(id).await? {
            return Err(AppError::Unauthorized);
        }
        Ok(())
    }
}
