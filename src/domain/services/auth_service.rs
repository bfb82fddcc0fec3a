use crate::domain::models::{session::Session, user::User};
use crate::domain::ports::UserRepository;
use crate::domain::services::session_store::SessionStore;
use crate::error::AppError;
use argon2::{password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString}, Argon2};
use rand::rngs::OsRng;
use std::sync::Arc;
use tracing::info;

const MIN_PASSWORD_LEN: usize = 8;

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<SessionStore>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, sessions: Arc<SessionStore>) -> Self {
        Self { users, sessions }
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, AppError> {
        let email = normalize_email(email);
        if name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".into()));
        }
        if !email.contains('@') {
            return Err(AppError::Validation("Invalid email".into()));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!("Password must be at least {} characters", MIN_PASSWORD_LEN)));
        }
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".into()));
        }

        let user = User::new(name.trim().to_string(), email, hash_password(password)?);
        let created = self.users.create(&user).await?;
        info!(user_id = %created.id, "User registered");
        Ok(created)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(Session, User), AppError> {
        let user = self.users.find_by_email(&normalize_email(email)).await?
            .ok_or(AppError::Unauthorized)?;

        let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|_| AppError::Internal)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AppError::Unauthorized)?;

        let session = self.sessions.create_session(&user.id, &user.email, user.is_admin).await;
        info!(user_id = %user.id, "User logged in");
        Ok((session, user))
    }

    pub async fn logout(&self, session_id: &str) {
        self.sessions.delete_session(session_id).await;
    }

    /// Creates the configured administrator on first start. An existing
    /// account with that e-mail is left untouched.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<(), AppError> {
        let email = normalize_email(email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Ok(());
        }
        let mut admin = User::new("Administrator".to_string(), email, hash_password(password)?);
        admin.is_admin = true;
        let created = self.users.create(&admin).await?;
        info!(user_id = %created.id, "Administrator account created");
        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|_| AppError::Internal)
}
