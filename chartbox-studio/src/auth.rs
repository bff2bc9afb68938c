use argon2::{
    password_hash::{Encoding, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chartbox_core::random_string;
use chrono::{Duration, Utc};
use thiserror::Error;

use crate::{Database, DatabaseError, NewSession, NewUser, SessionData, StudioContext, UserData};

pub struct Auth<Db> {
    context: StudioContext<Db>,
    argon: Argon2<'static>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Email or password is incorrect
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// Something else went wrong with the database
    #[error(transparent)]
    Db(DatabaseError),
    #[error("HashError: {0}")]
    HashError(String),
}

impl<Db> Auth<Db>
where
    Db: Database,
{
    const SESSION_DURATION_IN_DAYS: usize = 7;

    pub fn new(context: &StudioContext<Db>) -> Self {
        Self {
            context: context.clone(),
            argon: Argon2::default(),
        }
    }

    /// Logs in a user, returning a new session
    pub async fn login(&self, credentials: Credentials) -> Result<SessionData, AuthError> {
        self.clear_expired().await?;

        let user = self
            .context
            .database
            .user_by_email(&normalize_email(&credentials.email))
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound {
                    resource: _,
                    identifier: _,
                } => AuthError::InvalidCredentials,
                err => AuthError::Db(err),
            })?;

        let stored_password = PasswordHash::parse(&user.password, Encoding::default())
            .map_err(|e| AuthError::HashError(e.to_string()))?;

        self.argon
            .verify_password(credentials.password.as_bytes(), &stored_password)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let expires_at = Utc::now() + Duration::days(Self::SESSION_DURATION_IN_DAYS as i64);

        let new_session = NewSession {
            token: random_string(32),
            user_id: user.id,
            expires_at,
        };

        let new_session = self
            .context
            .database
            .create_session(new_session)
            .await
            .map_err(AuthError::Db)?;

        Ok(new_session)
    }

    /// Deletes the associated session, if it exists
    pub async fn logout(&self, token: &str) -> Result<(), DatabaseError> {
        self.context.database.delete_session_by_token(token).await
    }

    /// Creates a new account
    pub async fn register(&self, new_account: NewAccount) -> Result<UserData, AuthError> {
        let salt = SaltString::generate(&mut rand::rngs::OsRng);
        let hashed_password = self
            .argon
            .hash_password(new_account.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        self.context
            .database
            .create_user(NewUser {
                email: normalize_email(&new_account.email),
                password: hashed_password,
                display_name: new_account.display_name,
            })
            .await
            .map_err(AuthError::Db)
    }

    /// Returns a session if it exists
    pub async fn session(&self, token: &str) -> Result<SessionData, DatabaseError> {
        self.context.database.session_by_token(token).await
    }

    async fn clear_expired(&self) -> Result<(), AuthError> {
        self.context
            .database
            .clear_expired_sessions()
            .await
            .map_err(AuthError::Db)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::studio;

    #[tokio::test]
    async fn test_register_and_login() {
        let studio = studio().await;

        let user = studio
            .auth
            .register(NewAccount {
                email: "Ada@Example.com".to_string(),
                password: "correct horse".to_string(),
                display_name: "Ada".to_string(),
            })
            .await
            .unwrap();

        // Emails are normalized and passwords never stored raw
        assert_eq!(user.email, "ada@example.com");
        assert_ne!(user.password, "correct horse");

        let session = studio
            .auth
            .login(Credentials {
                email: "ada@example.com".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(session.user.id, user.id);

        let looked_up = studio.auth.session(&session.token).await.unwrap();
        assert_eq!(looked_up.user.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_credentials() {
        let studio = studio().await;

        studio
            .auth
            .register(NewAccount {
                email: "ada@example.com".to_string(),
                password: "correct horse".to_string(),
                display_name: "Ada".to_string(),
            })
            .await
            .unwrap();

        let result = studio
            .auth
            .login(Credentials {
                email: "ada@example.com".to_string(),
                password: "wrong horse".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));

        // Unknown accounts are indistinguishable from wrong passwords
        let result = studio
            .auth
            .login(Credentials {
                email: "nobody@example.com".to_string(),
                password: "correct horse".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let studio = studio().await;

        let account = || NewAccount {
            email: "ada@example.com".to_string(),
            password: "correct horse".to_string(),
            display_name: "Ada".to_string(),
        };

        studio.auth.register(account()).await.unwrap();
        let result = studio.auth.register(account()).await;

        assert!(matches!(
            result,
            Err(AuthError::Db(DatabaseError::Conflict { .. }))
        ));
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let studio = studio().await;

        studio
            .auth
            .register(NewAccount {
                email: "ada@example.com".to_string(),
                password: "correct horse".to_string(),
                display_name: "Ada".to_string(),
            })
            .await
            .unwrap();

        let session = studio
            .auth
            .login(Credentials {
                email: "ada@example.com".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();

        studio.auth.logout(&session.token).await.unwrap();

        assert!(matches!(
            studio.auth.session(&session.token).await,
            Err(DatabaseError::NotFound { .. })
        ));
    }
}
