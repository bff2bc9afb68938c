use std::sync::Arc;

use argon2::{
    password_hash::{Encoding, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chartbox_core::{random_string, timestamp_id};
use chrono::{Duration, Utc};
use log::info;
use thiserror::Error;

use crate::{
    AdminData, AdminSessionData, DatabaseError, EventBus, NewAdmin, NewAdminSession,
    NewSurveyResponse, PrimaryKey, StudioEvent, SurveyDatabase, SurveyResponseData,
};

/// The survey sub-application: response collection and its admin accounts,
/// backed by a database of its own.
pub struct Survey {
    database: Arc<SurveyDatabase>,
    events: EventBus,
    argon: Argon2<'static>,
    main_admin_email: String,
}

#[derive(Debug, Error)]
pub enum SurveyError {
    /// Email or password is incorrect
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Only the main admin can manage admin accounts")]
    NotMainAdmin,
    #[error("The main admin cannot be removed")]
    CannotRemoveMainAdmin,
    #[error(transparent)]
    Db(#[from] DatabaseError),
    #[error("HashError: {0}")]
    HashError(String),
}

/// A survey submission as it comes in from the form.
#[derive(Debug)]
pub struct NewSubmission {
    pub name: String,
    pub father_name: String,
    pub class: String,
    pub section: String,
    pub platforms: Vec<String>,
    pub platform_other: Option<String>,
    pub time_spent: String,
}

impl Survey {
    const SESSION_DURATION_IN_DAYS: usize = 7;

    pub fn new(database: Arc<SurveyDatabase>, events: EventBus, main_admin_email: String) -> Self {
        Self {
            database,
            events,
            argon: Argon2::default(),
            main_admin_email: main_admin_email.trim().to_lowercase(),
        }
    }

    /// Seeds the main admin account on startup, if it doesn't exist yet
    pub async fn ensure_main_admin(&self, password: &str) -> Result<(), SurveyError> {
        match self.database.admin_by_email(&self.main_admin_email).await {
            Ok(_) => Ok(()),
            Err(DatabaseError::NotFound { .. }) => {
                self.database
                    .create_admin(NewAdmin {
                        email: self.main_admin_email.clone(),
                        password: self.hash_password(password)?,
                        added_by: "system".to_string(),
                    })
                    .await?;

                info!("Main admin {} created", self.main_admin_email);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Stores a submission and pushes a fresh snapshot to live subscribers
    pub async fn submit(
        &self,
        submission: NewSubmission,
    ) -> Result<SurveyResponseData, SurveyError> {
        let response = self
            .database
            .create_response(NewSurveyResponse {
                id: timestamp_id(),
                name: submission.name,
                father_name: submission.father_name,
                class: submission.class,
                section: submission.section,
                platforms: submission.platforms,
                platform_other: submission.platform_other,
                time_spent: submission.time_spent,
            })
            .await?;

        self.emit_snapshot().await?;

        Ok(response)
    }

    pub async fn responses(&self) -> Result<Vec<SurveyResponseData>, SurveyError> {
        Ok(self.database.list_responses().await?)
    }

    pub async fn delete_response(&self, response_id: &str) -> Result<(), SurveyError> {
        self.database.delete_response(response_id).await?;
        self.emit_snapshot().await?;

        Ok(())
    }

    /// Logs an admin in, returning a dashboard session
    pub async fn admin_login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AdminSessionData, SurveyError> {
        self.database.clear_expired_admin_sessions().await?;

        let admin = self
            .database
            .admin_by_email(&email.trim().to_lowercase())
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => SurveyError::InvalidCredentials,
                err => SurveyError::Db(err),
            })?;

        let stored_password = PasswordHash::parse(&admin.password, Encoding::default())
            .map_err(|e| SurveyError::HashError(e.to_string()))?;

        self.argon
            .verify_password(password.as_bytes(), &stored_password)
            .map_err(|_| SurveyError::InvalidCredentials)?;

        let expires_at = Utc::now() + Duration::days(Self::SESSION_DURATION_IN_DAYS as i64);

        let session = self
            .database
            .create_admin_session(NewAdminSession {
                token: random_string(32),
                admin_id: admin.id,
                expires_at,
            })
            .await?;

        Ok(session)
    }

    /// Returns an admin session if it exists
    pub async fn admin_session(&self, token: &str) -> Result<AdminSessionData, DatabaseError> {
        self.database.admin_session_by_token(token).await
    }

    /// Adds a dashboard admin. Only the main admin may do this.
    pub async fn add_admin(
        &self,
        acting: &AdminData,
        email: &str,
        password: &str,
    ) -> Result<AdminData, SurveyError> {
        if !self.is_main_admin(acting) {
            return Err(SurveyError::NotMainAdmin);
        }

        let admin = self
            .database
            .create_admin(NewAdmin {
                email: email.trim().to_lowercase(),
                password: self.hash_password(password)?,
                added_by: acting.email.clone(),
            })
            .await?;

        info!("Admin {} added by {}", admin.email, acting.email);

        Ok(admin)
    }

    pub async fn list_admins(&self) -> Result<Vec<AdminData>, SurveyError> {
        Ok(self.database.list_admins().await?)
    }

    /// Removes an admin. Only the main admin may do this, and the main admin
    /// itself can never be removed.
    pub async fn remove_admin(
        &self,
        acting: &AdminData,
        admin_id: PrimaryKey,
    ) -> Result<(), SurveyError> {
        if !self.is_main_admin(acting) {
            return Err(SurveyError::NotMainAdmin);
        }

        let target = self.database.admin_by_id(admin_id).await?;

        if self.is_main_admin(&target) {
            return Err(SurveyError::CannotRemoveMainAdmin);
        }

        Ok(self.database.delete_admin(admin_id).await?)
    }

    fn is_main_admin(&self, admin: &AdminData) -> bool {
        admin.email == self.main_admin_email
    }

    async fn emit_snapshot(&self) -> Result<(), SurveyError> {
        let responses = self.database.list_responses().await?;

        self.events
            .emit(StudioEvent::SurveyResponsesChanged { responses });

        Ok(())
    }

    fn hash_password(&self, password: &str) -> Result<String, SurveyError> {
        let salt = SaltString::generate(&mut rand::rngs::OsRng);

        Ok(self
            .argon
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| SurveyError::HashError(e.to_string()))?
            .to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::studio;

    fn submission(name: &str) -> NewSubmission {
        NewSubmission {
            name: name.to_string(),
            father_name: "Parent".to_string(),
            class: "10".to_string(),
            section: "B".to_string(),
            platforms: vec!["instagram".to_string(), "youtube".to_string()],
            platform_other: None,
            time_spent: "2-3 hours".to_string(),
        }
    }

    #[tokio::test]
    async fn test_submissions_emit_full_snapshots() {
        let studio = studio().await;
        let feed = studio.events.subscribe();

        studio.survey.submit(submission("First")).await.unwrap();
        studio.survey.submit(submission("Second")).await.unwrap();

        let StudioEvent::SurveyResponsesChanged { responses } = feed.try_recv().unwrap();
        assert_eq!(responses.len(), 1);

        let StudioEvent::SurveyResponsesChanged { responses } = feed.try_recv().unwrap();
        assert_eq!(responses.len(), 2);

        // Deleting also pushes a snapshot
        let id = responses[0].id.clone();
        studio.survey.delete_response(&id).await.unwrap();

        let StudioEvent::SurveyResponsesChanged { responses } = feed.try_recv().unwrap();
        assert_eq!(responses.len(), 1);
    }

    #[tokio::test]
    async fn test_admin_login_and_session() {
        let studio = studio().await;

        studio.survey.ensure_main_admin("sekrit").await.unwrap();
        // Seeding twice is a no-op
        studio.survey.ensure_main_admin("other").await.unwrap();

        let session = studio
            .survey
            .admin_login("root@survey.app", "sekrit")
            .await
            .unwrap();

        let looked_up = studio.survey.admin_session(&session.token).await.unwrap();
        assert_eq!(looked_up.admin.email, "root@survey.app");

        assert!(matches!(
            studio.survey.admin_login("root@survey.app", "wrong").await,
            Err(SurveyError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_only_the_main_admin_manages_admins() {
        let studio = studio().await;

        studio.survey.ensure_main_admin("sekrit").await.unwrap();

        let main = studio
            .survey
            .admin_login("root@survey.app", "sekrit")
            .await
            .unwrap()
            .admin;

        let helper = studio
            .survey
            .add_admin(&main, "helper@survey.app", "helper-pass")
            .await
            .unwrap();

        // Admin passwords are stored hashed
        assert_ne!(helper.password, "helper-pass");
        assert_eq!(helper.added_by, "root@survey.app");

        // The helper can log in but not manage accounts
        let helper_session = studio
            .survey
            .admin_login("helper@survey.app", "helper-pass")
            .await
            .unwrap();

        assert!(matches!(
            studio
                .survey
                .add_admin(&helper_session.admin, "third@survey.app", "x")
                .await,
            Err(SurveyError::NotMainAdmin)
        ));

        // The main admin cannot be removed, even by itself
        assert!(matches!(
            studio.survey.remove_admin(&main, main.id).await,
            Err(SurveyError::CannotRemoveMainAdmin)
        ));

        studio.survey.remove_admin(&main, helper.id).await.unwrap();
        assert_eq!(studio.survey.list_admins().await.unwrap().len(), 1);
    }
}
