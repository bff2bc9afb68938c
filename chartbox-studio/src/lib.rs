mod auth;
mod calculator;
mod chats;
mod db;
mod events;
mod graphs;
mod sharing;
mod survey;

use std::sync::Arc;

pub use auth::*;
pub use calculator::*;
pub use chats::*;
pub use db::*;
pub use events::*;
pub use graphs::*;
pub use sharing::*;
pub use survey::*;

use chartbox_core::Assistant;

/// The chartbox studio, composing every domain service over the storage seam.
pub struct Studio<Db> {
    database: Arc<Db>,

    pub auth: Auth<Db>,
    pub graphs: GraphLibrary<Db>,
    pub sharing: Sharing<Db>,
    pub chats: Chats<Db>,
    pub calculator: Calculator<Db>,
    pub survey: Survey,
    pub events: EventBus,
}

/// A type passed to the studio's services, to access storage and emit events.
pub struct StudioContext<Db> {
    pub database: Arc<Db>,
    pub events: EventBus,
}

impl<Db> Studio<Db>
where
    Db: Database,
{
    pub fn new(
        database: Db,
        survey_database: SurveyDatabase,
        assistant: Arc<dyn Assistant>,
        main_admin_email: impl Into<String>,
    ) -> Self {
        let database = Arc::new(database);
        let survey_database = Arc::new(survey_database);
        let events = EventBus::new();

        let context = StudioContext {
            database: database.clone(),
            events: events.clone(),
        };

        Self {
            auth: Auth::new(&context),
            graphs: GraphLibrary::new(&context),
            sharing: Sharing::new(&context),
            chats: Chats::new(&context, assistant),
            calculator: Calculator::new(&context),
            survey: Survey::new(survey_database, events.clone(), main_admin_email.into()),

            database,
            events,
        }
    }

    pub fn database(&self) -> &Arc<Db> {
        &self.database
    }
}

impl<Db> Clone for StudioContext<Db>
where
    Db: Database,
{
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            events: self.events.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chartbox_core::{Assistant, AssistantError, ChatTurn};

    use crate::{NewAccount, SqliteDatabase, Studio, SurveyDatabase, UserData};

    /// Echoes the prompt and history size back, standing in for the backend.
    pub struct EchoAssistant;

    #[async_trait]
    impl Assistant for EchoAssistant {
        async fn ask(&self, prompt: &str, history: &[ChatTurn]) -> Result<String, AssistantError> {
            Ok(format!("echo({}): {}", history.len(), prompt))
        }

        async fn health(&self) -> bool {
            true
        }
    }

    /// An assistant whose server is never reachable.
    pub struct DownAssistant;

    #[async_trait]
    impl Assistant for DownAssistant {
        async fn ask(&self, _: &str, _: &[ChatTurn]) -> Result<String, AssistantError> {
            Err(AssistantError::Unreachable)
        }

        async fn health(&self) -> bool {
            false
        }
    }

    pub async fn studio() -> Studio<SqliteDatabase> {
        studio_with_assistant(Arc::new(EchoAssistant)).await
    }

    pub async fn studio_with_assistant(assistant: Arc<dyn Assistant>) -> Studio<SqliteDatabase> {
        let database = SqliteDatabase::in_memory().await.expect("database opens");
        let survey_database = SurveyDatabase::in_memory()
            .await
            .expect("survey database opens");

        Studio::new(database, survey_database, assistant, "root@survey.app")
    }

    pub async fn user(studio: &Studio<SqliteDatabase>, email: &str) -> UserData {
        studio
            .auth
            .register(NewAccount {
                email: email.to_string(),
                password: "password123".to_string(),
                display_name: "Test".to_string(),
            })
            .await
            .expect("user registers")
    }
}
