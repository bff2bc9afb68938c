use async_trait::async_trait;
use chartbox_core::{Category, ChatRole, GraphSpec};
use chrono::{DateTime, Utc};
use thiserror::Error;

mod data;
pub use data::*;

mod sqlite;
pub use sqlite::*;

mod survey;
pub use survey::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    fn any(self) -> DatabaseError;
}

/// Helper trait to reduce boilerplate
pub trait DatabaseResult {
    /// Turns the Result into a conflict error if it's Ok()
    fn conflict_or_ok(self, resource: &'static str, field: &'static str, value: &str)
        -> Result<()>;
}

impl<T> DatabaseResult for Result<T> {
    fn conflict_or_ok(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        match self {
            Ok(_) => Err(DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }),
            Err(e) => match e {
                DatabaseError::NotFound {
                    resource: _,
                    identifier: _,
                } => Ok(()),
                e => Err(e),
            },
        }
    }
}

/// Represents a type that can fetch and store chartbox data
#[async_trait]
pub trait Database: Send + Sync + 'static {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData>;
    async fn user_by_email(&self, email: &str) -> Result<UserData>;
    async fn create_user(&self, new_user: NewUser) -> Result<UserData>;

    async fn session_by_token(&self, token: &str) -> Result<SessionData>;
    async fn create_session(&self, new_session: NewSession) -> Result<SessionData>;
    async fn delete_session_by_token(&self, token: &str) -> Result<()>;
    async fn clear_expired_sessions(&self) -> Result<()>;

    async fn graph_by_id(
        &self,
        user_id: PrimaryKey,
        category: Category,
        graph_id: &str,
    ) -> Result<GraphRecord>;
    async fn graph_by_name(
        &self,
        user_id: PrimaryKey,
        category: Category,
        name: &str,
    ) -> Result<GraphRecord>;
    async fn list_graphs(&self, user_id: PrimaryKey, category: Category)
        -> Result<Vec<GraphRecord>>;
    async fn create_graph(&self, new_graph: NewGraph) -> Result<GraphRecord>;
    async fn update_graph(&self, updated_graph: UpdatedGraph) -> Result<GraphRecord>;
    async fn delete_graph(
        &self,
        user_id: PrimaryKey,
        category: Category,
        graph_id: &str,
    ) -> Result<()>;

    async fn share_code(&self, code: &str) -> Result<ShareCodeData>;
    async fn create_share_code(&self, new_code: NewShareCode) -> Result<ShareCodeData>;
    async fn set_share_code_visibility(&self, code: &str, is_public: bool)
        -> Result<ShareCodeData>;
    async fn delete_share_code(&self, code: &str) -> Result<()>;

    async fn chat_by_id(&self, user_id: PrimaryKey, chat_id: &str) -> Result<ChatData>;
    async fn list_chats(&self, user_id: PrimaryKey) -> Result<Vec<ChatData>>;
    async fn create_chat(&self, new_chat: NewChat) -> Result<ChatData>;
    async fn rename_chat(&self, user_id: PrimaryKey, chat_id: &str, name: &str)
        -> Result<ChatData>;
    async fn delete_chat(&self, user_id: PrimaryKey, chat_id: &str) -> Result<()>;
    /// Refreshes a chat's updated_at, bumping it in recency ordering
    async fn touch_chat(&self, chat_id: &str) -> Result<()>;
    async fn messages(&self, chat_id: &str) -> Result<Vec<MessageData>>;
    async fn create_message(&self, new_message: NewMessage) -> Result<MessageData>;

    async fn calculator_history(&self, user_id: PrimaryKey) -> Result<Vec<CalculatorEntryData>>;
    async fn create_calculator_entry(
        &self,
        new_entry: NewCalculatorEntry,
    ) -> Result<CalculatorEntryData>;
    async fn delete_calculator_entry(&self, user_id: PrimaryKey, entry_id: &str) -> Result<()>;
    async fn clear_calculator_history(&self, user_id: PrimaryKey) -> Result<()>;
}

#[derive(Debug)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug)]
pub struct NewSession {
    pub token: String,
    pub user_id: PrimaryKey,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewGraph {
    pub id: String,
    pub user_id: PrimaryKey,
    pub category: Category,
    pub spec: GraphSpec,
}

#[derive(Debug)]
pub struct UpdatedGraph {
    pub user_id: PrimaryKey,
    pub category: Category,
    pub graph_id: String,
    pub spec: GraphSpec,
}

#[derive(Debug)]
pub struct NewShareCode {
    pub code: String,
    /// The owner of the referenced graph
    pub owner_id: PrimaryKey,
    pub category: Category,
    pub graph_id: String,
    pub is_public: bool,
}

#[derive(Debug)]
pub struct NewChat {
    pub id: String,
    pub user_id: PrimaryKey,
    pub name: String,
}

#[derive(Debug)]
pub struct NewMessage {
    pub id: String,
    pub chat_id: String,
    pub role: ChatRole,
    pub text: String,
}

#[derive(Debug)]
pub struct NewCalculatorEntry {
    pub id: String,
    pub user_id: PrimaryKey,
    pub expression: String,
    pub result: String,
}
