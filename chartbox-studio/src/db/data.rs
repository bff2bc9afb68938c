use chartbox_core::{Category, ChatRole, GraphSpec};
use chrono::{DateTime, Utc};

/// The type used for primary keys in the database.
pub type PrimaryKey = i64;

/// A chartbox account
#[derive(Debug, Clone)]
pub struct UserData {
    pub id: PrimaryKey,
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// Login session data for authentication
#[derive(Debug, Clone)]
pub struct SessionData {
    pub id: PrimaryKey,
    /// The session token, or key if you will
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// The user that is logged in
    pub user: UserData,
}

/// A stored graph, namespaced under its owner and category.
#[derive(Debug, Clone)]
pub struct GraphRecord {
    /// Timestamp-derived string id
    pub id: String,
    pub user_id: PrimaryKey,
    pub category: Category,
    pub spec: GraphSpec,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An opaque token granting read-only access to one graph.
#[derive(Debug, Clone)]
pub struct ShareCodeData {
    pub code: String,
    pub owner_id: PrimaryKey,
    pub category: Category,
    pub graph_id: String,
    /// Only public codes resolve; a private code behaves like a missing one.
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

/// A named conversation with the assistant.
#[derive(Debug, Clone)]
pub struct ChatData {
    pub id: String,
    pub user_id: PrimaryKey,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One message of a chat, appended as its own row.
#[derive(Debug, Clone)]
pub struct MessageData {
    pub id: String,
    pub chat_id: String,
    pub role: ChatRole,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// A recorded calculator evaluation.
#[derive(Debug, Clone)]
pub struct CalculatorEntryData {
    pub id: String,
    pub user_id: PrimaryKey,
    pub expression: String,
    pub result: String,
    pub created_at: DateTime<Utc>,
}
