use std::str::FromStr;

use async_trait::async_trait;
use chartbox_core::{Category, ChatRole, GraphKind, GraphSpec};
use chrono::Utc;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Error as SqlxError, Row, SqlitePool};

use crate::{
    CalculatorEntryData, ChatData, Database, DatabaseError, DatabaseResult, GraphRecord,
    IntoDatabaseError, MessageData, NewCalculatorEntry, NewChat, NewGraph, NewMessage, NewSession,
    NewShareCode, NewUser, PrimaryKey, Result, SessionData, ShareCodeData, UpdatedGraph, UserData,
};

/// The statements that create the schema. Executed one by one, since the
/// sqlite driver prepares a single statement at a time.
const SCHEMA: [&str; 7] = [
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        display_name TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        token TEXT NOT NULL UNIQUE,
        user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        expires_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS graphs (
        id TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        category TEXT NOT NULL,
        name TEXT NOT NULL,
        kind TEXT NOT NULL,
        labels TEXT NOT NULL,
        data TEXT NOT NULL,
        metric TEXT,
        weather_type TEXT,
        expression TEXT,
        variables TEXT,
        x_min REAL,
        x_max REAL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (user_id, category, name)
    )",
    "CREATE TABLE IF NOT EXISTS share_codes (
        code TEXT PRIMARY KEY,
        owner_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        category TEXT NOT NULL,
        graph_id TEXT NOT NULL REFERENCES graphs (id) ON DELETE CASCADE,
        is_public INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS chats (
        id TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS messages (
        id TEXT PRIMARY KEY,
        chat_id TEXT NOT NULL REFERENCES chats (id) ON DELETE CASCADE,
        role TEXT NOT NULL,
        text TEXT NOT NULL,
        sent_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS calculator_history (
        id TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        expression TEXT NOT NULL,
        result TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
];

/// A sqlite database implementation for chartbox
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(internal)?;

        Ok(Self { pool })
    }

    /// An isolated in-memory database with the schema applied, used by tests.
    /// A single connection, since every sqlite memory connection is its own db.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(internal)?;

        let database = Self { pool };
        database.migrate().await?;

        Ok(database)
    }

    /// Creates the schema if it doesn't exist yet
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| e.any())?;
        }

        Ok(())
    }

    async fn message_by_id(&self, message_id: &str) -> Result<MessageData> {
        let row = sqlx::query("SELECT * FROM messages WHERE id = ?")
            .bind(message_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("message", "id"))?;

        message_from_row(&row)
    }

    async fn calculator_entry_by_id(&self, entry_id: &str) -> Result<CalculatorEntryData> {
        let row = sqlx::query("SELECT * FROM calculator_history WHERE id = ?")
            .bind(entry_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("calculator entry", "id"))?;

        Ok(calculator_entry_from_row(&row))
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("user", "id"))?;

        Ok(user_from_row(&row))
    }

    async fn user_by_email(&self, email: &str) -> Result<UserData> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("user", "email"))?;

        Ok(user_from_row(&row))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        self.user_by_email(&new_user.email)
            .await
            .conflict_or_ok("user", "email", &new_user.email)?;

        sqlx::query(
            "INSERT INTO users (email, password, display_name, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&new_user.email)
        .bind(&new_user.password)
        .bind(&new_user.display_name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.user_by_email(&new_user.email).await
    }

    async fn session_by_token(&self, token: &str) -> Result<SessionData> {
        let row = sqlx::query(
            "SELECT
                sessions.id AS session_id,
                sessions.token,
                sessions.expires_at,
                users.id,
                users.email,
                users.password,
                users.display_name,
                users.created_at
            FROM sessions
                INNER JOIN users ON sessions.user_id = users.id
            WHERE sessions.token = ?
            ",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("session", "token"))?;

        Ok(SessionData {
            id: row.get("session_id"),
            token: row.get("token"),
            expires_at: row.get("expires_at"),
            user: user_from_row(&row),
        })
    }

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData> {
        self.session_by_token(&new_session.token)
            .await
            .conflict_or_ok("session", "token", &new_session.token)?;

        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(&new_session.token)
            .bind(new_session.user_id)
            .bind(new_session.expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        self.session_by_token(&new_session.token).await
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<()> {
        // Ensure session exists
        let _ = self.session_by_token(token).await?;

        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn clear_expired_sessions(&self) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn graph_by_id(
        &self,
        user_id: PrimaryKey,
        category: Category,
        graph_id: &str,
    ) -> Result<GraphRecord> {
        let row = sqlx::query("SELECT * FROM graphs WHERE id = ? AND user_id = ? AND category = ?")
            .bind(graph_id)
            .bind(user_id)
            .bind(category.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("graph", "id"))?;

        graph_from_row(&row)
    }

    async fn graph_by_name(
        &self,
        user_id: PrimaryKey,
        category: Category,
        name: &str,
    ) -> Result<GraphRecord> {
        let row =
            sqlx::query("SELECT * FROM graphs WHERE name = ? AND user_id = ? AND category = ?")
                .bind(name)
                .bind(user_id)
                .bind(category.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| e.not_found_or("graph", "name"))?;

        graph_from_row(&row)
    }

    async fn list_graphs(
        &self,
        user_id: PrimaryKey,
        category: Category,
    ) -> Result<Vec<GraphRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM graphs WHERE user_id = ? AND category = ? ORDER BY created_at",
        )
        .bind(user_id)
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        rows.iter().map(graph_from_row).collect()
    }

    async fn create_graph(&self, new_graph: NewGraph) -> Result<GraphRecord> {
        // Graph names are unique per user and category. The UNIQUE constraint
        // is the backstop, this check produces the friendlier error.
        self.graph_by_name(new_graph.user_id, new_graph.category, &new_graph.spec.name)
            .await
            .conflict_or_ok("graph", "name", &new_graph.spec.name)?;

        let spec = &new_graph.spec;
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO graphs (
                id, user_id, category, name, kind, labels, data,
                metric, weather_type, expression, variables, x_min, x_max,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new_graph.id)
        .bind(new_graph.user_id)
        .bind(new_graph.category.as_str())
        .bind(&spec.name)
        .bind(spec.kind.as_str())
        .bind(to_json(&spec.labels)?)
        .bind(to_json(&spec.data)?)
        .bind(&spec.metric)
        .bind(&spec.weather_type)
        .bind(&spec.expression)
        .bind(&spec.variables)
        .bind(spec.x_min)
        .bind(spec.x_max)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.graph_by_id(new_graph.user_id, new_graph.category, &new_graph.id)
            .await
    }

    async fn update_graph(&self, updated_graph: UpdatedGraph) -> Result<GraphRecord> {
        // Ensure the graph exists and belongs to the user
        let _ = self
            .graph_by_id(
                updated_graph.user_id,
                updated_graph.category,
                &updated_graph.graph_id,
            )
            .await?;

        // A rename must not collide with another graph in the same category
        match self
            .graph_by_name(
                updated_graph.user_id,
                updated_graph.category,
                &updated_graph.spec.name,
            )
            .await
        {
            Ok(existing) if existing.id != updated_graph.graph_id => {
                return Err(DatabaseError::Conflict {
                    resource: "graph",
                    field: "name",
                    value: updated_graph.spec.name.clone(),
                })
            }
            Ok(_) => {}
            Err(DatabaseError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let spec = &updated_graph.spec;

        sqlx::query(
            "UPDATE graphs SET
                name = ?, kind = ?, labels = ?, data = ?,
                metric = ?, weather_type = ?, expression = ?, variables = ?,
                x_min = ?, x_max = ?, updated_at = ?
            WHERE id = ?",
        )
        .bind(&spec.name)
        .bind(spec.kind.as_str())
        .bind(to_json(&spec.labels)?)
        .bind(to_json(&spec.data)?)
        .bind(&spec.metric)
        .bind(&spec.weather_type)
        .bind(&spec.expression)
        .bind(&spec.variables)
        .bind(spec.x_min)
        .bind(spec.x_max)
        .bind(Utc::now())
        .bind(&updated_graph.graph_id)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.graph_by_id(
            updated_graph.user_id,
            updated_graph.category,
            &updated_graph.graph_id,
        )
        .await
    }

    async fn delete_graph(
        &self,
        user_id: PrimaryKey,
        category: Category,
        graph_id: &str,
    ) -> Result<()> {
        // Ensure graph exists; its share codes cascade away with it
        let _ = self.graph_by_id(user_id, category, graph_id).await?;

        sqlx::query("DELETE FROM graphs WHERE id = ?")
            .bind(graph_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn share_code(&self, code: &str) -> Result<ShareCodeData> {
        let row = sqlx::query("SELECT * FROM share_codes WHERE code = ?")
            .bind(code)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("share code", "code"))?;

        share_code_from_row(&row)
    }

    async fn create_share_code(&self, new_code: NewShareCode) -> Result<ShareCodeData> {
        self.share_code(&new_code.code)
            .await
            .conflict_or_ok("share code", "code", &new_code.code)?;

        sqlx::query(
            "INSERT INTO share_codes (code, owner_id, category, graph_id, is_public, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&new_code.code)
        .bind(new_code.owner_id)
        .bind(new_code.category.as_str())
        .bind(&new_code.graph_id)
        .bind(new_code.is_public)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.share_code(&new_code.code).await
    }

    async fn set_share_code_visibility(
        &self,
        code: &str,
        is_public: bool,
    ) -> Result<ShareCodeData> {
        // Ensure code exists
        let _ = self.share_code(code).await?;

        sqlx::query("UPDATE share_codes SET is_public = ? WHERE code = ?")
            .bind(is_public)
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        self.share_code(code).await
    }

    async fn delete_share_code(&self, code: &str) -> Result<()> {
        // Ensure code exists
        let _ = self.share_code(code).await?;

        sqlx::query("DELETE FROM share_codes WHERE code = ?")
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn chat_by_id(&self, user_id: PrimaryKey, chat_id: &str) -> Result<ChatData> {
        let row = sqlx::query("SELECT * FROM chats WHERE id = ? AND user_id = ?")
            .bind(chat_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("chat", "id"))?;

        Ok(chat_from_row(&row))
    }

    async fn list_chats(&self, user_id: PrimaryKey) -> Result<Vec<ChatData>> {
        let rows = sqlx::query("SELECT * FROM chats WHERE user_id = ? ORDER BY updated_at DESC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        Ok(rows.iter().map(chat_from_row).collect())
    }

    async fn create_chat(&self, new_chat: NewChat) -> Result<ChatData> {
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO chats (id, user_id, name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new_chat.id)
        .bind(new_chat.user_id)
        .bind(&new_chat.name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.chat_by_id(new_chat.user_id, &new_chat.id).await
    }

    async fn rename_chat(
        &self,
        user_id: PrimaryKey,
        chat_id: &str,
        name: &str,
    ) -> Result<ChatData> {
        // Ensure the chat exists and belongs to the user
        let _ = self.chat_by_id(user_id, chat_id).await?;

        sqlx::query("UPDATE chats SET name = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(Utc::now())
            .bind(chat_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        self.chat_by_id(user_id, chat_id).await
    }

    async fn delete_chat(&self, user_id: PrimaryKey, chat_id: &str) -> Result<()> {
        // Ensure the chat exists; its messages cascade away with it
        let _ = self.chat_by_id(user_id, chat_id).await?;

        sqlx::query("DELETE FROM chats WHERE id = ?")
            .bind(chat_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn touch_chat(&self, chat_id: &str) -> Result<()> {
        sqlx::query("UPDATE chats SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(chat_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn messages(&self, chat_id: &str) -> Result<Vec<MessageData>> {
        let rows = sqlx::query("SELECT * FROM messages WHERE chat_id = ? ORDER BY sent_at, id")
            .bind(chat_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        rows.iter().map(message_from_row).collect()
    }

    async fn create_message(&self, new_message: NewMessage) -> Result<MessageData> {
        sqlx::query("INSERT INTO messages (id, chat_id, role, text, sent_at) VALUES (?, ?, ?, ?, ?)")
            .bind(&new_message.id)
            .bind(&new_message.chat_id)
            .bind(role_to_str(new_message.role))
            .bind(&new_message.text)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        self.message_by_id(&new_message.id).await
    }

    async fn calculator_history(&self, user_id: PrimaryKey) -> Result<Vec<CalculatorEntryData>> {
        let rows = sqlx::query(
            "SELECT * FROM calculator_history WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        Ok(rows.iter().map(calculator_entry_from_row).collect())
    }

    async fn create_calculator_entry(
        &self,
        new_entry: NewCalculatorEntry,
    ) -> Result<CalculatorEntryData> {
        sqlx::query(
            "INSERT INTO calculator_history (id, user_id, expression, result, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new_entry.id)
        .bind(new_entry.user_id)
        .bind(&new_entry.expression)
        .bind(&new_entry.result)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.calculator_entry_by_id(&new_entry.id).await
    }

    async fn delete_calculator_entry(&self, user_id: PrimaryKey, entry_id: &str) -> Result<()> {
        sqlx::query("SELECT id FROM calculator_history WHERE id = ? AND user_id = ?")
            .bind(entry_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("calculator entry", "id"))?;

        sqlx::query("DELETE FROM calculator_history WHERE id = ?")
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn clear_calculator_history(&self, user_id: PrimaryKey) -> Result<()> {
        sqlx::query("DELETE FROM calculator_history WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }
}

fn user_from_row(row: &SqliteRow) -> UserData {
    UserData {
        id: row.get("id"),
        email: row.get("email"),
        password: row.get("password"),
        display_name: row.get("display_name"),
        created_at: row.get("created_at"),
    }
}

fn graph_from_row(row: &SqliteRow) -> Result<GraphRecord> {
    let category: String = row.get("category");
    let kind: String = row.get("kind");

    let spec = GraphSpec {
        name: row.get("name"),
        kind: GraphKind::from_str(&kind).map_err(internal)?,
        labels: from_json(row.get("labels"))?,
        data: from_json(row.get("data"))?,
        metric: row.get("metric"),
        weather_type: row.get("weather_type"),
        expression: row.get("expression"),
        variables: row.get("variables"),
        x_min: row.get("x_min"),
        x_max: row.get("x_max"),
    };

    Ok(GraphRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        category: Category::from_str(&category).map_err(internal)?,
        spec,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn share_code_from_row(row: &SqliteRow) -> Result<ShareCodeData> {
    let category: String = row.get("category");

    Ok(ShareCodeData {
        code: row.get("code"),
        owner_id: row.get("owner_id"),
        category: Category::from_str(&category).map_err(internal)?,
        graph_id: row.get("graph_id"),
        is_public: row.get("is_public"),
        created_at: row.get("created_at"),
    })
}

fn chat_from_row(row: &SqliteRow) -> ChatData {
    ChatData {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn message_from_row(row: &SqliteRow) -> Result<MessageData> {
    let role: String = row.get("role");

    Ok(MessageData {
        id: row.get("id"),
        chat_id: row.get("chat_id"),
        role: role_from_str(&role)?,
        text: row.get("text"),
        sent_at: row.get("sent_at"),
    })
}

fn calculator_entry_from_row(row: &SqliteRow) -> CalculatorEntryData {
    CalculatorEntryData {
        id: row.get("id"),
        user_id: row.get("user_id"),
        expression: row.get("expression"),
        result: row.get("result"),
        created_at: row.get("created_at"),
    }
}

fn role_to_str(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    }
}

fn role_from_str(value: &str) -> Result<ChatRole> {
    match value {
        "user" => Ok(ChatRole::User),
        "assistant" => Ok(ChatRole::Assistant),
        other => Err(DatabaseError::Internal(
            format!("unknown message role '{}'", other).into(),
        )),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(internal)
}

fn from_json<T: serde::de::DeserializeOwned>(value: String) -> Result<T> {
    serde_json::from_str(&value).map_err(internal)
}

fn internal<E: std::error::Error + Send + Sync + 'static>(error: E) -> DatabaseError {
    DatabaseError::Internal(Box::new(error))
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => Self::any(e),
        }
    }
}
