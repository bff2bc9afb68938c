use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::{DatabaseError, DatabaseResult, IntoDatabaseError, PrimaryKey, Result};

/// A submitted survey response.
#[derive(Debug, Clone)]
pub struct SurveyResponseData {
    pub id: String,
    pub name: String,
    pub father_name: String,
    pub class: String,
    pub section: String,
    pub platforms: Vec<String>,
    pub platform_other: Option<String>,
    pub time_spent: String,
    pub submitted_at: DateTime<Utc>,
}

/// An account allowed into the survey admin dashboard.
#[derive(Debug, Clone)]
pub struct AdminData {
    pub id: PrimaryKey,
    pub email: String,
    pub password: String,
    pub added_by: String,
    pub added_at: DateTime<Utc>,
}

/// Login session data for the admin dashboard
#[derive(Debug, Clone)]
pub struct AdminSessionData {
    pub id: PrimaryKey,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub admin: AdminData,
}

#[derive(Debug)]
pub struct NewSurveyResponse {
    pub id: String,
    pub name: String,
    pub father_name: String,
    pub class: String,
    pub section: String,
    pub platforms: Vec<String>,
    pub platform_other: Option<String>,
    pub time_spent: String,
}

#[derive(Debug)]
pub struct NewAdmin {
    pub email: String,
    pub password: String,
    pub added_by: String,
}

#[derive(Debug)]
pub struct NewAdminSession {
    pub token: String,
    pub admin_id: PrimaryKey,
    pub expires_at: DateTime<Utc>,
}

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS survey_responses (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        father_name TEXT NOT NULL,
        class TEXT NOT NULL,
        section TEXT NOT NULL,
        platforms TEXT NOT NULL,
        platform_other TEXT,
        time_spent TEXT NOT NULL,
        submitted_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS admins (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        added_by TEXT NOT NULL,
        added_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS admin_sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        token TEXT NOT NULL UNIQUE,
        admin_id INTEGER NOT NULL REFERENCES admins (id) ON DELETE CASCADE,
        expires_at TEXT NOT NULL
    )",
];

/// The survey sub-application's own database, fully separate from the main one.
pub struct SurveyDatabase {
    pool: SqlitePool,
}

impl SurveyDatabase {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))?;

        Ok(Self { pool })
    }

    /// An isolated in-memory database with the schema applied, used by tests.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))?;

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

    pub async fn response_by_id(&self, response_id: &str) -> Result<SurveyResponseData> {
        let row = sqlx::query("SELECT * FROM survey_responses WHERE id = ?")
            .bind(response_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("survey response", "id"))?;

        response_from_row(&row)
    }

    pub async fn list_responses(&self) -> Result<Vec<SurveyResponseData>> {
        let rows = sqlx::query("SELECT * FROM survey_responses ORDER BY submitted_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        rows.iter().map(response_from_row).collect()
    }

    pub async fn create_response(
        &self,
        new_response: NewSurveyResponse,
    ) -> Result<SurveyResponseData> {
        sqlx::query(
            "INSERT INTO survey_responses (
                id, name, father_name, class, section,
                platforms, platform_other, time_spent, submitted_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new_response.id)
        .bind(&new_response.name)
        .bind(&new_response.father_name)
        .bind(&new_response.class)
        .bind(&new_response.section)
        .bind(to_json(&new_response.platforms)?)
        .bind(&new_response.platform_other)
        .bind(&new_response.time_spent)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.response_by_id(&new_response.id).await
    }

    pub async fn delete_response(&self, response_id: &str) -> Result<()> {
        // Ensure response exists
        let _ = self.response_by_id(response_id).await?;

        sqlx::query("DELETE FROM survey_responses WHERE id = ?")
            .bind(response_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    pub async fn admin_by_id(&self, admin_id: PrimaryKey) -> Result<AdminData> {
        let row = sqlx::query("SELECT * FROM admins WHERE id = ?")
            .bind(admin_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("admin", "id"))?;

        Ok(admin_from_row(&row))
    }

    pub async fn admin_by_email(&self, email: &str) -> Result<AdminData> {
        let row = sqlx::query("SELECT * FROM admins WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("admin", "email"))?;

        Ok(admin_from_row(&row))
    }

    pub async fn list_admins(&self) -> Result<Vec<AdminData>> {
        let rows = sqlx::query("SELECT * FROM admins ORDER BY added_at")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        Ok(rows.iter().map(admin_from_row).collect())
    }

    pub async fn create_admin(&self, new_admin: NewAdmin) -> Result<AdminData> {
        self.admin_by_email(&new_admin.email)
            .await
            .conflict_or_ok("admin", "email", &new_admin.email)?;

        sqlx::query("INSERT INTO admins (email, password, added_by, added_at) VALUES (?, ?, ?, ?)")
            .bind(&new_admin.email)
            .bind(&new_admin.password)
            .bind(&new_admin.added_by)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        self.admin_by_email(&new_admin.email).await
    }

    pub async fn delete_admin(&self, admin_id: PrimaryKey) -> Result<()> {
        // Ensure admin exists
        let _ = self.admin_by_id(admin_id).await?;

        sqlx::query("DELETE FROM admins WHERE id = ?")
            .bind(admin_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    pub async fn admin_session_by_token(&self, token: &str) -> Result<AdminSessionData> {
        let row = sqlx::query(
            "SELECT
                admin_sessions.id AS session_id,
                admin_sessions.token,
                admin_sessions.expires_at,
                admins.id,
                admins.email,
                admins.password,
                admins.added_by,
                admins.added_at
            FROM admin_sessions
                INNER JOIN admins ON admin_sessions.admin_id = admins.id
            WHERE admin_sessions.token = ?
            ",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("admin session", "token"))?;

        Ok(AdminSessionData {
            id: row.get("session_id"),
            token: row.get("token"),
            expires_at: row.get("expires_at"),
            admin: admin_from_row(&row),
        })
    }

    pub async fn create_admin_session(
        &self,
        new_session: NewAdminSession,
    ) -> Result<AdminSessionData> {
        self.admin_session_by_token(&new_session.token)
            .await
            .conflict_or_ok("admin session", "token", &new_session.token)?;

        sqlx::query("INSERT INTO admin_sessions (token, admin_id, expires_at) VALUES (?, ?, ?)")
            .bind(&new_session.token)
            .bind(new_session.admin_id)
            .bind(new_session.expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        self.admin_session_by_token(&new_session.token).await
    }

    pub async fn clear_expired_admin_sessions(&self) -> Result<()> {
        sqlx::query("DELETE FROM admin_sessions WHERE expires_at < ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }
}

fn response_from_row(row: &SqliteRow) -> Result<SurveyResponseData> {
    Ok(SurveyResponseData {
        id: row.get("id"),
        name: row.get("name"),
        father_name: row.get("father_name"),
        class: row.get("class"),
        section: row.get("section"),
        platforms: from_json(row.get("platforms"))?,
        platform_other: row.get("platform_other"),
        time_spent: row.get("time_spent"),
        submitted_at: row.get("submitted_at"),
    })
}

fn admin_from_row(row: &SqliteRow) -> AdminData {
    AdminData {
        id: row.get("id"),
        email: row.get("email"),
        password: row.get("password"),
        added_by: row.get("added_by"),
        added_at: row.get("added_at"),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| DatabaseError::Internal(Box::new(e)))
}

fn from_json<T: serde::de::DeserializeOwned>(value: String) -> Result<T> {
    serde_json::from_str(&value).map_err(|e| DatabaseError::Internal(Box::new(e)))
}
