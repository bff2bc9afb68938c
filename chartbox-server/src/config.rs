use std::env;

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 9700;

/// Runtime configuration, read from the environment with development defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: String,
    pub survey_database_url: String,
    pub assistant_url: String,
    pub main_admin_email: String,
    pub main_admin_password: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("CHARTBOX_SERVER_PORT")
                .map(|x| x.parse::<u16>().expect("Port must be a number"))
                .unwrap_or(DEFAULT_PORT),
            database_url: env::var("CHARTBOX_DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://chartbox.db?mode=rwc".to_string()),
            survey_database_url: env::var("CHARTBOX_SURVEY_DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://chartbox-survey.db?mode=rwc".to_string()),
            assistant_url: env::var("CHARTBOX_ASSISTANT_URL")
                .unwrap_or_else(|_| "http://localhost:5000".to_string()),
            main_admin_email: env::var("CHARTBOX_MAIN_ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@chartbox.app".to_string()),
            main_admin_password: env::var("CHARTBOX_MAIN_ADMIN_PASSWORD")
                .unwrap_or_else(|_| "change-me".to_string()),
        }
    }
}
