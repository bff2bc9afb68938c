use std::sync::Arc;

use chartbox_impls::{HttpAssistant, PlottersRenderer};
use chartbox_server::{init_logger, run_server, ServerConfig, ServerContext, ServerSentEvents};
use chartbox_studio::{SqliteDatabase, Studio, SurveyDatabase};
use log::info;

#[tokio::main]
async fn main() {
    init_logger();

    let config = ServerConfig::from_env();

    let database = SqliteDatabase::connect(&config.database_url)
        .await
        .expect("database connects");
    database.migrate().await.expect("database migrates");

    let survey_database = SurveyDatabase::connect(&config.survey_database_url)
        .await
        .expect("survey database connects");
    survey_database.migrate().await.expect("survey database migrates");

    let assistant = Arc::new(HttpAssistant::new(config.assistant_url.clone()));

    let studio = Arc::new(Studio::new(
        database,
        survey_database,
        assistant,
        config.main_admin_email.clone(),
    ));

    studio
        .survey
        .ensure_main_admin(&config.main_admin_password)
        .await
        .expect("main admin seeds");

    info!("Studio is ready, assistant at {}", config.assistant_url);

    let context = ServerContext {
        studio,
        renderer: Arc::new(PlottersRenderer),
        sse: ServerSentEvents::new(),
    };

    run_server(context, config.port).await
}
