use std::sync::Arc;

use axum::extract::FromRef;
use chartbox_core::ChartRenderer;
use chartbox_studio::{SqliteDatabase, Studio};

use crate::sse::ServerSentEvents;

/// The studio as instantiated by the server binary.
pub type StudioInstance = Studio<SqliteDatabase>;

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub studio: Arc<StudioInstance>,
    pub renderer: Arc<dyn ChartRenderer>,
    pub sse: Arc<ServerSentEvents>,
}
