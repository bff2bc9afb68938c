mod auth;
mod calculator;
mod chats;
mod config;
mod context;
mod docs;
mod errors;
mod graphs;
mod logging;
mod schemas;
mod serialized;
mod shares;
mod sse;
mod survey;

use std::{
    net::{Ipv6Addr, SocketAddr},
    thread,
};

use axum::routing::get;
use log::info;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub use config::*;
pub use context::*;
pub use logging::*;
pub use sse::ServerSentEvents;

pub type Router = axum::Router<ServerContext>;

/// Starts the chartbox server
pub async fn run_server(context: ServerContext, port: u16) {
    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, port).into();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    spawn_event_pump(&context);

    let version_one_router = Router::new()
        .nest("/auth", auth::router())
        .nest("/graphs", graphs::router())
        .nest("/shares", shares::router())
        .nest("/chats", chats::router())
        .nest("/assistant", chats::assistant_router())
        .nest("/calculator", calculator::router())
        .nest("/survey", survey::router());

    let root_router = Router::new()
        .nest("/v1", version_one_router)
        .route("/api.json", get(docs::docs))
        .layer(cors)
        .with_state(context);

    let listener = TcpListener::bind(&addr).await.expect("listens on address");

    info!("Listening on port {}", port);

    axum::serve(listener, root_router.into_make_service())
        .await
        .expect("server runs");
}

/// Bridges studio events into the SSE fan-out
fn spawn_event_pump(context: &ServerContext) {
    let receiver = context.studio.events.subscribe();
    let sse = context.sse.clone();

    thread::spawn(move || {
        while let Ok(event) = receiver.recv() {
            sse.broadcast(event.into())
        }
    });
}
