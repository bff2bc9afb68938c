use axum::{
    extract::{Path, State},
    routing::{delete, get, patch, post},
    Json,
};

use crate::{
    auth::Session,
    context::ServerContext,
    errors::ServerResult,
    schemas::{NewChatSchema, NewMessageSchema, RenameChatSchema, ValidatedJson},
    serialized::{AssistantHealth, Chat, ChatTranscript, Exchange, ToSerialized},
    Router,
};

#[utoipa::path(
    get,
    path = "/v1/chats",
    tag = "chats",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Chat>)
    )
)]
async fn list_chats(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Chat>>> {
    let chats = context.studio.chats.list(session.user().id).await?;

    Ok(Json(chats.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/chats",
    tag = "chats",
    request_body = NewChatSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Chat)
    )
)]
async fn create_chat(
    session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewChatSchema>,
) -> ServerResult<Json<Chat>> {
    let chat = context
        .studio
        .chats
        .create(session.user().id, &body.name)
        .await?;

    Ok(Json(chat.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/chats/{id}",
    tag = "chats",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = ChatTranscript)
    )
)]
async fn chat(
    session: Session,
    State(context): State<ServerContext>,
    Path(chat_id): Path<String>,
) -> ServerResult<Json<ChatTranscript>> {
    let transcript = context
        .studio
        .chats
        .get(session.user().id, &chat_id)
        .await?;

    Ok(Json(transcript.to_serialized()))
}

#[utoipa::path(
    patch,
    path = "/v1/chats/{id}",
    tag = "chats",
    request_body = RenameChatSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Chat)
    )
)]
async fn rename_chat(
    session: Session,
    State(context): State<ServerContext>,
    Path(chat_id): Path<String>,
    ValidatedJson(body): ValidatedJson<RenameChatSchema>,
) -> ServerResult<Json<Chat>> {
    let chat = context
        .studio
        .chats
        .rename(session.user().id, &chat_id, &body.name)
        .await?;

    Ok(Json(chat.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/v1/chats/{id}",
    tag = "chats",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Chat and its messages were deleted")
    )
)]
async fn delete_chat(
    session: Session,
    State(context): State<ServerContext>,
    Path(chat_id): Path<String>,
) -> ServerResult<()> {
    context
        .studio
        .chats
        .delete(session.user().id, &chat_id)
        .await?;

    Ok(())
}

#[utoipa::path(
    post,
    path = "/v1/chats/{id}/messages",
    tag = "chats",
    request_body = NewMessageSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Exchange),
        (status = 502, description = "The assistant server is not running")
    )
)]
async fn send_message(
    session: Session,
    State(context): State<ServerContext>,
    Path(chat_id): Path<String>,
    ValidatedJson(body): ValidatedJson<NewMessageSchema>,
) -> ServerResult<Json<Exchange>> {
    let exchange = context
        .studio
        .chats
        .send(session.user().id, &chat_id, &body.text)
        .await?;

    Ok(Json(exchange.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/assistant/health",
    tag = "chats",
    responses(
        (status = 200, body = AssistantHealth)
    )
)]
async fn assistant_health(State(context): State<ServerContext>) -> Json<AssistantHealth> {
    Json(AssistantHealth {
        ok: context.studio.chats.assistant_health().await,
    })
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_chats))
        .route("/", post(create_chat))
        .route("/:id", get(chat))
        .route("/:id", patch(rename_chat))
        .route("/:id", delete(delete_chat))
        .route("/:id/messages", post(send_message))
}

pub fn assistant_router() -> Router {
    Router::new().route("/health", get(assistant_health))
}
