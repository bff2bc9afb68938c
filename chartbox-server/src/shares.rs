use std::str::FromStr;

use axum::{
    extract::{Path, State},
    routing::{delete, get, patch, post},
    Json,
};
use chartbox_core::Category;

use crate::{
    auth::Session,
    context::ServerContext,
    errors::{ServerError, ServerResult},
    schemas::{NewShareSchema, ShareVisibilitySchema, ValidatedJson},
    serialized::{ShareCode, SharedGraph, ToSerialized},
    Router,
};

#[utoipa::path(
    post,
    path = "/v1/shares",
    tag = "shares",
    request_body = NewShareSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = ShareCode)
    )
)]
async fn create_share(
    session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewShareSchema>,
) -> ServerResult<Json<ShareCode>> {
    let category =
        Category::from_str(&body.category).map_err(|e| ServerError::BadRequest(e.to_string()))?;

    let code = context
        .studio
        .sharing
        .create(session.user().id, category, &body.graph_id, body.is_public)
        .await?;

    Ok(Json(code.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/shares/{code}",
    tag = "shares",
    responses(
        (status = 200, body = SharedGraph),
        (status = 404, description = "The code is unknown or not public")
    )
)]
async fn resolve_share(
    State(context): State<ServerContext>,
    Path(code): Path<String>,
) -> ServerResult<Json<SharedGraph>> {
    let shared = context.studio.sharing.resolve(&code).await?;

    Ok(Json(shared.to_serialized()))
}

#[utoipa::path(
    patch,
    path = "/v1/shares/{code}",
    tag = "shares",
    request_body = ShareVisibilitySchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = ShareCode)
    )
)]
async fn set_visibility(
    session: Session,
    State(context): State<ServerContext>,
    Path(code): Path<String>,
    ValidatedJson(body): ValidatedJson<ShareVisibilitySchema>,
) -> ServerResult<Json<ShareCode>> {
    let code = context
        .studio
        .sharing
        .set_visibility(session.user().id, &code, body.is_public)
        .await?;

    Ok(Json(code.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/v1/shares/{code}",
    tag = "shares",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Share code was revoked")
    )
)]
async fn revoke_share(
    session: Session,
    State(context): State<ServerContext>,
    Path(code): Path<String>,
) -> ServerResult<()> {
    context
        .studio
        .sharing
        .revoke(session.user().id, &code)
        .await?;

    Ok(())
}

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_share))
        .route("/:code", get(resolve_share))
        .route("/:code", patch(set_visibility))
        .route("/:code", delete(revoke_share))
}
