use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json,
};

use crate::{
    auth::Session,
    context::ServerContext,
    errors::ServerResult,
    schemas::{CalculationSchema, ValidatedJson},
    serialized::{CalculatorEntry, ToSerialized},
    Router,
};

#[utoipa::path(
    post,
    path = "/v1/calculator",
    tag = "calculator",
    request_body = CalculationSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = CalculatorEntry),
        (status = 400, description = "The expression cannot be evaluated")
    )
)]
async fn evaluate(
    session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<CalculationSchema>,
) -> ServerResult<Json<CalculatorEntry>> {
    let entry = context
        .studio
        .calculator
        .evaluate(session.user().id, &body.expression)
        .await?;

    Ok(Json(entry.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/calculator/history",
    tag = "calculator",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<CalculatorEntry>)
    )
)]
async fn history(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<CalculatorEntry>>> {
    let entries = context.studio.calculator.history(session.user().id).await?;

    Ok(Json(entries.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/v1/calculator/history/{id}",
    tag = "calculator",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "History entry was deleted")
    )
)]
async fn delete_entry(
    session: Session,
    State(context): State<ServerContext>,
    Path(entry_id): Path<String>,
) -> ServerResult<()> {
    context
        .studio
        .calculator
        .delete_entry(session.user().id, &entry_id)
        .await?;

    Ok(())
}

#[utoipa::path(
    delete,
    path = "/v1/calculator/history",
    tag = "calculator",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "History was cleared")
    )
)]
async fn clear_history(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<()> {
    context.studio.calculator.clear(session.user().id).await?;

    Ok(())
}

pub fn router() -> Router {
    Router::new()
        .route("/", post(evaluate))
        .route("/history", get(history))
        .route("/history", delete(clear_history))
        .route("/history/:id", delete(delete_entry))
}
