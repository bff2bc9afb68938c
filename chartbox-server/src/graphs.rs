use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json,
};
use chartbox_core::{Category, RenderOptions};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    auth::Session,
    context::ServerContext,
    errors::{ServerError, ServerResult},
    schemas::{GraphSchema, ValidatedJson},
    serialized::{Graph, ToSerialized},
    Router,
};

fn parse_category(value: &str) -> ServerResult<Category> {
    Category::from_str(value).map_err(|e| ServerError::BadRequest(e.to_string()))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct RenderParams {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/v1/graphs/{category}",
    tag = "graphs",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Graph>)
    )
)]
async fn list_graphs(
    session: Session,
    State(context): State<ServerContext>,
    Path(category): Path<String>,
) -> ServerResult<Json<Vec<Graph>>> {
    let category = parse_category(&category)?;

    let graphs = context
        .studio
        .graphs
        .list(session.user().id, category)
        .await?;

    Ok(Json(graphs.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/graphs/{category}",
    tag = "graphs",
    request_body = GraphSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Graph)
    )
)]
async fn create_graph(
    session: Session,
    State(context): State<ServerContext>,
    Path(category): Path<String>,
    ValidatedJson(body): ValidatedJson<GraphSchema>,
) -> ServerResult<Json<Graph>> {
    let category = parse_category(&category)?;
    let spec = body.into_spec()?;

    let graph = context
        .studio
        .graphs
        .create(session.user().id, category, spec)
        .await?;

    Ok(Json(graph.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/graphs/{category}/{id}",
    tag = "graphs",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Graph)
    )
)]
async fn graph(
    session: Session,
    State(context): State<ServerContext>,
    Path((category, graph_id)): Path<(String, String)>,
) -> ServerResult<Json<Graph>> {
    let category = parse_category(&category)?;

    let graph = context
        .studio
        .graphs
        .get(session.user().id, category, &graph_id)
        .await?;

    Ok(Json(graph.to_serialized()))
}

#[utoipa::path(
    patch,
    path = "/v1/graphs/{category}/{id}",
    tag = "graphs",
    request_body = GraphSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Graph)
    )
)]
async fn update_graph(
    session: Session,
    State(context): State<ServerContext>,
    Path((category, graph_id)): Path<(String, String)>,
    ValidatedJson(body): ValidatedJson<GraphSchema>,
) -> ServerResult<Json<Graph>> {
    let category = parse_category(&category)?;
    let spec = body.into_spec()?;

    let graph = context
        .studio
        .graphs
        .update(session.user().id, category, &graph_id, spec)
        .await?;

    Ok(Json(graph.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/v1/graphs/{category}/{id}",
    tag = "graphs",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Graph and its share codes were deleted")
    )
)]
async fn delete_graph(
    session: Session,
    State(context): State<ServerContext>,
    Path((category, graph_id)): Path<(String, String)>,
) -> ServerResult<()> {
    let category = parse_category(&category)?;

    context
        .studio
        .graphs
        .delete(session.user().id, category, &graph_id)
        .await?;

    Ok(())
}

#[utoipa::path(
    get,
    path = "/v1/graphs/{category}/{id}/render",
    tag = "graphs",
    params(RenderParams),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "The graph rendered as a PNG image", content_type = "image/png")
    )
)]
async fn render_graph(
    session: Session,
    State(context): State<ServerContext>,
    Path((category, graph_id)): Path<(String, String)>,
    Query(params): Query<RenderParams>,
) -> ServerResult<impl IntoResponse> {
    let category = parse_category(&category)?;

    let graph = context
        .studio
        .graphs
        .get(session.user().id, category, &graph_id)
        .await?;

    let defaults = RenderOptions::default();
    let options = RenderOptions {
        width: params.width.unwrap_or(defaults.width).clamp(200, 2000),
        height: params.height.unwrap_or(defaults.height).clamp(200, 2000),
    };

    let png = context.renderer.render(
        &graph.spec.name,
        graph.spec.kind,
        &graph.spec.labels,
        &graph.spec.data,
        options,
    )?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

pub fn router() -> Router {
    Router::new()
        .route("/:category", get(list_graphs))
        .route("/:category", post(create_graph))
        .route("/:category/:id", get(graph))
        .route("/:category/:id", patch(update_graph))
        .route("/:category/:id", delete(delete_graph))
        .route("/:category/:id/render", get(render_graph))
}
