use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    response::sse::{KeepAlive, Sse},
    routing::{delete, get, post},
    Json,
};
use chartbox_studio::{AdminData, AdminSessionData, NewSubmission};
use chrono::Utc;

use crate::{
    auth::{bearer_token, Session},
    context::ServerContext,
    errors::ServerResult,
    schemas::{AdminLoginSchema, NewAdminSchema, SurveySubmissionSchema, ValidatedJson},
    serialized::{Admin, AdminLoginResult, SurveyResponse, ToSerialized},
    sse::{ConnectionHandle, ServerEvent},
    Router,
};

/// Wraps [AdminSessionData] so [FromRequestParts] can be implemented for it.
/// Admin sessions live in the survey database, separate from user sessions.
pub struct AdminSession(AdminSessionData);

impl AdminSession {
    pub fn admin(&self) -> AdminData {
        self.0.admin.clone()
    }
}

#[async_trait]
impl FromRequestParts<ServerContext> for AdminSession {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let context = ServerContext::from_ref(state);
        let token = bearer_token(parts)?;

        let session = context
            .studio
            .survey
            .admin_session(token)
            .await
            .map_err(|_| (StatusCode::UNAUTHORIZED, "Admin session does not exist"))?;

        if session.expires_at < Utc::now() {
            return Err((StatusCode::UNAUTHORIZED, "Admin session has expired"));
        }

        Ok(Self(session))
    }
}

#[utoipa::path(
    post,
    path = "/v1/survey/responses",
    tag = "survey",
    request_body = SurveySubmissionSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = SurveyResponse)
    )
)]
async fn submit_response(
    _session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<SurveySubmissionSchema>,
) -> ServerResult<Json<SurveyResponse>> {
    let response = context
        .studio
        .survey
        .submit(NewSubmission {
            name: body.name,
            father_name: body.father_name,
            class: body.class,
            section: body.section,
            platforms: body.platforms,
            platform_other: body.platform_other,
            time_spent: body.time_spent,
        })
        .await?;

    Ok(Json(response.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/survey/responses",
    tag = "survey",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<SurveyResponse>)
    )
)]
async fn list_responses(
    _session: AdminSession,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<SurveyResponse>>> {
    let responses = context.studio.survey.responses().await?;

    Ok(Json(responses.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/v1/survey/responses/{id}",
    tag = "survey",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Response was deleted")
    )
)]
async fn delete_response(
    _session: AdminSession,
    State(context): State<ServerContext>,
    Path(response_id): Path<String>,
) -> ServerResult<()> {
    context.studio.survey.delete_response(&response_id).await?;

    Ok(())
}

#[utoipa::path(
    get,
    path = "/v1/survey/feed",
    tag = "survey",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (
            status = 200,
            content_type = "text/event-stream",
            description = "A stream of survey response snapshots, one per change",
            body = ServerEvent
        )
    )
)]
async fn feed(
    _session: AdminSession,
    State(context): State<ServerContext>,
) -> Sse<ConnectionHandle> {
    Sse::new(context.sse.connect()).keep_alive(KeepAlive::default())
}

#[utoipa::path(
    post,
    path = "/v1/survey/admin/login",
    tag = "survey",
    request_body = AdminLoginSchema,
    responses(
        (status = 200, body = AdminLoginResult)
    )
)]
async fn admin_login(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<AdminLoginSchema>,
) -> ServerResult<Json<AdminLoginResult>> {
    let session = context
        .studio
        .survey
        .admin_login(&body.email, &body.password)
        .await?;

    Ok(Json(session.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/survey/admins",
    tag = "survey",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Admin>)
    )
)]
async fn list_admins(
    _session: AdminSession,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Admin>>> {
    let admins = context.studio.survey.list_admins().await?;

    Ok(Json(admins.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/survey/admins",
    tag = "survey",
    request_body = NewAdminSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Admin),
        (status = 403, description = "Only the main admin can manage admin accounts")
    )
)]
async fn add_admin(
    session: AdminSession,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewAdminSchema>,
) -> ServerResult<Json<Admin>> {
    let admin = context
        .studio
        .survey
        .add_admin(&session.admin(), &body.email, &body.password)
        .await?;

    Ok(Json(admin.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/v1/survey/admins/{id}",
    tag = "survey",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Admin was removed"),
        (status = 403, description = "Only the main admin can manage admin accounts")
    )
)]
async fn remove_admin(
    session: AdminSession,
    State(context): State<ServerContext>,
    Path(admin_id): Path<i64>,
) -> ServerResult<()> {
    context
        .studio
        .survey
        .remove_admin(&session.admin(), admin_id)
        .await?;

    Ok(())
}

pub fn router() -> Router {
    Router::new()
        .route("/responses", post(submit_response))
        .route("/responses", get(list_responses))
        .route("/responses/:id", delete(delete_response))
        .route("/feed", get(feed))
        .route("/admin/login", post(admin_login))
        .route("/admins", get(list_admins))
        .route("/admins", post(add_admin))
        .route("/admins/:id", delete(remove_admin))
}
