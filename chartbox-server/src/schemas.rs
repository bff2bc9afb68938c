//! Request bodies accepted by the endpoints, validated before handlers run

use std::str::FromStr;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    Json,
};
use chartbox_core::{GraphData, GraphKind, GraphSpec};
use serde::{de::DeserializeOwned, Deserialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::{ServerError, ServerResult};

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterSchema {
    #[validate(length(min = 2, max = 128))]
    pub display_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 64))]
    pub password: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginSchema {
    #[validate(length(max = 128))]
    pub email: String,
    #[validate(length(max = 64))]
    pub password: String,
}

/// The full content of a graph, used for both creation and replacement.
/// Kind and data are checked structurally past this schema.
#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GraphSchema {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 16))]
    pub kind: String,
    pub labels: Vec<String>,
    /// Either a flat numeric list or a list of labeled datasets
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
    pub metric: Option<String>,
    pub weather_type: Option<String>,
    pub expression: Option<String>,
    pub variables: Option<String>,
    pub x_min: Option<f64>,
    pub x_max: Option<f64>,
}

impl GraphSchema {
    pub fn into_spec(self) -> ServerResult<GraphSpec> {
        let kind =
            GraphKind::from_str(&self.kind).map_err(|e| ServerError::BadRequest(e.to_string()))?;

        let data: GraphData = serde_json::from_value(self.data).map_err(|_| {
            ServerError::BadRequest(
                "Graph data must be a flat numeric list or a list of labeled datasets".to_string(),
            )
        })?;

        Ok(GraphSpec {
            name: self.name,
            kind,
            labels: self.labels,
            data,
            metric: self.metric,
            weather_type: self.weather_type,
            expression: self.expression,
            variables: self.variables,
            x_min: self.x_min,
            x_max: self.x_max,
        })
    }
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewShareSchema {
    #[validate(length(max = 32))]
    pub category: String,
    #[validate(length(min = 1, max = 64))]
    pub graph_id: String,
    pub is_public: bool,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ShareVisibilitySchema {
    pub is_public: bool,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewChatSchema {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RenameChatSchema {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewMessageSchema {
    #[validate(length(min = 1, max = 4000))]
    pub text: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CalculationSchema {
    #[validate(length(min = 1, max = 500))]
    pub expression: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SurveySubmissionSchema {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 120))]
    pub father_name: String,
    #[validate(length(min = 1, max = 40))]
    pub class: String,
    #[validate(length(min = 1, max = 40))]
    pub section: String,
    #[validate(length(min = 1))]
    pub platforms: Vec<String>,
    pub platform_other: Option<String>,
    #[validate(length(min = 1, max = 60))]
    pub time_spent: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdminLoginSchema {
    #[validate(length(max = 128))]
    pub email: String,
    #[validate(length(max = 64))]
    pub password: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewAdminSchema {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 64))]
    pub password: String,
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extracted_json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|_| (StatusCode::BAD_REQUEST, "JSON parse failed"))?;

        extracted_json
            .0
            .validate()
            .map_err(|_| (StatusCode::BAD_REQUEST, "Request body is invalid"))?;

        Ok(Self(extracted_json.0))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_graph_schema_accepts_both_data_shapes() {
        let flat: GraphSchema = serde_json::from_str(
            r#"{
                "name": "Revenue",
                "kind": "line",
                "labels": ["Q1", "Q2"],
                "data": [1.0, 2.0]
            }"#,
        )
        .unwrap();

        assert!(matches!(
            flat.into_spec().unwrap().data,
            GraphData::Single(_)
        ));

        let datasets: GraphSchema = serde_json::from_str(
            r#"{
                "name": "Teams",
                "kind": "bar",
                "labels": ["Mon"],
                "data": [{"label": "A", "values": [1.0]}]
            }"#,
        )
        .unwrap();

        assert!(matches!(
            datasets.into_spec().unwrap().data,
            GraphData::Multi(_)
        ));
    }

    #[test]
    fn test_graph_schema_rejects_unknown_kind() {
        let schema: GraphSchema = serde_json::from_str(
            r#"{
                "name": "Revenue",
                "kind": "donut",
                "labels": [],
                "data": []
            }"#,
        )
        .unwrap();

        assert!(matches!(
            schema.into_spec(),
            Err(ServerError::BadRequest(_))
        ));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result: Result<LoginSchema, _> = serde_json::from_str(
            r#"{"email": "a@b.c", "password": "pw", "extra": true}"#,
        );

        assert!(result.is_err());
    }
}
