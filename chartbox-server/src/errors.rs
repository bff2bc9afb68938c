use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chartbox_core::{AssistantError, GraphError, RenderError};
use chartbox_studio::{
    AuthError, CalculatorError, ChatError, DatabaseError, GraphLibraryError, SharingError,
    SurveyError,
};
use thiserror::Error;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{resource}:{identifier} not found")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Only the main admin can manage admin accounts")]
    NotMainAdmin,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unreachable(String),
    #[error("Unknown internal error: {0}")]
    Unknown(String),
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::NotFound {
                resource: _,
                identifier: _,
            } => StatusCode::NOT_FOUND,
            Self::Conflict {
                resource: _,
                field: _,
                value: _,
            } => StatusCode::CONFLICT,
            Self::InvalidCredentials => StatusCode::BAD_REQUEST,
            Self::NotMainAdmin => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unreachable(_) => StatusCode::BAD_GATEWAY,
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.as_status_code(), self.to_string()).into_response()
    }
}

impl From<DatabaseError> for ServerError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::NotFound {
                resource,
                identifier,
            } => Self::NotFound {
                resource,
                identifier,
            },
            DatabaseError::Conflict {
                resource,
                field,
                value,
            } => Self::Conflict {
                resource,
                field,
                value,
            },
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<AuthError> for ServerError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::Db(e) => e.into(),
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<GraphError> for ServerError {
    fn from(value: GraphError) -> Self {
        Self::BadRequest(value.to_string())
    }
}

impl From<GraphLibraryError> for ServerError {
    fn from(value: GraphLibraryError) -> Self {
        match value {
            GraphLibraryError::Graph(e) => Self::BadRequest(e.to_string()),
            GraphLibraryError::Sample(e) => Self::BadRequest(e.to_string()),
            GraphLibraryError::Db(e) => e.into(),
        }
    }
}

impl From<SharingError> for ServerError {
    fn from(value: SharingError) -> Self {
        match value {
            SharingError::UnknownCode => Self::NotFound {
                resource: "share code",
                identifier: "code",
            },
            SharingError::Db(e) => e.into(),
        }
    }
}

impl From<AssistantError> for ServerError {
    fn from(value: AssistantError) -> Self {
        match value {
            AssistantError::Unreachable => Self::Unreachable(value.to_string()),
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<ChatError> for ServerError {
    fn from(value: ChatError) -> Self {
        match value {
            ChatError::EmptyMessage => Self::BadRequest(value.to_string()),
            ChatError::Assistant(e) => e.into(),
            ChatError::Db(e) => e.into(),
        }
    }
}

impl From<CalculatorError> for ServerError {
    fn from(value: CalculatorError) -> Self {
        match value {
            CalculatorError::Calc(e) => Self::BadRequest(e.to_string()),
            CalculatorError::Db(e) => e.into(),
        }
    }
}

impl From<SurveyError> for ServerError {
    fn from(value: SurveyError) -> Self {
        match value {
            SurveyError::InvalidCredentials => Self::InvalidCredentials,
            SurveyError::NotMainAdmin => Self::NotMainAdmin,
            SurveyError::CannotRemoveMainAdmin => Self::BadRequest(value.to_string()),
            SurveyError::Db(e) => e.into(),
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<RenderError> for ServerError {
    fn from(value: RenderError) -> Self {
        Self::Unknown(value.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_status_codes() {
        let not_found: ServerError = DatabaseError::NotFound {
            resource: "graph",
            identifier: "id",
        }
        .into();
        assert_eq!(not_found.as_status_code(), StatusCode::NOT_FOUND);

        let conflict: ServerError = DatabaseError::Conflict {
            resource: "graph",
            field: "name",
            value: "Revenue".to_string(),
        }
        .into();
        assert_eq!(conflict.as_status_code(), StatusCode::CONFLICT);

        let unreachable: ServerError = AssistantError::Unreachable.into();
        assert_eq!(unreachable.as_status_code(), StatusCode::BAD_GATEWAY);

        let forbidden: ServerError = SurveyError::NotMainAdmin.into();
        assert_eq!(forbidden.as_status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_sharing_errors_hide_the_reason() {
        let unknown: ServerError = SharingError::UnknownCode.into();

        assert_eq!(unknown.as_status_code(), StatusCode::NOT_FOUND);
        assert_eq!(unknown.to_string(), "share code:code not found");
    }
}
