//! All schemas that are exposed from endpoints are defined here
//! along with the ToSerialized impls

use chartbox_core::{ChatRole, GraphData};
use chartbox_studio::{
    AdminData, AdminSessionData, CalculatorEntryData, ChatData, ChatTranscript as StudioTranscript,
    Exchange as StudioExchange, GraphRecord, MessageData, SessionData,
    ShareCodeData, SharedGraph as StudioSharedGraph, SurveyResponseData, UserData,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: i64,
    email: String,
    display_name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    token: String,
    user: User,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    id: String,
    category: String,
    name: String,
    kind: String,
    labels: Vec<String>,
    /// Either a flat numeric list or a list of labeled datasets
    #[schema(value_type = Object)]
    data: GraphData,
    #[serde(skip_serializing_if = "Option::is_none")]
    metric: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weather_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    x_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    x_max: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareCode {
    code: String,
    category: String,
    graph_id: String,
    is_public: bool,
    created_at: DateTime<Utc>,
}

/// What a resolved share code exposes publicly: the graph, not its owner.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SharedGraph {
    code: String,
    graph: Graph,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    id: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    id: String,
    chat_id: String,
    sender: String,
    text: String,
    sent_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatTranscript {
    chat: Chat,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    message: Message,
    reply: Message,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssistantHealth {
    pub ok: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorEntry {
    id: String,
    expression: String,
    result: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResponse {
    id: String,
    name: String,
    father_name: String,
    class: String,
    section: String,
    platforms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    platform_other: Option<String>,
    time_spent: String,
    submitted_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    id: i64,
    email: String,
    added_by: String,
    added_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginResult {
    token: String,
    admin: Admin,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<User> for UserData {
    fn to_serialized(&self) -> User {
        User {
            id: self.id,
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            created_at: self.created_at,
        }
    }
}

impl ToSerialized<LoginResult> for SessionData {
    fn to_serialized(&self) -> LoginResult {
        LoginResult {
            token: self.token.clone(),
            user: self.user.to_serialized(),
        }
    }
}

impl ToSerialized<Graph> for GraphRecord {
    fn to_serialized(&self) -> Graph {
        Graph {
            id: self.id.clone(),
            category: self.category.to_string(),
            name: self.spec.name.clone(),
            kind: self.spec.kind.to_string(),
            labels: self.spec.labels.clone(),
            data: self.spec.data.clone(),
            metric: self.spec.metric.clone(),
            weather_type: self.spec.weather_type.clone(),
            expression: self.spec.expression.clone(),
            variables: self.spec.variables.clone(),
            x_min: self.spec.x_min,
            x_max: self.spec.x_max,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl ToSerialized<ShareCode> for ShareCodeData {
    fn to_serialized(&self) -> ShareCode {
        ShareCode {
            code: self.code.clone(),
            category: self.category.to_string(),
            graph_id: self.graph_id.clone(),
            is_public: self.is_public,
            created_at: self.created_at,
        }
    }
}

impl ToSerialized<SharedGraph> for StudioSharedGraph {
    fn to_serialized(&self) -> SharedGraph {
        SharedGraph {
            code: self.code.code.clone(),
            graph: self.graph.to_serialized(),
        }
    }
}

impl ToSerialized<Chat> for ChatData {
    fn to_serialized(&self) -> Chat {
        Chat {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl ToSerialized<Message> for MessageData {
    fn to_serialized(&self) -> Message {
        let sender = match self.role {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        };

        Message {
            id: self.id.clone(),
            chat_id: self.chat_id.clone(),
            sender: sender.to_string(),
            text: self.text.clone(),
            sent_at: self.sent_at,
        }
    }
}

impl ToSerialized<ChatTranscript> for StudioTranscript {
    fn to_serialized(&self) -> ChatTranscript {
        ChatTranscript {
            chat: self.chat.to_serialized(),
            messages: self.messages.to_serialized(),
        }
    }
}

impl ToSerialized<Exchange> for StudioExchange {
    fn to_serialized(&self) -> Exchange {
        Exchange {
            message: self.message.to_serialized(),
            reply: self.reply.to_serialized(),
        }
    }
}

impl ToSerialized<CalculatorEntry> for CalculatorEntryData {
    fn to_serialized(&self) -> CalculatorEntry {
        CalculatorEntry {
            id: self.id.clone(),
            expression: self.expression.clone(),
            result: self.result.clone(),
            created_at: self.created_at,
        }
    }
}

impl ToSerialized<SurveyResponse> for SurveyResponseData {
    fn to_serialized(&self) -> SurveyResponse {
        SurveyResponse {
            id: self.id.clone(),
            name: self.name.clone(),
            father_name: self.father_name.clone(),
            class: self.class.clone(),
            section: self.section.clone(),
            platforms: self.platforms.clone(),
            platform_other: self.platform_other.clone(),
            time_spent: self.time_spent.clone(),
            submitted_at: self.submitted_at,
        }
    }
}

impl ToSerialized<Admin> for AdminData {
    fn to_serialized(&self) -> Admin {
        Admin {
            id: self.id,
            email: self.email.clone(),
            added_by: self.added_by.clone(),
            added_at: self.added_at,
        }
    }
}

impl ToSerialized<AdminLoginResult> for AdminSessionData {
    fn to_serialized(&self) -> AdminLoginResult {
        AdminLoginResult {
            token: self.token.clone(),
            admin: self.admin.to_serialized(),
        }
    }
}
