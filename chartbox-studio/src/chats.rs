use std::sync::Arc;

use chartbox_core::{timestamp_id, Assistant, AssistantError, ChatTurn};
use thiserror::Error;

use crate::{
    ChatData, Database, DatabaseError, MessageData, NewChat, NewMessage, PrimaryKey, StudioContext,
};

/// Chat management and relaying of messages to the assistant backend.
pub struct Chats<Db> {
    context: StudioContext<Db>,
    assistant: Arc<dyn Assistant>,
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Message cannot be empty")]
    EmptyMessage,
    #[error(transparent)]
    Assistant(#[from] AssistantError),
    #[error(transparent)]
    Db(#[from] DatabaseError),
}

/// A chat together with its full message transcript.
#[derive(Debug, Clone)]
pub struct ChatTranscript {
    pub chat: ChatData,
    pub messages: Vec<MessageData>,
}

/// The stored result of one send: the user's message and the reply.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub message: MessageData,
    pub reply: MessageData,
}

impl<Db> Chats<Db>
where
    Db: Database,
{
    pub fn new(context: &StudioContext<Db>, assistant: Arc<dyn Assistant>) -> Self {
        Self {
            context: context.clone(),
            assistant,
        }
    }

    pub async fn create(&self, user_id: PrimaryKey, name: &str) -> Result<ChatData, DatabaseError> {
        self.context
            .database
            .create_chat(NewChat {
                id: timestamp_id(),
                user_id,
                name: name.to_string(),
            })
            .await
    }

    pub async fn list(&self, user_id: PrimaryKey) -> Result<Vec<ChatData>, DatabaseError> {
        self.context.database.list_chats(user_id).await
    }

    pub async fn get(
        &self,
        user_id: PrimaryKey,
        chat_id: &str,
    ) -> Result<ChatTranscript, DatabaseError> {
        let chat = self.context.database.chat_by_id(user_id, chat_id).await?;
        let messages = self.context.database.messages(chat_id).await?;

        Ok(ChatTranscript { chat, messages })
    }

    pub async fn rename(
        &self,
        user_id: PrimaryKey,
        chat_id: &str,
        name: &str,
    ) -> Result<ChatData, DatabaseError> {
        self.context
            .database
            .rename_chat(user_id, chat_id, name)
            .await
    }

    pub async fn delete(&self, user_id: PrimaryKey, chat_id: &str) -> Result<(), DatabaseError> {
        self.context.database.delete_chat(user_id, chat_id).await
    }

    /// Stores the user's message, relays it with the prior transcript to the
    /// assistant, and stores the reply. If the assistant fails, the user's
    /// message stays stored and the error surfaces as-is.
    pub async fn send(
        &self,
        user_id: PrimaryKey,
        chat_id: &str,
        text: &str,
    ) -> Result<Exchange, ChatError> {
        let text = text.trim();

        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        // Ensure the chat exists and belongs to the user
        let chat = self.context.database.chat_by_id(user_id, chat_id).await?;

        let history: Vec<ChatTurn> = self
            .context
            .database
            .messages(&chat.id)
            .await?
            .into_iter()
            .map(|m| ChatTurn {
                role: m.role,
                text: m.text,
            })
            .collect();

        let message = self
            .context
            .database
            .create_message(NewMessage {
                id: timestamp_id(),
                chat_id: chat.id.clone(),
                role: chartbox_core::ChatRole::User,
                text: text.to_string(),
            })
            .await?;

        let reply_text = self.assistant.ask(text, &history).await?;

        let reply = self
            .context
            .database
            .create_message(NewMessage {
                id: timestamp_id(),
                chat_id: chat.id.clone(),
                role: chartbox_core::ChatRole::Assistant,
                text: reply_text,
            })
            .await?;

        self.context.database.touch_chat(&chat.id).await?;

        Ok(Exchange { message, reply })
    }

    /// Whether the assistant backend currently answers
    pub async fn assistant_health(&self) -> bool {
        self.assistant.health().await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::{studio, studio_with_assistant, user, DownAssistant};
    use chartbox_core::ChatRole;

    #[tokio::test]
    async fn test_chat_crud() {
        let studio = studio().await;
        let me = user(&studio, "me@example.com").await;

        let chat = studio.chats.create(me.id, "Homework help").await.unwrap();
        assert_eq!(chat.name, "Homework help");

        let renamed = studio
            .chats
            .rename(me.id, &chat.id, "Math homework")
            .await
            .unwrap();
        assert_eq!(renamed.name, "Math homework");

        assert_eq!(studio.chats.list(me.id).await.unwrap().len(), 1);

        studio.chats.delete(me.id, &chat.id).await.unwrap();
        assert!(studio.chats.list(me.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_appends_both_sides() {
        let studio = studio().await;
        let me = user(&studio, "me@example.com").await;

        let chat = studio.chats.create(me.id, "Chat").await.unwrap();

        let exchange = studio.chats.send(me.id, &chat.id, "Hello").await.unwrap();
        assert_eq!(exchange.message.role, ChatRole::User);
        assert_eq!(exchange.reply.role, ChatRole::Assistant);

        studio.chats.send(me.id, &chat.id, "Again").await.unwrap();

        let transcript = studio.chats.get(me.id, &chat.id).await.unwrap();
        assert_eq!(transcript.messages.len(), 4);

        // The second prompt saw the first exchange as history
        assert!(transcript.messages[3].text.contains("echo(2)"));
    }

    #[tokio::test]
    async fn test_empty_messages_are_rejected() {
        let studio = studio().await;
        let me = user(&studio, "me@example.com").await;

        let chat = studio.chats.create(me.id, "Chat").await.unwrap();

        assert!(matches!(
            studio.chats.send(me.id, &chat.id, "   ").await,
            Err(ChatError::EmptyMessage)
        ));
    }

    #[tokio::test]
    async fn test_assistant_failure_keeps_user_message() {
        let studio = studio_with_assistant(Arc::new(DownAssistant)).await;
        let me = user(&studio, "me@example.com").await;

        let chat = studio.chats.create(me.id, "Chat").await.unwrap();

        let result = studio.chats.send(me.id, &chat.id, "Anyone there?").await;
        assert!(matches!(
            result,
            Err(ChatError::Assistant(AssistantError::Unreachable))
        ));

        let transcript = studio.chats.get(me.id, &chat.id).await.unwrap();
        assert_eq!(transcript.messages.len(), 1);
        assert_eq!(transcript.messages[0].role, ChatRole::User);

        assert!(!studio.chats.assistant_health().await);
    }

    #[tokio::test]
    async fn test_chats_are_owner_scoped() {
        let studio = studio().await;
        let me = user(&studio, "me@example.com").await;
        let other = user(&studio, "other@example.com").await;

        let chat = studio.chats.create(me.id, "Private").await.unwrap();

        assert!(matches!(
            studio.chats.get(other.id, &chat.id).await,
            Err(DatabaseError::NotFound { .. })
        ));
        assert!(matches!(
            studio.chats.send(other.id, &chat.id, "hi").await,
            Err(ChatError::Db(DatabaseError::NotFound { .. }))
        ));
    }
}
