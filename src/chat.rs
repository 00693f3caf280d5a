//! Chat Orchestration.
//!
//! A [`ChatSession`] owns the ordered message list of one conversation and
//! allows a single outstanding turn. The assistant's final stage is revealed
//! through a [`StreamingReveal`] owned by the session.

use crate::config::Config;
use crate::errors::AppError;
use crate::models::{ChatMessage, ChatReply, ChatRequest, MessageRole};
use crate::streaming::{RevealOptions, RevealSnapshot, StreamingReveal};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Sends one chat turn and returns the staged reply.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_chat(&self, request: ChatRequest) -> Result<ChatReply, AppError>;
}

/// The assistant stage currently being revealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamingTarget {
    pub message_id: String,
    pub stage_id: String,
}

#[derive(Default)]
struct SessionState {
    messages: Vec<ChatMessage>,
    target: Option<StreamingTarget>,
    reveal: Option<StreamingReveal>,
}

pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    conversation_id: String,
    reveal_options: RevealOptions,
    in_flight: AtomicBool,
    state: Mutex<SessionState>,
}

/// Clears the in-flight flag even if the submitting future is dropped.
struct TurnGuard<'a>(&'a AtomicBool);

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>, reveal_options: RevealOptions) -> Self {
        Self {
            backend,
            conversation_id: format!("conv-{}", Uuid::new_v4()),
            reveal_options,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Session revealing at the configured typing speed.
    pub fn from_config(backend: Arc<dyn ChatBackend>, config: &Config) -> Self {
        Self::new(backend, config.reveal_options())
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Submits one user turn.
    ///
    /// Returns `Ok(None)` for blank input, which is ignored entirely, and
    /// [`AppError::Busy`] while another turn is outstanding. On failure the
    /// user message stays in the list but no assistant message is added.
    pub async fn submit(&self, text: &str) -> Result<Option<ChatMessage>, AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("Rejected chat submission while a turn is in flight");
            return Err(AppError::Busy);
        }
        let _guard = TurnGuard(&self.in_flight);

        self.lock().messages.push(ChatMessage {
            id: format!("user-{}", Uuid::new_v4()),
            role: MessageRole::User,
            content: text.to_string(),
            created_at: Utc::now(),
            stages: None,
        });

        let request = ChatRequest {
            message: text.to_string(),
            conversation_id: Some(self.conversation_id.clone()),
        };
        let reply = self.backend.send_chat(request).await.map_err(|e| {
            tracing::warn!("Chat turn failed: {}", e);
            e
        })?;

        let Some(last_stage) = reply.stages.last().cloned() else {
            return Err(AppError::Provider(format!(
                "Reply {} has no stages",
                reply.message_id
            )));
        };

        let message = ChatMessage {
            id: reply.message_id.clone(),
            role: MessageRole::Assistant,
            content: last_stage.content.clone(),
            created_at: Utc::now(),
            stages: Some(reply.stages),
        };

        let message_id = message.id.clone();
        let reveal = StreamingReveal::start(&last_stage.content, self.reveal_options, move || {
            tracing::debug!("Finished revealing {}", message_id);
        });

        let mut state = self.lock();
        state.messages.push(message.clone());
        state.target = Some(StreamingTarget {
            message_id: message.id.clone(),
            stage_id: last_stage.id,
        });
        // Replacing the handle drops, and so cancels, the previous reveal.
        state.reveal = Some(reveal);
        tracing::info!(
            "Chat turn completed: {} ({} messages)",
            message.id,
            state.messages.len()
        );

        Ok(Some(message))
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().messages.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn streaming_target(&self) -> Option<StreamingTarget> {
        self.lock().target.clone()
    }

    pub fn reveal_snapshot(&self) -> Option<RevealSnapshot> {
        self.lock().reveal.as_ref().map(StreamingReveal::snapshot)
    }

    pub fn subscribe_reveal(&self) -> Option<tokio::sync::watch::Receiver<RevealSnapshot>> {
        self.lock().reveal.as_ref().map(StreamingReveal::subscribe)
    }

    pub fn skip_streaming(&self) {
        if let Some(reveal) = self.lock().reveal.as_ref() {
            reveal.skip();
        }
    }

    /// Empties the conversation and cancels any running reveal.
    pub fn clear(&self) {
        let mut state = self.lock();
        if let Some(reveal) = state.reveal.take() {
            reveal.cancel();
        }
        state.messages.clear();
        state.target = None;
        tracing::debug!("Chat session {} cleared", self.conversation_id);
    }
}
