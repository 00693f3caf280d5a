use crate::errors::{AppError, DomainCode};
use crate::models::{ChatReply, ChatRequest, Stage, StageKind, StageStatus};
use crate::router::{MockReply, RequestArgs};
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;

const EMBEDDED_SCENARIOS: &str = include_str!("../data/ai_assistant.json");

#[derive(Debug, Clone, Deserialize)]
struct StageTemplate {
    #[serde(rename = "type")]
    kind: StageKind,
    title: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ScriptedResponse {
    stages: Vec<StageTemplate>,
}

#[derive(Debug, Clone, Deserialize)]
struct Scenario {
    keywords: Vec<String>,
    response: ScriptedResponse,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawScenarios {
    scenarios: Vec<Scenario>,
    default_response: ScriptedResponse,
}

/// Keyword-scripted assistant replies.
#[derive(Debug, Clone)]
pub struct AssistantMock {
    scenarios: Vec<Scenario>,
    default_response: ScriptedResponse,
}

impl AssistantMock {
    pub fn embedded() -> anyhow::Result<Self> {
        Self::from_json(EMBEDDED_SCENARIOS).context("Failed to load embedded assistant scenarios")
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let raw: RawScenarios = serde_json::from_str(json)?;
        // The last stage is what gets revealed, so every reply needs one.
        if raw.default_response.stages.is_empty() {
            anyhow::bail!("Default assistant response has no stages");
        }
        for (i, scenario) in raw.scenarios.iter().enumerate() {
            if scenario.response.stages.is_empty() {
                anyhow::bail!("Assistant scenario {} has no stages", i);
            }
            // A blank keyword is contained in every message.
            if scenario.keywords.iter().any(|k| k.trim().is_empty()) {
                anyhow::bail!("Assistant scenario {} has a blank keyword", i);
            }
        }
        Ok(Self {
            scenarios: raw
                .scenarios
                .into_iter()
                .map(|mut s| {
                    s.keywords = s.keywords.iter().map(|k| k.to_lowercase()).collect();
                    s
                })
                .collect(),
            default_response: raw.default_response,
        })
    }

    /// First scenario with any keyword contained in the message, else the default.
    fn select(&self, message: &str) -> &ScriptedResponse {
        let message = message.to_lowercase();
        self.scenarios
            .iter()
            .find(|s| s.keywords.iter().any(|k| message.contains(k.as_str())))
            .map(|s| &s.response)
            .unwrap_or(&self.default_response)
    }

    pub fn reply(&self, request: &ChatRequest, now: DateTime<Utc>) -> Result<ChatReply, AppError> {
        if request.message.trim().is_empty() {
            return Err(AppError::validation(
                DomainCode::MISSING_IDENTIFIER,
                "message is required",
            ));
        }

        let stages: Vec<Stage> = self
            .select(&request.message)
            .stages
            .iter()
            .enumerate()
            .map(|(i, template)| Stage {
                id: format!("stage-{}", Uuid::new_v4()),
                kind: template.kind,
                title: template.title.clone(),
                content: template.content.clone(),
                status: StageStatus::Done,
                created_at: now + Duration::seconds(i as i64),
            })
            .collect();

        let content = stages
            .last()
            .map(|s| s.content.clone())
            .unwrap_or_default();
        tracing::debug!(
            "Assistant reply with {} stages for conversation {:?}",
            stages.len(),
            request.conversation_id
        );

        Ok(ChatReply {
            message_id: format!("msg-{}", Uuid::new_v4()),
            content,
            stages,
        })
    }

    pub fn chat_reply(&self, args: &RequestArgs) -> Result<MockReply, AppError> {
        let body = args.json();
        let request = ChatRequest {
            message: body
                .and_then(|b| b.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or_default()
                .to_string(),
            conversation_id: body
                .and_then(|b| b.get("conversationId"))
                .and_then(|c| c.as_str())
                .map(str::to_string),
        };
        match self.reply(&request, Utc::now()) {
            Ok(reply) => Ok(MockReply::data(serde_json::to_value(reply)?)),
            Err(e) => MockReply::from_validation(e),
        }
    }
}
