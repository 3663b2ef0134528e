pub mod bedrock;
pub mod parser;
pub mod prompt;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::BedrockSettings;

pub use bedrock::{InvokeRequest, ModelClient, ModelError};

/// One flight leg's observed before/after diff.
///
/// `None` means the caller did not provide the value, which is not the same
/// as an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub leg_id: String,
    #[serde(default, alias = "previousAcRegNo")]
    pub previous_tail_number: Option<String>,
    #[serde(default, alias = "currentAcRegNo")]
    pub current_tail_number: Option<String>,
    #[serde(default)]
    pub previous_carrier: Option<String>,
    #[serde(default)]
    pub current_carrier: Option<String>,
}

#[cfg(test)]
impl ChangeRecord {
    pub fn new(leg_id: impl Into<String>) -> Self {
        Self {
            leg_id: leg_id.into(),
            previous_tail_number: None,
            current_tail_number: None,
            previous_carrier: None,
            current_carrier: None,
        }
    }

    pub fn with_tail(mut self, previous: Option<&str>, current: Option<&str>) -> Self {
        self.previous_tail_number = previous.map(str::to_string);
        self.current_tail_number = current.map(str::to_string);
        self
    }

    pub fn with_carrier(mut self, previous: Option<&str>, current: Option<&str>) -> Self {
        self.previous_carrier = previous.map(str::to_string);
        self.current_carrier = current.map(str::to_string);
        self
    }
}

/// Human-readable summary of one leg's change.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub leg_id: String,
    /// Leading symbol plus a short one-line title.
    pub title: String,
    pub analysis: String,
}

/// Builds the prompt, makes one model call and normalizes the reply.
#[derive(Clone)]
pub struct AnalysisService {
    client: Arc<dyn ModelClient>,
    model_id: String,
    max_tokens: u32,
}

impl AnalysisService {
    pub fn new(client: Arc<dyn ModelClient>, settings: &BedrockSettings) -> Self {
        Self {
            client,
            model_id: settings.model_id.clone(),
            max_tokens: settings.max_tokens,
        }
    }

    /// Analyzes a batch of leg changes.
    ///
    /// Transport failures propagate. An unusable reply never does: it degrades
    /// to one fallback result per input record.
    pub async fn analyze(&self, records: &[ChangeRecord]) -> Result<Vec<AnalysisResult>, ModelError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        tracing::info!(
            "Sending {} flight change(s) to Bedrock model {}",
            records.len(),
            self.model_id
        );

        let prompt = prompt::build_prompt(records);
        let request = InvokeRequest {
            model_id: self.model_id.clone(),
            body: bedrock::request_body(&prompt, self.max_tokens)?,
        };

        let reply = self.client.invoke(&request).await?;
        let text = bedrock::completion_text(&reply).unwrap_or_default();
        tracing::debug!("Bedrock raw response:\n{}", text);

        Ok(parser::parse(&text, records))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Model client that returns a canned completion and records every call.
    pub struct ScriptedModel {
        pub reply: Result<String, String>,
        pub calls: Mutex<Vec<InvokeRequest>>,
    }

    impl ScriptedModel {
        pub fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        async fn invoke(&self, request: &InvokeRequest) -> Result<Vec<u8>, ModelError> {
            self.calls.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(serde_json::to_vec(&serde_json::json!({
                    "content": [{ "type": "text", "text": text }]
                }))?),
                Err(message) => Err(ModelError::Sdk(message.clone())),
            }
        }
    }

    pub fn settings() -> BedrockSettings {
        BedrockSettings {
            region: "us-east-1".into(),
            model_id: "test-model".into(),
            max_tokens: 512,
            credentials: crate::config::CredentialSource::Ambient,
        }
    }
}
