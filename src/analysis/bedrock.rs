//! Model invocation against Amazon Bedrock.
//!
//! The service speaks the Anthropic messages format. Two transports are
//! supported: the AWS SDK (signed with static or ambient credentials) and a
//! plain HTTPS call authenticated with a Bedrock API key.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::primitives::Blob;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::aws::load_sdk_config;
use crate::config::{BedrockSettings, CredentialSource};

const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("Bedrock call failed: {0}")]
    Sdk(String),

    #[error("Bedrock request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Bedrock returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to encode Bedrock request: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct InvokeRequest {
    pub model_id: String,
    pub body: Vec<u8>,
}

/// One request/response exchange with a text-generation model.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn invoke(&self, request: &InvokeRequest) -> Result<Vec<u8>, ModelError>;
}

#[derive(Serialize)]
struct MessagesBody<'a> {
    anthropic_version: &'static str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesReply {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

pub fn request_body(prompt: &str, max_tokens: u32) -> Result<Vec<u8>, ModelError> {
    let body = MessagesBody {
        anthropic_version: ANTHROPIC_VERSION,
        max_tokens,
        messages: [Message {
            role: "user",
            content: prompt,
        }],
    };
    Ok(serde_json::to_vec(&body)?)
}

/// Text of the first content block, if the envelope has one.
pub fn completion_text(body: &[u8]) -> Option<String> {
    match serde_json::from_slice::<MessagesReply>(body) {
        Ok(reply) => reply.content.into_iter().next().and_then(|block| block.text),
        Err(e) => {
            tracing::warn!("Unreadable Bedrock response envelope: {}", e);
            None
        }
    }
}

/// Picks the transport for the configured credentials.
pub async fn connect(settings: &BedrockSettings) -> Arc<dyn ModelClient> {
    tracing::info!(
        "Bedrock region {} with {} credentials",
        settings.region,
        settings.credentials.kind()
    );

    match &settings.credentials {
        CredentialSource::BearerToken(token) => {
            Arc::new(BearerModelClient::new(&settings.region, token))
        }
        other => {
            let config = load_sdk_config(&settings.region, other).await;
            Arc::new(SdkModelClient::new(&config))
        }
    }
}

pub struct SdkModelClient {
    client: aws_sdk_bedrockruntime::Client,
}

impl SdkModelClient {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_bedrockruntime::Client::new(config),
        }
    }
}

#[async_trait]
impl ModelClient for SdkModelClient {
    async fn invoke(&self, request: &InvokeRequest) -> Result<Vec<u8>, ModelError> {
        let output = self
            .client
            .invoke_model()
            .model_id(&request.model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(request.body.clone()))
            .send()
            .await
            .map_err(|e| ModelError::Sdk(DisplayErrorContext(&e).to_string()))?;

        Ok(output.body().as_ref().to_vec())
    }
}

/// Calls the Bedrock runtime REST endpoint with an API key.
pub struct BearerModelClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl BearerModelClient {
    pub fn new(region: &str, token: &str) -> Self {
        Self::with_endpoint(
            format!("https://bedrock-runtime.{}.amazonaws.com", region),
            token,
        )
    }

    pub fn with_endpoint(endpoint: impl Into<String>, token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            token: token.to_string(),
        }
    }

    fn invoke_url(&self, model_id: &str) -> String {
        format!("{}/model/{}/invoke", self.endpoint.trim_end_matches('/'), model_id)
    }
}

#[async_trait]
impl ModelClient for BearerModelClient {
    async fn invoke(&self, request: &InvokeRequest) -> Result<Vec<u8>, ModelError> {
        let response = self
            .http
            .post(self.invoke_url(&request.model_id))
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(request.body.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
