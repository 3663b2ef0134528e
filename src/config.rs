//! Process-wide settings, read once at startup.
//!
//! Every value comes from an environment variable with a default. Blank values
//! are treated as absent, so `BEDROCK_API_KEY=""` behaves like an unset key.

use crate::speech::EngineTier;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

const DEFAULT_BEDROCK_REGION: &str = "us-east-1";
const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-haiku-20240307-v1:0";
const DEFAULT_MAX_TOKENS: u32 = 2048;

const DEFAULT_POLLY_REGION: &str = "eu-west-1";
const DEFAULT_VOICE_ID: &str = "Amy";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// How an AWS client authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Bedrock long-term API key, sent as `Authorization: Bearer`.
    BearerToken(String),
    AccessKeyPair { access_key: String, secret_key: String },
    /// Whatever the default AWS provider chain finds (env, profile, IAM role).
    Ambient,
}

impl CredentialSource {
    /// Picks the strongest explicit credential available, falling back to ambient.
    pub fn resolve(
        api_key: Option<&str>,
        access_key: Option<&str>,
        secret_key: Option<&str>,
    ) -> Self {
        if let Some(token) = api_key {
            return Self::BearerToken(token.to_string());
        }

        match (access_key, secret_key) {
            (Some(access), Some(secret)) => Self::AccessKeyPair {
                access_key: access.to_string(),
                secret_key: secret.to_string(),
            },
            _ => Self::Ambient,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::BearerToken(_) => "bearer-token",
            Self::AccessKeyPair { .. } => "access-key-pair",
            Self::Ambient => "ambient",
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind())
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct BedrockSettings {
    pub region: String,
    pub model_id: String,
    pub max_tokens: u32,
    pub credentials: CredentialSource,
}

#[derive(Debug, Clone)]
pub struct PollySettings {
    pub region: String,
    pub voice_id: String,
    pub engine: EngineTier,
    pub credentials: CredentialSource,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub bedrock: BedrockSettings,
    pub polly: PollySettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let server = ServerSettings {
            host: get_or("HOST", DEFAULT_HOST),
            port: parse_or("PORT", get("PORT"), DEFAULT_PORT)?,
        };

        let bedrock = BedrockSettings {
            region: get_or("BEDROCK_REGION", DEFAULT_BEDROCK_REGION),
            model_id: get_or("BEDROCK_MODEL_ID", DEFAULT_MODEL_ID),
            max_tokens: parse_or("BEDROCK_MAX_TOKENS", get("BEDROCK_MAX_TOKENS"), DEFAULT_MAX_TOKENS)?,
            credentials: CredentialSource::resolve(
                get("BEDROCK_API_KEY").as_deref(),
                get("BEDROCK_ACCESS_KEY").as_deref(),
                get("BEDROCK_SECRET_KEY").as_deref(),
            ),
        };

        let polly = PollySettings {
            region: get_or("POLLY_REGION", DEFAULT_POLLY_REGION),
            voice_id: get_or("POLLY_VOICE_ID", DEFAULT_VOICE_ID),
            engine: get("POLLY_ENGINE")
                .map(|v| EngineTier::from_setting(&v))
                .unwrap_or_default(),
            credentials: CredentialSource::resolve(
                None,
                get("POLLY_ACCESS_KEY").as_deref(),
                get("POLLY_SECRET_KEY").as_deref(),
            ),
        };

        Ok(Self {
            server,
            bedrock,
            polly,
        })
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = raw else {
        return Ok(default);
    };

    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}
