pub mod polly;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::config::PollySettings;

pub use polly::PollySynthesizer;

/// Audio chunks as they arrive from the synthesizer.
pub type AudioStream = BoxStream<'static, Result<Bytes, SpeechError>>;

#[derive(thiserror::Error, Debug)]
pub enum SpeechError {
    #[error("Polly call failed: {0}")]
    Sdk(String),

    #[error("Audio stream interrupted: {0}")]
    Stream(String),
}

/// Quality tier for synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineTier {
    Standard,
    #[default]
    Neural,
}

impl EngineTier {
    /// Only "standard" (any case) selects the standard tier.
    pub fn from_setting(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("standard") {
            Self::Standard
        } else {
            Self::Neural
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Neural => "neural",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_id: String,
    pub engine: EngineTier,
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<AudioStream, SpeechError>;
}

#[derive(Clone)]
pub struct SpeechService {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    default_voice: String,
    engine: EngineTier,
}

impl SpeechService {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, settings: &PollySettings) -> Self {
        Self {
            synthesizer,
            default_voice: settings.voice_id.clone(),
            engine: settings.engine,
        }
    }

    /// Synthesizes `text` as MP3, with `voice_id` overriding the configured voice.
    pub async fn synthesize(
        &self,
        text: &str,
        voice_id: Option<&str>,
    ) -> Result<AudioStream, SpeechError> {
        let voice = voice_id.unwrap_or(self.default_voice.as_str());

        tracing::info!(
            "Synthesizing {} chars with Polly voice={} engine={}",
            text.chars().count(),
            voice,
            self.engine.as_str()
        );

        self.synthesizer
            .synthesize(SynthesisRequest {
                text: text.to_string(),
                voice_id: voice.to_string(),
                engine: self.engine,
            })
            .await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use futures::StreamExt;

    use super::*;

    /// Synthesizer that echoes canned audio chunks and records requests.
    pub struct FakeSynthesizer {
        pub chunks: Vec<&'static str>,
        pub fail: bool,
        pub requests: Mutex<Vec<SynthesisRequest>>,
    }

    impl FakeSynthesizer {
        pub fn with_chunks(chunks: &[&'static str]) -> Arc<Self> {
            Arc::new(Self {
                chunks: chunks.to_vec(),
                fail: false,
                requests: Mutex::new(Vec::new()),
            })
        }

        pub fn failing() -> Arc<Self> {
            Arc::new(Self {
                chunks: Vec::new(),
                fail: true,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for FakeSynthesizer {
        async fn synthesize(&self, request: SynthesisRequest) -> Result<AudioStream, SpeechError> {
            self.requests.lock().unwrap().push(request);
            if self.fail {
                return Err(SpeechError::Sdk("service unavailable".into()));
            }
            let chunks: Vec<Result<Bytes, SpeechError>> = self
                .chunks
                .iter()
                .map(|chunk| Ok(Bytes::from_static(chunk.as_bytes())))
                .collect();
            Ok(futures::stream::iter(chunks).boxed())
        }
    }

    pub fn settings(engine: EngineTier) -> PollySettings {
        PollySettings {
            region: "eu-west-1".into(),
            voice_id: "Amy".into(),
            engine,
            credentials: crate::config::CredentialSource::Ambient,
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;

    use super::testing::{settings, FakeSynthesizer};
    use super::*;

    #[test]
    fn engine_tier_parsing() {
        assert_eq!(EngineTier::from_setting("standard"), EngineTier::Standard);
        assert_eq!(EngineTier::from_setting("Standard"), EngineTier::Standard);
        assert_eq!(EngineTier::from_setting("neural"), EngineTier::Neural);
        assert_eq!(EngineTier::from_setting("generative"), EngineTier::Neural);
        assert_eq!(EngineTier::from_setting(""), EngineTier::Neural);
    }

    #[tokio::test]
    async fn uses_default_voice_and_engine() {
        let fake = FakeSynthesizer::with_chunks(&["ID3"]);
        let service = SpeechService::new(fake.clone(), &settings(EngineTier::Standard));

        service.synthesize("Hello", None).await.unwrap();

        let requests = fake.requests.lock().unwrap();
        assert_eq!(
            requests[0],
            SynthesisRequest {
                text: "Hello".into(),
                voice_id: "Amy".into(),
                engine: EngineTier::Standard,
            }
        );
    }

    #[tokio::test]
    async fn voice_override_wins() {
        let fake = FakeSynthesizer::with_chunks(&["ID3"]);
        let service = SpeechService::new(fake.clone(), &settings(EngineTier::Neural));

        service.synthesize("Hello", Some("Matthew")).await.unwrap();

        let requests = fake.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].voice_id, "Matthew");
        assert_eq!(requests[0].engine, EngineTier::Neural);
    }

    #[tokio::test]
    async fn relays_audio_chunks_in_order() {
        let fake = FakeSynthesizer::with_chunks(&["ID3", "\u{1}\u{2}", "\u{3}"]);
        let service = SpeechService::new(fake, &settings(EngineTier::Neural));

        let chunks: Vec<Bytes> = service
            .synthesize("Hello", None)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(chunks.concat(), b"ID3\x01\x02\x03");
    }

    #[tokio::test]
    async fn synthesis_failure_propagates() {
        let service = SpeechService::new(FakeSynthesizer::failing(), &settings(EngineTier::Neural));
        let result = service.synthesize("Hello", None).await;
        assert!(matches!(result, Err(SpeechError::Sdk(_))));
    }
}
