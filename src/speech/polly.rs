use async_trait::async_trait;
use aws_sdk_polly::error::DisplayErrorContext;
use aws_sdk_polly::primitives::ByteStream;
use aws_sdk_polly::types::{Engine, OutputFormat, VoiceId};
use futures::StreamExt;

use super::{AudioStream, EngineTier, SpeechError, SpeechSynthesizer, SynthesisRequest};
use crate::aws::load_sdk_config;
use crate::config::PollySettings;

/// Amazon Polly synthesizer producing MP3.
pub struct PollySynthesizer {
    client: aws_sdk_polly::Client,
}

impl PollySynthesizer {
    pub async fn connect(settings: &PollySettings) -> Self {
        tracing::info!(
            "Polly region {} with {} credentials",
            settings.region,
            settings.credentials.kind()
        );

        let config = load_sdk_config(&settings.region, &settings.credentials).await;
        Self {
            client: aws_sdk_polly::Client::new(&config),
        }
    }
}

fn engine(tier: EngineTier) -> Engine {
    match tier {
        EngineTier::Standard => Engine::Standard,
        EngineTier::Neural => Engine::Neural,
    }
}

/// Relays the SDK body chunk by chunk without buffering the whole clip.
fn relay(body: ByteStream) -> AudioStream {
    futures::stream::unfold(body, |mut body| async move {
        match body.next().await {
            Some(Ok(chunk)) => Some((Ok(chunk), body)),
            Some(Err(e)) => Some((Err(SpeechError::Stream(e.to_string())), body)),
            None => None,
        }
    })
    .boxed()
}

#[async_trait]
impl SpeechSynthesizer for PollySynthesizer {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<AudioStream, SpeechError> {
        let output = self
            .client
            .synthesize_speech()
            .text(request.text)
            .voice_id(VoiceId::from(request.voice_id.as_str()))
            .engine(engine(request.engine))
            .output_format(OutputFormat::Mp3)
            .send()
            .await
            .map_err(|e| SpeechError::Sdk(DisplayErrorContext(&e).to_string()))?;

        Ok(relay(output.audio_stream))
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures::TryStreamExt;

    use super::*;

    #[test]
    fn maps_engine_tiers() {
        assert_eq!(engine(EngineTier::Standard), Engine::Standard);
        assert_eq!(engine(EngineTier::Neural), Engine::Neural);
    }

    #[tokio::test]
    async fn relays_sdk_body() {
        let body = ByteStream::from(b"ID3\x04\x00".to_vec());
        let chunks: Vec<Bytes> = relay(body).try_collect().await.unwrap();
        assert_eq!(chunks.concat(), b"ID3\x04\x00");
    }
}
