use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_bedrockruntime::config::{Credentials, Region};

use crate::config::CredentialSource;

/// Loads shared AWS SDK config for one region.
///
/// An access-key pair is installed as a static provider; anything else leaves
/// the default chain (env vars, profile, IAM role) in charge. Bearer tokens are
/// not an SDK concern and are handled by the caller.
pub async fn load_sdk_config(region: &str, credentials: &CredentialSource) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()));

    if let CredentialSource::AccessKeyPair {
        access_key,
        secret_key,
    } = credentials
    {
        loader = loader.credentials_provider(Credentials::new(
            access_key.clone(),
            secret_key.clone(),
            None,
            None,
            "flight-brief-settings",
        ));
    }

    loader.load().await
}
