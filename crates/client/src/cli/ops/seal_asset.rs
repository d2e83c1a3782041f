use std::path::PathBuf;

use clap::Args;

use client::config::{asset_key, ConfigError};
use common::crypto::{CipherChannel, CipherError, KeyDomain};

/// Seal a file under the asset key, producing the object stored on the CDN
#[derive(Args, Debug, Clone)]
pub struct SealAsset {
    /// Plaintext asset
    #[arg(long)]
    pub input: PathBuf,

    /// Where to write the sealed object
    #[arg(long)]
    pub output: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum SealAssetError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Seal(#[from] CipherError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for SealAsset {
    type Error = SealAssetError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let key = asset_key(&ctx.settings()?)?;
        let channel = CipherChannel::new(KeyDomain::Asset, key);

        let plaintext = tokio::fs::read(&self.input)
            .await
            .map_err(|source| SealAssetError::Io {
                path: self.input.clone(),
                source,
            })?;
        let sealed = channel.seal(&plaintext)?;
        tokio::fs::write(&self.output, sealed.as_bytes())
            .await
            .map_err(|source| SealAssetError::Io {
                path: self.output.clone(),
                source,
            })?;

        Ok(format!(
            "sealed {} ({} bytes) into {} ({} bytes)",
            self.input.display(),
            plaintext.len(),
            self.output.display(),
            sealed.len()
        ))
    }
}

#[cfg(test)]
mod tests {
    use client::config::BenchSettings;
    use common::crypto::{SealedToken, SymmetricKey};

    use super::*;
    use crate::cli::op::{Op, OpContext};

    #[tokio::test]
    async fn test_seal_asset_round_trips_under_asset_key() {
        let key = SymmetricKey::generate().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("10mb.bin");
        let output = dir.path().join("sealed.bin");
        std::fs::write(&input, b"asset bytes").unwrap();

        let ctx = OpContext::new(
            None,
            BenchSettings {
                asset_key: Some(key.to_base64()),
                ..Default::default()
            },
        );
        let op = SealAsset {
            input,
            output: output.clone(),
        };
        op.execute(&ctx).await.unwrap();

        let sealed = SealedToken::from(std::fs::read(&output).unwrap());
        let channel = CipherChannel::new(KeyDomain::Asset, key);
        assert_eq!(channel.open(&sealed).unwrap(), b"asset bytes");
    }

    #[tokio::test]
    async fn test_seal_asset_requires_asset_key() {
        let ctx = OpContext::new(None, BenchSettings::default());
        let op = SealAsset {
            input: PathBuf::from("in"),
            output: PathBuf::from("out"),
        };
        assert!(matches!(
            op.execute(&ctx).await,
            Err(SealAssetError::Config(ConfigError::Missing("asset_key")))
        ));
    }
}
