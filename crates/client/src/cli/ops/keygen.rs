use clap::Args;

use common::crypto::{ensure_distinct, KeyConfigError, KeyDomain, KeyError, SymmetricKey};

/// Generate one fresh key per trust domain, printed as environment assignments
#[derive(Args, Debug, Clone)]
pub struct Keygen;

#[derive(Debug, thiserror::Error)]
pub enum KeygenError {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Isolation(#[from] KeyConfigError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Keygen {
    type Error = KeygenError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let tunnel = SymmetricKey::generate()?;
        let content_identifier = SymmetricKey::generate()?;
        let asset = SymmetricKey::generate()?;
        ensure_distinct(&[
            (KeyDomain::Tunnel, &tunnel),
            (KeyDomain::ContentIdentifier, &content_identifier),
            (KeyDomain::Asset, &asset),
        ])?;

        Ok([
            format!("NDNX_TUNNEL_KEY={}", tunnel.to_base64()),
            format!("NDNX_CONTENT_KEY={}", content_identifier.to_base64()),
            format!("NDNX_ASSET_KEY={}", asset.to_base64()),
        ]
        .join("\n"))
    }
}
