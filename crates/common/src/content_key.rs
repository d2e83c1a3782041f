//! Content Key Resolver table
//!
//! Maps an [`AssetIdentifier`] to the [`DeliveryToken`] provisioned for it. The table is built
//! once at process start and shared read-only between in-flight requests, so lookups need no
//! locking. A miss (`Ok(None)`) is always distinct from a resolver that could not be reached
//! ([`ResolverError::Unavailable`]).

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Identifier used by the reference experiment
pub const REFERENCE_IDENTIFIER: &str = "10mb.bin";
/// Delivery token provisioned for [`REFERENCE_IDENTIFIER`] in the reference deployment
pub const REFERENCE_TOKEN: &str = "gAAAAABpNfPVKq01kUouFVsT2PQGo83UWEuWevxB9TjVEz2D1v9Pz2y18QZtohsCpEhHP0GQ6sUYB1Bzcp4-_0akVGeMPLhd4g==";

/// Opaque name for a content item, e.g. a filename
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetIdentifier(String);

impl AssetIdentifier {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self(identifier.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<&str> for AssetIdentifier {
    fn from(identifier: &str) -> Self {
        Self::new(identifier)
    }
}

impl From<String> for AssetIdentifier {
    fn from(identifier: String) -> Self {
        Self(identifier)
    }
}

impl fmt::Display for AssetIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The resolver's mapping target for an identifier
///
/// Opaque to the relay; the client appends it to a CDN base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryToken(Bytes);

impl DeliveryToken {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Interpret the token as a CDN path suffix
    pub fn as_path_suffix(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.0)
    }
}

impl From<Bytes> for DeliveryToken {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl From<Vec<u8>> for DeliveryToken {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl From<String> for DeliveryToken {
    fn from(token: String) -> Self {
        Self(Bytes::from(token))
    }
}

impl From<&str> for DeliveryToken {
    fn from(token: &str) -> Self {
        Self(Bytes::copy_from_slice(token.as_bytes()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("content key resolver unavailable: {0}")]
    Unavailable(String),
}

/// Anything that can resolve identifiers into delivery tokens
#[async_trait]
pub trait ContentKeySource: Send + Sync {
    /// `Ok(None)` means the identifier was never provisioned.
    async fn resolve(
        &self,
        identifier: &AssetIdentifier,
    ) -> Result<Option<DeliveryToken>, ResolverError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to read content key table: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse content key table: {0}")]
    Toml(#[from] toml::de::Error),
}

/// On-disk layout:
///
/// ```toml
/// [entries]
/// "10mb.bin" = "token-abc"
/// ```
#[derive(Debug, Deserialize)]
struct TableFile {
    #[serde(default)]
    entries: HashMap<String, String>,
}

/// Static identifier -> token table
#[derive(Debug, Clone, Default)]
pub struct ContentKeyTable {
    entries: Arc<HashMap<AssetIdentifier, DeliveryToken>>,
}

impl ContentKeyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The single-entry table used by the experiment
    pub fn reference() -> Self {
        Self::new().with_entry(REFERENCE_IDENTIFIER, REFERENCE_TOKEN)
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<AssetIdentifier>,
        V: Into<DeliveryToken>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Provision one more entry. Only meant for building the table before it is shared.
    pub fn with_entry(
        mut self,
        identifier: impl Into<AssetIdentifier>,
        token: impl Into<DeliveryToken>,
    ) -> Self {
        Arc::make_mut(&mut self.entries).insert(identifier.into(), token.into());
        self
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, TableError> {
        let file: TableFile = toml::from_str(contents)?;
        Ok(Self::from_entries(file.entries))
    }

    pub fn load(path: &Path) -> Result<Self, TableError> {
        let contents = std::fs::read_to_string(path)?;
        let table = Self::from_toml_str(&contents)?;
        tracing::info!(entries = table.len(), path = ?path, "loaded content key table");
        Ok(table)
    }

    pub fn lookup(&self, identifier: &AssetIdentifier) -> Option<DeliveryToken> {
        self.entries.get(identifier).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ContentKeySource for ContentKeyTable {
    async fn resolve(
        &self,
        identifier: &AssetIdentifier,
    ) -> Result<Option<DeliveryToken>, ResolverError> {
        Ok(self.lookup(identifier))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_reference_table() {
        let table = ContentKeyTable::reference();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.lookup(&REFERENCE_IDENTIFIER.into()),
            Some(DeliveryToken::from(REFERENCE_TOKEN))
        );
        assert_eq!(table.lookup(&"missing.bin".into()), None);
    }

    #[test]
    fn test_with_entry_does_not_touch_shared_copies() {
        let base = ContentKeyTable::reference();
        let extended = base.clone().with_entry("10mb.bin", "token-abc");

        assert_eq!(
            base.lookup(&"10mb.bin".into()),
            Some(DeliveryToken::from(REFERENCE_TOKEN))
        );
        assert_eq!(
            extended.lookup(&"10mb.bin".into()),
            Some(DeliveryToken::from("token-abc"))
        );
    }

    #[test]
    fn test_table_from_toml() {
        let table = ContentKeyTable::from_toml_str(
            r#"
            [entries]
            "10mb.bin" = "token-abc"
            "1mb.bin" = "assets/1mb.sealed"
            "#,
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.lookup(&"1mb.bin".into()).unwrap().as_path_suffix().unwrap(),
            "assets/1mb.sealed"
        );

        assert!(ContentKeyTable::from_toml_str("").unwrap().is_empty());
        assert!(matches!(
            ContentKeyTable::from_toml_str("[entries]\n\"a\" = 3"),
            Err(TableError::Toml(_))
        ));
    }

    #[test]
    fn test_table_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.toml");
        std::fs::write(&path, "[entries]\n\"x.bin\" = \"tok\"\n").unwrap();

        let table = ContentKeyTable::load(&path).unwrap();
        assert_eq!(table.lookup(&"x.bin".into()), Some(DeliveryToken::from("tok")));

        assert!(matches!(
            ContentKeyTable::load(&dir.path().join("missing.toml")),
            Err(TableError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_table_as_content_key_source() {
        let table = ContentKeyTable::new().with_entry("10mb.bin", "token-abc");
        let source: &dyn ContentKeySource = &table;

        let hit = source.resolve(&"10mb.bin".into()).await.unwrap();
        assert_eq!(hit, Some(DeliveryToken::from("token-abc")));

        let miss = source.resolve(&"missing.bin".into()).await.unwrap();
        assert_eq!(miss, None);
    }
}
