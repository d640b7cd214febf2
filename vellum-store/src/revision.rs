use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use sha3::{Digest, Sha3_256};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionMetadata {
    /// Document id, stable across every revision of the document.
    pub id: String,
    /// Zero-based, strictly increasing per document.
    pub version: i32,
    pub tx_time: DateTime<Utc>,
}

/// One entry of a table's immutable history.
///
/// A redacted revision keeps its `data_hash` and loses its `data`: the hash
/// proves the content existed without revealing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    pub metadata: RevisionMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_hash: Option<String>,
    pub hash: String,
}

impl Revision {
    pub fn new(id: impl Into<String>, version: i32, data: Value) -> Self {
        let metadata = RevisionMetadata {
            id: id.into(),
            version,
            tx_time: Utc::now(),
        };
        let hash = digest(&[&data, &metadata_value(&metadata)]);

        Self {
            metadata,
            data: Some(data),
            data_hash: None,
            hash,
        }
    }

    pub fn is_redacted(&self) -> bool {
        self.data_hash.is_some()
    }

    /// Blanks the payload, keeping a digest of it in `data_hash`.
    pub fn redact(&mut self) {
        if let Some(data) = self.data.take() {
            self.data_hash = Some(digest(&[&data]));
        }
    }

    pub fn to_data<D: DeserializeOwned>(&self) -> Result<Option<D>> {
        match &self.data {
            Some(data) => Ok(Some(serde_json::from_value(data.clone())?)),
            None => Ok(None),
        }
    }
}

fn metadata_value(metadata: &RevisionMetadata) -> Value {
    serde_json::to_value(metadata).unwrap_or_default()
}

/// Base64 encoded SHA3-256 over the canonical JSON of each value, in order.
pub fn digest(values: &[&Value]) -> String {
    let mut hasher = Sha3_256::new();

    for value in values {
        hasher.update(value.to_string().as_bytes());
    }

    general_purpose::STANDARD.encode(hasher.finalize())
}
