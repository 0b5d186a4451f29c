use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A fish as served by `/api/Halak`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FishRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nev: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub faj: String,
    pub meret_cm: f64,
    pub to_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kep: Option<Kep>,

    /// Fields this client does not know about, sent back untouched on update.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Image payload of a [`FishRecord`], in whatever shape the server chose.
///
/// Variants are tried in order, so every JSON value deserializes into one of
/// them and serializes back to the same JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Kep {
    /// Either a `data:` URL or bare base64.
    Text(String),
    /// A wrapped byte buffer, e.g. `{"type": "Buffer", "data": [255, 216]}`.
    Wrapped(WrappedBytes),
    /// A bare array of byte values.
    Bytes(Vec<Value>),
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrappedBytes {
    pub data: Value,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}
