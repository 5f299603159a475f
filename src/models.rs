use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One decoded API response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Vec<Value>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageMeta {
    /// Opaque; any JSON type is carried through.
    #[serde(default)]
    pub fingerprint: Option<Value>,
}

fn null_as_empty<'de, D>(d: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(d)?.unwrap_or_default())
}

impl RawPage {
    /// Continuation cursor for the next page. Absent, null, empty, `false`
    /// or `0` means last page.
    pub fn cursor(&self) -> Option<String> {
        match self.meta.as_ref()?.fingerprint.as_ref()? {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            Value::Array(a) if a.is_empty() => None,
            Value::Object(o) if o.is_empty() => None,
            other => Some(other.to_string()),
        }
    }
}

/// One output row: `from,to,amount,timestamp,token,txid`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub from: Option<String>,
    pub to: Option<String>,
    pub amount: f64,
    pub timestamp: String,
    #[serde(rename = "token")]
    pub token_symbol: String,
    #[serde(rename = "txid")]
    pub tx_id: String,
}

pub const OUTPUT_HEADER: [&str; 6] = ["from", "to", "amount", "timestamp", "token", "txid"];
