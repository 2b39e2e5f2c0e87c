//! Canonical payload encoding.
//!
//! Payloads are serialized as a JSON object with keys in sorted order, so the
//! same mapping always yields the same bytes. JSON string escaping keeps
//! quotes, commas and colons inside keys or values from being read as
//! delimiters.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::TokenError;

/// Ordered property bag carried inside a token.
pub type Props = BTreeMap<String, String>;

pub fn encode(props: &Props) -> String {
    let object: Map<String, Value> = props
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();

    Value::Object(object).to_string()
}

pub fn decode(canonical: &str) -> Result<Props, TokenError> {
    serde_json::from_str::<Props>(canonical)
        .map_err(|e| TokenError::MalformedPayload(e.to_string()))
}
