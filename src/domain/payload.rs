//! Structured payloads exchanged with the gateway.
//!
//! Both request parameters and response data are string-keyed maps of tagged
//! JSON values (`serde_json::Value`). Key order is preserved so that a stored
//! payload serializes back to exactly the text it was read from.

use crate::error::{Result, TransferError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw data returned by the gateway for one response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseData(Map<String, Value>);

impl ResponseData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compact keyed-object text, e.g. `{"amount":"1000.00","success":true}`.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// Parses stored text. Anything but a JSON object is rejected.
    pub fn from_json(text: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => Ok(Self(map)),
            other => Err(TransferError::Serialization(format!(
                "Response data must be an object, found {other}"
            ))),
        }
    }
}

impl From<Map<String, Value>> for ResponseData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for ResponseData {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parameters handed to a gateway action.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestParameters(Map<String, Value>);

impl RequestParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shallow merge: every key of `extra` is copied verbatim, replacing any existing value.
    pub fn merge(mut self, extra: RequestParameters) -> Self {
        for (key, value) in extra.0 {
            self.0.insert(key, value);
        }
        self
    }
}

impl From<Map<String, Value>> for RequestParameters {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for RequestParameters {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Serde adapter storing `Option<ResponseData>` as its compact JSON text.
pub(crate) mod stored_text {
    use super::ResponseData;
    use serde::{Deserialize, Deserializer, Serializer, de, ser};

    pub fn serialize<S>(data: &Option<ResponseData>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match data {
            Some(data) => {
                let text = data.to_json().map_err(ser::Error::custom)?;
                serializer.serialize_some(&text)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<ResponseData>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|text| ResponseData::from_json(&text).map_err(de::Error::custom))
            .transpose()
    }
}
