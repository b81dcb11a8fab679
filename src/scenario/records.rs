use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;

/// Relative path of the call collection under a user record.
pub const CALL_HISTORY: &str = "calls/history";

pub const LAST_UPDATED: &str = "lastUpdated";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: String,

    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
}

impl CallRecord {
    pub fn new(
        id: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            phone_number: phone_number.into(),
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "id": self.id,
            "phoneNumber": self.phone_number,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CallHistory {
    #[serde(default)]
    pub history: BTreeMap<String, CallRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub name: String,

    #[serde(rename = "lastUpdated", default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<i64>,

    #[serde(default)]
    pub calls: CallHistory,
}

impl UserRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_updated: None,
            calls: CallHistory::default(),
        }
    }

    /// The bare record written by reset, before any call exists.
    pub fn to_value(&self) -> Value {
        let mut value = json!({ "name": self.name });
        if let Some(last_updated) = self.last_updated {
            value[LAST_UPDATED] = json!(last_updated);
        }
        for (key, call) in &self.calls.history {
            value["calls"]["history"][key] = call.to_value();
        }
        value
    }
}
