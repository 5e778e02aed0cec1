use crate::builder::Harness;
use crate::Result;
use serde::Deserialize;
use static_double::Value;

/// Recorded calls for one target, loaded from JSON.
///
/// ```json
/// [{ "class": "App\\Clock", "method": "now", "calls": [[], ["UTC"], 5] }]
/// ```
///
/// An array entry is the argument list; any other entry is a single argument.
#[derive(Debug, Clone, Deserialize)]
pub struct CallFixture {
    pub class: String,
    pub method: String,
    #[serde(default)]
    pub calls: Vec<serde_json::Value>,
}

impl CallFixture {
    pub fn from_json(text: &str) -> Result<Vec<CallFixture>> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn arguments(&self) -> Vec<Vec<Value>> {
        self.calls.iter().map(parse_args).collect()
    }

    /// Invoke the target once per call, returning how many were recorded
    pub fn replay(&self, harness: &Harness) -> Result<usize> {
        let mut recorded = 0;
        for args in self.arguments() {
            if harness.call(&self.class, &self.method, &args)? {
                recorded += 1;
            }
        }
        Ok(recorded)
    }
}

pub fn parse_args(json: &serde_json::Value) -> Vec<Value> {
    match json {
        serde_json::Value::Array(items) => items.iter().map(Value::from_json).collect(),
        other => vec![Value::from_json(other)],
    }
}
