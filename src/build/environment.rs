use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// One exported build variable, as carried by build state change events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    pub name: String,
    /// Absent and `null` values both read as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub value: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl EnvironmentVariable {
    /// A plain, non-secret variable.
    pub fn plaintext(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            kind: Some("PLAINTEXT".to_string()),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Flat, immutable lookup over a build's exported variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnvironment {
    vars: HashMap<String, String>,
}

impl BuildEnvironment {
    /// Never fails. Duplicate names resolve to the last value seen.
    pub fn from_variables(variables: &[EnvironmentVariable]) -> Self {
        let vars = variables
            .iter()
            .map(|v| (v.name.clone(), v.value.clone()))
            .collect();
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
