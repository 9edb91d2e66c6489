//! Merge of the assembled collections into the base template

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::pipeline::Codeplug;

/// Keys the template merge writes; anything else in the template is kept.
pub const COLLECTION_KEYS: [&str; 8] = [
    "contacts",
    "groupLists",
    "channels",
    "zones",
    "scanLists",
    "roamingChannels",
    "roamingZones",
    "aprs",
];

pub fn load_template(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let content =
        std::fs::read_to_string(path).context(format!("Failed to read template file: {}", path.display()))?;
    serde_json::from_str(&content).context(format!("Failed to parse template file: {}", path.display()))
}

/// Insert every collection of `codeplug` into `template`, replacing
/// existing entries under the same keys.
pub fn merge_into_template(template: Value, codeplug: &Codeplug) -> Result<Value> {
    let mut root = match template {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => anyhow::bail!("Template must be a JSON object, found {}", kind(&other)),
    };

    let Value::Object(collections) = serde_json::to_value(codeplug).context("Failed to serialize codeplug")? else {
        anyhow::bail!("Codeplug did not serialize to a JSON object");
    };
    for (key, value) in collections {
        if root.insert(key.clone(), value).is_some() {
            tracing::debug!("Template key '{}' replaced", key);
        }
    }
    Ok(Value::Object(root))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub fn write_codeplug(path: impl AsRef<Path>, document: &Value) -> Result<()> {
    let path = path.as_ref();
    let content = serde_json::to_string_pretty(document).context("Failed to render codeplug")?;
    std::fs::write(path, content).context(format!("Failed to write codeplug to {}", path.display()))?;
    tracing::info!("Codeplug written to {}", path.display());
    Ok(())
}
