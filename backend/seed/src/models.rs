use registry::SchoolInput;
use serde_json::Value;

/// Accepted layouts of a seed file.
pub fn parse_seed(json: &str) -> Result<Vec<SchoolInput>, serde_json::Error> {
    let value: Value = serde_json::from_str(json)?;

    match value {
        Value::Object(mut map) if map.contains_key("schools") => {
            serde_json::from_value(map.remove("schools").unwrap_or_default())
        }
        other => serde_json::from_value(other),
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub created: usize,
    pub skipped: usize,
    pub rejected: usize,
}
