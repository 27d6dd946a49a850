use serde::Deserialize;
use serde::Deserializer;
use serde_json::Value;

/// Treats an explicit `null` the same as a missing field.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let res = Option::<T>::deserialize(deserializer)?;
    return Ok(res.unwrap_or_default());
}

/// Backend ids arrive as either numbers or strings depending on the endpoint.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let res = match Value::deserialize(deserializer)? {
        Value::Null => "".to_string(),
        Value::String(text) => text,
        other => other.to_string(),
    };

    return Ok(res);
}

pub fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let res = match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    };

    return Ok(res);
}
