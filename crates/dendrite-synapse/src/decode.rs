//! Turning raw provider text into an accepted result value.
use dendrite_core::{
    Validate,
    error::{ResponseError, ValidationError},
};
use serde::de::DeserializeOwned;

/// Extract JSON from text, handling optional markdown code fences.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    for fence in ["```json", "```"] {
        if let Some(start) = trimmed.find(fence) {
            let body = start + fence.len();
            if let Some(end) = trimmed[body..].find("```") {
                return trimmed[body..body + end].trim();
            }
        }
    }
    trimmed
}

/// Decode `text` as JSON, falling back to the body of a code fence only when
/// the whole text does not parse. Backticks inside string values stay
/// intact.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ResponseError> {
    let trimmed = text.trim();
    let err = match serde_json::from_str(trimmed) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };
    let body = extract_json(trimmed);
    if body == trimmed {
        return Err(ResponseError::Decode(err));
    }
    serde_json::from_str(body).map_err(ResponseError::Decode)
}

/// Decode, then run the type's own validation and the extra `verify` check.
pub fn accept<T, F>(text: &str, verify: F) -> Result<T, ResponseError>
where
    T: DeserializeOwned + Validate,
    F: FnOnce(&T) -> Result<(), ValidationError>,
{
    let value: T = decode(text)?;
    value.validate()?;
    verify(&value)?;
    Ok(value)
}
