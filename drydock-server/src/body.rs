//! Request input parsing: query string and body merged into one
//! field map before the endpoint is even looked up.

use drydock_core::InputMap;

use crate::router::BodyFormat;

/// Input parsing errors. These become a 400 without entering the
/// fault-containment path.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BodyError {
    /// The body is not valid JSON.
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    /// The body parsed as JSON but is not an object.
    #[error("JSON body must be an object")]
    NotAnObject,
}

/// Parse the query string and body into a single input map.
///
/// Query parameters are always read as strings. For [`BodyFormat::Form`]
/// the body is URL-encoded pairs merged over the query; for
/// [`BodyFormat::Json`] it must be a JSON object (or empty), whose
/// fields keep their JSON types. Body fields win over query fields of
/// the same name.
///
/// # Errors
/// Returns [`BodyError`] when a JSON body is malformed or not an
/// object. Form bodies cannot fail; unparsable bytes simply contribute
/// no fields.
pub fn parse_input(
    format: BodyFormat,
    query: Option<&str>,
    body: &[u8],
) -> Result<InputMap, BodyError> {
    let mut input = InputMap::new();
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            input.insert(key.into_owned(), serde_json::Value::String(value.into_owned()));
        }
    }
    match format {
        BodyFormat::Form => {
            for (key, value) in url::form_urlencoded::parse(body) {
                input.insert(key.into_owned(), serde_json::Value::String(value.into_owned()));
            }
        }
        BodyFormat::Json => {
            if !body.is_empty() {
                let value: serde_json::Value = serde_json::from_slice(body)?;
                let serde_json::Value::Object(fields) = value else {
                    return Err(BodyError::NotAnObject);
                };
                input.extend(fields);
            }
        }
    }
    Ok(input)
}
