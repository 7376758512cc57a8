//! Request path routing: the final path segment names the endpoint,
//! and a `.json` suffix selects the JSON body format.

/// How the request body should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    /// URL-encoded form fields.
    Form,
    /// A JSON object.
    Json,
}

/// Split a request path into its endpoint name and body format.
///
/// Only the final path segment matters, so `/api/repository` and
/// `/anything/else/repository` address the same endpoint. A `.json`
/// suffix is stripped from the name and selects [`BodyFormat::Json`].
#[must_use]
pub fn route(path: &str) -> (&str, BodyFormat) {
    let segment = path.rsplit('/').next().unwrap_or(path);
    match segment.strip_suffix(".json") {
        Some(name) => (name, BodyFormat::Json),
        None => (segment, BodyFormat::Form),
    }
}
