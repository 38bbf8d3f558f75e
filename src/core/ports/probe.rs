//! HTTP probe port

use crate::core::error::QueryError;

/// Unauthenticated HTTP GET returning a JSON body
pub trait HttpProbe {
    /// Fetch `url` and parse the body as JSON
    ///
    /// A 404 is [`QueryError::NotFound`]; a body that is not JSON is
    /// [`QueryError::Malformed`].
    fn get_json(&self, url: &str) -> Result<serde_json::Value, QueryError>;
}
