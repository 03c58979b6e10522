//! Request and response types for search engine operations.

/// HTTP methods used against the search engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
        }
    }
}

/// Content type for newline-delimited bulk bodies.
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Content type for regular JSON bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// An unsigned request to the search engine.
///
/// This is the value handed to a `RequestSigner`: the signature covers the
/// method, path, headers and body exactly as they will be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRequest {
    /// The HTTP method.
    pub method: HttpMethod,
    /// Absolute path on the engine, e.g. `/_bulk` or `/saves`.
    pub path: String,
    /// Headers to send, lower-case names.
    pub headers: Vec<(String, String)>,
    /// Optional request body.
    pub body: Option<String>,
}

impl EngineRequest {
    fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// A GET request without body.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// A DELETE request without body.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// A PUT request carrying a JSON body.
    pub fn put_json(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
            .with_header("content-type", JSON_CONTENT_TYPE)
            .with_body(body)
    }

    /// A POST request carrying a newline-delimited JSON body.
    pub fn post_ndjson(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
            .with_header("content-type", NDJSON_CONTENT_TYPE)
            .with_body(body)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response from the search engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text (empty when unreadable).
    pub body: String,
}

impl EngineResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Result of a successful bulk delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Number of items the engine reported as processed.
    pub items: usize,
    /// Number of attempts it took, starting at 1.
    pub attempts: u32,
}

/// Result of a successful index administration call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminReport {
    /// The index the call targeted.
    pub index: String,
    /// HTTP status returned by the engine.
    pub status: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_ndjson_sets_content_type() {
        let request = EngineRequest::post_ndjson("/_bulk", "{}\n");
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.header("Content-Type"), Some(NDJSON_CONTENT_TYPE));
        assert_eq!(request.body.as_deref(), Some("{}\n"));
    }

    #[test]
    fn test_get_has_no_body() {
        let request = EngineRequest::get("/saves");
        assert!(request.body.is_none());
        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_response_success_range() {
        assert!(EngineResponse::new(200, "").is_success());
        assert!(EngineResponse::new(201, "").is_success());
        assert!(!EngineResponse::new(300, "").is_success());
        assert!(!EngineResponse::new(429, "").is_success());
    }
}
