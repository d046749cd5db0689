//! Read-only view of the request handed to validation hooks.

use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};

/// Request metadata visible to custom validation hooks.
///
/// Carries the method, target and headers, but never the body; by the time
/// a hook runs the body has already been consumed by binding.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
}

impl RequestContext {
    /// Create a context from its parts.
    #[must_use]
    pub const fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
        }
    }

    /// Snapshot the metadata of an [`http::Request`].
    #[must_use]
    pub fn from_request<B>(request: &http::Request<B>) -> Self {
        Self::new(
            request.method().clone(),
            request.uri().clone(),
            request.headers().clone(),
        )
    }

    /// Snapshot the metadata of [`http::request::Parts`].
    #[must_use]
    pub fn from_parts(parts: &http::request::Parts) -> Self {
        Self::new(parts.method.clone(), parts.uri.clone(), parts.headers.clone())
    }

    /// Return a copy with one header added.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Request method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Request target.
    #[must_use]
    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}
