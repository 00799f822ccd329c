//! The request the client builds and sends.
//!
//! `HttpRequest` holds the resolved parts; `RequestBuilder` offers the
//! fluent construction API.

use http::{HeaderMap, HeaderValue, Method, Version};
use url::Url;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: Url,
    pub method: Method,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: String,
    pub auto_redirect: bool,
    pub max_redirects: u64,
    pub timeout: Option<std::time::Duration>,
}

/// Builds an [`HttpRequest`], mirroring `request_builder`.
pub struct RequestBuilder {
    url: Url,
    method: Method,
    version: Version,
    headers: HeaderMap,
    body: String,
    auto_redirect: bool,
    max_redirects: u64,
    timeout: Option<std::time::Duration>,
}

impl RequestBuilder {
    pub fn new(url: &str) -> Result<Self> {
        Ok(RequestBuilder {
            url: Url::parse(url)?,
            method: Method::GET,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: String::new(),
            auto_redirect: true,
            max_redirects: 5,
            timeout: Some(std::time::Duration::from_millis(5000)),
        })
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(key, value);
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = http::HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::protocol(format!("invalid header name: {name}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| Error::protocol(format!("invalid header value for {name}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn timeout(mut self, duration: std::time::Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    pub fn auto_redirect(mut self, enable: bool) -> Self {
        self.auto_redirect = enable;
        self
    }

    pub fn max_redirects(mut self, max_redirects: u64) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn build(self) -> HttpRequest {
        HttpRequest {
            url: self.url,
            method: self.method,
            version: self.version,
            headers: self.headers,
            body: self.body,
            auto_redirect: self.auto_redirect,
            max_redirects: self.max_redirects,
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_get_request_with_query_params() {
        let request = RequestBuilder::new("http://example.com/search")
            .unwrap()
            .param("q", "rust")
            .build();
        assert_eq!(request.url.query(), Some("q=rust"));
        assert_eq!(request.method, Method::GET);
    }

    #[test]
    fn default_redirect_policy_is_five_hops() {
        let request = RequestBuilder::new("http://example.com").unwrap().build();
        assert!(request.auto_redirect);
        assert_eq!(request.max_redirects, 5);
    }

    #[test]
    fn default_timeout_is_five_seconds() {
        let request = RequestBuilder::new("http://example.com").unwrap().build();
        assert_eq!(request.timeout, Some(std::time::Duration::from_millis(5000)));
    }
}
