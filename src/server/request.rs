//! The request type handlers receive.
//!
//! Wraps the parsed head, splits the request-target into a decoded path and
//! a query multimap up front, and carries a slot for whatever a matcher
//! (see [`super::router`]) populates — named path parameters or regex
//! captures.

use std::collections::HashMap;

use http::{HeaderMap, Method, Version};

/// A multimap over query-string keys, since a key may repeat
/// (`?tag=a&tag=b`).
#[derive(Debug, Clone, Default)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    fn parse(query: &str) -> Self {
        QueryParams(
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        )
    }

    /// The first value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Every value for `key`, in the order they appeared.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        self.0.iter().filter(move |(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) version: Version,
    pub(crate) path: String,
    pub(crate) query: QueryParams,
    pub(crate) headers: HeaderMap,
    pub(crate) body: String,
    pub(crate) path_params: HashMap<String, String>,
    pub(crate) captures: Vec<Option<String>>,
}

impl Request {
    pub(crate) fn new(method: Method, version: Version, target: &str, headers: HeaderMap, body: String) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), QueryParams::parse(query)),
            None => (target.to_string(), QueryParams::default()),
        };

        Request {
            method,
            version,
            path,
            query,
            headers,
            body,
            path_params: HashMap::new(),
            captures: Vec::new(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }

    /// Named path parameters captured by a [`super::router::PathParamMatcher`].
    pub fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(|s| s.as_str())
    }

    /// Regex capture groups from a [`super::router::RegexMatcher`], indexed
    /// the same way as `Regex::captures` (group 0 is the whole match).
    pub fn captures(&self) -> &[Option<String>] {
        &self.captures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_path_and_query() {
        let req = Request::new(Method::GET, Version::HTTP_11, "/search?q=rust&q=http", HeaderMap::new(), String::new());
        assert_eq!(req.path(), "/search");
        assert_eq!(req.query().get("q"), Some("rust"));
        assert_eq!(req.query().get_all("q").collect::<Vec<_>>(), vec!["rust", "http"]);
    }

    #[test]
    fn no_query_is_fine() {
        let req = Request::new(Method::GET, Version::HTTP_11, "/", HeaderMap::new(), String::new());
        assert_eq!(req.path(), "/");
        assert_eq!(req.query().get("x"), None);
    }
}
