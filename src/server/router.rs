//! Route matching.
//!
//! A pattern is compiled once, then matched against each request's path.
//! `/:name` segments in a pattern capture named path parameters
//! ([`PathParamMatcher`]); any other pattern is compiled as a full-path
//! regular expression ([`RegexMatcher`]), anchored with `^...$` for
//! whole-string semantics.

use std::collections::HashMap;

use regex::Regex;

use super::request::Request;

/// The outcome of a successful match: named captures, positional regex
/// captures, or both empty for a matcher that doesn't produce either.
#[derive(Debug, Default)]
pub struct RouteMatch {
    pub path_params: HashMap<String, String>,
    pub captures: Vec<Option<String>>,
}

pub trait Matcher: Send + Sync {
    fn pattern(&self) -> &str;
    fn try_match(&self, path: &str) -> Option<RouteMatch>;
}

/// Captures named segments in a route pattern like
/// `/users/:id/subscriptions/:sub_id`.
///
/// The pattern is split on every `/:` marker into static fragments and
/// parameter names; matching walks the path comparing each static fragment
/// and then capturing up to the next `/` for the parameter that follows
/// it. A pattern with a trailing static fragment after the last param
/// (`/users/:id/subscriptions`) is handled the same way: that tail has no
/// corresponding parameter, it's just matched literally.
pub struct PathParamMatcher {
    pattern: String,
    static_fragments: Vec<String>,
    param_names: Vec<String>,
}

impl PathParamMatcher {
    pub fn new(pattern: &str) -> Self {
        const MARKER: &str = "/:";
        const SEPARATOR: char = '/';

        let mut static_fragments = Vec::new();
        let mut param_names: Vec<String> = Vec::new();
        let mut seen = std::collections::HashSet::new();

        let mut last_param_end = 0usize;
        loop {
            let search_from = if last_param_end == 0 { 0 } else { last_param_end - 1 };
            let Some(marker_rel) = pattern[search_from..].find(MARKER) else {
                break;
            };
            let marker_pos = search_from + marker_rel;

            static_fragments.push(pattern[last_param_end..=marker_pos].to_string());

            let name_start = marker_pos + MARKER.len();
            let sep_pos = pattern[name_start..]
                .find(SEPARATOR)
                .map(|p| name_start + p)
                .unwrap_or(pattern.len());

            let name = pattern[name_start..sep_pos].to_string();
            if !seen.insert(name.clone()) {
                tracing::warn!(pattern, param = %name, "duplicate path parameter name in route pattern");
            }
            param_names.push(name);

            last_param_end = sep_pos + 1;
        }

        if last_param_end < pattern.len() {
            static_fragments.push(pattern[last_param_end..].to_string());
        }

        PathParamMatcher { pattern: pattern.to_string(), static_fragments, param_names }
    }
}

impl Matcher for PathParamMatcher {
    fn pattern(&self) -> &str {
        &self.pattern
    }

    fn try_match(&self, path: &str) -> Option<RouteMatch> {
        let mut path_params = HashMap::with_capacity(self.param_names.len());
        let mut starting_pos = 0usize;

        for (i, fragment) in self.static_fragments.iter().enumerate() {
            if starting_pos + fragment.len() > path.len() {
                return None;
            }
            if &path[starting_pos..starting_pos + fragment.len()] != fragment {
                return None;
            }
            starting_pos += fragment.len();

            let Some(name) = self.param_names.get(i) else {
                continue;
            };

            let sep_pos = path[starting_pos..]
                .find('/')
                .map(|p| starting_pos + p)
                .unwrap_or(path.len());
            path_params.insert(name.clone(), path[starting_pos..sep_pos].to_string());
            starting_pos = sep_pos + 1;
        }

        if starting_pos >= path.len() {
            Some(RouteMatch { path_params, captures: Vec::new() })
        } else {
            None
        }
    }
}

/// Matches a pattern as a regular expression against the whole path, so a
/// wildcard like `/begin/(.*)/end` can span multiple segments.
pub struct RegexMatcher {
    pattern: String,
    regex: Regex,
}

impl RegexMatcher {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let anchored = format!("^{pattern}$");
        Ok(RegexMatcher { pattern: pattern.to_string(), regex: Regex::new(&anchored)? })
    }
}

impl Matcher for RegexMatcher {
    fn pattern(&self) -> &str {
        &self.pattern
    }

    fn try_match(&self, path: &str) -> Option<RouteMatch> {
        let captures = self.regex.captures(path)?;
        let captures = captures
            .iter()
            .map(|m| m.map(|m| m.as_str().to_string()))
            .collect();
        Some(RouteMatch { path_params: HashMap::new(), captures })
    }
}

/// Picks [`PathParamMatcher`] for patterns containing `/:`, [`RegexMatcher`]
/// otherwise.
pub fn make_matcher(pattern: &str) -> Result<Box<dyn Matcher>, regex::Error> {
    if pattern.contains("/:") {
        Ok(Box::new(PathParamMatcher::new(pattern)))
    } else {
        Ok(Box::new(RegexMatcher::new(pattern)?))
    }
}

pub(crate) fn matches_path(matcher: &dyn Matcher, request: &mut Request) -> bool {
    match matcher.try_match(&request.path) {
        Some(RouteMatch { path_params, captures }) => {
            request.path_params = path_params;
            request.captures = captures;
            true
        }
        None => false,
    }
}
