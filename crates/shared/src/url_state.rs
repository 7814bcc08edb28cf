//! URL model shared by pages, navigation services and the page state controller.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::{form_urlencoded, Url};

const SCRATCH_BASE: &str = "http://localhost/";

/// Ordered query parameters. A `None` value marks a parameter that was cleared
/// and must not appear in a rendered query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParameters(Vec<(String, Option<String>)>);

impl QueryParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a raw `application/x-www-form-urlencoded` query, with or without
    /// the leading `?`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let mut params = Self::new();
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            params.insert(key.into_owned(), Some(value.into_owned()));
        }
        params
    }

    pub fn with(mut self, key: impl Into<String>, value: Option<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key`, keeping the position of an existing entry.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Looks up a parameter value. Keys match case-insensitively, the way
    /// browser routers bind query parameters.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(key))
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_values(&self) -> bool {
        self.0.iter().any(|(_, value)| value.is_some())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_deref()))
    }

    /// Encodes the parameters that carry a value. Returns `None` when nothing
    /// would be rendered.
    pub fn to_query_string(&self) -> Option<String> {
        if !self.has_values() {
            return None;
        }

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.0 {
            if let Some(value) = value {
                serializer.append_pair(key, value);
            }
        }
        Some(serializer.finish())
    }
}

/// Where a page wants the browser to be: a relative path plus optional query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlState {
    pub path: String,
    pub query_parameters: Option<QueryParameters>,
}

impl UrlState {
    pub fn new(path: impl Into<String>, query_parameters: Option<QueryParameters>) -> Self {
        Self {
            path: path.into(),
            query_parameters,
        }
    }

    pub fn path_only(path: impl Into<String>) -> Self {
        Self::new(path, None)
    }

    /// The path exactly as the page produced it, followed by the query string
    /// when one would be rendered.
    pub fn to_relative_url(&self) -> String {
        append_query(self.path.clone(), self.query_parameters.as_ref())
    }

    /// The app-rooted URL: a single leading `/`, then path and query.
    pub fn to_rooted_url(&self) -> String {
        let rooted = format!("/{}", self.path.trim_start_matches('/'));
        append_query(rooted, self.query_parameters.as_ref())
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_relative_url())
    }
}

fn append_query(mut url: String, query: Option<&QueryParameters>) -> String {
    if let Some(query) = query.and_then(QueryParameters::to_query_string) {
        url.push('?');
        url.push_str(&query);
    }
    url
}

/// A concrete location inside the app: path relative to the app root (no
/// leading `/`) and the decoded query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: QueryParameters,
}

impl Location {
    /// Parses an app-relative (`/metrics?x=1`, `metrics`) or absolute
    /// (`http://host/metrics`) URL. Fragments are dropped.
    pub fn parse(raw: &str) -> Self {
        if raw.contains("://") {
            if let Ok(url) = Url::parse(raw) {
                return Self {
                    path: url.path().trim_start_matches('/').to_string(),
                    query: url.query().map(QueryParameters::parse).unwrap_or_default(),
                };
            }
        }

        let without_fragment = raw.split('#').next().unwrap_or_default();
        let (path, query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, QueryParameters::parse(query)),
            None => (without_fragment, QueryParameters::new()),
        };

        Self {
            path: path.trim_start_matches('/').to_string(),
            query,
        }
    }

    /// Decoded, non-empty path segments.
    pub fn path_segments(&self) -> Vec<String> {
        self.path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(decode_path_segment)
            .collect()
    }

    pub fn to_url(&self) -> String {
        append_query(format!("/{}", self.path), Some(&self.query))
    }
}

/// Bare-path equality: a leading `/` on either side is ignored, everything
/// else (including case) must match.
pub fn paths_match(left: &str, right: &str) -> bool {
    left.trim_start_matches('/') == right.trim_start_matches('/')
}

/// Percent-encodes one path segment (`/`, spaces, `?` and `#` included).
///
/// `.` and `..` are escaped as well; left bare, URL normalization would treat
/// them as dot-segments and drop them from the path.
pub fn encode_path_segment(segment: &str) -> String {
    match segment {
        "." => return "%2E".to_string(),
        ".." => return "%2E%2E".to_string(),
        _ => {}
    }
    let Ok(mut scratch) = Url::parse(SCRATCH_BASE) else {
        return segment.to_string();
    };
    if let Ok(mut segments) = scratch.path_segments_mut() {
        segments.clear().push(segment);
    }
    scratch.path().trim_start_matches('/').to_string()
}

/// Reverses [`encode_path_segment`]. A literal `+` stays a `+`.
pub fn decode_path_segment(segment: &str) -> String {
    let escaped = segment
        .replace('+', "%2B")
        .replace('&', "%26")
        .replace('=', "%3D");
    form_urlencoded::parse(escaped.as_bytes())
        .next()
        .map(|(decoded, _)| decoded.into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "tests/url_state_tests.rs"]
mod tests;
