//! Inbound request envelope and its canonical form
//!
//! The gateway receives a serialized description of a web request with
//! string-encoded body and list-valued headers. [`Request::from_wire`]
//! turns it into the canonical, immutable [`Request`] every strategy sees.
//!
//! ## Translation rules
//!
//! - `body` is parsed as JSON; an empty or unparsable body becomes `{}`
//! - header names are lower-cased, and names that collide after
//!   lower-casing are merged in sorted order
//! - a single-element header list collapses to a scalar string
//! - an empty header list is dropped
//! - `method` must be an HTTP token and is upper-cased
//! - `url` must be a path (optionally with query), never a full URL
//!
//! All maps are ordered, so translating the same envelope twice yields
//! identical values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{CoreError, Result};

/// Header values as they appear on the wire
///
/// Accepts both a bare list (`["a", "b"]`) and the repeated-value message
/// form (`{"value": ["a", "b"]}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireHeaderValues {
    /// Bare list of values
    List(Vec<String>),
    /// Repeated-value message
    Repeated { value: Vec<String> },
}

impl WireHeaderValues {
    /// The raw values, in wire order
    pub fn values(&self) -> &[String] {
        match self {
            WireHeaderValues::List(values) => values,
            WireHeaderValues::Repeated { value } => value,
        }
    }
}

impl From<Vec<String>> for WireHeaderValues {
    fn from(values: Vec<String>) -> Self {
        WireHeaderValues::List(values)
    }
}

/// Wire request envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRequest {
    /// JSON-encoded body
    #[serde(default)]
    pub body: String,

    /// Header name to list of values
    #[serde(default)]
    pub headers: BTreeMap<String, WireHeaderValues>,

    /// HTTP method, e.g. GET
    pub method: String,

    /// Query string parameters
    #[serde(default)]
    pub query: BTreeMap<String, String>,

    /// Path and query, without scheme or host
    pub url: String,

    /// Route parameters extracted by the caller
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl WireRequest {
    /// Create an envelope with an empty body, headers and query
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            body: String::new(),
            headers: BTreeMap::new(),
            method: method.into(),
            query: BTreeMap::new(),
            url: url.into(),
            params: BTreeMap::new(),
        }
    }

    /// Set the raw body
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Add a header with one or more values
    pub fn with_header<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect::<Vec<_>>();
        self.headers.insert(name.into(), values.into());
        self
    }

    /// Add a query parameter
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a route parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Canonical header value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    /// Header sent once
    Single(String),
    /// Header sent more than once, in order
    Multiple(Vec<String>),
}

impl HeaderValue {
    /// Collapse a value list. Returns `None` for an empty list.
    pub fn from_values(mut values: Vec<String>) -> Option<Self> {
        match values.len() {
            0 => None,
            1 => values.pop().map(HeaderValue::Single),
            _ => Some(HeaderValue::Multiple(values)),
        }
    }

    /// The scalar value, if the header was sent once
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::Single(value) => Some(value),
            HeaderValue::Multiple(_) => None,
        }
    }

    /// First value, whichever shape the header has
    pub fn first(&self) -> &str {
        match self {
            HeaderValue::Single(value) => value,
            HeaderValue::Multiple(values) => values.first().map(String::as_str).unwrap_or(""),
        }
    }

    /// All values in order
    pub fn values(&self) -> Vec<&str> {
        match self {
            HeaderValue::Single(value) => vec![value.as_str()],
            HeaderValue::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// Canonical inbound request
///
/// Immutable once built. Strategies read it through the accessors below.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    method: String,
    url: String,
    headers: BTreeMap<String, HeaderValue>,
    query: BTreeMap<String, String>,
    body: Value,
    params: BTreeMap<String, String>,
}

impl Request {
    /// Translate a wire envelope into a canonical request
    ///
    /// Never fails because of the body. Fails with
    /// [`CoreError::InvalidRequest`] when `method`, `url` or a header name
    /// is malformed.
    pub fn from_wire(wire: &WireRequest) -> Result<Self> {
        let method = normalize_method(&wire.method)?;
        validate_url(&wire.url)?;

        Ok(Self {
            method,
            url: wire.url.clone(),
            headers: normalize_headers(&wire.headers)?,
            query: wire.query.clone(),
            body: parse_body(&wire.body),
            params: wire.params.clone(),
        })
    }

    /// Upper-cased HTTP method
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Path and query
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Path without the query string
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }

    /// All headers, keyed by lower-cased name
    pub fn headers(&self) -> &BTreeMap<String, HeaderValue> {
        &self.headers
    }

    /// Look up a header by name, case-insensitively
    ///
    /// `referer` and `referrer` are aliases: either name returns whichever
    /// of the two is present, checking `referrer` first.
    pub fn header(&self, name: &str) -> Result<Option<&HeaderValue>> {
        if name.is_empty() {
            return Err(CoreError::InvalidArgument(
                "header name must be a non-empty string".into(),
            ));
        }

        let name = name.to_ascii_lowercase();
        let value = match name.as_str() {
            "referer" | "referrer" => self
                .headers
                .get("referrer")
                .or_else(|| self.headers.get("referer")),
            _ => self.headers.get(&name),
        };

        Ok(value)
    }

    /// First value of a header, if present
    pub fn header_first(&self, name: &str) -> Result<Option<&str>> {
        Ok(self.header(name)?.map(HeaderValue::first))
    }

    /// Single query parameter
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Route parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Parsed body
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// String field of an object body
    pub fn body_field(&self, name: &str) -> Option<&str> {
        self.body.get(name).and_then(Value::as_str)
    }
}

fn parse_body(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(Map::new());
    }

    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Unparsable request body, substituting empty object");
            Value::Object(Map::new())
        }
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

fn normalize_method(method: &str) -> Result<String> {
    if method.is_empty() {
        return Err(CoreError::InvalidRequest("method cannot be empty".into()));
    }

    if !method.chars().all(is_token_char) {
        return Err(CoreError::InvalidRequest(format!(
            "method is not a valid HTTP token: {:?}",
            method
        )));
    }

    Ok(method.to_ascii_uppercase())
}

fn validate_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(CoreError::InvalidRequest("url cannot be empty".into()));
    }

    if url.contains("://") || !url.starts_with('/') {
        return Err(CoreError::InvalidRequest(format!(
            "url must be a path without scheme or host: {:?}",
            url
        )));
    }

    if url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(CoreError::InvalidRequest(
            "url contains whitespace or control characters".into(),
        ));
    }

    Ok(())
}

fn normalize_headers(
    wire: &BTreeMap<String, WireHeaderValues>,
) -> Result<BTreeMap<String, HeaderValue>> {
    let mut merged: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (name, values) in wire {
        if name.is_empty() {
            return Err(CoreError::InvalidRequest("header name cannot be empty".into()));
        }

        merged
            .entry(name.to_ascii_lowercase())
            .or_default()
            .extend(values.values().iter().cloned());
    }

    Ok(merged
        .into_iter()
        .filter_map(|(name, values)| HeaderValue::from_values(values).map(|v| (name, v)))
        .collect())
}
