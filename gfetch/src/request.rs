//! Request description and encoding.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Header forced onto every request, after all caller-supplied headers.
pub const REQUESTED_WITH: (&str, &str) = ("X-Requested-With", "XMLHttpRequest");

/// Query data of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// Pre-encoded text appended to the URL unchanged.
    Raw(String),
    /// Key/value pairs encoded into a query string.
    Map(Vec<(String, Value)>),
}

impl Default for Params {
    fn default() -> Self {
        Self::Map(Vec::new())
    }
}

impl Params {
    /// Encode into the text appended after the route.
    ///
    /// `null` and empty-string values are dropped; `0` and `false` are kept.
    /// A key ending in `=`, `>`, `<` or `!` (optionally followed by
    /// whitespace) is written without an extra `=`, as is a value made of a
    /// comparison operator (`>`, `>=`, `<`, `<=`, `!=`) and an operand. An
    /// empty map encodes to an empty string.
    pub fn encode(&self) -> String {
        let pairs = match self {
            Self::Raw(raw) => return raw.clone(),
            Self::Map(pairs) => pairs,
        };

        let encoded: Vec<String> = pairs
            .iter()
            .filter_map(|(key, value)| encode_pair(key, value))
            .collect();

        if encoded.is_empty() {
            String::new()
        } else {
            format!("?{}", encoded.join("&"))
        }
    }

    fn push(&mut self, key: String, value: Value) {
        match self {
            Self::Map(pairs) => pairs.push((key, value)),
            Self::Raw(_) => *self = Self::Map(vec![(key, value)]),
        }
    }
}

impl From<&str> for Params {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_string())
    }
}

impl From<String> for Params {
    fn from(raw: String) -> Self {
        Self::Raw(raw)
    }
}

impl From<Value> for Params {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Map(map.into_iter().collect()),
            Value::String(raw) => Self::Raw(raw),
            Value::Null => Self::default(),
            other => Self::Raw(other.to_string()),
        }
    }
}

impl<K, V> From<Vec<(K, V)>> for Params
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(pairs: Vec<(K, V)>) -> Self {
        Self::Map(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Params
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        Self::Map(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn encode_pair(key: &str, value: &Value) -> Option<String> {
    let value = match value {
        Value::Null => return None,
        Value::String(s) if s.is_empty() => return None,
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    };

    let stem = key.trim_end();
    if stem.ends_with(is_operator) || stem.ends_with('=') {
        let op_start = stem
            .char_indices()
            .rev()
            .take_while(|(_, c)| is_operator(*c) || *c == '=')
            .last()
            .map(|(i, _)| i)
            .unwrap_or(stem.len());
        return Some(format!(
            "{}{}{}",
            escape(&stem[..op_start]),
            &stem[op_start..],
            escape(&value)
        ));
    }

    if let Some((op, operand)) = split_comparison(&value) {
        return Some(format!("{}{}{}", escape(key), op, escape(operand)));
    }

    Some(format!("{}={}", escape(key), escape(&value)))
}

/// Split a value such as `>21` or `!=bob` into its comparison operator and
/// operand. Anything else, e.g. `!urgent` or `<b>`, is plain data.
fn split_comparison(value: &str) -> Option<(&str, &str)> {
    let op = [">=", "<=", "!=", ">", "<"]
        .into_iter()
        .find(|op| value.starts_with(op))?;
    let operand = &value[op.len()..];
    if operand.is_empty() || operand.contains(|c: char| is_operator(c) || c == '=') {
        return None;
    }
    Some((op, operand))
}

fn is_operator(c: char) -> bool {
    matches!(c, '>' | '<' | '!')
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape(text: &str) -> String {
    url::form_urlencoded::byte_serialize(text.as_bytes()).collect()
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Structured or primitive value, encoded according to [`BodyType`].
    Value(Value),
    /// Text sent verbatim.
    Text(String),
    /// Bytes sent verbatim.
    Binary(Bytes),
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::Binary(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes.into())
    }
}

/// How a structured [`Body::Value`] is encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyType {
    /// Serialize objects and arrays as JSON with `Content-Type: application/json`.
    #[default]
    Json,
    /// Serialize objects as `application/x-www-form-urlencoded`.
    Form,
    /// Send the value's text without a content type.
    Raw,
}

/// Abstract parameters of one endpoint call.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub(crate) method: Method,
    pub(crate) route: Option<String>,
    pub(crate) params: Params,
    pub(crate) body: Option<Body>,
    pub(crate) body_type: BodyType,
    pub(crate) headers: Vec<(String, String)>,
}

impl RequestSpec {
    /// Create a spec for the given method.
    pub fn new(method: Method) -> Self {
        Self {
            method,
            route: None,
            params: Params::default(),
            body: None,
            body_type: BodyType::default(),
            headers: Vec::new(),
        }
    }

    /// Get the method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Set the route appended after the endpoint URL.
    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Replace the query data.
    pub fn params(mut self, params: impl Into<Params>) -> Self {
        self.params = params.into();
        self
    }

    /// Add a query parameter. Raw params are discarded.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.push(key.into(), value.into());
        self
    }

    /// Add a text query parameter.
    pub fn query(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.param(key, Value::String(value.into()))
    }

    /// Set the request body.
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the request body as text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.body = Some(Body::Text(text.into()));
        self.header(http::header::CONTENT_TYPE.as_str(), "text/plain; charset=utf-8")
    }

    /// Set the request body from any serializable value.
    pub fn json<T: Serialize>(mut self, json: &T) -> Self {
        match serde_json::to_value(json) {
            Ok(value) => {
                self.body = Some(Body::Value(value));
                self.body_type = BodyType::Json;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize JSON body");
            }
        }
        self
    }

    /// Set the body encoding.
    pub fn body_type(mut self, body_type: BodyType) -> Self {
        self.body_type = body_type;
        self
    }

    /// Add a call-local header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set bearer authentication for this call.
    pub fn bearer_auth(self, token: impl Into<String>) -> Self {
        self.header("Authorization", bearer_value(token))
    }

    /// Set basic authentication for this call.
    pub fn basic_auth(
        self,
        username: impl Into<String>,
        password: Option<impl Into<String>>,
    ) -> Self {
        self.header("Authorization", basic_value(username, password))
    }

    /// Assemble the transport request.
    ///
    /// Headers are layered: `client` first, then call-local headers, then the
    /// content type chosen by body encoding, then [`REQUESTED_WITH`].
    pub(crate) fn build(self, endpoint_url: &str, client: &HashMap<String, String>) -> TransportRequest {
        let mut headers = HeaderMap::new();
        for (name, value) in client {
            insert_header(&mut headers, name, value);
        }
        for (name, value) in &self.headers {
            insert_header(&mut headers, name, value);
        }

        let (body, content_type) = encode_body(self.body, self.body_type);
        if let Some(content_type) = content_type {
            headers.insert(http::header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        headers.insert(
            HeaderName::from_static("x-requested-with"),
            HeaderValue::from_static(REQUESTED_WITH.1),
        );

        let url = format!(
            "{}{}{}",
            endpoint_url,
            self.route.as_deref().unwrap_or_default(),
            self.params.encode()
        );

        TransportRequest {
            method: self.method,
            url,
            headers,
            body,
        }
    }
}

pub(crate) fn bearer_value(token: impl Into<String>) -> String {
    format!("Bearer {}", token.into())
}

pub(crate) fn basic_value(username: impl Into<String>, password: Option<impl Into<String>>) -> String {
    use base64::Engine;
    let credentials = match password {
        Some(p) => format!("{}:{}", username.into(), p.into()),
        None => format!("{}:", username.into()),
    };
    let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
    format!("Basic {}", encoded)
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) {
    match (
        HeaderName::try_from(name),
        HeaderValue::try_from(value),
    ) {
        (Ok(name), Ok(value)) => {
            headers.insert(name, value);
        }
        _ => {
            tracing::warn!(header = name, "Skipping invalid header");
        }
    }
}

fn encode_body(body: Option<Body>, body_type: BodyType) -> (Option<Bytes>, Option<&'static str>) {
    let value = match body {
        None => return (None, None),
        Some(Body::Text(text)) => return (Some(text.into()), None),
        Some(Body::Binary(bytes)) => return (Some(bytes), None),
        Some(Body::Value(value)) => value,
    };

    match value {
        Value::Null => (None, None),
        Value::String(text) => (Some(text.into()), None),
        Value::Object(_) | Value::Array(_) => match body_type {
            BodyType::Json => match serde_json::to_vec(&value) {
                Ok(bytes) => (Some(bytes.into()), Some("application/json")),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize JSON body");
                    (None, None)
                }
            },
            BodyType::Form => match serde_urlencoded::to_string(&value) {
                Ok(encoded) => (
                    Some(encoded.into()),
                    Some("application/x-www-form-urlencoded"),
                ),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode form data");
                    (None, None)
                }
            },
            BodyType::Raw => (Some(value.to_string().into()), None),
        },
        primitive => (Some(primitive.to_string().into()), None),
    }
}

/// Concrete request handed to a [`Transport`](crate::Transport).
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Fully resolved target URL including the query string.
    pub url: String,
    /// Effective headers.
    pub headers: HeaderMap,
    /// Encoded body.
    pub body: Option<Bytes>,
}

impl TransportRequest {
    /// Get a header value as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get the body as UTF-8 text.
    pub fn body_text(&self) -> Option<&str> {
        self.body.as_deref().and_then(|b| std::str::from_utf8(b).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://api.example.com/users/";

    fn build(spec: RequestSpec) -> TransportRequest {
        spec.build(URL, &HashMap::new())
    }

    #[test]
    fn test_query_drops_empty_and_keeps_operators() {
        let params = Params::from([
            ("status", json!("active")),
            ("age", json!(">21")),
            ("empty", json!("")),
        ]);
        let query = params.encode();
        assert!(query.contains("status=active&age>21"));
        assert!(!query.contains("empty"));
    }

    #[test]
    fn test_query_operator_suffixed_key() {
        let params = Params::from([("age>", json!(21)), ("name!=", json!("bob")), ("x<= ", json!(3))]);
        assert_eq!(params.encode(), "?age>21&name!=bob&x<=3");
    }

    #[test]
    fn test_query_operator_values() {
        let params = Params::from([
            ("age", json!(">21")),
            ("size", json!(">=5")),
            ("name", json!("!=bob")),
            ("note", json!("!urgent")),
            ("q", json!("<b>")),
            ("x", json!(">")),
        ]);
        assert_eq!(
            params.encode(),
            "?age>21&size>=5&name!=bob&note=%21urgent&q=%3Cb%3E&x=%3E"
        );
    }

    #[test]
    fn test_query_keeps_zero_and_false() {
        let params = Params::from([
            ("page", json!(0)),
            ("archived", json!(false)),
            ("owner", Value::Null),
        ]);
        assert_eq!(params.encode(), "?page=0&archived=false");
    }

    #[test]
    fn test_query_escapes_values() {
        let params = Params::from([("q", json!("a b&c")), ("tags", json!(["x", 1]))]);
        assert_eq!(params.encode(), "?q=a+b%26c&tags=x%2C1");
    }

    #[test]
    fn test_query_all_dropped_is_empty() {
        assert_eq!(Params::from([("a", json!(""))]).encode(), "");
        assert_eq!(Params::default().encode(), "");
    }

    #[test]
    fn test_raw_params_untouched() {
        assert_eq!(Params::from("?sort=name desc").encode(), "?sort=name desc");
        assert_eq!(Params::from(json!("?a=1")), Params::Raw("?a=1".to_string()));
    }

    #[test]
    fn test_url_assembly() {
        let req = build(RequestSpec::new(Method::GET).route("42").param("expand", "roles"));
        assert_eq!(req.url, "https://api.example.com/users/42?expand=roles");
        assert_eq!(req.method, Method::GET);
        assert!(req.body.is_none());
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let req = build(RequestSpec::new(Method::POST).body(json!({"name": "ada"})));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.body_text(), Some(r#"{"name":"ada"}"#));
    }

    #[test]
    fn test_primitive_body_passes_through() {
        let req = build(RequestSpec::new(Method::POST).body(json!(42)));
        assert_eq!(req.body_text(), Some("42"));
        assert!(req.header("content-type").is_none());

        let req = build(RequestSpec::new(Method::POST).body("hello"));
        assert_eq!(req.body_text(), Some("hello"));

        let req = build(RequestSpec::new(Method::POST).body(Value::Null));
        assert!(req.body.is_none());
    }

    #[test]
    fn test_form_and_raw_body_types() {
        let req = build(
            RequestSpec::new(Method::POST)
                .body(json!({"a": "1", "b": 2}))
                .body_type(BodyType::Form),
        );
        assert_eq!(req.header("content-type"), Some("application/x-www-form-urlencoded"));
        assert_eq!(req.body_text(), Some("a=1&b=2"));

        let req = build(
            RequestSpec::new(Method::PUT)
                .body(json!([1, 2]))
                .body_type(BodyType::Raw),
        );
        assert!(req.header("content-type").is_none());
        assert_eq!(req.body_text(), Some("[1,2]"));
    }

    #[test]
    fn test_header_layering() {
        let mut client = HashMap::new();
        client.insert("Authorization".to_string(), "Bearer global".to_string());
        client.insert("Accept".to_string(), "application/json".to_string());

        let req = RequestSpec::new(Method::GET)
            .header("authorization", "Bearer local")
            .header("X-Requested-With", "custom")
            .build(URL, &client);

        assert_eq!(req.header("Authorization"), Some("Bearer local"));
        assert_eq!(req.header("Accept"), Some("application/json"));
        assert_eq!(req.header("X-Requested-With"), Some("XMLHttpRequest"));
        assert_eq!(req.headers.get_all("x-requested-with").iter().count(), 1);
    }

    #[test]
    fn test_json_content_type_overrides_caller() {
        let req = build(
            RequestSpec::new(Method::POST)
                .header("Content-Type", "text/plain")
                .body(json!({"a": 1})),
        );
        assert_eq!(req.header("content-type"), Some("application/json"));
    }

    #[test]
    fn test_invalid_header_is_skipped() {
        let req = build(RequestSpec::new(Method::GET).header("bad header", "x"));
        assert_eq!(req.headers.len(), 1);
    }

    #[test]
    fn test_auth_helpers() {
        let req = build(RequestSpec::new(Method::GET).bearer_auth("t0k3n"));
        assert_eq!(req.header("authorization"), Some("Bearer t0k3n"));

        let req = build(RequestSpec::new(Method::GET).basic_auth("user", Some("pass")));
        assert_eq!(req.header("authorization"), Some("Basic dXNlcjpwYXNz"));
    }

    #[test]
    fn test_query_and_text_helpers() {
        let req = build(
            RequestSpec::new(Method::POST)
                .query("lang", "en")
                .query("tag", "a b")
                .text("hello"),
        );
        assert_eq!(req.url, "https://api.example.com/users/?lang=en&tag=a+b");
        assert_eq!(req.body_text(), Some("hello"));
        assert_eq!(req.header("content-type"), Some("text/plain; charset=utf-8"));
    }

    #[test]
    fn test_json_helper_serializes_structs() {
        #[derive(Serialize)]
        struct NewUser<'a> {
            name: &'a str,
        }

        let req = build(RequestSpec::new(Method::POST).json(&NewUser { name: "ada" }));
        assert_eq!(req.body_text(), Some(r#"{"name":"ada"}"#));
    }
}
