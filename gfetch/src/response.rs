//! HTTP response wrapper and body normalization.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::TransportError;

/// Parsed response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    /// Body parsed as JSON.
    Json(Value),
    /// Body that was not JSON but was valid UTF-8.
    Text(String),
}

impl ResponseData {
    /// Get the JSON value if the body parsed as JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// Get the text if the body was not JSON.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Json(_) => None,
            Self::Text(text) => Some(text),
        }
    }
}

/// HTTP response with a fully buffered body.
///
/// The body is held as [`Bytes`] so it can be read any number of times.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    status_text: String,
    headers: HeaderMap,
    body: Bytes,
    url: Option<url::Url>,
    data: Option<ResponseData>,
}

impl Response {
    /// Create a response with the canonical status text for `status`.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers: HeaderMap::new(),
            body: body.into(),
            url: None,
            data: None,
        }
    }

    /// Create a response from a reqwest response, buffering the body.
    ///
    /// A body that cannot be read to the end is a transport failure.
    pub(crate) async fn from_reqwest(response: reqwest::Response) -> Result<Self, TransportError> {
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response.bytes().await?;

        Ok(Self::new(status, body).with_headers(headers).with_url(url))
    }

    /// Override the status text.
    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    /// Replace the response headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set the URL the response was served from.
    pub fn with_url(mut self, url: url::Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Check if the status is in the 2xx range.
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the status text.
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Get the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a specific header value.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// Get the content type if available.
    pub fn content_type(&self) -> Option<&str> {
        self.header(http::header::CONTENT_TYPE.as_str())
    }

    /// Get the response URL if the transport reported one.
    pub fn url(&self) -> Option<&url::Url> {
        self.url.as_ref()
    }

    /// Get the raw response body.
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Read the body as UTF-8 text.
    pub fn text(&self) -> std::result::Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }

    /// Parsed body attached after a successful call.
    pub fn data(&self) -> Option<&ResponseData> {
        self.data.as_ref()
    }

    /// Consume the response and return the parsed body.
    pub fn into_data(self) -> Option<ResponseData> {
        self.data
    }

    /// Parse the body and attach it as [`data`](Self::data).
    ///
    /// JSON is tried first, then UTF-8 text. When neither succeeds `data`
    /// stays absent; parse failures are never reported.
    pub(crate) fn parse_data(mut self) -> Self {
        self.data = parse_body(&self.body);
        self
    }
}

fn parse_body(body: &Bytes) -> Option<ResponseData> {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        return Some(ResponseData::Json(value));
    }
    match std::str::from_utf8(body) {
        Ok(text) => Some(ResponseData::Text(text.to_string())),
        Err(e) => {
            tracing::debug!(error = %e, "Response body is neither JSON nor text");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_json_body() {
        let response = Response::new(StatusCode::OK, r#"{"id":1}"#).parse_data();
        assert_eq!(
            response.data(),
            Some(&ResponseData::Json(json!({"id": 1})))
        );
    }

    #[test]
    fn test_parse_falls_back_to_text() {
        let response = Response::new(StatusCode::OK, "plain").parse_data();
        assert_eq!(response.data().and_then(ResponseData::as_text), Some("plain"));
    }

    #[test]
    fn test_parse_binary_leaves_data_absent() {
        let response = Response::new(StatusCode::OK, vec![0xff, 0xfe, 0x00]).parse_data();
        assert!(response.data().is_none());
        assert_eq!(response.bytes().len(), 3);
    }

    #[test]
    fn test_empty_body_is_empty_text() {
        let response = Response::new(StatusCode::NO_CONTENT, "").parse_data();
        assert_eq!(response.data().and_then(ResponseData::as_text), Some(""));
    }

    #[test]
    fn test_status_text_and_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        let response = Response::new(StatusCode::CREATED, "{}").with_headers(headers);
        assert!(response.ok());
        assert_eq!(response.status_text(), "Created");
        assert_eq!(response.content_type(), Some("application/json"));

        let response = Response::new(StatusCode::IM_A_TEAPOT, "").with_status_text("Short");
        assert!(!response.ok());
        assert_eq!(response.status_text(), "Short");
    }

    #[test]
    fn test_body_can_be_read_repeatedly() {
        #[derive(serde::Deserialize)]
        struct User {
            name: String,
        }

        let response = Response::new(StatusCode::OK, r#"{"name":"ada"}"#);
        let user: User = response.json().unwrap();
        assert_eq!(user.name, "ada");
        assert_eq!(response.text().unwrap(), r#"{"name":"ada"}"#);
    }
}
