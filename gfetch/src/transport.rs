//! Transport seam and the default reqwest implementation.

use async_trait::async_trait;

use crate::{Response, TransportConfig, TransportError, TransportRequest};

/// Single "send a request, get a response" primitive.
///
/// A transport returns every completed response as data, whatever its
/// status. Errors are reserved for requests that never produced a response.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute the request.
    async fn send(&self, request: TransportRequest) -> Result<Response, TransportError>;
}

/// Transport backed by a [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport from the given configuration.
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().user_agent(&config.user_agent);

        if config.gzip {
            builder = builder.gzip(true);
        }
        if config.brotli {
            builder = builder.brotli(true);
        }
        if config.follow_redirects {
            builder = builder.redirect(reqwest::redirect::Policy::limited(config.max_redirects));
        } else {
            builder = builder.redirect(reqwest::redirect::Policy::none());
        }

        Ok(Self {
            inner: builder.build()?,
        })
    }

    /// Wrap an existing reqwest client.
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    /// Get the underlying reqwest client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<Response, TransportError> {
        let url = url::Url::parse(&request.url)?;

        let mut builder = self
            .inner
            .request(request.method, url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        Response::from_reqwest(response).await
    }
}
