//! Endpoints and their verb surface.

use http::Method;
use serde::Serialize;
use serde_json::Value;
use std::sync::Weak;
use tracing::debug;

use crate::client::ClientInner;
use crate::notify::{self, LifecycleEvent, LifecycleStatus};
use crate::{Body, BodyType, Params, RequestError, RequestSpec, Response, TransportError};

/// A resource path under a client's base URL.
///
/// Endpoints are created by [`Client::register_endpoints`](crate::Client::register_endpoints)
/// and hold a weak reference back to their client, from which they read the
/// current headers, notifier and transport on every call.
#[derive(Debug)]
pub struct Endpoint {
    name: String,
    url: String,
    client: Weak<ClientInner>,
}

impl Endpoint {
    pub(crate) fn new(name: &str, base_url: &str, client: Weak<ClientInner>) -> Self {
        Self {
            name: name.to_string(),
            url: format!("{}{}/", base_url, name),
            client,
        }
    }

    /// Raw name the endpoint was registered with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved URL: base URL, name and a trailing `/`.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Create a GET request builder.
    pub fn get(&self) -> EndpointRequest<'_> {
        self.request(Method::GET)
    }

    /// Create a POST request builder.
    pub fn post(&self) -> EndpointRequest<'_> {
        self.request(Method::POST)
    }

    /// Create a PUT request builder.
    pub fn put(&self) -> EndpointRequest<'_> {
        self.request(Method::PUT)
    }

    /// Create a PATCH request builder.
    pub fn patch(&self) -> EndpointRequest<'_> {
        self.request(Method::PATCH)
    }

    /// Create a DELETE request builder.
    pub fn delete(&self) -> EndpointRequest<'_> {
        self.request(Method::DELETE)
    }

    /// Create a HEAD request builder.
    pub fn head(&self) -> EndpointRequest<'_> {
        self.request(Method::HEAD)
    }

    /// Create a request builder with a custom method.
    pub fn request(&self, method: Method) -> EndpointRequest<'_> {
        EndpointRequest {
            endpoint: self,
            spec: RequestSpec::new(method),
        }
    }

    /// Issue a request described by `spec`.
    ///
    /// Emits `Pending` before sending and `Succeeded` or `Failed` once the
    /// outcome is known. Non-success responses and transport failures are
    /// returned as [`RequestError`]. On success the body is parsed into
    /// [`Response::data`].
    ///
    /// Client headers are read when the call starts; a concurrent header
    /// change may or may not be seen by a call already in progress.
    pub async fn call(&self, spec: RequestSpec) -> Result<Response, RequestError> {
        let Some(client) = self.client.upgrade() else {
            return Err(TransportError::ClientDropped.into());
        };
        let method = spec.method.clone();

        self.emit(&client, &method, LifecycleStatus::Pending);

        let request = spec.build(&self.url, &client.headers.snapshot());
        debug!(
            endpoint = %self.name,
            method = %method,
            url = %request.url,
            "Sending request"
        );

        match client.transport.send(request).await {
            Err(e) => {
                debug!(endpoint = %self.name, error = %e, "Transport failure");
                let err = RequestError::from(e);
                self.emit(&client, &method, LifecycleStatus::Failed(err.status()));
                Err(err)
            }
            Ok(response) if !response.ok() => {
                let status = response.status().as_u16();
                debug!(endpoint = %self.name, status, "Request returned error status");
                self.emit(&client, &method, LifecycleStatus::Failed(status));
                Err(RequestError::from_response(response))
            }
            Ok(response) => {
                let status = response.status().as_u16();
                self.emit(&client, &method, LifecycleStatus::Succeeded(status));
                Ok(response.parse_data())
            }
        }
    }

    fn emit(&self, client: &ClientInner, method: &Method, status: LifecycleStatus) {
        if let Some(notifier) = &client.notifier {
            notify::dispatch(
                notifier.as_ref(),
                LifecycleEvent {
                    endpoint: self.name.clone(),
                    method: method.clone(),
                    status,
                },
            );
        }
    }
}

/// Request builder bound to an [`Endpoint`].
#[derive(Debug)]
pub struct EndpointRequest<'a> {
    endpoint: &'a Endpoint,
    spec: RequestSpec,
}

impl EndpointRequest<'_> {
    /// Set the route appended after the endpoint URL.
    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.spec = self.spec.route(route);
        self
    }

    /// Replace the query data.
    pub fn params(mut self, params: impl Into<Params>) -> Self {
        self.spec = self.spec.params(params);
        self
    }

    /// Add a query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.spec = self.spec.param(key, value);
        self
    }

    /// Add a text query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec = self.spec.query(key, value);
        self
    }

    /// Set the request body.
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.spec = self.spec.body(body);
        self
    }

    /// Set the request body as text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.spec = self.spec.text(text);
        self
    }

    /// Set the request body from any serializable value.
    pub fn json<T: Serialize>(mut self, json: &T) -> Self {
        self.spec = self.spec.json(json);
        self
    }

    /// Set the body encoding.
    pub fn body_type(mut self, body_type: BodyType) -> Self {
        self.spec = self.spec.body_type(body_type);
        self
    }

    /// Add a call-local header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec = self.spec.header(name, value);
        self
    }

    /// Set bearer authentication for this call.
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.spec = self.spec.bearer_auth(token);
        self
    }

    /// Set basic authentication for this call.
    pub fn basic_auth(
        mut self,
        username: impl Into<String>,
        password: Option<impl Into<String>>,
    ) -> Self {
        self.spec = self.spec.basic_auth(username, password);
        self
    }

    /// Get the spec built so far.
    pub fn spec(&self) -> &RequestSpec {
        &self.spec
    }

    /// Send the request.
    pub async fn send(self) -> Result<Response, RequestError> {
        self.endpoint.call(self.spec).await
    }
}
