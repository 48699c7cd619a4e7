//! Client implementation.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::request::{basic_value, bearer_value};
use crate::{
    ClientConfig, Endpoint, EndpointRegistry, Error, HeaderStore, Notifier, ReqwestTransport,
    Result, Transport, TransportConfig,
};

pub(crate) struct ClientInner {
    pub(crate) base_url: String,
    pub(crate) headers: HeaderStore,
    pub(crate) registry: RwLock<EndpointRegistry>,
    pub(crate) notifier: Option<Arc<dyn Notifier>>,
    pub(crate) transport: Arc<dyn Transport>,
}

/// Entry point holding the base URL, shared headers, registered endpoints
/// and the optional notifier.
///
/// Cloning is cheap and every clone shares the same state.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Create a client for `base_url` using the default reqwest transport.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::builder(base_url).build()
    }

    /// Create a client from a configuration.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        ClientBuilder::from_config(config).build()
    }

    /// Create a client builder.
    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::from_config(ClientConfig::new(base_url))
    }

    /// Normalized base URL, always ending in exactly one `/`.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Copy of the current client headers.
    pub fn headers(&self) -> HashMap<String, String> {
        self.inner.headers.snapshot()
    }

    /// Merge a header patch: `Some` sets or overwrites, `None` deletes.
    pub fn merge_headers<I, K, V>(&self, patch: I) -> &Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.headers.merge(patch);
        self
    }

    /// Set a single client header.
    pub fn set_header(&self, name: impl Into<String>, value: impl Into<String>) -> &Self {
        self.inner.headers.set(name, value);
        self
    }

    /// Remove a single client header.
    pub fn remove_header(&self, name: &str) -> &Self {
        self.inner.headers.remove(name);
        self
    }

    /// Send bearer authentication with every request.
    pub fn bearer_auth(&self, token: impl Into<String>) -> &Self {
        self.set_header("Authorization", bearer_value(token))
    }

    /// Send basic authentication with every request.
    pub fn basic_auth(
        &self,
        username: impl Into<String>,
        password: Option<impl Into<String>>,
    ) -> &Self {
        self.set_header("Authorization", basic_value(username, password))
    }

    /// Registered endpoint names in first-registration order.
    pub fn endpoints(&self) -> Vec<String> {
        self.inner.registry.read().names().to_vec()
    }

    /// Register endpoints by raw name.
    ///
    /// Already registered names are skipped. When two names share an
    /// accessor identifier the first registration keeps it.
    pub fn register_endpoints<I, S>(&self, names: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = self.inner.registry.write();
        for name in names {
            let name = name.as_ref();
            let added = registry.register(name, || {
                Endpoint::new(name, &self.inner.base_url, Arc::downgrade(&self.inner))
            });
            if added {
                debug!(endpoint = name, "Registered endpoint");
            }
        }
        self
    }

    /// Look up an endpoint by accessor identifier, e.g. `userProfiles` for
    /// `user-profiles`.
    pub fn endpoint(&self, ident: &str) -> Option<Arc<Endpoint>> {
        self.inner.registry.read().get(ident)
    }

    /// Look up an endpoint by its exact raw name.
    pub fn endpoint_named(&self, name: &str) -> Option<Arc<Endpoint>> {
        self.inner.registry.read().named(name)
    }

    /// Check if a notifier is installed.
    pub fn has_notifier(&self) -> bool {
        self.inner.notifier.is_some()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url)
            .field("headers", &self.inner.headers)
            .field("endpoints", &self.inner.registry.read().names())
            .field("notifier", &self.inner.notifier.is_some())
            .finish()
    }
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    config: ClientConfig,
    notifier: Option<Arc<dyn Notifier>>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Start from an existing configuration.
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            notifier: None,
            transport: None,
        }
    }

    /// Add a default header.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.push((name.into(), value.into()));
        self
    }

    /// Register an endpoint at construction.
    pub fn endpoint(mut self, name: impl Into<String>) -> Self {
        self.config.endpoints.push(name.into());
        self
    }

    /// Set the default transport settings. Ignored when a custom transport
    /// is supplied.
    pub fn transport_config(mut self, transport: TransportConfig) -> Self {
        self.config.transport = transport;
        self
    }

    /// Install the lifecycle notifier.
    pub fn notifier<N: Notifier + 'static>(mut self, notifier: N) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    /// Use a custom transport instead of reqwest.
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Use a shared transport instead of reqwest.
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client.
    ///
    /// Fails when the base URL is empty or not an absolute URL with a host,
    /// or when the default transport cannot be built.
    pub fn build(self) -> Result<Client> {
        let base_url = normalize_base_url(&self.config.base_url)?;
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&self.config.transport)?),
        };

        let headers = HeaderStore::new();
        headers.merge(
            self.config
                .default_headers
                .into_iter()
                .map(|(name, value)| (name, Some(value))),
        );

        let client = Client {
            inner: Arc::new(ClientInner {
                base_url,
                headers,
                registry: RwLock::new(EndpointRegistry::new()),
                notifier: self.notifier,
                transport,
            }),
        };
        client.register_endpoints(&self.config.endpoints);
        Ok(client)
    }
}

fn normalize_base_url(url: &str) -> Result<String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(Error::InvalidArgument("base URL is empty".to_string()));
    }

    let parsed = url::Url::parse(url)?;
    if parsed.cannot_be_a_base() || !parsed.has_host() {
        return Err(Error::InvalidArgument(format!(
            "base URL must be absolute: {}",
            url
        )));
    }

    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(Error::InvalidArgument(format!(
            "base URL must not have a query or fragment: {}",
            url
        )));
    }

    Ok(format!("{}/", url.trim_end_matches('/')))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalization() {
        assert_eq!(
            normalize_base_url("https://api.example.com").unwrap(),
            "https://api.example.com/"
        );
        assert_eq!(
            normalize_base_url("https://api.example.com/v1///").unwrap(),
            "https://api.example.com/v1/"
        );
    }

    #[test]
    fn test_base_url_validation() {
        assert!(matches!(
            normalize_base_url(""),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            normalize_base_url("api.example.com"),
            Err(Error::InvalidUrl(_))
        ));
        assert!(matches!(
            normalize_base_url("mailto:ops@example.com"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            normalize_base_url("https://api.example.com/api?x=1"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            normalize_base_url("https://api.example.com/api#top"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_client_creation() {
        let client = Client::new("https://api.example.com/").unwrap();
        assert_eq!(client.base_url(), "https://api.example.com/");
        assert!(client.headers().is_empty());
        assert!(client.endpoints().is_empty());
        assert!(!client.has_notifier());
    }

    #[test]
    fn test_client_with_config() {
        let config = ClientConfig::builder("https://api.example.com")
            .default_header("Accept", "application/json")
            .endpoint("users")
            .build();

        let client = Client::with_config(config).unwrap();
        assert_eq!(
            client.headers().get("Accept").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(client.endpoints(), vec!["users"]);
        assert_eq!(
            client.endpoint("users").unwrap().url(),
            "https://api.example.com/users/"
        );
    }

    #[test]
    fn test_auth_headers() {
        let client = Client::new("https://api.example.com").unwrap();
        client.bearer_auth("abc");
        assert_eq!(
            client.headers().get("Authorization").map(String::as_str),
            Some("Bearer abc")
        );

        client.basic_auth("user", None::<String>);
        assert_eq!(
            client.headers().get("Authorization").map(String::as_str),
            Some("Basic dXNlcjo=")
        );

        client.remove_header("Authorization");
        assert!(client.headers().is_empty());
    }

    #[test]
    fn test_chaining() {
        let client = Client::new("https://api.example.com").unwrap();
        client
            .merge_headers([("X-Tenant", Some("acme"))])
            .register_endpoints(["users", "orders"]);

        assert_eq!(client.endpoints(), vec!["users", "orders"]);
        assert_eq!(client.headers().len(), 1);
    }
}
