//! # gfetch
//!
//! A declarative REST client: give it a base URL and a set of endpoint
//! names, and it hands back endpoints that issue requests with consistent
//! header injection, query encoding, JSON bodies, response normalization and
//! lifecycle notifications.
//!
//! ## Features
//!
//! - **Shared Headers**: Client-wide headers merged with per-call headers
//! - **Endpoint Registry**: Deduplicated endpoints with camelCase accessors
//! - **Query Encoding**: Operator-aware query strings (`age>21`, `name!=bob`)
//! - **JSON Bodies**: Structured bodies serialized automatically
//! - **Uniform Errors**: Every failure is a [`RequestError`] with a status
//! - **Lifecycle Notifications**: Pending / succeeded / failed events
//! - **Pluggable Transport**: reqwest by default, any [`Transport`] in tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gfetch::Client;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("https://api.example.com/v1")?;
//!     client
//!         .merge_headers([("Authorization", Some("Bearer secret"))])
//!         .register_endpoints(["users", "order-items"]);
//!
//!     let users = client.endpoint("users").expect("registered");
//!     let response = users
//!         .get()
//!         .params([("status", json!("active")), ("age>", json!(21))])
//!         .send()
//!         .await?;
//!     println!("{:?}", response.data());
//!
//!     let items = client.endpoint("orderItems").expect("registered");
//!     items.post().body(json!({"sku": "A-1", "qty": 2})).send().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Observing Requests
//!
//! ```rust,no_run
//! use gfetch::{Client, LifecycleEvent};
//!
//! # fn main() -> Result<(), gfetch::Error> {
//! let client = Client::builder("https://api.example.com")
//!     .notifier(|event: &LifecycleEvent| {
//!         println!("{} {} {}", event.method, event.endpoint, event.status);
//!     })
//!     .endpoint("users")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod endpoint;
mod error;
mod headers;
mod notify;
mod registry;
mod request;
mod response;
mod transport;

pub use client::{Client, ClientBuilder};
pub use config::{ClientConfig, ClientConfigBuilder, TransportConfig};
pub use endpoint::{Endpoint, EndpointRequest};
pub use error::{Error, RequestError, Result, TRANSPORT_FAILURE_STATUS, TransportError};
pub use headers::HeaderStore;
pub use notify::{LifecycleEvent, LifecycleStatus, Notifier, TracingNotifier};
pub use registry::{EndpointRegistry, accessor_ident};
pub use request::{Body, BodyType, Params, REQUESTED_WITH, RequestSpec, TransportRequest};
pub use response::{Response, ResponseData};
pub use transport::{ReqwestTransport, Transport};

// Re-export common types
pub use bytes::Bytes;
pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
pub use serde_json::{Value, json};

/// Prelude for common imports.
///
/// ```
/// use gfetch::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::{Client, ClientBuilder};
    pub use crate::config::{ClientConfig, TransportConfig};
    pub use crate::endpoint::{Endpoint, EndpointRequest};
    pub use crate::error::{Error, RequestError, Result, TRANSPORT_FAILURE_STATUS};
    pub use crate::notify::{LifecycleEvent, LifecycleStatus, Notifier};
    pub use crate::request::{Body, BodyType, Params, RequestSpec};
    pub use crate::response::{Response, ResponseData};
    pub use crate::transport::Transport;
    pub use http::{Method, StatusCode};
}
