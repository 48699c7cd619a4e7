//! Endpoint registry and accessor naming.

use std::collections::HashMap;
use std::sync::Arc;

use crate::Endpoint;

/// Derive the accessor identifier for a raw endpoint name.
///
/// The name is lowercased and split on every character outside
/// `[A-Za-z0-9_]`. The first segment is kept as is and each following
/// segment has its first letter capitalized.
///
/// ```
/// assert_eq!(gfetch::accessor_ident("user-profiles"), "userProfiles");
/// assert_eq!(gfetch::accessor_ident("Orders"), "orders");
/// ```
pub fn accessor_ident(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut ident = String::with_capacity(lower.len());
    for (i, segment) in lower
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .enumerate()
    {
        if i == 0 {
            ident.push_str(segment);
            continue;
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            ident.extend(first.to_uppercase());
            ident.push_str(chars.as_str());
        }
    }
    ident
}

/// Ordered, deduplicated set of endpoint names.
///
/// Every distinct raw name owns one [`Endpoint`], reachable by that exact
/// name. Accessor identifiers are bound to the first name that produced
/// them.
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    names: Vec<String>,
    by_name: HashMap<String, Arc<Endpoint>>,
    by_ident: HashMap<String, Arc<Endpoint>>,
}

impl EndpointRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a raw name, building its endpoint with `make` when needed.
    ///
    /// Names are compared exactly; re-registering a name is a no-op and
    /// returns `false`. When a new name maps to an identifier that is
    /// already taken, the first endpoint keeps the identifier.
    pub fn register<F>(&mut self, name: &str, make: F) -> bool
    where
        F: FnOnce() -> Endpoint,
    {
        if self.by_name.contains_key(name) {
            return false;
        }
        let endpoint = Arc::new(make());
        self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), endpoint.clone());

        let ident = accessor_ident(name);
        match self.by_ident.get(&ident) {
            Some(existing) => {
                tracing::warn!(
                    name,
                    ident = %ident,
                    existing = existing.name(),
                    "Endpoint identifier already taken; keeping first registration"
                );
            }
            None => {
                self.by_ident.insert(ident, endpoint);
            }
        }
        true
    }

    /// Check if a raw name has been registered.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Registered raw names in first-registration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Look up an endpoint by accessor identifier.
    pub fn get(&self, ident: &str) -> Option<Arc<Endpoint>> {
        self.by_ident.get(ident).cloned()
    }

    /// Look up an endpoint by its exact raw name.
    pub fn named(&self, name: &str) -> Option<Arc<Endpoint>> {
        self.by_name.get(name).cloned()
    }

    /// Accessor identifiers currently bound.
    pub fn idents(&self) -> impl Iterator<Item = &str> {
        self.by_ident.keys().map(String::as_str)
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
