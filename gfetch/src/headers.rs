//! Client-wide header store.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Mutable mapping of header name to value shared by every endpoint of a
/// client.
///
/// Names match case-insensitively, as HTTP header names do. A write keeps
/// the spelling of the most recent name. Deleting is done by merging a
/// `None` value, so the store never holds an empty slot.
#[derive(Debug, Default)]
pub struct HeaderStore {
    inner: RwLock<HashMap<String, String>>,
}

impl HeaderStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a patch: `Some` sets or overwrites, `None` deletes.
    pub fn merge<I, K, V>(&self, patch: I)
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut headers = self.inner.write();
        for (name, value) in patch {
            let name = name.into();
            take(&mut headers, &name);
            if let Some(value) = value {
                headers.insert(name, value.into());
            }
        }
    }

    /// Set a single header.
    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let mut headers = self.inner.write();
        take(&mut headers, &name);
        headers.insert(name, value.into());
    }

    /// Remove a single header, returning its previous value.
    pub fn remove(&self, name: &str) -> Option<String> {
        take(&mut self.inner.write(), name)
    }

    /// Get a single header value.
    pub fn get(&self, name: &str) -> Option<String> {
        self.inner
            .read()
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
    }

    /// Copy of the current headers.
    ///
    /// Mutating the returned map does not affect the store.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.inner.read().clone()
    }

    /// Number of stored headers.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Check if no headers are stored.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

fn take(headers: &mut HashMap<String, String>, name: &str) -> Option<String> {
    let key = headers
        .keys()
        .find(|key| key.eq_ignore_ascii_case(name))
        .cloned()?;
    headers.remove(&key)
}
