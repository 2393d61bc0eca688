//! Host capabilities handed to nodes.
//!
//! A pulse carries one `ExecutorExtensions` map. Hosts put their services in
//! it (device drivers, output sinks, clients) under string keys, and nodes
//! look them up by key and concrete type through `cx.extensions()`. The
//! engine itself never reads the map.
//!
//! # Example
//!
//! ```ignore
//! let extensions = ExecutorExtensions::new()
//!     .with("led_strip", Arc::new(LedStrip::open()?));
//!
//! // In a Node::process:
//! if let Some(strip) = cx.extensions().get::<Arc<LedStrip>>("led_strip") {
//!     strip.fill(color).await;
//! }
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

type Capability = Box<dyn Any + Send + Sync>;

/// Keyed map of host services of arbitrary `Send + Sync` types
#[derive(Default)]
pub struct ExecutorExtensions {
    services: HashMap<String, Capability>,
}

impl ExecutorExtensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing whatever was there
    pub fn set<T: Send + Sync + 'static>(&mut self, key: &str, value: T) {
        self.services.insert(key.to_owned(), Box::new(value));
    }

    /// Chained form of [`set`](Self::set)
    pub fn with<T: Send + Sync + 'static>(mut self, key: &str, value: T) -> Self {
        self.set(key, value);
        self
    }

    /// The service under `key`, if present and of type `T`
    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<&T> {
        self.services.get(key)?.downcast_ref()
    }

    pub fn has(&self, key: &str) -> bool {
        self.services.contains_key(key)
    }

    /// Take a service out of the map. Returns `None` (and keeps the entry)
    /// when the stored value is not a `T`.
    pub fn remove<T: Send + Sync + 'static>(&mut self, key: &str) -> Option<T> {
        if !self.services.get(key)?.is::<T>() {
            return None;
        }
        let boxed = self.services.remove(key)?;
        boxed.downcast().ok().map(|b| *b)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for ExecutorExtensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.services.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("ExecutorExtensions").field("keys", &keys).finish()
    }
}

/// Keys of the services the built-in nodes look for.
pub mod extension_keys {
    /// `Arc<dyn PrintSink>` receiving the values of Print nodes.
    pub const PRINT_SINK: &str = "print_sink";
}
