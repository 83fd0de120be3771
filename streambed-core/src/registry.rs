//! # Service Registry
//!
//! The in-process stand-in for dial/listen. A server side binds an endpoint
//! (typically an `Arc<dyn SomeService>`) under a name; a client side connects
//! by that name and gets back a clone of the endpoint, or a
//! [`ConnectError`] when nothing suitable is bound there.
//!
//! Connect-time failures are deliberately a separate type from
//! [`crate::CallError`]: failing to reach an endpoint is not the same as a
//! call failing once it is established.

use std::any::Any;
use std::collections::HashMap;

/// Errors that can occur when connecting to a named endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    #[error("failed to connect to '{0}': nothing is bound under that name")]
    NotBound(String),
    #[error("failed to connect to '{0}': the bound endpoint has a different type")]
    EndpointTypeMismatch(String),
}

/// A name→endpoint map shared by the two sides of a process.
#[derive(Default)]
pub struct ServiceRegistry {
    endpoints: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds an endpoint under a name, replacing any previous binding.
    pub fn bind<T>(&mut self, name: impl Into<String>, endpoint: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        self.endpoints.insert(name.into(), Box::new(endpoint));
    }

    /// Connects to the endpoint bound under `name`.
    ///
    /// # Errors
    ///
    /// * [`ConnectError::NotBound`] - no endpoint under that name.
    /// * [`ConnectError::EndpointTypeMismatch`] - an endpoint is bound there,
    ///   but it is not a `T`.
    pub fn connect<T>(&self, name: &str) -> Result<T, ConnectError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let endpoint = self
            .endpoints
            .get(name)
            .ok_or_else(|| ConnectError::NotBound(name.to_string()))?;

        endpoint
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| ConnectError::EndpointTypeMismatch(name.to_string()))
    }
}
