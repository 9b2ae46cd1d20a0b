use std::sync::{Arc, RwLock};

use tracing::info;

use super::{RpcConnection, RpcConnectionConfig};

/// Holds the single connection every action shares. Changing the endpoint
/// swaps in a freshly built connection; callers holding the previous `Arc`
/// finish their work against the old endpoint.
#[derive(Debug)]
pub struct ChainContext<R: RpcConnection> {
    config: RwLock<RpcConnectionConfig>,
    current: RwLock<Arc<R>>,
}

impl<R: RpcConnection> ChainContext<R> {
    pub fn new(config: RpcConnectionConfig) -> Self {
        let rpc = Arc::new(R::new(config.clone()));
        Self {
            config: RwLock::new(config),
            current: RwLock::new(rpc),
        }
    }

    pub fn from_connection(config: RpcConnectionConfig, rpc: R) -> Self {
        Self {
            config: RwLock::new(config),
            current: RwLock::new(Arc::new(rpc)),
        }
    }

    pub fn rpc(&self) -> Arc<R> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn endpoint(&self) -> String {
        match self.config.read() {
            Ok(guard) => guard.url.clone(),
            Err(poisoned) => poisoned.into_inner().url.clone(),
        }
    }

    /// Rebuilds the connection when `url` differs from the current endpoint.
    /// Returns whether a rebuild happened.
    pub fn set_endpoint(&self, url: &str) -> bool {
        let mut config = match self.config.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if config.url == url {
            return false;
        }

        let next = config.with_url(url.to_string());
        let rpc = Arc::new(R::new(next.clone()));
        *config = next;
        match self.current.write() {
            Ok(mut guard) => *guard = rpc,
            Err(poisoned) => *poisoned.into_inner() = rpc,
        }
        info!("Rebuilt chain client for endpoint {}", url);
        true
    }
}
