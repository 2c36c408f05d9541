use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::channel::StoreChannel;
use crate::client::ActionClient;
use crate::server::ActionServer;
use crate::store::RecordStore;
use crate::Result;

type Client<S> = ActionClient<StoreChannel<S>>;
type Server<S> = ActionServer<StoreChannel<S>>;

/// Hands out one client and one server handle per record key, constructed
/// lazily and memoized so repeated lookups share a single store subscription
/// per side. Entries are never evicted.
///
/// Built once at process start and passed by handle; there is no implicit
/// process-wide instance.
pub struct Registry<S> {
    store: Arc<S>,
    clients: Mutex<HashMap<String, Arc<Client<S>>>>,
    servers: Mutex<HashMap<String, Arc<Server<S>>>>,
}

impl<S> Registry<S>
where
    S: RecordStore + Send + Sync + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            clients: Mutex::new(HashMap::new()),
            servers: Mutex::new(HashMap::new()),
        }
    }

    pub fn client(&self, key: &str) -> Arc<Client<S>> {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(clients.entry(key.to_string()).or_insert_with(|| {
            Arc::new(ActionClient::new(StoreChannel::new(
                Arc::clone(&self.store),
                key,
            )))
        }))
    }

    /// First lookup for a key attaches the server, which resets the record;
    /// later lookups return the same handle without touching the record.
    pub fn server(&self, key: &str) -> Result<Arc<Server<S>>> {
        let mut servers = self.servers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(server) = servers.get(key) {
            return Ok(Arc::clone(server));
        }

        let server = Arc::new(ActionServer::new(StoreChannel::new(
            Arc::clone(&self.store),
            key,
        ))?);
        servers.insert(key.to_string(), Arc::clone(&server));
        Ok(server)
    }
}
