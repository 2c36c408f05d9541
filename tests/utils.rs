use std::sync::Arc;

use agendo::{MemoryStore, Registry};

/// Opt-in log output: `RUST_LOG=agendo=debug cargo test -- --nocapture`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

pub fn registry() -> (Arc<MemoryStore>, Registry<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let registry = Registry::new(Arc::clone(&store));
    (store, registry)
}
