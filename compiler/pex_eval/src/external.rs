//! Named parameter sets reachable from any expression via
//! `%{=ext:name:key[:default]}`.

use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::provider::ParamsProvider;

/// A provider shared through the external registry.
pub type SharedProvider = Arc<dyn ParamsProvider + Send + Sync>;

static EXTERNAL: LazyLock<RwLock<FxHashMap<String, SharedProvider>>> =
    LazyLock::new(|| RwLock::new(FxHashMap::default()));

/// Publish `provider` under `name`, replacing any previous one.
pub fn register_external_params(name: impl Into<String>, provider: SharedProvider) {
    let name = name.into();
    tracing::debug!(name = %name, "registered external params");
    EXTERNAL.write().insert(name, provider);
}

pub fn unregister_external_params(name: &str) -> Option<SharedProvider> {
    EXTERNAL.write().remove(name)
}

pub fn external_params(name: &str) -> Option<SharedProvider> {
    EXTERNAL.read().get(name).cloned()
}

/// Registered names, sorted.
pub fn external_params_names() -> Vec<String> {
    let mut names: Vec<String> = EXTERNAL.read().keys().cloned().collect();
    names.sort();
    names
}
