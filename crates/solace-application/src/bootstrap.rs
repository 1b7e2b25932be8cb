//! Default wiring for a real client.
//!
//! Resolves the backend endpoint from the launch context plus the durable
//! override, opens the state store at its platform location, and assembles
//! the controller over the HTTP remote service. Hosts embedding the engine
//! call [`launch`] and then [`AppController::start`].

use crate::controller::AppController;
use crate::surface::PresentationSurface;
use anyhow::{Context, Result};
use solace_core::consent::ConsentCache;
use solace_core::endpoint::EndpointSources;
use solace_core::remote::RemoteService;
use solace_core::session::SessionStore;
use solace_core::storage::{LocalStore, StateKey};
use solace_core::survey::ScheduleStore;
use solace_infrastructure::{
    LocalConsentCache, LocalScheduleStore, LocalSessionStore, TomlStateStore,
};
use solace_interaction::HttpRemoteService;
use std::sync::Arc;

/// Endpoint-relevant facts about where the client is running, provided by
/// the embedding host.
#[derive(Debug, Clone, Default)]
pub struct LaunchContext {
    /// Endpoint injected by a trusted host environment, if any.
    pub injected_endpoint: Option<String>,
    /// Endpoint passed as an explicit query-string override, if any.
    pub query_endpoint: Option<String>,
    /// Hostname the client is served from, for the loopback heuristic.
    pub hostname: String,
}

/// Builds a controller wired to the durable store and the HTTP backend.
pub async fn launch(
    ctx: LaunchContext,
    surface: Arc<dyn PresentationSurface>,
) -> Result<Arc<AppController>> {
    let store: Arc<dyn LocalStore> = Arc::new(
        TomlStateStore::default_location().context("opening durable state store")?,
    );

    let saved_override = store
        .get(&StateKey::EndpointOverride)
        .await
        .context("reading endpoint override")?;

    let sources = EndpointSources {
        injected: ctx.injected_endpoint,
        query_override: ctx.query_endpoint,
        saved_override,
        hostname: ctx.hostname,
    };
    let endpoint = sources.resolve();
    tracing::info!(target: "bootstrap", "resolved backend endpoint: {}", endpoint.base());

    let remote: Arc<dyn RemoteService> = Arc::new(HttpRemoteService::new(endpoint.clone()));
    let sessions: Arc<dyn SessionStore> = Arc::new(LocalSessionStore::new(store.clone()));
    let consent: Arc<dyn ConsentCache> = Arc::new(LocalConsentCache::new(store.clone()));
    let schedule: Arc<dyn ScheduleStore> = Arc::new(LocalScheduleStore::new(store.clone()));

    Ok(Arc::new(AppController::new(
        remote, sessions, consent, schedule, store, surface, endpoint,
    )))
}
