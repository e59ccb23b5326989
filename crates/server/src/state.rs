//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::gateway::{Backend, BackendError};
use crate::services::SessionRegistry;
use crate::supabase::SupabaseClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration, the backend and the per-session contexts.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    sessions: SessionRegistry,
}

impl AppState {
    /// Create application state backed by the configured Supabase project.
    ///
    /// # Errors
    ///
    /// Returns an error if the Supabase client cannot be built.
    pub fn new(config: AppConfig) -> Result<Self, BackendError> {
        let backend = SupabaseClient::new(&config.supabase)?;
        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    /// Create application state on top of any backend.
    #[must_use]
    pub fn with_backend(config: AppConfig, backend: Arc<dyn Backend>) -> Self {
        let ttl = Duration::from_secs(config.session_ttl_minutes.unsigned_abs() * 60);
        let sessions = SessionRegistry::new(backend, ttl);

        Self {
            inner: Arc::new(AppStateInner { config, sessions }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn Backend> {
        self.inner.sessions.backend()
    }

    /// Get a reference to the session registry.
    #[must_use]
    pub fn sessions(&self) -> &SessionRegistry {
        &self.inner.sessions
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("sessions", &self.inner.sessions)
            .finish()
    }
}
