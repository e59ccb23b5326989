//! Per-browser-session context and the registry that owns it.
//!
//! Each browser session gets one [`SessionContext`]: its own identity and its
//! own order store. Handlers receive it explicitly through the
//! [`crate::middleware::CurrentSession`] extractor; nothing is global.
//!
//! Contexts live in a `moka` cache keyed by the session id stored in the
//! cookie session. An idle context is evicted after the session TTL, which
//! drops its identity listener and its store.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use uuid::Uuid;

use crate::gateway::{AccessToken, AuthTokens, Backend};
use crate::services::identity::IdentityGateway;
use crate::store::Store;

/// Upper bound on concurrently cached sessions.
const MAX_SESSIONS: u64 = 10_000;

/// Identity and order state for one browser session.
#[derive(Debug)]
pub struct SessionContext {
    pub identity: IdentityGateway,
    pub store: Store,
}

impl SessionContext {
    /// Restore `persisted` tokens and build a store that reads and writes on
    /// behalf of whoever is signed in.
    pub async fn start(backend: &dyn Backend, persisted: Option<AuthTokens>) -> Self {
        let identity = IdentityGateway::start(backend.auth(), persisted).await;
        let token: Arc<dyn AccessToken> = Arc::new(identity.clone());
        let store = Store::new(backend.orders(Some(token)));
        Self { identity, store }
    }
}

/// All live session contexts.
#[derive(Clone)]
pub struct SessionRegistry {
    backend: Arc<dyn Backend>,
    sessions: Cache<Uuid, Arc<SessionContext>>,
}

impl SessionRegistry {
    /// Create an empty registry. Contexts idle for longer than `ttl` are
    /// dropped.
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, ttl: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(MAX_SESSIONS)
            .time_to_idle(ttl)
            .build();

        Self { backend, sessions }
    }

    /// The context for `key`, starting one from `persisted` if none is live.
    ///
    /// Concurrent first requests for the same key share one start.
    pub async fn get_or_start(
        &self,
        key: Uuid,
        persisted: Option<AuthTokens>,
    ) -> Arc<SessionContext> {
        let backend = Arc::clone(&self.backend);
        self.sessions
            .get_with(key, async move {
                tracing::debug!(
                    session = %key,
                    restoring = persisted.is_some(),
                    "Starting session context"
                );
                Arc::new(SessionContext::start(backend.as_ref(), persisted).await)
            })
            .await
    }

    /// Drop the context for `key`.
    pub async fn remove(&self, key: Uuid) {
        self.sessions.invalidate(&key).await;
    }

    /// Number of live contexts (approximate).
    #[must_use]
    pub fn len(&self) -> u64 {
        self.sessions.entry_count()
    }

    /// Whether no context is cached (approximate).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The backend every context is built on.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.entry_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use stitchtrack_core::{Email, OrderStatus};

    use super::*;
    use crate::gateway::{AuthBackend, BackendError, OrderGateway};
    use crate::services::identity::tests::{FakeAuth, PASSWORD};
    use crate::store::effects::tests::FakeOrders;
    use crate::store::reducer::tests::order;
    use crate::store::{Intent, Outcome};

    /// Backend made of the in-memory fakes. Every session shares one order
    /// table; the token each gateway was handed is recorded.
    pub(crate) struct FakeBackend {
        pub auth: Arc<FakeAuth>,
        pub orders: Arc<FakeOrders>,
        pub tokens: Mutex<Vec<Arc<dyn AccessToken>>>,
    }

    impl FakeBackend {
        pub(crate) fn new(is_admin: bool) -> Self {
            Self {
                auth: Arc::new(FakeAuth::new(is_admin)),
                orders: Arc::new(FakeOrders::default()),
                tokens: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Backend for FakeBackend {
        fn auth(&self) -> Arc<dyn AuthBackend> {
            self.auth.clone()
        }

        fn orders(&self, token: Option<Arc<dyn AccessToken>>) -> Arc<dyn OrderGateway> {
            if let Some(token) = token {
                self.tokens.lock().unwrap().push(token);
            }
            self.orders.clone()
        }

        async fn ready(&self) -> Result<(), BackendError> {
            Ok(())
        }
    }

    fn registry(backend: FakeBackend) -> SessionRegistry {
        SessionRegistry::new(Arc::new(backend), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_same_key_returns_same_context() {
        let registry = registry(FakeBackend::new(true));
        let key = Uuid::new_v4();

        let a = registry.get_or_start(key, None).await;
        let b = registry.get_or_start(key, None).await;
        assert!(Arc::ptr_eq(&a, &b));

        let other = registry.get_or_start(Uuid::new_v4(), None).await;
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[tokio::test]
    async fn test_sessions_have_separate_identities_and_stores() {
        let registry = registry(FakeBackend::new(true));
        let a = registry.get_or_start(Uuid::new_v4(), None).await;
        let b = registry.get_or_start(Uuid::new_v4(), None).await;

        a.identity
            .login(&Email::parse("admin@example.com").unwrap(), PASSWORD)
            .await
            .unwrap();
        assert!(a.identity.is_admin());
        assert!(!b.identity.is_authenticated());

        a.store.dispatch_and_wait(Intent::LoadOrders).await.unwrap();
        let loaded = a.store.state();
        assert!(!Arc::ptr_eq(&loaded, &b.store.state()));
    }

    #[tokio::test]
    async fn test_store_reads_with_session_token() {
        let backend = Arc::new(FakeBackend::new(true));
        backend
            .orders
            .rows
            .lock()
            .unwrap()
            .push(order(1, OrderStatus::Paid));
        let registry = SessionRegistry::new(backend.clone(), Duration::from_secs(60));
        let context = registry.get_or_start(Uuid::new_v4(), None).await;

        let outcome = context
            .store
            .dispatch_and_wait(Intent::LoadOrders)
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::LoadOrdersSuccess(ref rows) if rows.len() == 1));

        let token = backend.tokens.lock().unwrap()[0].clone();
        assert_eq!(token.access_token(), None);

        context
            .identity
            .login(&Email::parse("admin@example.com").unwrap(), PASSWORD)
            .await
            .unwrap();
        assert_eq!(token.access_token().as_deref(), Some("access-1"));
    }

    #[tokio::test]
    async fn test_remove_starts_fresh_context() {
        let registry = registry(FakeBackend::new(true));
        let key = Uuid::new_v4();
        let first = registry.get_or_start(key, None).await;

        registry.remove(key).await;
        let second = registry.get_or_start(key, None).await;
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_persisted_tokens_restore_identity() {
        let backend = FakeBackend::new(true);
        let tokens = AuthTokens {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-access-1".to_string(),
            expires_at: chrono::Utc::now() + chrono::Duration::hours(1),
        };
        let registry = registry(backend);

        let context = registry.get_or_start(Uuid::new_v4(), Some(tokens)).await;
        assert!(context.identity.is_authenticated());
        assert!(context.identity.is_admin());
    }
}
