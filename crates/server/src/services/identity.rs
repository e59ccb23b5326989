//! Per-session identity: current user, current profile and the tokens
//! behind them.
//!
//! The user and profile travel together as one [`AuthSnapshot`] published on
//! a `watch` channel. Every change goes through a listener task that applies
//! [`AuthEvent`]s in order, loads the profile after each sign-in, restore or
//! refresh, and renews the access token shortly before it expires.
//!
//! One-shot reads ([`IdentityGateway::is_authenticated`],
//! [`IdentityGateway::is_admin`]) look at the latest snapshot and never wait.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use chrono::{DateTime, Duration, Utc};
use stitchtrack_core::{Email, Profile, User};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::gateway::{AccessToken, AuthBackend, AuthError, AuthSession, AuthTokens};

/// How long before expiry the access token is renewed, at most. Short-lived
/// tokens are renewed halfway through their lifetime instead.
const REFRESH_MARGIN_SECONDS: i64 = 60;

/// Shortest wait between two refreshes.
const MIN_REFRESH_WAIT_SECONDS: i64 = 5;

/// Refreshes in a row that may hand back an already-expiring token before
/// the session is dropped.
const MAX_EXPIRING_REFRESHES: u8 = 2;

/// Time to wait before renewing a token that expires at `expires_at` and was
/// received at `received_at`.
fn refresh_delay(
    expires_at: DateTime<Utc>,
    received_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> std::time::Duration {
    let margin = ((expires_at - received_at) / 2)
        .clamp(Duration::zero(), Duration::seconds(REFRESH_MARGIN_SECONDS));
    ((expires_at - margin) - now)
        .max(Duration::seconds(MIN_REFRESH_WAIT_SECONDS))
        .to_std()
        .unwrap_or_default()
}

/// The token would be due for renewal again before the next refresh could run.
fn expires_soon(tokens: &AuthTokens, now: DateTime<Utc>) -> bool {
    tokens.expires_at - now <= Duration::seconds(MIN_REFRESH_WAIT_SECONDS)
}

/// Current user and profile, replaced wholesale on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub user: Option<User>,
    pub profile: Option<Profile>,
}

impl AuthSnapshot {
    /// A user is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// A profile is loaded and marks the user as admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.is_admin)
    }
}

/// Authentication state changes applied by the listener.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    /// Result of restoring a persisted session at start-up.
    InitialSession(Option<AuthSession>),
    /// A password sign-in succeeded.
    SignedIn(AuthSession),
    /// The access token was renewed.
    TokenRefreshed(AuthSession),
    /// The session ended.
    SignedOut,
}

impl AuthEvent {
    /// Stable name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::InitialSession(_) => "initial_session",
            Self::SignedIn(_) => "signed_in",
            Self::TokenRefreshed(_) => "token_refreshed",
            Self::SignedOut => "signed_out",
        }
    }
}

struct Envelope {
    event: AuthEvent,
    applied: Option<oneshot::Sender<()>>,
}

/// Aborts the listener when the last gateway handle goes away.
struct ListenerGuard(JoinHandle<()>);

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Tokens plus when this process received them.
struct HeldTokens {
    tokens: AuthTokens,
    received_at: DateTime<Utc>,
}

struct Shared {
    backend: Arc<dyn AuthBackend>,
    snapshot: watch::Sender<AuthSnapshot>,
    tokens: Mutex<Option<HeldTokens>>,
    expiring_refreshes: AtomicU8,
    events: mpsc::UnboundedSender<Envelope>,
    listener: Mutex<Option<ListenerGuard>>,
}

impl Shared {
    fn tokens(&self) -> Option<AuthTokens> {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|held| held.tokens.clone())
    }

    fn set_tokens(&self, tokens: Option<AuthTokens>) {
        *self.tokens.lock().unwrap_or_else(PoisonError::into_inner) =
            tokens.map(|tokens| HeldTokens {
                tokens,
                received_at: Utc::now(),
            });
    }

    /// Fetch the profile for a fresh session. Failures count as "no profile".
    async fn load_profile(&self, session: &AuthSession) -> Option<Profile> {
        match self
            .backend
            .fetch_profile(&session.tokens.access_token, session.user.id)
            .await
        {
            Ok(profile) => {
                if profile.is_none() {
                    tracing::warn!(user_id = %session.user.id, "No profile row for user");
                }
                profile
            }
            Err(e) => {
                tracing::error!(user_id = %session.user.id, error = %e, "Error loading user profile");
                None
            }
        }
    }

    async fn apply(&self, event: AuthEvent) {
        tracing::debug!(event = event.name(), "Applying auth event");
        if !matches!(event, AuthEvent::TokenRefreshed(_)) {
            self.expiring_refreshes.store(0, Ordering::Relaxed);
        }
        match event {
            AuthEvent::InitialSession(Some(session))
            | AuthEvent::SignedIn(session)
            | AuthEvent::TokenRefreshed(session) => {
                let profile = self.load_profile(&session).await;
                self.set_tokens(Some(session.tokens));
                self.snapshot.send_replace(AuthSnapshot {
                    user: Some(session.user),
                    profile,
                });
            }
            AuthEvent::InitialSession(None) | AuthEvent::SignedOut => {
                self.set_tokens(None);
                self.snapshot.send_replace(AuthSnapshot::default());
            }
        }
    }

    /// When the listener should renew the access token.
    fn refresh_deadline(&self) -> Option<tokio::time::Instant> {
        let (expires_at, received_at) = {
            let held = self.tokens.lock().unwrap_or_else(PoisonError::into_inner);
            let held = held.as_ref()?;
            (held.tokens.expires_at, held.received_at)
        };
        Some(tokio::time::Instant::now() + refresh_delay(expires_at, received_at, Utc::now()))
    }

    async fn refresh(&self) {
        let Some(tokens) = self.tokens() else {
            return;
        };
        match self.backend.refresh_session(&tokens.refresh_token).await {
            Ok(session) => {
                if expires_soon(&session.tokens, Utc::now()) {
                    let streak = self.expiring_refreshes.fetch_add(1, Ordering::Relaxed) + 1;
                    if streak >= MAX_EXPIRING_REFRESHES {
                        tracing::warn!(streak, "Refreshed tokens keep expiring, signing out");
                        self.apply(AuthEvent::SignedOut).await;
                        return;
                    }
                } else {
                    self.expiring_refreshes.store(0, Ordering::Relaxed);
                }
                self.apply(AuthEvent::TokenRefreshed(session)).await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, signing out");
                self.apply(AuthEvent::SignedOut).await;
            }
        }
    }
}

async fn wait_for(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn listen(shared: Weak<Shared>, mut events: mpsc::UnboundedReceiver<Envelope>) {
    loop {
        let deadline = match shared.upgrade() {
            Some(shared) => shared.refresh_deadline(),
            None => return,
        };

        tokio::select! {
            envelope = events.recv() => {
                let Some(Envelope { event, applied }) = envelope else {
                    return;
                };
                let Some(shared) = shared.upgrade() else {
                    return;
                };
                shared.apply(event).await;
                if let Some(applied) = applied {
                    let _ = applied.send(());
                }
            }
            () = wait_for(deadline) => {
                let Some(shared) = shared.upgrade() else {
                    return;
                };
                shared.refresh().await;
            }
        }
    }
}

/// Identity of one browser session.
///
/// Cheap to clone; all clones share one snapshot and one listener. The
/// listener stops when the last clone is dropped.
#[derive(Clone)]
pub struct IdentityGateway {
    shared: Arc<Shared>,
}

impl IdentityGateway {
    /// Restore `persisted` tokens (if any), publish the resulting user and
    /// profile, then start the listener.
    ///
    /// Expired tokens are refreshed first. A session that cannot be restored
    /// starts signed out.
    pub async fn start(backend: Arc<dyn AuthBackend>, persisted: Option<AuthTokens>) -> Self {
        let (snapshot, _) = watch::channel(AuthSnapshot::default());
        let (events, receiver) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            backend,
            snapshot,
            tokens: Mutex::new(None),
            expiring_refreshes: AtomicU8::new(0),
            events,
            listener: Mutex::new(None),
        });

        let restored = match persisted {
            Some(tokens) => restore(shared.backend.as_ref(), tokens).await,
            None => None,
        };
        shared.apply(AuthEvent::InitialSession(restored)).await;

        let handle = tokio::spawn(listen(Arc::downgrade(&shared), receiver));
        *shared.listener.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(ListenerGuard(handle));

        Self { shared }
    }

    /// Sign in with email and password.
    ///
    /// On success the user and profile are published before this returns,
    /// so [`Self::is_admin`] reflects the new profile immediately.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] with the backend's message
    /// for a rejected password; the current user is left unchanged.
    #[instrument(skip(self, email, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &str) -> Result<User, AuthError> {
        let session = self.shared.backend.sign_in_with_password(email, password).await?;
        let user = session.user.clone();
        self.send_and_wait(AuthEvent::SignedIn(session)).await;
        tracing::info!(user_id = %user.id, "Signed in");
        Ok(user)
    }

    /// Sign out and clear the user and profile.
    ///
    /// # Errors
    ///
    /// Returns the backend error; user and profile stay as they were.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AuthError> {
        if let Some(tokens) = self.shared.tokens() {
            self.shared.backend.sign_out(&tokens.access_token).await?;
        }
        self.send_and_wait(AuthEvent::SignedOut).await;
        tracing::info!("Signed out");
        Ok(())
    }

    /// Forget the local session without telling the backend.
    ///
    /// Used when the backend sign-out failed; the tokens stay valid upstream
    /// until they expire but this session no longer holds them.
    pub async fn discard(&self) {
        self.send_and_wait(AuthEvent::SignedOut).await;
        tracing::info!("Local session discarded");
    }

    /// Queue an auth state change for the listener.
    pub fn notify(&self, event: AuthEvent) {
        if self
            .shared
            .events
            .send(Envelope {
                event,
                applied: None,
            })
            .is_err()
        {
            tracing::warn!("Auth listener stopped; event dropped");
        }
    }

    async fn send_and_wait(&self, event: AuthEvent) {
        let (applied, done) = oneshot::channel();
        match self.shared.events.send(Envelope {
            event,
            applied: Some(applied),
        }) {
            Ok(()) => {
                let _ = done.await;
            }
            Err(mpsc::error::SendError(envelope)) => {
                tracing::warn!("Auth listener stopped; applying inline");
                self.shared.apply(envelope.event).await;
            }
        }
    }

    /// Receive every future snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.shared.snapshot.subscribe()
    }

    /// Copy of the latest snapshot.
    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        self.shared.snapshot.borrow().clone()
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.shared.snapshot.borrow().user.clone()
    }

    /// The loaded profile, if any.
    #[must_use]
    pub fn current_profile(&self) -> Option<Profile> {
        self.shared.snapshot.borrow().profile.clone()
    }

    /// Whether a user is signed in right now.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.shared.snapshot.borrow().is_authenticated()
    }

    /// Whether the signed-in user's profile marks them as admin right now.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.shared.snapshot.borrow().is_admin()
    }

    /// Tokens to persist with the browser session.
    #[must_use]
    pub fn tokens(&self) -> Option<AuthTokens> {
        self.shared.tokens()
    }
}

impl AccessToken for IdentityGateway {
    fn access_token(&self) -> Option<String> {
        self.shared.tokens().map(|t| t.access_token)
    }
}

impl std::fmt::Debug for IdentityGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.shared.snapshot.borrow();
        f.debug_struct("IdentityGateway")
            .field("user", &snapshot.user.as_ref().map(|u| u.id))
            .field("is_admin", &snapshot.is_admin())
            .finish_non_exhaustive()
    }
}

/// Turn persisted tokens back into a session.
async fn restore(backend: &dyn AuthBackend, tokens: AuthTokens) -> Option<AuthSession> {
    let expiring = tokens.expires_at - Duration::seconds(REFRESH_MARGIN_SECONDS) <= Utc::now();
    let restored = if expiring {
        backend.refresh_session(&tokens.refresh_token).await
    } else {
        backend
            .get_user(&tokens.access_token)
            .await
            .map(|user| AuthSession { user, tokens })
    };

    match restored {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::info!(error = %e, "Could not restore session");
            None
        }
    }
}
