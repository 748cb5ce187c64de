//! # Account Session
//!
//! Holds the signed-in user and coordinates the account requests.
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        AccountSession                                   │
//! │                                                                         │
//! │  login / register ──► begin_load(email) ──► AccountBackend ──► apply    │
//! │                                                                         │
//! │  update_profile ────► begin_refresh() ────► AccountBackend ──► apply    │
//! │                       (Skipped when nobody is signed in)                │
//! │                                                                         │
//! │  logout ────────────► clear() (in-flight sign-ins become Stale)         │
//! │                                                                         │
//! │  forgot_password / reset_password: stateless, result returned directly  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The user lives in a [`Slot`] keyed by email, so the generation rules of
//! the catalogue slots apply unchanged: the newest sign-in wins and a
//! sign-out discards whatever is still in flight. A failed request keeps
//! the current user and only sets `last_error`; input rejected before any
//! request leaves the session untouched.
//!
//! Nothing is persisted. Storing the session across runs is left to the
//! embedding application.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use vetrina_core::{
    ApplyOutcome, Credentials, PasswordReset, ProfileChanges, ProfileImage, ProfileUpdated,
    Registration, Slot, SlotSnapshot, SlotTicket, User,
};

use crate::error::{ClientError, ClientResult};
use crate::http::CatalogApi;
use crate::stream::LoadOutcome;

pub type AccountSnapshot = SlotSnapshot<User, String>;

// =============================================================================
// Backend Seam
// =============================================================================

/// The account endpoints, as seen by the session.
#[async_trait]
pub trait AccountBackend: Send + Sync + 'static {
    async fn register(&self, registration: Registration) -> ClientResult<User>;

    async fn login(&self, credentials: Credentials) -> ClientResult<User>;

    async fn forgot_password(&self, email: &str) -> ClientResult<String>;

    async fn reset_password(&self, reset: PasswordReset) -> ClientResult<String>;

    async fn update_profile(
        &self,
        user_id: u64,
        changes: ProfileChanges,
        image: Option<ProfileImage>,
    ) -> ClientResult<ProfileUpdated>;
}

#[async_trait]
impl AccountBackend for CatalogApi {
    async fn register(&self, registration: Registration) -> ClientResult<User> {
        CatalogApi::register(self, registration).await
    }

    async fn login(&self, credentials: Credentials) -> ClientResult<User> {
        CatalogApi::login(self, credentials).await
    }

    async fn forgot_password(&self, email: &str) -> ClientResult<String> {
        CatalogApi::forgot_password(self, email).await
    }

    async fn reset_password(&self, reset: PasswordReset) -> ClientResult<String> {
        CatalogApi::reset_password(self, reset).await
    }

    async fn update_profile(
        &self,
        user_id: u64,
        changes: ProfileChanges,
        image: Option<ProfileImage>,
    ) -> ClientResult<ProfileUpdated> {
        match image {
            Some(image) => self.update_profile_with_image(user_id, changes, image).await,
            None => CatalogApi::update_profile(self, user_id, changes).await,
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// The signed-in user, observable like the catalogue slots.
pub struct AccountSession<B: AccountBackend = CatalogApi> {
    backend: B,
    state: RwLock<Slot<User, String>>,
    updates: watch::Sender<AccountSnapshot>,
    request_timeout: Duration,
}

impl<B: AccountBackend> AccountSession<B> {
    pub fn new(backend: B, request_timeout: Duration) -> Self {
        let slot = Slot::new();
        let (updates, _) = watch::channel(slot.snapshot());

        AccountSession {
            backend,
            state: RwLock::new(slot),
            updates,
            request_timeout,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn snapshot(&self) -> AccountSnapshot {
        self.updates.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AccountSnapshot> {
        self.updates.subscribe()
    }

    /// The signed-in user, if any.
    pub fn user(&self) -> Option<User> {
        self.updates.borrow().value.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.updates.borrow().value.is_some()
    }

    // =========================================================================
    // Sign-in
    // =========================================================================

    /// Signs in. A newer sign-in or a logout makes this one Stale.
    pub async fn login(&self, credentials: Credentials) -> LoadOutcome {
        let credentials = match credentials.validated() {
            Ok(credentials) => credentials,
            Err(err) => return self.reject(err.into()),
        };

        let ticket = self.begin(credentials.email.clone()).await;
        let result = self.timed(self.backend.login(credentials)).await;
        self.finish(ticket, result, "Signed in").await
    }

    /// Creates an account and signs in as the new user.
    pub async fn register(&self, registration: Registration) -> LoadOutcome {
        let registration = match registration.validated() {
            Ok(registration) => registration,
            Err(err) => return self.reject(err.into()),
        };

        let ticket = self.begin(registration.email.clone()).await;
        let result = self.timed(self.backend.register(registration)).await;
        self.finish(ticket, result, "Registered").await
    }

    /// Signs out locally and discards every in-flight account request.
    pub async fn logout(&self) {
        let mut state = self.state.write().await;
        let was_signed_in = state.value().is_some();
        state.clear();
        self.publish(&state);
        if was_signed_in {
            info!(resource = "account", "Signed out");
        }
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Updates the signed-in user's profile, optionally with a new picture.
    ///
    /// Skipped when nobody is signed in or a sign-in is still in flight.
    pub async fn update_profile(
        &self,
        changes: ProfileChanges,
        image: Option<ProfileImage>,
    ) -> LoadOutcome {
        let (ticket, user_id) = {
            let mut state = self.state.write().await;
            let user_id = state.value().map(User::numeric_id);
            let user_id = match user_id {
                Some(Ok(id)) => id,
                Some(Err(err)) => return self.reject(err.into()),
                None => {
                    debug!(resource = "account", "Profile update skipped, nobody signed in");
                    return LoadOutcome::Skipped;
                }
            };
            match state.begin_refresh() {
                Some(ticket) => {
                    self.publish(&state);
                    (ticket, user_id)
                }
                None => {
                    debug!(resource = "account", "Profile update skipped, sign-in pending");
                    return LoadOutcome::Skipped;
                }
            }
        };

        let result = self
            .timed(self.backend.update_profile(user_id, changes, image))
            .await
            .map(|updated| updated.user);
        self.finish(ticket, result, "Profile updated").await
    }

    // =========================================================================
    // Password Recovery
    // =========================================================================

    /// Requests a reset code for `email`. Does not touch the session.
    pub async fn forgot_password(&self, email: &str) -> ClientResult<String> {
        self.timed(self.backend.forgot_password(email)).await
    }

    /// Sets a new password with a mailed reset code. Does not touch the
    /// session.
    pub async fn reset_password(&self, reset: PasswordReset) -> ClientResult<String> {
        self.timed(self.backend.reset_password(reset)).await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn begin(&self, email: String) -> SlotTicket<String> {
        let mut state = self.state.write().await;
        let ticket = state.begin_load(email);
        self.publish(&state);
        ticket
    }

    async fn timed<T>(&self, request: impl Future<Output = ClientResult<T>>) -> ClientResult<T> {
        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(self.request_timeout.as_secs())),
        }
    }

    /// Input errors are returned without touching the session.
    fn reject(&self, err: ClientError) -> LoadOutcome {
        let message = err.to_string();
        warn!(resource = "account", error = %message, "Account request rejected");
        LoadOutcome::Failed(message)
    }

    async fn finish(
        &self,
        ticket: SlotTicket<String>,
        result: ClientResult<User>,
        action: &'static str,
    ) -> LoadOutcome {
        let generation = ticket.generation();
        let mut state = self.state.write().await;

        match result {
            Ok(user) => {
                let user_id = user.id.clone();
                match state.apply_value(ticket, user) {
                    ApplyOutcome::Applied => {
                        self.publish(&state);
                        info!(resource = "account", %user_id, "{}", action);
                        LoadOutcome::Applied
                    }
                    ApplyOutcome::Stale => {
                        debug!(resource = "account", generation, "Dropping stale account response");
                        LoadOutcome::Stale
                    }
                }
            }
            Err(err) => {
                let message = err.to_string();
                match state.apply_failure(&ticket, message.clone()) {
                    ApplyOutcome::Applied => {
                        self.publish(&state);
                        warn!(resource = "account", error = %message, "Account request failed");
                        LoadOutcome::Failed(message)
                    }
                    ApplyOutcome::Stale => LoadOutcome::Stale,
                }
            }
        }
    }

    fn publish(&self, state: &Slot<User, String>) {
        self.updates.send_replace(state.snapshot());
    }
}
