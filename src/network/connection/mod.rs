//! Connection - supervises one client session end to end.
//!
//! ```text
//!  authenticate ──fail──▶ close 1008 "Invalid username or password"
//!       │ ok
//!       ▼
//!  register (displaces any older login for the username)
//!       │
//!       ├──spawn──▶ pump:   queue ──▶ FrameSink       (own task)
//!       │
//!       ▼
//!  reader: FrameSource ──▶ Dispatcher               (this task)
//!       │ peer close / read error / shutdown
//!       ▼
//!  teardown: compare-and-remove, cancel, await pump
//! ```
//!
//! Teardown is a drop guard armed right after registration, so it also
//! runs when dispatch panics or the supervisor future is dropped. It is
//! idempotent, so it is safe whether the reader or the pump notices the
//! end first.

mod pump;
mod reader;

pub use pump::PumpExit;
pub use reader::ReadExit;

use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, warn};

use crate::error::AuthError;
use crate::handlers::Dispatcher;
use crate::network::transport::{CLOSE_POLICY, FrameSink, FrameSource};
use crate::security::{dummy_verify, verify_password};
use crate::state::{Hub, SessionHandle, ShutdownReason};
use crate::store::{StoreError, User};

/// Credentials presented at handshake time.
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How an authenticated session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEnd {
    pub reader: ReadExit,
    pub pump: Option<PumpExit>,
    pub reason: Option<ShutdownReason>,
}

/// A client connection supervisor.
pub struct Connection {
    hub: Arc<Hub>,
    dispatcher: Dispatcher,
    credentials: Credentials,
}

impl Connection {
    pub fn new(hub: Arc<Hub>, credentials: Credentials) -> Self {
        let dispatcher = Dispatcher::new(Arc::clone(&hub));
        Self {
            hub,
            dispatcher,
            credentials,
        }
    }

    /// Run the session lifecycle over an accepted transport.
    ///
    /// Returns once the session has ended and been deregistered. An
    /// `Err` means authentication failed and no session was created.
    pub async fn run<Src, Snk>(self, mut source: Src, mut sink: Snk) -> Result<SessionEnd, AuthError>
    where
        Src: FrameSource,
        Snk: FrameSink + 'static,
    {
        let user = match authenticate(&self.hub, &self.credentials).await {
            Ok(user) => user,
            Err(e) => {
                crate::metrics::record_auth_failure();
                info!(
                    username = %self.credentials.username,
                    code = e.error_code(),
                    "Authentication failed"
                );
                if let Err(close_err) = sink.close(CLOSE_POLICY, e.close_reason()).await {
                    debug!(error = %close_err, "Failed to send auth close frame");
                }
                return Err(e);
            }
        };

        let (handle, queue) = self.hub.new_session(&user.username).into_parts();
        let span = crate::telemetry::spans::session(handle.username(), &handle.id().to_string());

        let end = async {
            if let Some(displaced) = self.hub.registry.add(handle.clone()) {
                info!(displaced = %displaced.id(), "Displacing older session");
                displaced.shutdown(ShutdownReason::Displaced);
            }
            let mut teardown = Teardown {
                hub: Arc::clone(&self.hub),
                handle: handle.clone(),
                pump: None,
            };
            info!(online = self.hub.registry.len(), "Session registered");

            teardown.pump = Some(tokio::spawn(
                pump::run(Arc::clone(&self.hub), handle.clone(), queue, sink).in_current_span(),
            ));

            let reader = reader::run(&self.dispatcher, &handle, &mut source).await;
            let pump = teardown.finish().await;

            let end = SessionEnd {
                reader,
                pump,
                reason: handle.shutdown_reason(),
            };
            info!(reader = ?end.reader, reason = ?end.reason, "Session closed");
            end
        }
        .instrument(span)
        .await;

        Ok(end)
    }
}

/// Deregisters and cancels a session when dropped.
///
/// Runs on every exit from the session body, including a panic in
/// dispatch or the supervisor future being dropped. The registry entry
/// may already belong to a newer login, hence compare-and-remove.
struct Teardown {
    hub: Arc<Hub>,
    handle: SessionHandle,
    pump: Option<JoinHandle<PumpExit>>,
}

impl Teardown {
    /// Tear down now and wait for the pump to send its close frame.
    async fn finish(mut self) -> Option<PumpExit> {
        self.release();
        let pump = self.pump.take()?;
        match pump.await {
            Ok(exit) => Some(exit),
            Err(e) => {
                warn!(error = %e, "Pump task failed");
                None
            }
        }
    }

    fn release(&self) {
        self.hub
            .registry
            .remove_session(self.handle.username(), self.handle.id());
        self.handle.shutdown(ShutdownReason::ReaderEnded);
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        // Idempotent; after `finish` this is a no-op. The cancelled pump
        // closes the transport on its own.
        self.release();
    }
}

/// Check credentials against the store.
///
/// Unknown usernames still pay for one hash verification so response
/// timing does not reveal which names exist.
async fn authenticate(hub: &Hub, credentials: &Credentials) -> Result<User, AuthError> {
    match hub.store.get_user(&credentials.username).await {
        Ok(user) => {
            if verify_password(&credentials.password, &user.password_hash) {
                Ok(user)
            } else {
                Err(AuthError::BadPassword(credentials.username.clone()))
            }
        }
        Err(StoreError::NotFound(_)) => {
            dummy_verify(&credentials.password);
            Err(AuthError::UnknownUser(credentials.username.clone()))
        }
        Err(e) => Err(AuthError::Store(e)),
    }
}
