//! Shared hub state.
//!
//! The [`Hub`] is the one value every connection task shares: the live
//! session registry, the persistence collaborator and the session limits.

mod registry;
mod session;

pub use registry::{Delivery, SessionRegistry};
pub use session::{DeliveryError, Session, SessionHandle, SessionId, ShutdownReason};

use std::sync::Arc;

use crate::config::LimitsConfig;
use crate::store::Store;

/// State shared by all connections.
pub struct Hub {
    pub registry: SessionRegistry,
    pub store: Arc<dyn Store>,
    pub limits: LimitsConfig,
}

impl Hub {
    pub fn new(store: Arc<dyn Store>, limits: LimitsConfig) -> Self {
        crate::metrics::set_send_queue_capacity(limits.send_queue);
        Self {
            registry: SessionRegistry::new(),
            store,
            limits,
        }
    }

    /// Create a session for an authenticated user, sized from the limits.
    pub fn new_session(&self, username: &str) -> Session {
        Session::new(username, self.limits.send_queue)
    }
}
