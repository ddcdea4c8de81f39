//! Process-wide registry of live sessions, keyed by username.
//!
//! # Thread Safety
//!
//! Backed by a `DashMap`; every operation is a short shard-locked section
//! and no guard is ever held across an `.await` or a transport write.
//! Handles are cloned out before anything is sent to them.

use dashmap::DashMap;
use relay_proto::ServerMessage;
use tracing::{debug, warn};

use super::session::{DeliveryError, SessionHandle, SessionId};

/// Outcome of routing one message to a username.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued on the recipient's session.
    Delivered,
    /// No live session for the recipient; the message is discarded.
    Offline,
    /// The recipient is online but the frame could not be queued.
    Dropped(DeliveryError),
}

/// Username -> live session mapping. At most one session per username.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, SessionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` under its username, overwriting any prior entry.
    ///
    /// Returns the displaced handle, if there was one. The caller decides
    /// what happens to it.
    pub fn add(&self, handle: SessionHandle) -> Option<SessionHandle> {
        let displaced = self.sessions.insert(handle.username().to_string(), handle);
        self.record_size();
        displaced
    }

    /// Remove whatever session is registered for `username`.
    ///
    /// Idempotent: an absent username is a no-op.
    pub fn remove(&self, username: &str) -> Option<SessionHandle> {
        let removed = self.sessions.remove(username).map(|(_, h)| h);
        if removed.is_some() {
            self.record_size();
        }
        removed
    }

    /// Remove the entry for `username` only if it is still session `id`.
    ///
    /// Teardown uses this so a displaced session never evicts the login
    /// that replaced it. Idempotent.
    pub fn remove_session(&self, username: &str, id: SessionId) -> bool {
        let removed = self
            .sessions
            .remove_if(username, |_, h| h.id() == id)
            .is_some();
        if removed {
            self.record_size();
        }
        removed
    }

    /// Current session for `username`, if online.
    pub fn lookup(&self, username: &str) -> Option<SessionHandle> {
        self.sessions.get(username).map(|e| e.value().clone())
    }

    pub fn contains(&self, username: &str) -> bool {
        self.sessions.contains_key(username)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Snapshot of online usernames, sorted.
    pub fn usernames(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Encode `message` and queue it for `username`.
    ///
    /// Never waits on the recipient: offline recipients and full queues
    /// both drop the message.
    pub fn deliver(&self, username: &str, message: &ServerMessage) -> Delivery {
        let Some(handle) = self.lookup(username) else {
            debug!(recipient = %username, kind = message.kind(), "Recipient offline, dropping");
            return Delivery::Offline;
        };

        match handle.enqueue(message.encode()) {
            Ok(()) => Delivery::Delivered,
            Err(e) => {
                warn!(
                    recipient = %username,
                    session = %handle.id(),
                    kind = message.kind(),
                    error = %e,
                    "Outbound message dropped"
                );
                crate::metrics::record_dropped(e.code());
                Delivery::Dropped(e)
            }
        }
    }

    /// Ask every live session to stop.
    pub fn shutdown_all(&self, reason: super::ShutdownReason) {
        // Snapshot first; cancelled tasks deregister themselves.
        let handles: Vec<SessionHandle> = self.sessions.iter().map(|e| e.value().clone()).collect();
        for handle in handles {
            handle.shutdown(reason);
        }
    }

    fn record_size(&self) {
        crate::metrics::set_connected_sessions(self.sessions.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Session, ShutdownReason};

    fn chat(from: &str, text: &str) -> ServerMessage {
        ServerMessage::Message {
            username: from.into(),
            content: text.into(),
        }
    }

    #[test]
    fn add_overwrites_and_returns_displaced() {
        let registry = SessionRegistry::new();
        let first = Session::new("alice", 4);
        let second = Session::new("alice", 4);

        assert!(registry.add(first.handle().clone()).is_none());
        let displaced = registry.add(second.handle().clone()).unwrap();

        assert_eq!(displaced.id(), first.handle().id());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("alice").unwrap().id(), second.handle().id());
    }

    #[test]
    fn remove_is_idempotent() {
        let registry = SessionRegistry::new();
        assert!(registry.remove("nobody").is_none());

        let s = Session::new("alice", 4);
        registry.add(s.handle().clone());
        assert!(registry.remove("alice").is_some());
        assert!(registry.remove("alice").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn stale_session_cannot_evict_replacement() {
        let registry = SessionRegistry::new();
        let old = Session::new("alice", 4);
        let new = Session::new("alice", 4);
        registry.add(old.handle().clone());
        registry.add(new.handle().clone());

        assert!(!registry.remove_session("alice", old.handle().id()));
        assert!(registry.contains("alice"));
        assert!(registry.remove_session("alice", new.handle().id()));
        assert!(!registry.remove_session("alice", new.handle().id()));
    }

    #[test]
    fn deliver_to_offline_user() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.deliver("bob", &chat("alice", "hi")), Delivery::Offline);
    }

    #[tokio::test]
    async fn deliver_reaches_only_the_recipient() {
        let registry = SessionRegistry::new();
        let (bob, mut bob_rx) = Session::new("bob", 4).into_parts();
        let (carol, mut carol_rx) = Session::new("carol", 4).into_parts();
        registry.add(bob);
        registry.add(carol);

        assert_eq!(registry.deliver("bob", &chat("alice", "hi")), Delivery::Delivered);
        assert_eq!(
            bob_rx.recv().await.unwrap(),
            r#"{"type":"message","data":{"username":"alice","content":"hi"}}"#
        );
        assert!(carol_rx.try_recv().is_err());
    }

    #[test]
    fn full_queue_is_reported_as_dropped() {
        let registry = SessionRegistry::new();
        let (bob, _rx) = Session::new("bob", 1).into_parts();
        registry.add(bob);

        assert_eq!(registry.deliver("bob", &chat("a", "1")), Delivery::Delivered);
        assert_eq!(
            registry.deliver("bob", &chat("a", "2")),
            Delivery::Dropped(DeliveryError::QueueFull)
        );
    }

    #[test]
    fn shutdown_all_cancels_every_session() {
        let registry = SessionRegistry::new();
        let a = Session::new("a", 1);
        let b = Session::new("b", 1);
        registry.add(a.handle().clone());
        registry.add(b.handle().clone());

        registry.shutdown_all(ShutdownReason::ServerShutdown);
        assert!(a.handle().is_shut_down());
        assert_eq!(b.handle().shutdown_reason(), Some(ShutdownReason::ServerShutdown));
        assert_eq!(registry.usernames(), vec!["a", "b"]);
    }

    #[test]
    fn concurrent_registration_keeps_one_entry_per_user() {
        let registry = std::sync::Arc::new(SessionRegistry::new());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let registry = std::sync::Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let s = Session::new("alice", 1);
                        registry.add(s.handle().clone());
                        registry.remove_session("alice", s.handle().id());
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert!(registry.len() <= 1);
    }
}
