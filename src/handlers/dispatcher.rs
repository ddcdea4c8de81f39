//! Applies planned effects: store mutation first, then notification.

use relay_proto::ClientMessage;
use std::sync::Arc;
use tracing::{Instrument, Level, debug, span};

use super::plan::{Mutation, Plan, plan};
use crate::error::{HandlerError, HandlerResult};
use crate::network::Frame;
use crate::state::{Delivery, Hub};
use crate::telemetry::DispatchTimer;

/// Routes decoded messages from one acting user.
///
/// Cheap to clone; every session's reader holds one.
#[derive(Clone)]
pub struct Dispatcher {
    hub: Arc<Hub>,
}

impl Dispatcher {
    pub fn new(hub: Arc<Hub>) -> Self {
        Self { hub }
    }

    /// Decode one inbound frame and dispatch it.
    ///
    /// Every error is scoped to this frame; the caller logs and continues.
    pub async fn handle_frame(&self, acting: &str, frame: &Frame) -> HandlerResult {
        let decoded = match frame {
            Frame::Text(text) => ClientMessage::decode(text),
            Frame::Binary(bytes) => ClientMessage::decode_bytes(bytes),
        };

        let message = match decoded {
            Ok(m) => m,
            Err(e) => {
                crate::metrics::record_frame("invalid");
                crate::metrics::record_dispatch_error(e.code());
                debug!(username = %acting, error = %e, "Discarding undecodable frame");
                return Err(e.into());
            }
        };

        self.dispatch(acting, message).await.map(|_| ())
    }

    /// Apply the effects of one decoded message.
    ///
    /// Returns the delivery outcome of the notification, if the message
    /// produces one.
    pub async fn dispatch(
        &self,
        acting: &str,
        message: ClientMessage,
    ) -> Result<Option<Delivery>, HandlerError> {
        let kind = message.kind();
        crate::metrics::record_frame(kind);
        let _timer = DispatchTimer::new(kind);

        let dispatch_span = span!(
            Level::DEBUG,
            "relay.dispatch",
            kind = kind,
            username = %acting,
            target = %message.target(),
        );

        let result = self.apply(plan(acting, message)).instrument(dispatch_span).await;

        if let Err(ref e) = result {
            crate::metrics::record_dispatch_error(e.error_code());
            debug!(kind = kind, username = %acting, error = %e, "Dispatch failed");
        }

        result
    }

    async fn apply(&self, plan: Plan) -> Result<Option<Delivery>, HandlerError> {
        if let Some(mutation) = plan.mutation {
            let store = &self.hub.store;
            match mutation {
                Mutation::AddEdge { owner, friend } => store.add_friend_edge(&owner, &friend).await?,
                Mutation::RemoveEdge { owner, friend } => {
                    store.remove_friend_edge(&owner, &friend).await?
                }
            }
        }

        Ok(plan
            .notify
            .map(|n| self.hub.registry.deliver(&n.recipient, &n.message)))
    }
}
