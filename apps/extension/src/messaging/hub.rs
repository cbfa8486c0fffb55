//! Message hub: delivers envelopes to listeners and routes each reply back to its caller.
//!
//! Lifecycle of one request:
//! 1. Received: the envelope arrives on the hub's inbox with a fresh reply channel.
//! 2. Dispatched: the first listener whose `accepts` matches the action owns it.
//!    If none does, the request is ignored and the caller sees `NoResponse`.
//! 3. Pending: the listener runs on its own task, so slow requests never
//!    hold up the ones behind them.
//! 4. Resolved: the `Response` goes back over a oneshot channel, which can
//!    only ever be completed once.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use super::{Envelope, Request, Response, TabId};

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Receiving end does not exist")]
    Disconnected,

    #[error("No response received for {action}")]
    NoResponse { action: &'static str },

    #[error("Could not establish connection to tab {tab}: no content agent is attached")]
    NoReceiver { tab: TabId },
}

/// A party that answers messages on a hub.
///
/// `handle` returns a `Response`, never a `Result`: failures must be turned
/// into `Response::Error` by the listener so nothing escapes the agent.
#[async_trait]
pub trait Listener: Send + Sync {
    fn name(&self) -> &'static str;

    fn accepts(&self, request: &Request) -> bool;

    async fn handle(&self, request: Request) -> Response;
}

struct Delivery {
    envelope: Envelope,
    reply: oneshot::Sender<Response>,
}

/// Cloneable sending side of a hub.
#[derive(Debug, Clone)]
pub struct AgentHandle {
    tx: mpsc::Sender<Delivery>,
}

impl AgentHandle {
    /// Sends a request and waits for its reply.
    pub async fn send(&self, request: Request) -> Result<Response, MessagingError> {
        let envelope = Envelope::new(request);
        let id = envelope.id;
        let action = envelope.request.action();
        let (reply, response) = oneshot::channel();

        self.tx
            .send(Delivery { envelope, reply })
            .await
            .map_err(|_| MessagingError::Disconnected)?;
        trace!(%id, action, "message sent");

        response
            .await
            .map_err(|_| MessagingError::NoResponse { action })
    }
}

/// Builder for a hub: register listeners, then `spawn` it onto the runtime.
pub struct MessageHub {
    listeners: Vec<Arc<dyn Listener>>,
    capacity: usize,
}

impl Default for MessageHub {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageHub {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            capacity: DEFAULT_CAPACITY,
        }
    }

    pub fn with_listener(mut self, listener: impl Listener + 'static) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn with_shared_listener(mut self, listener: Arc<dyn Listener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Starts the dispatch loop. Must be called from within a tokio runtime.
    /// The loop ends once every handle has been dropped.
    pub fn spawn(self) -> AgentHandle {
        let (tx, rx) = mpsc::channel(self.capacity);
        tokio::spawn(dispatch_loop(self.listeners, rx));
        AgentHandle { tx }
    }
}

async fn dispatch_loop(listeners: Vec<Arc<dyn Listener>>, mut inbox: mpsc::Receiver<Delivery>) {
    while let Some(Delivery { envelope, reply }) = inbox.recv().await {
        let Envelope { id, request } = envelope;
        let action = request.action();

        let Some(listener) = listeners.iter().find(|l| l.accepts(&request)).cloned() else {
            debug!(%id, action, "no listener owns this action, ignoring");
            continue;
        };
        debug!(%id, action, listener = listener.name(), "dispatched");

        tokio::spawn(async move {
            let response = listener.handle(request).await;
            if reply.send(response).is_err() {
                debug!(%id, action, "caller went away before the reply");
            }
        });
    }
    debug!("message hub closed");
}
