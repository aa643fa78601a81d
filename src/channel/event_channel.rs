use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::messages::{ChannelMessage, KIND_CONNECTED, KIND_DISCONNECTED, KIND_ERROR};
use super::transport::{ChannelError, Transport};

/// Token identifying one registered handler, used to deregister it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerId(u64);

type Handler = Box<dyn Fn(&ChannelMessage) -> anyhow::Result<()> + Send + Sync>;

type Registry = HashMap<String, Vec<(HandlerId, Handler)>>;

/// Publish/subscribe wrapper over one bidirectional transport, typed by the
/// message-kind field.
///
/// Dispatch contract: each inbound frame is decoded and routed to every
/// handler registered for its kind, in registration order; a failing handler
/// is logged and does not stop the rest; unregistered kinds are dropped
/// silently. The lifecycle kinds `connected`/`disconnected`/`error` go
/// through the same registry.
///
/// Sending is best-effort by design: a send while disconnected is silently
/// dropped, never queued or retried, and a dropped send is never reported as
/// delivered. The channel does not reconnect; after a transport failure the
/// caller decides whether to connect again.
///
/// Handlers run on the dispatch task and must not mutate channel state.
pub struct EventChannel {
    registry: Arc<Mutex<Registry>>,
    connected: Arc<AtomicBool>,
    outbound_tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
    dispatch_task: Option<JoinHandle<()>>,
    next_id: u64,
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl EventChannel {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::new())),
            connected: Arc::new(AtomicBool::new(false)),
            outbound_tx: None,
            dispatch_task: None,
            next_id: 0,
        }
    }

    /// Open the channel over the given transport.
    ///
    /// Exactly one connection is live per channel; connecting while
    /// connected fails with [`ChannelError::AlreadyConnected`]. The
    /// `connected` lifecycle kind is dispatched once the dispatch loop is
    /// running.
    pub fn connect<T: Transport + 'static>(&mut self, transport: T) -> Result<(), ChannelError> {
        if self.connected.load(Ordering::SeqCst) {
            return Err(ChannelError::AlreadyConnected);
        }
        // A previous connection that the remote side closed leaves a
        // finished task behind; detach it.
        let _ = self.dispatch_task.take();

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        self.connected.store(true, Ordering::SeqCst);
        self.outbound_tx = Some(outbound_tx);

        let registry = Arc::clone(&self.registry);
        let connected = Arc::clone(&self.connected);
        self.dispatch_task = Some(tokio::spawn(dispatch_loop(
            transport, outbound_rx, registry, connected,
        )));

        info!("event channel connected");
        Ok(())
    }

    /// Transmit `{ "type": kind, ...payload }` if the connection is open;
    /// otherwise drop the frame silently. `payload` must be a JSON object.
    pub fn send(&self, kind: &str, payload: serde_json::Value) {
        if !self.connected.load(Ordering::SeqCst) {
            debug!(kind, "send dropped: channel not connected");
            return;
        }
        let Some(outbound) = &self.outbound_tx else {
            debug!(kind, "send dropped: channel not connected");
            return;
        };

        match serde_json::to_vec(&ChannelMessage::new(kind, payload)) {
            Ok(frame) => {
                if outbound.send(frame).is_err() {
                    debug!(kind, "send dropped: dispatch loop ended");
                }
            }
            Err(e) => warn!(kind, "send dropped: unencodable payload: {e}"),
        }
    }

    /// Register a handler for a kind. Handlers for the same kind run in
    /// registration order.
    pub fn on<F>(&mut self, kind: &str, handler: F) -> HandlerId
    where
        F: Fn(&ChannelMessage) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_id);
        self.next_id += 1;

        let mut registry = lock_registry(&self.registry);
        registry
            .entry(kind.to_string())
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Deregister one handler. Returns whether it was registered.
    pub fn off(&mut self, kind: &str, id: HandlerId) -> bool {
        let mut registry = lock_registry(&self.registry);
        let Some(handlers) = registry.get_mut(kind) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(registered, _)| *registered != id);
        handlers.len() != before
    }

    /// Close the transport and stop dispatch.
    ///
    /// No handler is invoked after this returns. Idempotent.
    pub async fn disconnect(&mut self) {
        self.connected.store(false, Ordering::SeqCst);
        // Dropping the sender makes the dispatch loop close the transport
        // and exit.
        self.outbound_tx = None;
        if let Some(task) = self.dispatch_task.take() {
            if let Err(e) = task.await {
                warn!("dispatch task failed: {e}");
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

async fn dispatch_loop<T: Transport>(
    mut transport: T,
    mut outbound_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    registry: Arc<Mutex<Registry>>,
    connected: Arc<AtomicBool>,
) {
    dispatch(&registry, &lifecycle(KIND_CONNECTED));

    loop {
        tokio::select! {
            inbound = transport.recv() => {
                match inbound {
                    Some(frame) => match serde_json::from_slice::<ChannelMessage>(&frame) {
                        Ok(message) => dispatch(&registry, &message),
                        Err(e) => {
                            warn!("dropping undecodable frame: {e}");
                            dispatch(
                                &registry,
                                &ChannelMessage::new(
                                    KIND_ERROR,
                                    json!({ "message": format!("undecodable frame: {e}") }),
                                ),
                            );
                        }
                    },
                    None => {
                        // Remote close.
                        connected.store(false, Ordering::SeqCst);
                        dispatch(&registry, &lifecycle(KIND_DISCONNECTED));
                        break;
                    }
                }
            }
            outbound = outbound_rx.recv() => {
                match outbound {
                    Some(frame) => {
                        if let Err(e) = transport.send(frame).await {
                            warn!("transport send failed: {e}");
                            dispatch(
                                &registry,
                                &ChannelMessage::new(
                                    KIND_ERROR,
                                    json!({ "message": e.to_string() }),
                                ),
                            );
                        }
                    }
                    None => {
                        // Local disconnect.
                        transport.close().await;
                        connected.store(false, Ordering::SeqCst);
                        dispatch(&registry, &lifecycle(KIND_DISCONNECTED));
                        break;
                    }
                }
            }
        }
    }

    debug!("dispatch loop ended");
}

fn dispatch(registry: &Mutex<Registry>, message: &ChannelMessage) {
    let registry = lock_registry(registry);
    let Some(handlers) = registry.get(&message.kind) else {
        debug!(kind = %message.kind, "no handler registered; dropping message");
        return;
    };

    for (id, handler) in handlers {
        if let Err(e) = handler(message) {
            warn!(kind = %message.kind, handler = id.0, "handler failed: {e}");
        }
    }
}

fn lifecycle(kind: &str) -> ChannelMessage {
    ChannelMessage::new(kind, json!({}))
}

fn lock_registry(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    match registry.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
