// Shared fakes for the integration tests: a scripted capture device and an
// in-memory duplex transport.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use signstream::{AudioChunk, CaptureConstraints, CaptureDevice, CaptureError, ChannelError, Transport};

/// Shared observation counters for a [`ScriptedDevice`].
#[derive(Clone, Default)]
pub struct DeviceCounters {
    pub acquires: Arc<AtomicUsize>,
    pub releases: Arc<AtomicUsize>,
    pub constraints: Arc<Mutex<Vec<CaptureConstraints>>>,
    feed: Arc<Mutex<Option<mpsc::Sender<AudioChunk>>>>,
}

impl DeviceCounters {
    pub fn acquires(&self) -> usize {
        self.acquires.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// End chunk delivery as the device would on its own (hardware fault,
    /// revoked permission). The device stays held; only the feed closes.
    pub fn end_delivery(&self) {
        self.feed.lock().unwrap().take();
    }
}

/// Capture device fake that queues a scripted set of chunks on acquire and
/// ends delivery on release. Panics on a double acquire so a missing release
/// fails the test loudly.
pub struct ScriptedDevice {
    chunks: Vec<Vec<u8>>,
    fail_first_acquire: bool,
    held: bool,
    counters: DeviceCounters,
}

impl ScriptedDevice {
    pub fn new(chunks: Vec<Vec<u8>>) -> (Self, DeviceCounters) {
        let counters = DeviceCounters::default();
        (
            Self {
                chunks,
                fail_first_acquire: false,
                held: false,
                counters: counters.clone(),
            },
            counters,
        )
    }

    /// Make the first acquire fail with `CaptureError::Unavailable`;
    /// subsequent acquires succeed.
    pub fn failing_first(chunks: Vec<Vec<u8>>) -> (Self, DeviceCounters) {
        let (mut device, counters) = Self::new(chunks);
        device.fail_first_acquire = true;
        (device, counters)
    }
}

#[async_trait]
impl CaptureDevice for ScriptedDevice {
    async fn acquire(
        &mut self,
        constraints: &CaptureConstraints,
    ) -> Result<mpsc::Receiver<AudioChunk>, CaptureError> {
        self.counters
            .constraints
            .lock()
            .unwrap()
            .push(constraints.clone());

        if self.fail_first_acquire {
            self.fail_first_acquire = false;
            return Err(CaptureError::Unavailable("permission denied".to_string()));
        }

        assert!(!self.held, "device acquired while already held");
        self.held = true;
        self.counters.acquires.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(self.chunks.len() + 1);
        for chunk in &self.chunks {
            tx.try_send(AudioChunk::new(chunk.clone()))
                .expect("scripted chunk queue overflow");
        }
        *self.counters.feed.lock().unwrap() = Some(tx);

        Ok(rx)
    }

    async fn release(&mut self) -> Result<(), CaptureError> {
        if self.held {
            self.held = false;
            self.counters.feed.lock().unwrap().take();
            self.counters.releases.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_held(&self) -> bool {
        self.held
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

impl Drop for ScriptedDevice {
    // A still-held device gives back the hardware when dropped.
    fn drop(&mut self) {
        if self.held {
            self.held = false;
            self.counters.feed.lock().unwrap().take();
            self.counters.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Other end of a [`DuplexTransport`].
pub struct TransportPeer {
    /// Frames pushed here arrive at the channel as inbound messages.
    pub to_channel: mpsc::UnboundedSender<Vec<u8>>,
    /// Frames the channel transmitted.
    pub from_channel: mpsc::UnboundedReceiver<Vec<u8>>,
}

/// In-memory bidirectional transport for event channel tests.
pub struct DuplexTransport {
    inbound_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    outbound_tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
}

pub fn duplex_transport() -> (DuplexTransport, TransportPeer) {
    let (to_channel, inbound_rx) = mpsc::unbounded_channel();
    let (outbound_tx, from_channel) = mpsc::unbounded_channel();

    (
        DuplexTransport {
            inbound_rx,
            outbound_tx: Some(outbound_tx),
        },
        TransportPeer {
            to_channel,
            from_channel,
        },
    )
}

#[async_trait]
impl Transport for DuplexTransport {
    async fn send(&mut self, frame: Vec<u8>) -> Result<(), ChannelError> {
        let tx = self
            .outbound_tx
            .as_ref()
            .ok_or_else(|| ChannelError::Transport("closed".to_string()))?;
        tx.send(frame)
            .map_err(|_| ChannelError::Transport("peer gone".to_string()))
    }

    async fn recv(&mut self) -> Option<Vec<u8>> {
        self.inbound_rx.recv().await
    }

    async fn close(&mut self) {
        self.outbound_tx = None;
        self.inbound_rx.close();
    }
}
