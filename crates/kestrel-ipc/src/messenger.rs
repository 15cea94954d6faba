use crate::{CoreId, CoreMessage, CoreTransport, GateGuard, HardwareGate, IpcError, MessageTag, SystemTag};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

type AppHandler = Box<dyn Fn(CoreMessage) + Send>;

struct Inner {
    core: CoreId,
    gate: Arc<dyn HardwareGate>,
    transport: Arc<dyn CoreTransport>,
    app_handler: Mutex<Option<AppHandler>>,
    peer_ready: AtomicBool,
    bound: AtomicBool,
}

/// One core's endpoint of the two-core message channel.
///
/// Lives for the process lifetime; clones share the endpoint.
#[derive(Clone)]
pub struct Messenger {
    inner: Arc<Inner>,
}

impl Messenger {
    pub fn new(
        core: CoreId,
        gate: Arc<dyn HardwareGate>,
        transport: Arc<dyn CoreTransport>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                core,
                gate,
                transport,
                app_handler: Mutex::new(None),
                peer_ready: AtomicBool::new(false),
                bound: AtomicBool::new(false),
            }),
        }
    }

    /// Bind the receive path. Idempotent; only the first call spawns the
    /// receive worker.
    pub fn init(&self) {
        if self.inner.bound.swap(true, Ordering::SeqCst) {
            return;
        }
        let inner = self.inner.clone();
        let name = format!("ipc-rx-{:?}", self.inner.core);
        thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                log::debug!("{name} bound");
                loop {
                    inner.transport.wait();
                    inner.drain();
                }
            })
            .unwrap_or_else(|e| panic!("failed to spawn ipc receive worker: {e}"));
    }

    /// Install the application-level message handler. Exactly one is
    /// active; a later registration replaces an earlier one.
    pub fn register_app_handler(&self, handler: impl Fn(CoreMessage) + Send + 'static) {
        let mut slot = self
            .inner
            .app_handler
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *slot = Some(Box::new(handler));
    }

    /// Write into the peer core's mailbox and ring its doorbell.
    /// Delivery to the peer's handler is FIFO per sender.
    pub fn send(&self, msg: CoreMessage) -> Result<(), IpcError> {
        {
            let _gate = GateGuard::new(&*self.inner.gate, self.inner.core);
            self.inner.transport.push(msg)?;
        }
        self.inner.transport.ring();
        Ok(())
    }

    /// Tell the peer this core is up and accepting messages.
    pub fn announce_ready(&self) -> Result<(), IpcError> {
        self.send(CoreMessage::system(SystemTag::PeerReady))
    }

    /// True once the peer has announced itself.
    pub fn peer_ready(&self) -> bool {
        self.inner.peer_ready.load(Ordering::SeqCst)
    }

    pub fn core(&self) -> CoreId {
        self.inner.core
    }
}

impl Inner {
    /// Empty the local mailbox, holding the gate only per message.
    fn drain(&self) {
        loop {
            let msg = {
                let _gate = GateGuard::new(&*self.gate, self.core);
                self.transport.pop()
            };
            match msg {
                Some(msg) => self.dispatch(msg),
                None => break,
            }
        }
    }

    fn dispatch(&self, msg: CoreMessage) {
        match msg.tag {
            MessageTag::System(SystemTag::PeerReady) => {
                log::info!("peer core ready");
                self.peer_ready.store(true, Ordering::SeqCst);
            }
            MessageTag::System(SystemTag::ConsoleLine) => {
                let end = msg
                    .payload
                    .iter()
                    .position(|&b| b == 0)
                    .unwrap_or(msg.payload.len());
                log::info!("peer console: {}", String::from_utf8_lossy(&msg.payload[..end]));
            }
            MessageTag::App(_) => {
                let handler = self.app_handler.lock().unwrap_or_else(|e| e.into_inner());
                match handler.as_ref() {
                    Some(f) => f(msg),
                    None => log::debug!("app message dropped: no handler registered"),
                }
            }
        }
    }
}
