use crate::{AccelError, AcceleratorBus, DeviceInfo, DeviceSignature, PowerRail};
use kestrel_actor::{Actor, ActorConfig, ActorError, Handler, Overflow};
use std::thread;
use std::time::Duration;
use tokio::sync::watch;

/// Attach machine states. Monotonic through the enumeration sequence;
/// `Error` is absorbing, and a detach returns to `Unattached` from any
/// state except `Error`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachState {
    Unattached,
    Attached,
    SetInterface,
    GetStatus,
    Connected,
    Error,
}

/// Events raised by the external bus host stack.
#[derive(Clone, Debug)]
pub enum BusEvent {
    /// A device appeared; carries its advertised identity.
    Attach(DeviceInfo),
    /// Bus-level enumeration of the claimed device finished.
    EnumerationDone,
    /// The device went away.
    Detach,
}

/// Requests serviced by the attach actor.
pub enum AccelRequest {
    BusEvent(BusEvent),
    /// Internal sequencing step; `seq` guards against completions of a
    /// canceled sequence re-entering after a detach.
    Advance { target: AttachState, seq: u32 },
    SetPower(bool),
    GetPower,
    RegisterObserver(Box<dyn FnOnce() + Send>),
}

/// Responses mirroring [`AccelRequest`] kinds.
pub enum AccelResponse {
    Event,
    Advance,
    Power { success: bool },
    PowerState { enabled: bool },
    Observer,
}

/// Configuration for the attach actor.
#[derive(Clone, Copy, Debug)]
pub struct AccelConfig {
    signature: DeviceSignature,
    mailbox_capacity: usize,
    settle: Duration,
    request_deadline: Duration,
}

impl Default for AccelConfig {
    fn default() -> Self {
        Self {
            signature: DeviceSignature {
                vendor_id: 0x18d1,
                product_id: 0x9302,
                class: 0xff,
                subclass: 0xff,
            },
            mailbox_capacity: 8,
            settle: Duration::from_millis(10),
            request_deadline: Duration::from_secs(1),
        }
    }
}

impl AccelConfig {
    /// Set the identity the actor will claim on attach events.
    pub fn with_signature(mut self, signature: DeviceSignature) -> Self {
        self.signature = signature;
        self
    }

    /// Set the actor mailbox capacity.
    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity;
        self
    }

    /// Set the delay between power-good and reset release.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Set the deadline applied to synchronous requests.
    pub fn with_request_deadline(mut self, deadline: Duration) -> Self {
        self.request_deadline = deadline;
        self
    }

    pub fn signature(&self) -> DeviceSignature {
        self.signature
    }

    pub fn settle(&self) -> Duration {
        self.settle
    }

    pub fn request_deadline(&self) -> Duration {
        self.request_deadline
    }
}

struct AttachHandler {
    me: Actor<AccelRequest, AccelResponse>,
    bus: Box<dyn AcceleratorBus>,
    rail: Box<dyn PowerRail>,
    signature: DeviceSignature,
    settle: Duration,
    state_tx: watch::Sender<AttachState>,
    claimed: Option<DeviceInfo>,
    /// Bumped whenever an in-flight sequence is canceled; completions
    /// carry the value they were issued under.
    seq: u32,
    powered: bool,
    observer: Option<Box<dyn FnOnce() + Send>>,
}

impl Handler<AccelRequest, AccelResponse> for AttachHandler {
    fn handle(&mut self, request: AccelRequest) -> AccelResponse {
        match request {
            AccelRequest::BusEvent(event) => self.handle_event(event),
            AccelRequest::Advance { target, seq } => self.handle_advance(target, seq),
            AccelRequest::SetPower(enable) => self.handle_power(enable),
            AccelRequest::GetPower => AccelResponse::PowerState {
                enabled: self.powered,
            },
            AccelRequest::RegisterObserver(f) => {
                // Last registration wins.
                self.observer = Some(f);
                AccelResponse::Observer
            }
        }
    }
}

impl AttachHandler {
    fn state(&self) -> AttachState {
        *self.state_tx.borrow()
    }

    fn set_state(&self, state: AttachState) {
        let _ = self.state_tx.send(state);
    }

    fn handle_event(&mut self, event: BusEvent) -> AccelResponse {
        if self.state() == AttachState::Error {
            log::warn!("bus event ignored: accelerator halted");
            return AccelResponse::Event;
        }
        match event {
            BusEvent::Attach(info) => {
                if self.signature.matches(&info) {
                    log::info!(
                        "accelerator {:04x}:{:04x} claimed",
                        info.vendor_id,
                        info.product_id
                    );
                    self.claimed = Some(info);
                } else {
                    // Not ours; leave the device unclaimed.
                    log::debug!(
                        "attach event {:04x}:{:04x} did not match, unclaimed",
                        info.vendor_id,
                        info.product_id
                    );
                }
            }
            BusEvent::EnumerationDone => {
                if self.claimed.is_some() {
                    self.advance(AttachState::Attached);
                } else {
                    log::debug!("enumeration done for unclaimed device");
                }
            }
            BusEvent::Detach => {
                log::info!("accelerator detached");
                self.claimed = None;
                // Cancel any in-flight enumeration step.
                self.seq = self.seq.wrapping_add(1);
                self.set_state(AttachState::Unattached);
            }
        }
        AccelResponse::Event
    }

    fn handle_advance(&mut self, target: AttachState, seq: u32) -> AccelResponse {
        if seq != self.seq {
            log::debug!("stale advance to {target:?} dropped");
            return AccelResponse::Advance;
        }
        if self.state() == AttachState::Error {
            log::warn!("advance to {target:?} refused: accelerator halted");
            return AccelResponse::Advance;
        }
        self.step(target);
        AccelResponse::Advance
    }

    fn step(&mut self, target: AttachState) {
        match target {
            AttachState::Unattached => {
                self.claimed = None;
                self.set_state(AttachState::Unattached);
            }
            AttachState::Attached => {
                self.set_state(AttachState::Attached);
                match self.bus.open_class() {
                    Ok(()) => self.advance(AttachState::SetInterface),
                    Err(e) => {
                        log::error!("class open failed: {e}");
                        self.advance(AttachState::Error);
                    }
                }
            }
            AttachState::SetInterface => {
                self.set_state(AttachState::SetInterface);
                let done = self.completion(AttachState::GetStatus, "interface select");
                if let Err(e) = self.bus.set_interface(done) {
                    log::error!("interface select submit failed: {e}");
                    self.advance(AttachState::Error);
                }
            }
            AttachState::GetStatus => {
                self.set_state(AttachState::GetStatus);
                let done = self.completion(AttachState::Connected, "status query");
                if let Err(e) = self.bus.get_status(done) {
                    log::error!("status query submit failed: {e}");
                    self.advance(AttachState::Error);
                }
            }
            AttachState::Connected => {
                self.set_state(AttachState::Connected);
                log::info!("accelerator connected");
                if let Some(notify) = self.observer.take() {
                    notify();
                }
            }
            AttachState::Error => {
                self.set_state(AttachState::Error);
                log::error!("attach sequence failed; accelerator halted until restart");
            }
        }
    }

    /// Build the completion for one async enumeration step: success moves
    /// to `next`, failure to `Error`, both by re-entering the mailbox.
    fn completion(&self, next: AttachState, what: &'static str) -> crate::BusCompletion {
        let me = self.me.clone();
        let seq = self.seq;
        Box::new(move |ok| {
            let target = if ok {
                next
            } else {
                log::error!("{what} failed");
                AttachState::Error
            };
            if let Err(e) = me.send(AccelRequest::Advance { target, seq }) {
                log::error!("completion enqueue failed: {e}");
            }
        })
    }

    fn advance(&self, target: AttachState) {
        if let Err(e) = self.me.send(AccelRequest::Advance {
            target,
            seq: self.seq,
        }) {
            log::error!("advance enqueue failed: {e}");
        }
    }

    fn handle_power(&mut self, enable: bool) -> AccelResponse {
        self.rail.set_rail(enable);
        if enable {
            // No overall deadline here: an unresponsive rail stalls this
            // actor indefinitely. Known risk, kept as-is.
            while !self.rail.power_good() {
                thread::yield_now();
            }
            thread::sleep(self.settle);
        }
        self.rail.set_reset(!enable);
        self.powered = enable;
        AccelResponse::Power { success: true }
    }
}

/// Handle to the accelerator attach actor.
#[derive(Clone)]
pub struct Accelerator {
    actor: Actor<AccelRequest, AccelResponse>,
    state_rx: watch::Receiver<AttachState>,
    deadline: Duration,
}

impl Accelerator {
    /// Spawn the attach actor around the bus and power-rail seams.
    pub fn new(
        config: AccelConfig,
        bus: Box<dyn AcceleratorBus>,
        rail: Box<dyn PowerRail>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(AttachState::Unattached);

        let actor_config = ActorConfig::default()
            .with_capacity(config.mailbox_capacity)
            .with_overflow(Overflow::Block(config.request_deadline));

        let actor = Actor::spawn("accel-attach", actor_config, move |me| AttachHandler {
            me,
            bus,
            rail,
            signature: config.signature,
            settle: config.settle,
            state_tx,
            claimed: None,
            seq: 0,
            powered: false,
            observer: None,
        });

        Self {
            actor,
            state_rx,
            deadline: config.request_deadline,
        }
    }

    /// Feed a host-stack event into the machine. Non-blocking; safe from
    /// completion-interrupt context.
    pub fn bus_event(&self, event: BusEvent) -> Result<(), AccelError> {
        self.actor.send(AccelRequest::BusEvent(event))?;
        Ok(())
    }

    /// Power the rail up or down. On enable this waits for power-good
    /// (with no overall deadline), settles, then releases reset.
    pub async fn set_power(&self, enable: bool) -> Result<(), AccelError> {
        match self
            .actor
            .call(AccelRequest::SetPower(enable), self.deadline)
            .await?
        {
            AccelResponse::Power { success: true } => Ok(()),
            _ => Err(AccelError::Bus("power request rejected".to_string())),
        }
    }

    pub async fn power_enabled(&self) -> Result<bool, AccelError> {
        match self.actor.call(AccelRequest::GetPower, self.deadline).await? {
            AccelResponse::PowerState { enabled } => Ok(enabled),
            _ => Err(AccelError::Bus("response kind mismatch".to_string())),
        }
    }

    /// Register the (single) observer notified when the machine reaches
    /// `Connected`. A later registration replaces an earlier one.
    pub fn on_connected(&self, notify: impl FnOnce() + Send + 'static) -> Result<(), AccelError> {
        self.actor
            .send(AccelRequest::RegisterObserver(Box::new(notify)))?;
        Ok(())
    }

    /// Current machine state. Async failures surface only here (plus a
    /// log line); there is no error callback.
    pub fn state(&self) -> AttachState {
        *self.state_rx.borrow()
    }

    /// Wait until the machine reaches `target`, up to `deadline`.
    pub async fn wait_for(
        &self,
        target: AttachState,
        deadline: Duration,
    ) -> Result<(), AccelError> {
        let mut rx = self.state_rx.clone();
        // Error is absorbing; waiting for anything else would only run out
        // the deadline.
        if *rx.borrow() == AttachState::Error && target != AttachState::Error {
            return Err(AccelError::Halted);
        }
        match tokio::time::timeout(deadline, rx.wait_for(|s| *s == target)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(AccelError::Actor(ActorError::WorkerGone)),
            Err(_) => Err(AccelError::Actor(ActorError::Timeout)),
        }
    }
}
