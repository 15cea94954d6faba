use kestrel_accel::{
    AccelConfig, Accelerator, AcceleratorBus, AttachState, BusCompletion, BusEvent, DeviceInfo,
    DeviceSignature, InterfaceDesc, PowerRail,
};
use kestrel_accel::AccelError;
use kestrel_actor::ActorError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SIG: DeviceSignature = DeviceSignature {
    vendor_id: 0x18d1,
    product_id: 0x9302,
    class: 0xff,
    subclass: 0xff,
};

fn matching_device() -> DeviceInfo {
    DeviceInfo {
        vendor_id: 0x18d1,
        product_id: 0x9302,
        interfaces: vec![
            InterfaceDesc {
                class: 0x08,
                subclass: 0x06,
            },
            InterfaceDesc {
                class: 0xff,
                subclass: 0xff,
            },
        ],
    }
}

#[derive(Default)]
struct BusState {
    opens: usize,
    set_interface_ok: Option<bool>,
    get_status_ok: Option<bool>,
    deferred: Vec<BusCompletion>,
}

/// Bus mock: each async step either completes inline with the configured
/// result, or (when the result is `None`) stashes the completion for the
/// test to fire later.
#[derive(Clone)]
struct MockBus {
    state: Arc<Mutex<BusState>>,
}

impl MockBus {
    fn new(set_interface_ok: Option<bool>, get_status_ok: Option<bool>) -> Self {
        Self {
            state: Arc::new(Mutex::new(BusState {
                set_interface_ok,
                get_status_ok,
                ..Default::default()
            })),
        }
    }

    fn fire_deferred(&self, ok: bool) {
        let deferred: Vec<_> = std::mem::take(&mut self.state.lock().unwrap().deferred);
        for done in deferred {
            done(ok);
        }
    }
}

impl AcceleratorBus for MockBus {
    fn open_class(&mut self) -> Result<(), AccelError> {
        self.state.lock().unwrap().opens += 1;
        Ok(())
    }

    fn set_interface(&mut self, done: BusCompletion) -> Result<(), AccelError> {
        let mut state = self.state.lock().unwrap();
        match state.set_interface_ok {
            Some(ok) => {
                drop(state);
                done(ok);
            }
            None => state.deferred.push(done),
        }
        Ok(())
    }

    fn get_status(&mut self, done: BusCompletion) -> Result<(), AccelError> {
        let mut state = self.state.lock().unwrap();
        match state.get_status_ok {
            Some(ok) => {
                drop(state);
                done(ok);
            }
            None => state.deferred.push(done),
        }
        Ok(())
    }
}

struct MockRail {
    rail: Arc<AtomicBool>,
    pgood: Arc<AtomicBool>,
    reset: Arc<AtomicBool>,
}

impl MockRail {
    fn new(pgood_now: bool) -> (Self, Arc<AtomicBool>, Arc<AtomicBool>) {
        let pgood = Arc::new(AtomicBool::new(pgood_now));
        let reset = Arc::new(AtomicBool::new(true));
        (
            Self {
                rail: Arc::new(AtomicBool::new(false)),
                pgood: pgood.clone(),
                reset: reset.clone(),
            },
            pgood,
            reset,
        )
    }
}

impl PowerRail for MockRail {
    fn set_rail(&mut self, enable: bool) {
        self.rail.store(enable, Ordering::SeqCst);
    }

    fn power_good(&self) -> bool {
        self.pgood.load(Ordering::SeqCst)
    }

    fn set_reset(&mut self, asserted: bool) {
        self.reset.store(asserted, Ordering::SeqCst);
    }
}

fn accelerator(bus: MockBus) -> Accelerator {
    let (rail, _, _) = MockRail::new(true);
    Accelerator::new(
        AccelConfig::default().with_signature(SIG),
        Box::new(bus),
        Box::new(rail),
    )
}

/// Push a request through the actor so everything already queued has been
/// handled when it returns.
async fn flush(accel: &Accelerator) {
    accel.power_enabled().await.unwrap();
}

#[tokio::test]
async fn matching_device_walks_to_connected() {
    let bus = MockBus::new(Some(true), Some(true));
    let accel = accelerator(bus.clone());

    let notified = Arc::new(AtomicUsize::new(0));
    let n = notified.clone();
    accel
        .on_connected(move || {
            n.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    accel.bus_event(BusEvent::Attach(matching_device())).unwrap();
    accel.bus_event(BusEvent::EnumerationDone).unwrap();

    accel
        .wait_for(AttachState::Connected, Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(notified.load(Ordering::SeqCst), 1);
    assert_eq!(bus.state.lock().unwrap().opens, 1);
}

#[tokio::test]
async fn connected_notification_fires_exactly_once() {
    let bus = MockBus::new(Some(true), Some(true));
    let accel = accelerator(bus);

    let notified = Arc::new(AtomicUsize::new(0));
    let n = notified.clone();
    accel
        .on_connected(move || {
            n.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    accel.bus_event(BusEvent::Attach(matching_device())).unwrap();
    accel.bus_event(BusEvent::EnumerationDone).unwrap();
    accel
        .wait_for(AttachState::Connected, Duration::from_secs(1))
        .await
        .unwrap();

    // Detach and run the whole sequence again: the consumed observer must
    // not fire a second time.
    accel.bus_event(BusEvent::Detach).unwrap();
    accel.bus_event(BusEvent::Attach(matching_device())).unwrap();
    accel.bus_event(BusEvent::EnumerationDone).unwrap();
    accel
        .wait_for(AttachState::Connected, Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(notified.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn non_matching_interfaces_leave_device_unclaimed() {
    let bus = MockBus::new(Some(true), Some(true));
    let accel = accelerator(bus.clone());

    let mut info = matching_device();
    info.interfaces = vec![InterfaceDesc {
        class: 0x03,
        subclass: 0x01,
    }];
    accel.bus_event(BusEvent::Attach(info)).unwrap();
    accel.bus_event(BusEvent::EnumerationDone).unwrap();

    flush(&accel).await;
    assert_eq!(accel.state(), AttachState::Unattached);
    assert_eq!(bus.state.lock().unwrap().opens, 0);
}

#[tokio::test]
async fn wrong_product_id_leaves_device_unclaimed() {
    let bus = MockBus::new(Some(true), Some(true));
    let accel = accelerator(bus);

    let mut info = matching_device();
    info.product_id = 0x1234;
    accel.bus_event(BusEvent::Attach(info)).unwrap();
    accel.bus_event(BusEvent::EnumerationDone).unwrap();

    flush(&accel).await;
    assert_eq!(accel.state(), AttachState::Unattached);
}

#[tokio::test]
async fn interface_select_failure_is_terminal() {
    kestrel_base::init_stdout_logger();

    let bus = MockBus::new(Some(false), Some(true));
    let accel = accelerator(bus);

    let notified = Arc::new(AtomicUsize::new(0));
    let n = notified.clone();
    accel
        .on_connected(move || {
            n.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    accel.bus_event(BusEvent::Attach(matching_device())).unwrap();
    accel.bus_event(BusEvent::EnumerationDone).unwrap();
    accel
        .wait_for(AttachState::Error, Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(notified.load(Ordering::SeqCst), 0);

    // Nothing short of process restart leaves Error: fresh attach cycles
    // and detaches are all refused.
    accel.bus_event(BusEvent::Detach).unwrap();
    accel.bus_event(BusEvent::Attach(matching_device())).unwrap();
    accel.bus_event(BusEvent::EnumerationDone).unwrap();
    flush(&accel).await;
    assert_eq!(accel.state(), AttachState::Error);

    // And waiting for any other state reports the halt outright.
    let err = accel
        .wait_for(AttachState::Connected, Duration::from_secs(1))
        .await
        .unwrap_err();
    assert_eq!(err, AccelError::Halted);
}

#[tokio::test]
async fn status_query_failure_is_terminal() {
    let bus = MockBus::new(Some(true), Some(false));
    let accel = accelerator(bus);

    accel.bus_event(BusEvent::Attach(matching_device())).unwrap();
    accel.bus_event(BusEvent::EnumerationDone).unwrap();
    accel
        .wait_for(AttachState::Error, Duration::from_secs(1))
        .await
        .unwrap();
}

#[tokio::test]
async fn detach_cancels_in_flight_sequence() {
    // Interface select never completes on its own.
    let bus = MockBus::new(None, Some(true));
    let accel = accelerator(bus.clone());

    accel.bus_event(BusEvent::Attach(matching_device())).unwrap();
    accel.bus_event(BusEvent::EnumerationDone).unwrap();
    accel
        .wait_for(AttachState::SetInterface, Duration::from_secs(1))
        .await
        .unwrap();

    accel.bus_event(BusEvent::Detach).unwrap();
    accel
        .wait_for(AttachState::Unattached, Duration::from_secs(1))
        .await
        .unwrap();

    // The stale completion lands after the cancel and must be dropped.
    bus.fire_deferred(true);
    flush(&accel).await;
    assert_eq!(accel.state(), AttachState::Unattached);
}

#[tokio::test]
async fn power_up_waits_for_good_then_releases_reset() {
    let bus = MockBus::new(Some(true), Some(true));
    let (rail, _pgood, reset) = MockRail::new(true);
    let accel = Accelerator::new(
        AccelConfig::default().with_signature(SIG),
        Box::new(bus),
        Box::new(rail),
    );

    assert!(!accel.power_enabled().await.unwrap());
    accel.set_power(true).await.unwrap();
    assert!(accel.power_enabled().await.unwrap());
    assert!(!reset.load(Ordering::SeqCst), "reset still asserted");

    accel.set_power(false).await.unwrap();
    assert!(!accel.power_enabled().await.unwrap());
    assert!(reset.load(Ordering::SeqCst), "reset not reasserted");
}

#[tokio::test]
async fn missing_power_good_blocks_the_caller() {
    let bus = MockBus::new(Some(true), Some(true));
    let (rail, pgood, _) = MockRail::new(false);
    let accel = Accelerator::new(
        AccelConfig::default()
            .with_signature(SIG)
            .with_request_deadline(Duration::from_millis(100)),
        Box::new(bus),
        Box::new(rail),
    );

    // The rail never reports good, so the worker spins and the caller's
    // deadline expires. There is no silent internal timeout.
    let err = accel.set_power(true).await.unwrap_err();
    assert_eq!(err, AccelError::Actor(ActorError::Timeout));

    // Unstick the worker so the test process can exit cleanly.
    pgood.store(true, Ordering::SeqCst);
}
