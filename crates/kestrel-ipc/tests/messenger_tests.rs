use kestrel_ipc::{CoreId, CoreMessage, CoreTransport, HardwareGate, IpcError, Messenger};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// One core's mailbox plus its doorbell flag.
#[derive(Default)]
struct MailboxSide {
    queue: Mutex<VecDeque<CoreMessage>>,
    bell: Mutex<bool>,
    bell_cv: Condvar,
}

impl MailboxSide {
    fn ring(&self) {
        let mut rung = self.bell.lock().unwrap();
        *rung = true;
        self.bell_cv.notify_one();
    }
}

/// In-memory stand-in for the shared-mailbox/doorbell hardware.
struct TestTransport {
    local: Arc<MailboxSide>,
    peer: Arc<MailboxSide>,
    capacity: usize,
}

impl CoreTransport for TestTransport {
    fn push(&self, msg: CoreMessage) -> Result<(), IpcError> {
        let mut queue = self.peer.queue.lock().unwrap();
        if queue.len() >= self.capacity {
            return Err(IpcError::MailboxFull);
        }
        queue.push_back(msg);
        Ok(())
    }

    fn pop(&self) -> Option<CoreMessage> {
        self.local.queue.lock().unwrap().pop_front()
    }

    fn ring(&self) {
        self.peer.ring();
    }

    fn wait(&self) {
        let mut rung = self.local.bell.lock().unwrap();
        while !*rung {
            rung = self.local.bell_cv.wait(rung).unwrap();
        }
        *rung = false;
    }
}

/// Two-party gate: at most one holder, blocking acquire, counts
/// acquisitions so tests can check the critical sections really go
/// through it.
#[derive(Default)]
struct TestGate {
    holder: Mutex<Option<CoreId>>,
    cv: Condvar,
    acquisitions: AtomicUsize,
}

impl HardwareGate for TestGate {
    fn lock(&self, core: CoreId) {
        let mut holder = self.holder.lock().unwrap();
        while holder.is_some() {
            holder = self.cv.wait(holder).unwrap();
        }
        *holder = Some(core);
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
    }

    fn unlock(&self, core: CoreId) {
        let mut holder = self.holder.lock().unwrap();
        assert_eq!(*holder, Some(core), "gate released by non-holder");
        *holder = None;
        self.cv.notify_all();
    }
}

fn rig(capacity: usize) -> (Messenger, Messenger, Arc<TestGate>) {
    let primary_side = Arc::new(MailboxSide::default());
    let secondary_side = Arc::new(MailboxSide::default());
    let gate = Arc::new(TestGate::default());

    let primary = Messenger::new(
        CoreId::Primary,
        gate.clone(),
        Arc::new(TestTransport {
            local: primary_side.clone(),
            peer: secondary_side.clone(),
            capacity,
        }),
    );
    let secondary = Messenger::new(
        CoreId::Secondary,
        gate.clone(),
        Arc::new(TestTransport {
            local: secondary_side,
            peer: primary_side,
            capacity,
        }),
    );
    (primary, secondary, gate)
}

fn wait_until(timeout: Duration, ready: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if ready() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    ready()
}

#[test]
fn app_messages_arrive_in_send_order() {
    let (primary, secondary, _) = rig(32);
    secondary.init();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen2 = seen.clone();
    secondary.register_app_handler(move |msg| {
        seen2.lock().unwrap().push(msg.payload[0]);
    });

    for i in 0..10u8 {
        primary.send(CoreMessage::app(1, &[i]).unwrap()).unwrap();
    }

    assert!(wait_until(Duration::from_secs(2), || seen
        .lock()
        .unwrap()
        .len()
        == 10));
    assert_eq!(*seen.lock().unwrap(), (0..10).collect::<Vec<u8>>());
}

#[test]
fn last_handler_registration_wins() {
    let (primary, secondary, _) = rig(8);
    secondary.init();

    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    let f = first.clone();
    secondary.register_app_handler(move |_| {
        f.fetch_add(1, Ordering::SeqCst);
    });
    let s = second.clone();
    secondary.register_app_handler(move |_| {
        s.fetch_add(1, Ordering::SeqCst);
    });

    primary.send(CoreMessage::app(7, &[]).unwrap()).unwrap();

    assert!(wait_until(Duration::from_secs(2), || {
        second.load(Ordering::SeqCst) == 1
    }));
    assert_eq!(first.load(Ordering::SeqCst), 0);
}

#[test]
fn system_tags_are_intercepted_before_the_app_handler() {
    kestrel_base::init_stdout_logger();

    let (primary, secondary, _) = rig(8);
    secondary.init();

    let app_calls = Arc::new(AtomicUsize::new(0));
    let a = app_calls.clone();
    secondary.register_app_handler(move |_| {
        a.fetch_add(1, Ordering::SeqCst);
    });

    assert!(!secondary.peer_ready());
    primary.announce_ready().unwrap();
    primary
        .send(CoreMessage::console_line("hello from the other core"))
        .unwrap();

    assert!(wait_until(Duration::from_secs(2), || secondary.peer_ready()));
    // Give the drain a moment: neither system message may reach the app
    // handler.
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(app_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn full_peer_mailbox_surfaces_resource_exhaustion() {
    let (primary, secondary, _) = rig(2);
    // Receiver deliberately not bound, so nothing drains.
    let _ = secondary;

    primary.send(CoreMessage::app(0, &[1]).unwrap()).unwrap();
    primary.send(CoreMessage::app(0, &[2]).unwrap()).unwrap();
    let err = primary.send(CoreMessage::app(0, &[3]).unwrap()).unwrap_err();
    assert_eq!(err, IpcError::MailboxFull);
}

#[test]
fn both_directions_deliver() {
    let (primary, secondary, gate) = rig(8);
    primary.init();
    secondary.init();

    let at_secondary = Arc::new(AtomicUsize::new(0));
    let at_primary = Arc::new(AtomicUsize::new(0));

    let s = at_secondary.clone();
    secondary.register_app_handler(move |_| {
        s.fetch_add(1, Ordering::SeqCst);
    });
    let p = at_primary.clone();
    primary.register_app_handler(move |_| {
        p.fetch_add(1, Ordering::SeqCst);
    });

    primary.send(CoreMessage::app(1, b"ping").unwrap()).unwrap();
    secondary.send(CoreMessage::app(2, b"pong").unwrap()).unwrap();

    assert!(wait_until(Duration::from_secs(2), || {
        at_secondary.load(Ordering::SeqCst) == 1 && at_primary.load(Ordering::SeqCst) == 1
    }));
    // Every mailbox touch went through the two-party gate.
    assert!(gate.acquisitions.load(Ordering::SeqCst) >= 4);
}

#[test]
fn init_is_idempotent() {
    let (primary, secondary, _) = rig(8);
    secondary.init();
    secondary.init();

    let seen = Arc::new(AtomicUsize::new(0));
    let s = seen.clone();
    secondary.register_app_handler(move |_| {
        s.fetch_add(1, Ordering::SeqCst);
    });

    primary.send(CoreMessage::app(1, &[]).unwrap()).unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        seen.load(Ordering::SeqCst) == 1
    }));
    // A second worker would have raced the first on the same mailbox;
    // exactly one delivery proves only one is bound.
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}
