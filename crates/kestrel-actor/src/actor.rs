use crate::{ActorConfig, ActorError, Overflow};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::error::{SendTimeoutError, TrySendError};
use tokio::sync::{mpsc, oneshot};

/// Request handler run on the actor's worker thread.
///
/// `handle` executes one request to completion before the worker dequeues
/// the next, so a handler owns its hardware without further locking.
pub trait Handler<Req, Resp>: Send {
    /// Called once on the worker thread before the dequeue loop starts.
    fn init(&mut self) {}

    fn handle(&mut self, request: Req) -> Resp;
}

enum Completion<Resp> {
    /// Fire-and-forget; the response is dropped.
    None,
    /// A sync caller is parked on the other end.
    Sync(oneshot::Sender<Resp>),
    /// Invoked on the worker thread before the next dequeue. Must not block.
    Continue(Box<dyn FnOnce(Resp) + Send>),
}

struct Envelope<Req, Resp> {
    request: Req,
    completion: Completion<Resp>,
}

/// Handle to a single-consumer worker bound to one bounded mailbox.
///
/// Cloning the handle gives another producer; there is always exactly one
/// consumer. The worker runs for the process lifetime as long as any handle
/// is alive.
pub struct Actor<Req, Resp> {
    name: &'static str,
    tx: mpsc::Sender<Envelope<Req, Resp>>,
    overflow: Overflow,
}

impl<Req, Resp> Clone for Actor<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            tx: self.tx.clone(),
            overflow: self.overflow,
        }
    }
}

impl<Req, Resp> Actor<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// Spawn the worker thread and return a handle to its mailbox.
    ///
    /// `make_handler` runs on the calling thread and receives a clone of
    /// the handle, so the handler can enqueue follow-up requests to its own
    /// mailbox (asynchronous completions re-enter this way).
    pub fn spawn<H>(
        name: &'static str,
        config: ActorConfig,
        make_handler: impl FnOnce(Actor<Req, Resp>) -> H,
    ) -> Self
    where
        H: Handler<Req, Resp> + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<Envelope<Req, Resp>>(config.capacity());
        let actor = Self {
            name,
            tx,
            overflow: config.overflow(),
        };

        let mut handler = make_handler(actor.clone());
        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                handler.init();
                log::debug!("actor {name} running");
                while let Some(envelope) = rx.blocking_recv() {
                    let response = handler.handle(envelope.request);
                    match envelope.completion {
                        Completion::None => {}
                        Completion::Sync(done) => {
                            // A caller that gave up waiting drops its receiver;
                            // the response is discarded.
                            let _ = done.send(response);
                        }
                        Completion::Continue(f) => f(response),
                    }
                }
                log::debug!("actor {name} mailbox closed");
            })
            .unwrap_or_else(|e| panic!("failed to spawn actor {name}: {e}"));

        actor
    }

    /// Enqueue a request and await the response.
    ///
    /// Fails with `MailboxFull` if the mailbox stays full past the
    /// configured bound, or `Timeout` if no response arrives within
    /// `deadline`. Only the calling task is suspended.
    pub async fn call(&self, request: Req, deadline: Duration) -> Result<Resp, ActorError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.enqueue(Envelope {
            request,
            completion: Completion::Sync(done_tx),
        })
        .await?;

        match tokio::time::timeout(deadline, done_rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(ActorError::WorkerGone),
            Err(_) => Err(ActorError::Timeout),
        }
    }

    /// Enqueue a request and return immediately.
    ///
    /// The worker invokes `continuation` with the response before resuming
    /// its dequeue loop. The continuation runs on the worker thread and
    /// must not block; it may only issue further non-blocking calls.
    pub fn call_async(
        &self,
        request: Req,
        continuation: impl FnOnce(Resp) + Send + 'static,
    ) -> Result<(), ActorError> {
        self.try_enqueue(Envelope {
            request,
            completion: Completion::Continue(Box::new(continuation)),
        })
    }

    /// Non-blocking fire-and-forget enqueue.
    ///
    /// Never waits and never takes a lock, so it is safe from completion
    /// interrupts and other restricted contexts.
    pub fn send(&self, request: Req) -> Result<(), ActorError> {
        self.try_enqueue(Envelope {
            request,
            completion: Completion::None,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    async fn enqueue(&self, envelope: Envelope<Req, Resp>) -> Result<(), ActorError> {
        match self.overflow {
            Overflow::Reject => self.try_enqueue(envelope),
            Overflow::Block(wait) => {
                self.tx
                    .send_timeout(envelope, wait)
                    .await
                    .map_err(|e| match e {
                        SendTimeoutError::Timeout(_) => ActorError::MailboxFull,
                        SendTimeoutError::Closed(_) => ActorError::WorkerGone,
                    })
            }
        }
    }

    fn try_enqueue(&self, envelope: Envelope<Req, Resp>) -> Result<(), ActorError> {
        self.tx.try_send(envelope).map_err(|e| match e {
            TrySendError::Full(_) => ActorError::MailboxFull,
            TrySendError::Closed(_) => ActorError::WorkerGone,
        })
    }
}
