//! Handles for calls running on the worker pool
//!
//! [`RpcClient::submit`](crate::RpcClient::submit) spawns the call and hands
//! back a [`PendingCall`]. Awaiting it yields the [`CallOutcome`]; calling
//! [`PendingCall::cancel`] (or [`CancelHandle::cancel`] from elsewhere)
//! stops the call at its next await point. Cancellation is observed while
//! waiting for a worker slot, during delivery and during backoff, and always
//! ends the call with `TransportFault { kind: Cancelled }`.
//!
//! Dropping a `PendingCall` before it resolves cancels the call, so a `send`
//! abandoned under `tokio::time::timeout` or `select!` stops retrying.
//! [`PendingCall::detach`] lets a call run on without anyone awaiting it.

use noderpc_core::{CallOutcome, FaultKind, TransportFault};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Create a linked cancel handle and signal
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx: Arc::new(tx) }, CancelSignal { rx })
}

/// Requests cancellation of one call
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Cancel the call; later calls are no-ops
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observed by the dispatcher to stop a call early
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        let (_, signal) = cancel_pair();
        signal
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested, or never if the handle is gone
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

enum State {
    Ready(Option<CallOutcome>),
    Running(JoinHandle<CallOutcome>),
}

/// A call in progress
///
/// Implements `Future<Output = CallOutcome>`. The caller awaits it on its own
/// task; the network work happens on the worker task.
pub struct PendingCall {
    state: State,
    cancel: CancelHandle,
    detached: bool,
}

impl PendingCall {
    pub(crate) fn running(task: JoinHandle<CallOutcome>, cancel: CancelHandle) -> Self {
        Self {
            state: State::Running(task),
            cancel,
            detached: false,
        }
    }

    /// A call that finished before reaching the network
    pub(crate) fn ready(outcome: CallOutcome) -> Self {
        let (cancel, _) = cancel_pair();
        Self {
            state: State::Ready(Some(outcome)),
            cancel,
            detached: false,
        }
    }

    /// Cancel the call
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A handle that can cancel this call from another task
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Let the call run to completion without awaiting it
    ///
    /// The outcome is discarded. A [`CancelHandle`] taken earlier can still
    /// stop it.
    pub fn detach(mut self) {
        self.detached = true;
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        if !self.detached {
            self.cancel.cancel();
        }
    }
}

impl Future for PendingCall {
    type Output = CallOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<CallOutcome> {
        match &mut self.state {
            State::Ready(outcome) => match outcome.take() {
                Some(outcome) => Poll::Ready(outcome),
                None => panic!("PendingCall polled after completion"),
            },
            State::Running(task) => match Pin::new(task).poll(cx) {
                Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
                Poll::Ready(Err(e)) if e.is_cancelled() => {
                    Poll::Ready(CallOutcome::TransportFault(TransportFault::cancelled()))
                }
                Poll::Ready(Err(e)) => Poll::Ready(CallOutcome::TransportFault(TransportFault::new(
                    FaultKind::Io,
                    format!("call task failed: {}", e),
                ))),
                Poll::Pending => Poll::Pending,
            },
        }
    }
}
