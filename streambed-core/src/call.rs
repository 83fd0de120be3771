//! # Calls
//!
//! A [`Call`] is one invocation: a handler wired to the caller through at
//! most two directional channels. The call exposes one driver per shape,
//! mirroring the four classic interaction patterns:
//!
//! * [`Call::unary`] - one request, one response.
//! * [`Call::server_streaming`] - one request, a stream of responses.
//! * [`Call::client_streaming`] - a stream of requests, one response.
//! * [`Call::bidi_streaming`] - both sides stream, interleaved independently.
//!
//! Exactly one handler instance serves one call; whatever state the handler
//! accumulates (counters, running aggregates) lives inside that invocation
//! and is never shared across calls.
//!
//! ## Status & cancellation
//!
//! A call's status only moves forward: `Pending → Active → {Completed,
//! Failed}`. The [`CallHandle`] returned by [`Call::new`] observes the status
//! and can cancel the call at any time; cancellation half-closes both
//! channels at once, and each endpoint reports [`CallError::Cancelled`] on
//! its next operation.

use crate::channel::{Message, Receiver, Sender, channel_with_state};
use crate::error::CallError;
use futures_util::{Stream, StreamExt, future, pin_mut};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// The four interaction shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Unary,
    ServerStreaming,
    ClientStreaming,
    BidiStreaming,
}

/// Where a call is in its lifecycle. Transitions are forward-only and the
/// two terminal states are sticky.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Pending,
    Active,
    Completed,
    Failed,
}

impl CallStatus {
    /// Whether the call has finished, successfully or not.
    pub fn is_terminal(self) -> bool {
        matches!(self, CallStatus::Completed | CallStatus::Failed)
    }

    fn can_transition_to(self, next: CallStatus) -> bool {
        matches!(
            (self, next),
            (CallStatus::Pending, CallStatus::Active)
                | (CallStatus::Pending, CallStatus::Failed)
                | (CallStatus::Active, CallStatus::Completed)
                | (CallStatus::Active, CallStatus::Failed)
        )
    }
}

/// State shared between a call, its handle and its channel endpoints.
#[derive(Debug)]
pub(crate) struct CallState {
    status: watch::Sender<CallStatus>,
    cancel: watch::Sender<bool>,
}

impl CallState {
    pub(crate) fn detached() -> Arc<Self> {
        Arc::new(Self {
            status: watch::Sender::new(CallStatus::Pending),
            cancel: watch::Sender::new(false),
        })
    }

    pub(crate) fn status(&self) -> CallStatus {
        *self.status.borrow()
    }

    pub(crate) fn advance(&self, next: CallStatus) {
        self.status.send_modify(|current| {
            if current.can_transition_to(next) {
                *current = next;
            }
        });
    }

    pub(crate) fn cancel(&self) {
        self.cancel.send_replace(true);
        self.advance(CallStatus::Failed);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    pub(crate) async fn cancelled(&self) {
        let mut rx = self.cancel.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Observes and cancels a call from outside the invocation itself.
#[derive(Debug, Clone)]
pub struct CallHandle {
    state: Arc<CallState>,
}

impl CallHandle {
    /// The call's current status.
    pub fn status(&self) -> CallStatus {
        self.state.status()
    }

    /// Aborts the call. Both channel endpoints observe
    /// [`CallError::Cancelled`] on their next operation and the call is
    /// marked [`CallStatus::Failed`]. Cancelling twice, or after the call has
    /// finished, is a no-op on the status.
    pub fn cancel(&self) {
        self.state.cancel();
    }
}

/// One invocation of a handler. Consumed by the shape driver that runs it.
#[derive(Debug)]
pub struct Call {
    kind: CallKind,
    state: Arc<CallState>,
}

impl Call {
    /// Creates a call in the [`CallStatus::Pending`] state, together with the
    /// handle that outlives it.
    pub fn new(kind: CallKind) -> (Self, CallHandle) {
        let state = CallState::detached();
        let handle = CallHandle {
            state: state.clone(),
        };
        (Self { kind, state }, handle)
    }

    /// The shape this call was created for.
    pub fn kind(&self) -> CallKind {
        self.kind
    }

    /// Runs a one-request/one-response exchange. The caller blocks until the
    /// handler returns or the call is cancelled.
    pub async fn unary<Req, Resp, H, Fut>(
        self,
        handler: H,
        request: Req,
    ) -> Result<Message<Resp>, CallError>
    where
        H: FnOnce(Message<Req>) -> Fut,
        Fut: Future<Output = Result<Resp, CallError>>,
    {
        debug_assert_eq!(self.kind, CallKind::Unary);
        self.state.advance(CallStatus::Active);

        let run = handler(Message::new(0, request));
        let result = tokio::select! {
            biased;
            _ = self.state.cancelled() => Err(CallError::Cancelled),
            out = run => out,
        };

        self.finish(result).map(|response| Message::new(0, response))
    }

    /// Runs a one-request/stream-of-responses exchange. The handler runs in
    /// its own task, writing into the returned receiver; a handler error is
    /// delivered in-band after any output already produced.
    pub fn server_streaming<Req, Resp, H, Fut>(self, handler: H, request: Req) -> Receiver<Resp>
    where
        Req: Send + 'static,
        Resp: Send + 'static,
        H: FnOnce(Message<Req>, Sender<Resp>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), CallError>> + Send + 'static,
    {
        debug_assert_eq!(self.kind, CallKind::ServerStreaming);
        self.state.advance(CallStatus::Active);

        let (tx, rx) = channel_with_state(self.state.clone());
        let error_tx = tx.raw();
        let state = self.state;
        tokio::spawn(async move {
            match handler(Message::new(0, request), tx).await {
                Ok(()) => state.advance(CallStatus::Completed),
                Err(err) => {
                    if let Some(error_tx) = error_tx {
                        let _ = error_tx.send(Err(err));
                    }
                    state.advance(CallStatus::Failed);
                }
            }
        });

        rx
    }

    /// Runs a stream-of-requests/one-response exchange. The request stream is
    /// fed into the client→server channel and half-closed at its end; the
    /// handler consumes to end-of-stream and yields a single response. Feed
    /// and handler run cooperatively in the calling task, so neither the
    /// stream nor the handler future needs to be `Send`.
    pub async fn client_streaming<Req, Resp, S, H, Fut>(
        self,
        handler: H,
        requests: S,
    ) -> Result<Message<Resp>, CallError>
    where
        S: Stream<Item = Req>,
        H: FnOnce(Receiver<Req>) -> Fut,
        Fut: Future<Output = Result<Resp, CallError>>,
    {
        debug_assert_eq!(self.kind, CallKind::ClientStreaming);
        self.state.advance(CallStatus::Active);

        let (mut tx, rx) = channel_with_state(self.state.clone());
        let feed = async move {
            pin_mut!(requests);
            while let Some(request) = requests.next().await {
                if tx.send(request).is_err() {
                    break;
                }
            }
            // Dropping the sender half-closes the request channel.
        };

        let run = async {
            let (_, out) = future::join(feed, handler(rx)).await;
            out
        };
        let result = tokio::select! {
            biased;
            _ = self.state.cancelled() => Err(CallError::Cancelled),
            out = run => out,
        };

        self.finish(result).map(|response| Message::new(0, response))
    }

    /// Runs a duplex exchange. The feeder and the handler run as two
    /// independent tasks talking only through the two directional channels:
    /// the send side can half-close without waiting for any inbound message,
    /// and the returned receiver drains whatever is buffered after
    /// half-close.
    pub fn bidi_streaming<Req, Resp, S, H, Fut>(self, handler: H, requests: S) -> Receiver<Resp>
    where
        S: Stream<Item = Req> + Send + 'static,
        Req: Send + 'static,
        Resp: Send + 'static,
        H: FnOnce(Receiver<Req>, Sender<Resp>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), CallError>> + Send + 'static,
    {
        debug_assert_eq!(self.kind, CallKind::BidiStreaming);
        self.state.advance(CallStatus::Active);

        let (mut out_tx, out_rx) = channel_with_state(self.state.clone());
        let (in_tx, in_rx) = channel_with_state(self.state.clone());

        let feed_state = self.state.clone();
        tokio::spawn(async move {
            let feed = async {
                pin_mut!(requests);
                while let Some(request) = requests.next().await {
                    if out_tx.send(request).is_err() {
                        break;
                    }
                }
            };
            // Stop feeding as soon as the call is cancelled, even if the
            // request stream never yields again.
            tokio::select! {
                biased;
                _ = feed_state.cancelled() => {}
                _ = feed => {}
            }
        });

        let error_tx = in_tx.raw();
        let state = self.state;
        tokio::spawn(async move {
            match handler(out_rx, in_tx).await {
                Ok(()) => state.advance(CallStatus::Completed),
                Err(err) => {
                    if let Some(error_tx) = error_tx {
                        let _ = error_tx.send(Err(err));
                    }
                    state.advance(CallStatus::Failed);
                }
            }
        });

        in_rx
    }

    fn finish<Resp>(self, result: Result<Resp, CallError>) -> Result<Resp, CallError> {
        match &result {
            Ok(_) => self.state.advance(CallStatus::Completed),
            Err(_) => self.state.advance(CallStatus::Failed),
        }
        result
    }
}
