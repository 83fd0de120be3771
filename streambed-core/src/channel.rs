//! # Directional Message Channels
//!
//! A channel is an ordered, unbounded queue of messages flowing one way
//! between the two sides of a call. Every call owns two of them, one per
//! direction, and each can be half-closed independently of the other.
//!
//! ## Guarantees
//!
//! * Messages arrive in send order; none are lost or duplicated. Each message
//!   carries the sequence number stamped at its sending endpoint.
//! * [`Sender::close`] is idempotent. After it, sends fail with
//!   [`CallError::ChannelClosed`] while everything already queued stays
//!   receivable; once drained, [`Receiver::message`] reports `Ok(None)`.
//! * A handler failure is delivered in-band after all messages queued before
//!   it, so partial output is never retracted.
//!
//! Cancelling the owning call short-circuits both endpoints: the next send or
//! receive fails with [`CallError::Cancelled`] even if messages are buffered.

use crate::call::CallState;
use crate::error::CallError;
use std::sync::Arc;
use tokio::sync::mpsc;

pub(crate) type Item<T> = Result<Message<T>, CallError>;

/// A typed payload plus the sequence number stamped by its sending endpoint.
///
/// Sequence numbers start at 0 and increase by 1 per direction; they exist so
/// tests and consumers can assert on delivery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message<T> {
    seq: u64,
    payload: T,
}

impl<T> Message<T> {
    pub(crate) fn new(seq: u64, payload: T) -> Self {
        Self { seq, payload }
    }

    /// The position of this message in its channel, starting at 0.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// A reference to the payload.
    pub fn get_ref(&self) -> &T {
        &self.payload
    }

    /// Consumes the message, returning the payload.
    pub fn into_inner(self) -> T {
        self.payload
    }
}

/// Creates a standalone directional channel, unattached to any call.
///
/// Channels created through [`crate::Call`] additionally observe the call's
/// cancellation; a standalone channel is never cancelled.
pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
    channel_with_state(CallState::detached())
}

pub(crate) fn channel_with_state<T>(state: Arc<CallState>) -> (Sender<T>, Receiver<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sender = Sender {
        tx: Some(tx),
        next_seq: 0,
        state: state.clone(),
    };
    let receiver = Receiver {
        rx,
        state,
        terminal: None,
        done: false,
    };
    (sender, receiver)
}

/// The enqueueing endpoint of a channel.
///
/// Dropping the sender half-closes the channel the same way [`Sender::close`]
/// does.
#[derive(Debug)]
pub struct Sender<T> {
    tx: Option<mpsc::UnboundedSender<Item<T>>>,
    next_seq: u64,
    state: Arc<CallState>,
}

impl<T> Sender<T> {
    /// Enqueues a message.
    ///
    /// # Errors
    ///
    /// * [`CallError::Cancelled`] once the owning call has been cancelled.
    /// * [`CallError::ChannelClosed`] after [`Sender::close`] or once the
    ///   receiving endpoint has been dropped.
    pub fn send(&mut self, payload: T) -> Result<(), CallError> {
        if self.state.is_cancelled() {
            return Err(CallError::Cancelled);
        }
        let tx = self.tx.as_ref().ok_or(CallError::ChannelClosed)?;
        tx.send(Ok(Message::new(self.next_seq, payload)))
            .map_err(|_| CallError::ChannelClosed)?;
        self.next_seq += 1;
        Ok(())
    }

    /// Half-closes the channel: no further messages will be enqueued, while
    /// everything already queued remains receivable. Idempotent.
    pub fn close(&mut self) {
        self.tx = None;
    }

    /// Whether this endpoint has been half-closed.
    pub fn is_closed(&self) -> bool {
        self.tx.is_none()
    }

    /// A raw handle used by the call drivers to deliver a terminal error
    /// after the handler has consumed the user-facing endpoint.
    pub(crate) fn raw(&self) -> Option<mpsc::UnboundedSender<Item<T>>> {
        self.tx.clone()
    }
}

/// The dequeueing endpoint of a channel.
#[derive(Debug)]
pub struct Receiver<T> {
    rx: mpsc::UnboundedReceiver<Item<T>>,
    state: Arc<CallState>,
    terminal: Option<CallError>,
    done: bool,
}

impl<T> Receiver<T> {
    /// Awaits the next message.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(message))` - the next payload, in send order.
    /// * `Ok(None)` - the channel is half-closed and fully drained. Repeated
    ///   reads keep returning `Ok(None)`.
    /// * `Err(error)` - the call failed or was cancelled. The failure is
    ///   sticky: later reads report it again.
    pub async fn message(&mut self) -> Result<Option<Message<T>>, CallError> {
        // A stream that already ended stays ended, even if the call is
        // cancelled afterwards.
        if self.done {
            return Ok(None);
        }
        if let Some(err) = &self.terminal {
            return Err(err.clone());
        }
        if self.state.is_cancelled() {
            self.terminal = Some(CallError::Cancelled);
            return Err(CallError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.state.cancelled() => {
                self.terminal = Some(CallError::Cancelled);
                Err(CallError::Cancelled)
            }
            item = self.rx.recv() => match item {
                Some(Ok(message)) => Ok(Some(message)),
                Some(Err(err)) => {
                    self.terminal = Some(err.clone());
                    Err(err)
                }
                None => {
                    self.done = true;
                    Ok(None)
                }
            },
        }
    }

    /// Drains the stream to its end, returning the payloads in order.
    pub async fn collect(mut self) -> Result<Vec<T>, CallError> {
        let mut payloads = Vec::new();
        while let Some(message) = self.message().await? {
            payloads.push(message.into_inner());
        }
        Ok(payloads)
    }
}
