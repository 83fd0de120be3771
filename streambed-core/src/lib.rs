//! # Streambed Core
//!
//! `streambed-core` is a small in-process harness for exercising the four
//! streaming call shapes (unary, server-streaming, client-streaming and
//! bidirectional-streaming) without a network transport. It is the engine
//! behind the `demo-services` toy services and the `streambed` demo binaries.
//!
//! ## Key Components
//!
//! * **[`Call`] & [`CallHandle`]:** One RPC invocation. The [`Call`] owns the
//!   shape driver that connects a handler to the caller; the [`CallHandle`]
//!   observes status and cancels the call from outside.
//! * **[`Sender`] & [`Receiver`]:** The two endpoints of a directional,
//!   ordered, unbounded message channel with half-close semantics. One channel
//!   carries client→server traffic, a second one carries server→client
//!   traffic; each can be half-closed independently.
//! * **[`ServiceRegistry`]:** An in-process stand-in for dial/listen. Services
//!   bind under a name; clients connect by name and fail with a connect error
//!   when nothing is bound there.
//!
//! ## Reading from a stream
//!
//! [`Receiver::message`] distinguishes the three outcomes of a streaming read
//! instead of overloading a sentinel:
//!
//! * `Ok(Some(message))` - the next payload, in send order.
//! * `Ok(None)` - normal end of stream. This is not an error.
//! * `Err(error)` - the call failed; any output delivered before the failure
//!   remains valid.
//!
//! ## Failure model
//!
//! Failures terminate exactly the call they belong to and surface to the
//! immediate caller as a [`CallError`]. There are no retries and no implicit
//! deadlines; a caller wanting a deadline wraps the await in
//! `tokio::time::timeout` itself.

pub mod call;
pub mod channel;
pub mod error;
pub mod registry;

pub use call::{Call, CallHandle, CallKind, CallStatus};
pub use channel::{Message, Receiver, Sender, channel};
pub use error::CallError;
pub use registry::{ConnectError, ServiceRegistry};
