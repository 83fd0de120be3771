//! # Call Errors
//!
//! Failures that can terminate a call while it is in flight. Connect-time
//! failures live with the [`crate::registry`] module instead, mirroring the
//! split between establishing an endpoint and talking over it.
//!
//! Normal end of input is *not* represented here: streaming reads report it
//! as `Ok(None)` from [`crate::Receiver::message`].

/// A terminal failure of a single call.
///
/// Errors are cloneable so the same failure can be both returned to the
/// handler side and delivered in-band to the consumer side of a stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    /// An operation was attempted on a half-closed or closed channel.
    #[error("channel closed")]
    ChannelClosed,
    /// The handler's business logic raised an error.
    #[error("handler failure: '{0}'")]
    Handler(String),
    /// The call was aborted by its originating side.
    #[error("call cancelled")]
    Cancelled,
}

impl CallError {
    /// Builds a business-logic failure with the given message.
    pub fn handler(message: impl Into<String>) -> Self {
        CallError::Handler(message.into())
    }
}
