//! Request handlers.

use bytes::Bytes;

/// Maps one request payload to an optional reply payload.
///
/// Returning `None` sends nothing back, which makes the request one-way.
pub trait Handler: Send + Sync + 'static {
    /// Produce the reply to `request`.
    fn handle(&self, request: Bytes) -> Option<Bytes>;
}

impl<F> Handler for F
where
    F: Fn(Bytes) -> Option<Bytes> + Send + Sync + 'static,
{
    fn handle(&self, request: Bytes) -> Option<Bytes> {
        self(request)
    }
}

/// Replies with the request payload unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

impl Handler for EchoHandler {
    fn handle(&self, request: Bytes) -> Option<Bytes> {
        Some(request)
    }
}
