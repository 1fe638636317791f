use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::Result;
use crate::smtp::envelope::Request;

/// How a handler finished, or will finish, a request.
pub enum Disposition {
    /// The request was handled to completion; the connection acknowledges it
    /// right away.
    Done,
    /// Completion is pending: the connection suspends until the future
    /// resolves, then acknowledges.
    Deferred(BoxFuture<'static, Result<()>>),
}

/// Application callback, invoked once per completed envelope.
///
/// `handle` runs on the connection task and must not block; work that needs
/// to wait goes into a [`Disposition::Deferred`] future. On completion the
/// connection writes the closing `250 Ok` unless the handler already called
/// [`Request::finish`] itself.
///
/// Returning an error answers the client with that error's status line:
/// [`SmtpError::Status`](crate::error::SmtpError::Status) values pass through
/// verbatim, anything else is masked as `451 Internal confusion`. The
/// connection stays open either way.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: Arc<Request>) -> Result<Disposition>;
}

/// Plain functions and closures are handlers.
impl<F> Handler for F
where
    F: Fn(Arc<Request>) -> Result<Disposition> + Send + Sync + 'static,
{
    fn handle(&self, request: Arc<Request>) -> Result<Disposition> {
        self(request)
    }
}
