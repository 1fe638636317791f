use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use mail_parser::{Message, MessageParser};
use tracing::debug;

use crate::error::{Result, SmtpError};
use crate::smtp::connection::Wire;

/// A completed mail transaction, handed to the [`Handler`].
///
/// The envelope is a snapshot: the connection's own sender and recipient
/// state is already cleared by the time the handler sees this, so a slow
/// handler never observes the next transaction.
///
/// [`Handler`]: crate::smtp::handler::Handler
pub struct Request {
    remote_addr: SocketAddr,
    helo: Option<String>,
    sender: String,
    recipients: Vec<String>,
    body: String,
    parsed: OnceLock<Option<Message<'static>>>,
    finished: AtomicBool,
    wire: Wire,
}

impl Request {
    pub(crate) fn new(
        remote_addr: SocketAddr,
        helo: Option<String>,
        sender: String,
        recipients: Vec<String>,
        body: String,
        wire: Wire,
    ) -> Arc<Self> {
        Arc::new(Self {
            remote_addr,
            helo,
            sender,
            recipients,
            body,
            parsed: OnceLock::new(),
            finished: AtomicBool::new(false),
            wire,
        })
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Hostname the client announced with HELO, if it sent one.
    pub fn helo(&self) -> Option<&str> {
        self.helo.as_deref()
    }

    /// Envelope sender. The null reverse-path is the literal `<>`.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Raw message body: dot-unstuffed, lines joined with `\n`.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The body parsed as a mail message.
    ///
    /// Parsed on first access and cached for the lifetime of the envelope;
    /// `None` when the body is not parseable as a message.
    pub fn message(&self) -> Option<&Message<'static>> {
        self.parsed
            .get_or_init(|| {
                MessageParser::default()
                    .parse(self.body.as_bytes())
                    .map(|message| message.into_owned())
            })
            .as_ref()
    }

    /// Finishes the request, writing the closing `250 Ok` acknowledgment.
    ///
    /// A request finishes exactly once. A second call is a handler bug and
    /// returns an internal error rather than being silently ignored.
    pub async fn finish(&self) -> Result<()> {
        if self.finished.swap(true, Ordering::SeqCst) {
            return Err(SmtpError::Internal("request finished twice".to_string()));
        }
        self.wire.reply(250, "Ok").await
    }

    /// Engine-side completion: acknowledges unless the handler already did.
    pub(crate) async fn acknowledge(&self) -> Result<()> {
        if self.finished.swap(true, Ordering::SeqCst) {
            debug!("Handler already finished the request");
            return Ok(());
        }
        self.wire.reply(250, "Ok").await
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}
