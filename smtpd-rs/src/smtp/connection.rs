use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::error::{Result, SmtpError};
use crate::smtp::command::{extract_address, Command, Verb};
use crate::smtp::envelope::Request;
use crate::smtp::handler::{Disposition, Handler};

/// Write half of the connection, shared with the in-flight [`Request`] so
/// the handler can emit the closing acknowledgment itself.
#[derive(Clone)]
pub(crate) struct Wire {
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl Wire {
    fn new(writer: OwnedWriteHalf) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    /// Writes one `<code> <text>` status line and flushes it.
    pub(crate) async fn reply(&self, code: u16, text: &str) -> Result<()> {
        self.write_line(&format!("{code} {text}")).await
    }

    async fn write_line(&self, line: &str) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(format!("{line}\r\n").as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }
}

/// Receive state: awaiting the next command line, or the DATA payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Command,
    Data,
}

/// Result of dispatching one command.
enum Flow {
    Continue,
    Quit,
}

/// One SMTP connection, driven to completion by [`Connection::run`].
///
/// The connection owns all per-client state; dropping it (peer reset, task
/// abort) releases the pending read, the shared write half, and any
/// outstanding handler completion with it.
pub(crate) struct Connection {
    reader: BufReader<OwnedReadHalf>,
    wire: Wire,
    remote_addr: SocketAddr,
    hostname: String,
    handler: Arc<dyn Handler>,
    state: State,
    helo: Option<String>,
    mail_from: Option<String>,
    rcpt_tos: Vec<String>,
}

impl Connection {
    pub(crate) fn new(
        stream: TcpStream,
        remote_addr: SocketAddr,
        hostname: String,
        handler: Arc<dyn Handler>,
    ) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            wire: Wire::new(write_half),
            remote_addr,
            hostname,
            handler,
            state: State::Command,
            helo: None,
            mail_from: None,
            rcpt_tos: Vec::new(),
        }
    }

    /// Drives the connection until QUIT, end of stream, or a fatal I/O
    /// error. Command-level failures are answered on the wire and do not end
    /// the session.
    pub(crate) async fn run(mut self) -> Result<()> {
        self.wire
            .reply(
                220,
                &format!(
                    "{} {} {}",
                    self.hostname,
                    env!("CARGO_PKG_NAME"),
                    env!("CARGO_PKG_VERSION")
                ),
            )
            .await?;

        loop {
            match self.state {
                State::Command => {
                    let line = match self.read_line().await? {
                        Some(line) => line,
                        None => {
                            debug!("Client {} disconnected", self.remote_addr);
                            return Ok(());
                        }
                    };
                    debug!("Received: {}", line);

                    match self.dispatch(&line).await {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::Quit) => return Ok(()),
                        Err(e) => self.report(e).await?,
                    }
                }
                State::Data => {
                    let body = match self.read_data_block().await? {
                        Some(body) => body,
                        None => {
                            debug!("Client {} disconnected during DATA", self.remote_addr);
                            return Ok(());
                        }
                    };
                    self.state = State::Command;

                    if let Err(e) = self.deliver(body).await {
                        self.report(e).await?;
                    }
                }
            }
        }
    }

    /// Reads one CRLF-terminated line; `None` at end of stream.
    async fn read_line(&mut self) -> Result<Option<String>> {
        let mut buf = Vec::new();
        let n = self.reader.read_until(b'\n', &mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        while matches!(buf.last(), Some(b'\r' | b'\n')) {
            buf.pop();
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    /// Reads the DATA payload up to the lone-`.` terminator line,
    /// dot-unstuffing each line as it arrives. `None` at end of stream.
    async fn read_data_block(&mut self) -> Result<Option<String>> {
        let mut lines = Vec::new();
        loop {
            let line = match self.read_line().await? {
                Some(line) => line,
                None => return Ok(None),
            };
            if line == "." {
                return Ok(Some(lines.join("\n")));
            }
            let line = match line.strip_prefix('.') {
                Some(rest) => rest.to_string(),
                None => line,
            };
            lines.push(line);
        }
    }

    async fn dispatch(&mut self, line: &str) -> Result<Flow> {
        let command = Command::parse(line)?;
        let arg = command.arg.as_deref();

        match command.verb {
            Verb::Helo => self.command_helo(arg).await?,
            Verb::Noop => self.command_noop(arg).await?,
            Verb::Quit => return self.command_quit().await,
            Verb::Mail => self.command_mail(arg).await?,
            Verb::Rcpt => self.command_rcpt(arg).await?,
            Verb::Rset => self.command_rset(arg).await?,
            Verb::Data => self.command_data(arg).await?,
        }
        Ok(Flow::Continue)
    }

    async fn command_helo(&mut self, arg: Option<&str>) -> Result<()> {
        let hostname = match arg {
            Some(hostname) => hostname,
            None => return Err(SmtpError::BadArguments("HELO hostname")),
        };
        if self.helo.is_some() {
            return Err(SmtpError::BadSequence("Duplicate HELO/EHLO"));
        }
        self.helo = Some(hostname.to_string());
        self.wire
            .reply(250, &format!("Hello {}", self.remote_addr.ip()))
            .await
    }

    async fn command_noop(&mut self, arg: Option<&str>) -> Result<()> {
        if arg.is_some() {
            return Err(SmtpError::BadArguments("NOOP"));
        }
        self.wire.reply(250, "Ok").await
    }

    // Any argument is ignored.
    async fn command_quit(&mut self) -> Result<Flow> {
        self.wire.reply(221, "Bye").await?;
        Ok(Flow::Quit)
    }

    async fn command_mail(&mut self, arg: Option<&str>) -> Result<()> {
        let address = match arg.and_then(|arg| extract_address("FROM:", arg)) {
            Some(address) => address,
            None => return Err(SmtpError::BadArguments("MAIL FROM:<address>")),
        };
        if self.mail_from.is_some() {
            return Err(SmtpError::BadSequence("Error: nested MAIL command"));
        }
        self.mail_from = Some(address.to_string());
        self.wire.reply(250, "Ok").await
    }

    async fn command_rcpt(&mut self, arg: Option<&str>) -> Result<()> {
        if self.mail_from.is_none() {
            return Err(SmtpError::BadSequence("Error: need MAIL command"));
        }
        let address = match arg.and_then(|arg| extract_address("TO:", arg)) {
            Some(address) => address,
            None => return Err(SmtpError::BadArguments("RCPT TO:<address>")),
        };
        self.rcpt_tos.push(address.to_string());
        self.wire.reply(250, "Ok").await
    }

    // Clears the sender, recipients, and receive state, but not the greeting.
    async fn command_rset(&mut self, arg: Option<&str>) -> Result<()> {
        if arg.is_some() {
            return Err(SmtpError::BadArguments("RSET"));
        }
        self.mail_from = None;
        self.rcpt_tos.clear();
        self.state = State::Command;
        self.wire.reply(250, "Ok").await
    }

    async fn command_data(&mut self, arg: Option<&str>) -> Result<()> {
        if self.rcpt_tos.is_empty() {
            return Err(SmtpError::BadSequence("Error: need RCPT command"));
        }
        if arg.is_some() {
            return Err(SmtpError::BadArguments("DATA"));
        }
        self.state = State::Data;
        self.wire
            .reply(354, "End data with <CR><LF>.<CR><LF>")
            .await
    }

    /// Hands a completed envelope to the handler and sees its completion
    /// through, immediately or once the deferred future resolves.
    async fn deliver(&mut self, body: String) -> Result<()> {
        // Snapshot and clear the envelope before the handler runs, so a
        // deferred handler never observes the next transaction's state.
        let sender = match self.mail_from.take() {
            Some(sender) => sender,
            None => return Err(SmtpError::Internal("DATA completed without a sender".to_string())),
        };
        let recipients = std::mem::take(&mut self.rcpt_tos);

        let request = Request::new(
            self.remote_addr,
            self.helo.clone(),
            sender,
            recipients,
            body,
            self.wire.clone(),
        );

        let completion = match self.handler.handle(Arc::clone(&request)) {
            Ok(Disposition::Done) => Ok(()),
            Ok(Disposition::Deferred(deferred)) => deferred.await,
            Err(e) => Err(e),
        };

        match completion {
            Ok(()) => request.acknowledge().await,
            Err(e) if request.is_finished() => {
                // The client already has its final reply; the failure is a
                // local handler defect and goes to the diagnostics only.
                error!(
                    "Handler for {} failed after completing the request: {:?}",
                    self.remote_addr, e
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// The single boundary where raised errors become wire responses. The
    /// connection stays open; only transport failures propagate.
    async fn report(&mut self, error: SmtpError) -> Result<()> {
        match error.log_detail() {
            Some(detail) => error!(
                "Client {} request failed ({}): {}",
                self.remote_addr,
                error.status_code(),
                detail
            ),
            None => warn!(
                "Client {} rejected ({}): {}",
                self.remote_addr,
                error.status_code(),
                error
            ),
        }
        self.wire.write_line(&error.status_line()).await
    }
}
