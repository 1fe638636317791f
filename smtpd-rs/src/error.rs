use thiserror::Error;

/// Errors raised by the SMTP engine.
///
/// The protocol variants each carry a fixed status code and the exact text
/// answered to the client. Everything else (I/O, configuration, opaque
/// handler failures) is masked as `451 Internal confusion` at the write
/// boundary so internal detail never reaches the wire.
#[derive(Error, Debug)]
pub enum SmtpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Command valid but issued out of order (503).
    #[error("{0}")]
    BadSequence(&'static str),

    /// Malformed or missing command argument (501).
    #[error("Syntax: {0}")]
    BadArguments(&'static str),

    /// Verb outside the implemented command set (502).
    #[error("Error: command \"{0}\" not implemented")]
    NotImplemented(String),

    /// Empty or all-whitespace command line (500).
    #[error("Error: bad syntax")]
    Unrecognised,

    /// Catch-all for unexpected failures, including handler contract
    /// violations (451). The detail goes to the log, never to the client.
    #[error("Internal confusion")]
    Internal(String),

    /// Application-supplied status, passed through to the client verbatim.
    #[error("{message}")]
    Status {
        code: u16,
        message: String,
        log_message: Option<String>,
    },

    /// Opaque handler failure; degrades to 451 at the write boundary.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SmtpError>;

impl SmtpError {
    /// An application status answered to the client as `<code> <message>`,
    /// e.g. `452 Insufficient system storage`.
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        SmtpError::Status {
            code,
            message: message.into(),
            log_message: None,
        }
    }

    /// Like [`SmtpError::status`], with an extra diagnostic message that is
    /// logged but does not alter the wire response.
    pub fn status_logged(
        code: u16,
        message: impl Into<String>,
        log_message: impl Into<String>,
    ) -> Self {
        SmtpError::Status {
            code,
            message: message.into(),
            log_message: Some(log_message.into()),
        }
    }

    /// The status code this error answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            SmtpError::BadSequence(_) => 503,
            SmtpError::BadArguments(_) => 501,
            SmtpError::NotImplemented(_) => 502,
            SmtpError::Unrecognised => 500,
            SmtpError::Status { code, .. } => *code,
            _ => 451,
        }
    }

    /// The wire response for this error, without the trailing CRLF.
    pub fn status_line(&self) -> String {
        match self {
            SmtpError::Io(_) | SmtpError::Config(_) | SmtpError::Handler(_) => {
                "451 Internal confusion".to_string()
            }
            _ => format!("{} {}", self.status_code(), self),
        }
    }

    /// Diagnostic detail for the log; `None` when the wire response already
    /// says everything there is to say.
    pub fn log_detail(&self) -> Option<String> {
        match self {
            SmtpError::Io(e) => Some(e.to_string()),
            SmtpError::Config(e) => Some(e.clone()),
            SmtpError::Internal(detail) => Some(detail.clone()),
            SmtpError::Handler(e) => Some(format!("{e:#}")),
            SmtpError::Status { log_message, .. } => log_message.clone(),
            _ => None,
        }
    }
}
