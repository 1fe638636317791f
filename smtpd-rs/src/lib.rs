//! smtpd-rs: Minimal inbound SMTP protocol engine
//!
//! Accepts SMTP connections, drives each client through the command
//! sequence (HELO, MAIL, RCPT, DATA, RSET, NOOP, QUIT), and hands every
//! completed envelope to an application [`Handler`](smtp::Handler).
//!
//! # Features
//!
//! - **Protocol engine**: command sequencing, argument validation, and
//!   dot-unstuffed DATA framing (RFC 5321 subset)
//! - **Sync or deferred completion**: handlers finish a request immediately
//!   or after a suspended operation, with exactly-once acknowledgment
//! - **Lazy parsing**: the raw body parses into a structured message on
//!   first access only
//! - **Performance**: async/await with Tokio, one independent task per
//!   connection
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use smtpd_rs::config::Config;
//! use smtpd_rs::smtp::{Disposition, Request, SmtpServer};
//!
//! fn deliver(request: Arc<Request>) -> smtpd_rs::Result<Disposition> {
//!     println!("message from {} for {:?}", request.sender(), request.recipients());
//!     Ok(Disposition::Done)
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = SmtpServer::new(Config::default(), Arc::new(deliver));
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration management
//! - [`error`]: Error types and status-line mapping
//! - [`smtp`]: SMTP protocol implementation

pub mod config;
pub mod error;
pub mod smtp;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, SmtpError};
