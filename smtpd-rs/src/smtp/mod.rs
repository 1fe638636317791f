//! Inbound SMTP protocol engine (RFC 5321 subset)
//!
//! - [`server`]: accept loop, one task per connection
//! - `connection`: per-connection command/DATA state machine
//! - [`command`]: command-line parsing and address extraction
//! - [`envelope`]: the completed transaction handed to the application
//! - [`handler`]: the application completion contract

pub mod command;
pub(crate) mod connection;
pub mod envelope;
pub mod handler;
pub mod server;

pub use command::{Command, Verb};
pub use envelope::Request;
pub use handler::{Disposition, Handler};
pub use server::SmtpServer;
