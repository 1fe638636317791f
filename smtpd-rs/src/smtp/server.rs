use crate::config::Config;
use crate::error::Result;
use crate::smtp::connection::Connection;
use crate::smtp::handler::Handler;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Accepts SMTP connections and runs one [`Connection`] task per client.
pub struct SmtpServer {
    config: Config,
    handler: Arc<dyn Handler>,
}

impl SmtpServer {
    pub fn new(config: Config, handler: Arc<dyn Handler>) -> Self {
        Self { config, handler }
    }

    /// Binds the configured address and serves until the task is dropped.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.smtp.listen_addr).await?;
        info!("SMTP server listening on {}", self.config.smtp.listen_addr);
        self.run_on(listener).await
    }

    /// Serves connections from an already-bound listener.
    ///
    /// Useful for embedding and for tests that bind port 0.
    pub async fn run_on(&self, listener: TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, addr)) => {
                    info!("New SMTP connection from {}", addr);

                    let connection = Connection::new(
                        socket,
                        addr,
                        self.config.server.hostname.clone(),
                        Arc::clone(&self.handler),
                    );

                    tokio::spawn(async move {
                        if let Err(e) = connection.run().await {
                            error!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}
