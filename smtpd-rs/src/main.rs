use smtpd_rs::config::Config;
use smtpd_rs::smtp::{Disposition, Request, SmtpServer};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Sink handler for the standalone binary: log the envelope and accept.
fn log_and_accept(request: Arc<Request>) -> smtpd_rs::Result<Disposition> {
    let subject = request
        .message()
        .and_then(|message| message.subject().map(str::to_owned));
    info!(
        "Message accepted: from={} to={:?} subject={:?} size={}",
        request.sender(),
        request.recipients(),
        subject,
        request.body().len()
    );
    Ok(Disposition::Done)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = if std::path::Path::new("config.toml").exists() {
        Config::from_file("config.toml")?
    } else {
        Config::default()
    };

    // Initialize logging
    let level: Level = config.logging.level.parse().unwrap_or(Level::INFO);
    if config.logging.format == "json" {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .pretty()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    info!("Starting smtpd-rs");
    info!("  SMTP listening on: {}", config.smtp.listen_addr);
    info!("  Hostname: {}", config.server.hostname);

    let server = SmtpServer::new(config, Arc::new(log_and_accept));
    server.run().await?;

    Ok(())
}
