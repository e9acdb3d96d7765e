//! # Example: monitor accounts until they come back
//!
//! Polls the public profile endpoint for every id given on the command line
//! and logs a recovery notice once one of them is reachable again.
//!
//! ```text
//! RECOVERWATCH_SESSIONS=token-a,token-b \
//!   cargo run --example monitor -- some.user another_user
//! ```
//!
//! Ctrl-C stops every task; registry entries stay in memory only.

use std::sync::Arc;

use anyhow::{Context, bail};
use async_trait::async_trait;
use tracing::info;
use tracing_subscriber::EnvFilter;

use recoverwatch::{
    Attachment, Courier, CourierSink, CredentialPool, Destination, EngineBuilder, EngineConfig,
    EntityId, HttpTransport, HttpTransportConfig, NotifyError,
};

/// Courier that writes notices to the log instead of a chat.
struct LogCourier;

#[async_trait]
impl Courier for LogCourier {
    async fn send_text(&self, destination: &Destination, text: &str) -> Result<(), NotifyError> {
        info!(%destination, "\n{text}");
        Ok(())
    }

    async fn send_attachment(
        &self,
        destination: &Destination,
        attachment: Attachment,
        caption: &str,
    ) -> Result<(), NotifyError> {
        info!(%destination, file = %attachment.file_name, "\n{caption}");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,recoverwatch=debug")),
        )
        .init();

    let sessions = std::env::var("RECOVERWATCH_SESSIONS")
        .context("RECOVERWATCH_SESSIONS must hold comma-separated session tokens")?;
    let pool = Arc::new(CredentialPool::new(sessions.split(',')));

    let ids: Vec<EntityId> = std::env::args()
        .skip(1)
        .filter_map(|raw| EntityId::parse(&raw))
        .collect();
    if ids.is_empty() {
        bail!("usage: monitor <id>...");
    }

    let cfg = EngineConfig::default();
    let transport = HttpTransport::new(HttpTransportConfig::default())?;
    let sink = CourierSink::new(LogCourier).with_attachments(cfg.generate_attachments);

    let engine = EngineBuilder::new(cfg)
        .with_credentials(pool)
        .with_transport(Arc::new(transport))
        .with_sink(Arc::new(sink))
        .build()?;

    for id in ids {
        engine.start_monitoring(id, Destination::from("log")).await;
    }

    engine.run_until_signal().await?;
    Ok(())
}
