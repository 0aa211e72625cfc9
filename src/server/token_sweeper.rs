use crate::application_port::*;
use crate::logger::*;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Periodically deletes refresh tokens that are revoked and past expiry.
pub struct TokenSweeper {
    auth_service: Arc<dyn AuthService>,
    interval: Duration,
    cancellation_token: CancellationToken,
}

impl TokenSweeper {
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        interval: Duration,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            auth_service,
            interval,
            cancellation_token,
        }
    }

    async fn tick_once(&self) -> anyhow::Result<usize> {
        let purged = self.auth_service.purge_expired_tokens(Utc::now()).await?;
        if purged > 0 {
            info!(purged, "revoked refresh tokens purged");
        }
        Ok(purged)
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        loop {
            tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => {
                    info!("token sweeper shutting down...");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {
                    if let Err(e) = self.tick_once().await {
                        error!("token sweeper error: {:#}", e);
                    }
                }
            }
        }
        Ok(())
    }
}
