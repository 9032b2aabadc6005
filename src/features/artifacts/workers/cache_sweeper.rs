use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;

use crate::features::artifacts::services::ProviderCacheService;

/// Background worker that periodically drops expired provider-file entries
pub struct CacheSweeper {
    cache_service: Arc<ProviderCacheService>,
    interval_secs: u64,
}

impl CacheSweeper {
    pub fn new(cache_service: Arc<ProviderCacheService>, interval_secs: u64) -> Self {
        Self {
            cache_service,
            interval_secs,
        }
    }

    /// Run the sweeper in a background loop
    pub async fn run(&self) {
        tracing::info!(
            "Starting provider-file cache sweeper (every {}s)",
            self.interval_secs
        );

        let mut interval = interval(Duration::from_secs(self.interval_secs));

        loop {
            interval.tick().await;

            if let Err(e) = self.cache_service.sweep_expired().await {
                tracing::error!("Error sweeping provider-file cache: {:?}", e);
            }
        }
    }
}
