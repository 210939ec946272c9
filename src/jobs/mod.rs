use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

pub mod tasks;

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<crate::context::AppContext>,
    shutdown_tx: watch::Sender<bool>,
}

impl JobScheduler {
    pub fn new(context: Arc<crate::context::AppContext>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            context,
            shutdown_tx,
        }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!("Starting background job scheduler");

        tokio::spawn(Self::media_compression_job(Arc::clone(&self)));

        info!("Background jobs started");
    }

    /// Signal all jobs to stop after their current cycle
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Media compression sweep (LQIP previews + video thumbnails).
    ///
    /// Runs once per configured interval, forever, until shutdown is
    /// signalled. A failing cycle is logged and never terminates the
    /// loop; files that failed are picked up again next cycle.
    async fn media_compression_job(scheduler: Arc<Self>) {
        let period = Duration::from_secs(scheduler.context.config.media.compress_interval_secs);
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown_rx = scheduler.shutdown_tx.subscribe();
        // A receiver subscribed after the signal considers it seen
        if *shutdown_rx.borrow() {
            return;
        }

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown_rx.changed() => {
                    info!("Media compression job shutting down");
                    return;
                }
            }

            info!("Running media compression cycle");

            match tasks::run_compression_cycle(&scheduler.context).await {
                Ok((images, videos)) => {
                    info!(
                        "Compression cycle done: {} previews, {} thumbnails generated ({} skipped, {} failed)",
                        images.generated,
                        videos.generated,
                        images.skipped + videos.skipped,
                        images.failed + videos.failed,
                    );
                }
                Err(e) => error!("Media compression cycle failed: {}", e),
            }
        }
    }
}
