//! Background maintenance: the expired-session sweep.

use std::sync::Arc;
use std::time::Duration;

use crate::service::App;

/// Periodically purge expired sessions from storage.
///
/// Runs until the process exits. A failed sweep is logged and retried
/// on the next tick.
pub async fn run_tasks(app: Arc<App>) {
    let interval = Duration::from_secs(app.ctx.config.database.purge_interval_secs);
    loop {
        tokio::time::sleep(interval).await;
        match app.ctx.storage.purge_expired().await {
            Ok(0) => {}
            Ok(purged) => tracing::info!(purged, "swept expired sessions"),
            Err(error) => tracing::warn!(%error, "session sweep failed"),
        }
    }
}
