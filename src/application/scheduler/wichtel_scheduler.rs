use chrono::Utc;
use std::sync::Arc;
use tokio::time::{Duration, sleep};
use tracing::{debug, info};

use crate::application::services::wichtel_service::{TickOutcome, WichtelService};

/// How often an open signup window is checked for expiry.
const EXPIRY_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Expiry loop for the Wichteln signup window. One loop runs per open round
/// and terminates itself as soon as the round is gone, whether it ended on
/// this loop's own tick, through the force-end command, or by defensive
/// reset.
pub struct WichtelScheduler;

impl WichtelScheduler {
    pub fn start(service: Arc<WichtelService>) {
        tokio::spawn(async move {
            info!("Wichtel expiry check started");
            loop {
                sleep(EXPIRY_CHECK_INTERVAL).await;
                match service.tick(Utc::now()).await {
                    TickOutcome::Pending => {}
                    TickOutcome::Finished => {
                        info!("Wichtel round finished, expiry check stopping");
                        break;
                    }
                    TickOutcome::Stopped => {
                        debug!("No active Wichtel round, expiry check stopping");
                        break;
                    }
                }
            }
        });
    }
}
