use chrono::Utc;
use std::sync::Arc;
use tokio::time::{Duration, sleep};
use tracing::{debug, info};

use crate::application::services::poll_service::PollService;

const EXPIRY_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Expiry loop for reaction polls. Unlike the Wichtel loop this one runs for
/// the whole process lifetime; an empty expired set on a tick is the normal
/// case.
pub struct PollScheduler;

impl PollScheduler {
    pub fn start(service: Arc<PollService>) {
        tokio::spawn(async move {
            info!("Poll expiry check started");
            loop {
                sleep(EXPIRY_CHECK_INTERVAL).await;
                let closed = service.close_expired(Utc::now()).await;
                if closed > 0 {
                    debug!("Closed {} poll(s) on this tick", closed);
                }
            }
        });
    }
}
