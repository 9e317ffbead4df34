use std::sync::Arc;

use tokio::sync::watch;

use crate::adapter::pvnode::PVNode;
use crate::core::time::Duration;
use crate::forecast::Estimate;

/// Polls the forecast client on a fixed interval and publishes the latest
/// snapshot. The poll interval is independent of the client's freshness
/// window, so most ticks are answered from the cache. A failed tick marks
/// the published data stale; the next tick is the only retry.
pub struct ForecastCoordinator {
    pvnode: PVNode,
    interval: Duration,
    tx: watch::Sender<Option<Arc<Estimate>>>,
}

impl ForecastCoordinator {
    pub fn new(pvnode: PVNode, interval: Duration) -> (Self, watch::Receiver<Option<Arc<Estimate>>>) {
        let (tx, rx) = watch::channel(None);

        (Self { pvnode, interval, tx }, rx)
    }

    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval.clone().into());

        loop {
            ticker.tick().await;

            match self.pvnode.estimate().await {
                Ok(estimate) => {
                    tracing::debug!(
                        "Publishing forecast from {}",
                        estimate.last_update().to_human_readable()
                    );
                    let _ = self.tx.send(Some(estimate));
                }
                Err(e) => {
                    tracing::error!("Error fetching forecast, marking data stale: {:?}", e);
                    let _ = self.tx.send(None);
                }
            }
        }
    }
}
