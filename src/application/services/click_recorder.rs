//! Best-effort click recording.

use std::sync::Arc;
use std::time::Duration;

use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::entities::NewClick;
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::infrastructure::cache::EphemeralStore;
use crate::utils::user_agent::classify_user_agent;

/// Ephemeral key of the near-real-time click counter for a code.
pub fn fast_counter_key(code: &str) -> String {
    format!("link:{}:clicks", code)
}

/// Persists one click per [`ClickEvent`].
///
/// Runs off the request path. Steps after the link lookup are independent:
/// a failed click insert still increments the counters, and vice versa.
/// Nothing is propagated to the caller; failures are logged and counted.
pub struct ClickRecorder<
    L: LinkRepository + ?Sized = dyn LinkRepository,
    C: ClickRepository + ?Sized = dyn ClickRepository,
> {
    link_repository: Arc<L>,
    click_repository: Arc<C>,
    store: Arc<dyn EphemeralStore>,
}

impl<L, C> ClickRecorder<L, C>
where
    L: LinkRepository + ?Sized,
    C: ClickRepository + ?Sized,
{
    pub fn new(
        link_repository: Arc<L>,
        click_repository: Arc<C>,
        store: Arc<dyn EphemeralStore>,
    ) -> Self {
        Self {
            link_repository,
            click_repository,
            store,
        }
    }

    fn lookup_backoff() -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(2)
            .factor(10)
            .max_delay(Duration::from_millis(250))
            .map(jitter)
            .take(3)
    }

    /// Records a single click. Always completes; never panics on store errors.
    pub async fn record(&self, event: ClickEvent) {
        let code = event.code.as_str();

        let link = match Retry::spawn(Self::lookup_backoff(), || {
            self.link_repository.find_by_code(code)
        })
        .await
        {
            Ok(Some(link)) => link,
            Ok(None) => {
                debug!(code, "Click for unknown code dropped");
                return;
            }
            Err(e) => {
                warn!(code, error = %e, "Click lookup failed after retries");
                metrics::counter!("click_record_failures_total", "step" => "lookup").increment(1);
                return;
            }
        };

        let device = classify_user_agent(event.user_agent.as_deref().unwrap_or_default());

        let new_click = NewClick {
            link_id: link.id,
            ip_address: event.ip,
            user_agent: event.user_agent,
            referer: event.referer,
            device_type: device.device_type.to_string(),
            browser: device.browser.to_string(),
            os: device.os.to_string(),
        };

        if let Err(e) = self.click_repository.record(new_click).await {
            warn!(code, link_id = link.id, error = %e, "Failed to insert click");
            metrics::counter!("click_record_failures_total", "step" => "insert").increment(1);
        }

        if let Err(e) = self.link_repository.increment_click_count(link.id).await {
            warn!(code, link_id = link.id, error = %e, "Failed to increment click count");
            metrics::counter!("click_record_failures_total", "step" => "counter").increment(1);
        }

        if let Err(e) = self.store.incr(&fast_counter_key(code)).await {
            warn!(code, error = %e, "Failed to increment fast click counter");
            metrics::counter!("click_record_failures_total", "step" => "fast_counter")
                .increment(1);
        }

        debug!(code, link_id = link.id, "Click recorded");
    }
}
