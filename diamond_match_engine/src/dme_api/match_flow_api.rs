use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{DealerMatch, DiamondRequest, NewCtaClick, NewNotification, RequestContext},
    dme_api::matcher::scan_dealer_inventories,
    events::{DealerNotifiedEvent, EventProducers},
    helpers::notification_idempotency_key,
    traits::{CtaTracking, DealerDirectory, InventoryFetcher, NotificationError, NotificationManagement},
    MatchFlowError,
};

/// `MatchFlowApi` is the primary API for turning an extracted diamond request into persisted
/// dealer notifications. The caller (the webhook orchestrator) is responsible for gating on
/// request confidence before invoking it.
pub struct MatchFlowApi<B, F> {
    db: B,
    fetcher: F,
    producers: EventProducers,
    idempotent_inserts: bool,
}

impl<B, F> Debug for MatchFlowApi<B, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MatchFlowApi")
    }
}

impl<B, F> MatchFlowApi<B, F> {
    pub fn new(db: B, fetcher: F, producers: EventProducers) -> Self {
        Self { db, fetcher, producers, idempotent_inserts: false }
    }

    /// When enabled, every dispatched notification carries a deterministic key derived from the
    /// update id and dealer id, and redelivered updates stop producing duplicate rows. Off by
    /// default: duplicate-on-redelivery is the historical behaviour and some dashboards count on
    /// seeing the repeats.
    pub fn with_idempotent_inserts(mut self, enabled: bool) -> Self {
        self.idempotent_inserts = enabled;
        self
    }
}

impl<B, F> MatchFlowApi<B, F>
where
    B: DealerDirectory + NotificationManagement + CtaTracking,
    F: InventoryFetcher,
{
    /// Runs the full match-and-notify fan-out for one extracted request.
    ///
    /// Scans every dealer in the directory sequentially, then inserts one notification per dealer
    /// with at least one qualifying stone. Insert failures are per-dealer: they are logged and do
    /// not stop the remaining dealers from being notified. Returns the matches regardless of how
    /// many notifications could actually be recorded.
    pub async fn process_diamond_request(
        &self,
        request: &DiamondRequest,
        ctx: &RequestContext,
    ) -> Result<Vec<DealerMatch>, MatchFlowError> {
        let dealers = self.db.fetch_active_dealers().await?;
        debug!(
            "🔎️ Scanning {} dealer inventories for update {} from {}",
            dealers.len(),
            ctx.update_id,
            ctx.requester.display_name()
        );
        let matches = scan_dealer_inventories(&self.fetcher, request, &dealers).await;
        info!("🔎️ Update {}: {} of {} dealers hold matching stones", ctx.update_id, matches.len(), dealers.len());
        self.dispatch_notifications(request, &matches, ctx).await;
        Ok(matches)
    }

    async fn dispatch_notifications(&self, request: &DiamondRequest, matches: &[DealerMatch], ctx: &RequestContext) {
        for dealer_match in matches {
            let dealer_id = dealer_match.dealer_telegram_id;
            let mut notification = NewNotification::for_dealer_match(request, dealer_match, ctx);
            if self.idempotent_inserts {
                notification = notification.with_idempotency_key(notification_idempotency_key(ctx.update_id, dealer_id));
            }
            match self.db.insert_notification(notification).await {
                Ok(notification_id) => {
                    debug!("🔎️ Notification #{notification_id} recorded for dealer {dealer_id}");
                    self.call_dealer_notified_hook(notification_id, dealer_match).await;
                },
                Err(NotificationError::Duplicate(key)) => {
                    info!("🔎️ Dealer {dealer_id} was already notified for update {} (key {key})", ctx.update_id);
                },
                Err(e) => {
                    warn!("🔎️ Could not record notification for dealer {dealer_id}. {e}");
                },
            }
        }
    }

    async fn call_dealer_notified_hook(&self, notification_id: i64, dealer_match: &DealerMatch) {
        for emitter in &self.producers.dealer_notified_producer {
            let event = DealerNotifiedEvent::new(notification_id, dealer_match.clone());
            emitter.publish_event(event).await;
        }
    }

    /// Records a `/start <parameter>` deep-link click. Completely independent of the matching
    /// pipeline; the orchestrator short-circuits into this before any extraction happens.
    pub async fn record_cta_click(&self, click: NewCtaClick) -> Result<i64, MatchFlowError> {
        let id = self.db.record_cta_click(click).await?;
        debug!("🔎️ CTA click #{id} recorded");
        Ok(id)
    }
}
