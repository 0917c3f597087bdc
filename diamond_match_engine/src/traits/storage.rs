use thiserror::Error;

use crate::db_types::{Dealer, NewCtaClick, NewNotification};

#[derive(Debug, Clone, Error)]
pub enum DealerDirectoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// The directory of dealers whose inventories get scanned for every qualifying request.
#[allow(async_fn_in_trait)]
pub trait DealerDirectory {
    async fn fetch_active_dealers(&self) -> Result<Vec<Dealer>, DealerDirectoryError>;
}

#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("A notification with idempotency key {0} already exists")]
    Duplicate(String),
}

/// Write side of the notification store. Each insert is independent; there is deliberately no
/// transaction spanning a fan-out, so one dealer's failure cannot roll back another's row.
#[allow(async_fn_in_trait)]
pub trait NotificationManagement {
    /// Inserts a single notification and returns its row id. Must return
    /// [`NotificationError::Duplicate`] when the notification carries an idempotency key that is
    /// already present.
    async fn insert_notification(&self, notification: NewNotification) -> Result<i64, NotificationError>;
}

#[derive(Debug, Clone, Error)]
pub enum CtaTrackingError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Records `/start <parameter>` deep-link clicks for the campaign dashboards.
#[allow(async_fn_in_trait)]
pub trait CtaTracking {
    async fn record_cta_click(&self, click: NewCtaClick) -> Result<i64, CtaTrackingError>;
}

/// Umbrella trait for stores that provide everything the webhook flow needs.
pub trait MatchStorage: DealerDirectory + NotificationManagement + CtaTracking {}

impl<T> MatchStorage for T where T: DealerDirectory + NotificationManagement + CtaTracking {}
