use thiserror::Error;

use crate::traits::{CtaTrackingError, DealerDirectoryError, NotificationError};

#[derive(Debug, Error)]
pub enum MatchFlowError {
    #[error("Could not read the dealer directory. {0}")]
    DealerDirectory(#[from] DealerDirectoryError),
    #[error("Could not record the CTA click. {0}")]
    CtaTracking(#[from] CtaTrackingError),
    #[error("Notification store error. {0}")]
    Notification(#[from] NotificationError),
}
