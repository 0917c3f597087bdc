use serde::{Deserialize, Serialize};

use crate::db_types::{DealerMatch, MessageType};

/// Emitted once per notification row the dispatcher manages to insert. The delivery worker (which
/// actually talks to Telegram's send API) subscribes to these rather than polling the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealerNotifiedEvent {
    pub notification_id: i64,
    pub message_type: MessageType,
    pub dealer_match: DealerMatch,
}

impl DealerNotifiedEvent {
    pub fn new(notification_id: i64, dealer_match: DealerMatch) -> Self {
        Self { notification_id, message_type: MessageType::GroupDiamondRequest, dealer_match }
    }
}
