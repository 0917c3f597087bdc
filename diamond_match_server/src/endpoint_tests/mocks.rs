use diamond_match_engine::{
    db_types::{Dealer, InventoryItem, NewCtaClick, NewNotification},
    traits::{
        CtaTracking,
        CtaTrackingError,
        DealerDirectory,
        DealerDirectoryError,
        InventoryFetchError,
        InventoryFetcher,
        NotificationError,
        NotificationManagement,
        PostComposer,
        PostComposerError,
    },
};
use mockall::mock;

mock! {
    pub MatchStore {}
    impl DealerDirectory for MatchStore {
        async fn fetch_active_dealers(&self) -> Result<Vec<Dealer>, DealerDirectoryError>;
    }
    impl NotificationManagement for MatchStore {
        async fn insert_notification(&self, notification: NewNotification) -> Result<i64, NotificationError>;
    }
    impl CtaTracking for MatchStore {
        async fn record_cta_click(&self, click: NewCtaClick) -> Result<i64, CtaTrackingError>;
    }
}

mock! {
    pub Inventory {}
    impl InventoryFetcher for Inventory {
        async fn fetch_inventory(&self, dealer_telegram_id: i64) -> Result<Vec<InventoryItem>, InventoryFetchError>;
    }
}

mock! {
    pub Composer {}
    impl PostComposer for Composer {
        async fn generate_diamond_post(&self, dealer_telegram_id: i64) -> Result<(), PostComposerError>;
    }
}
