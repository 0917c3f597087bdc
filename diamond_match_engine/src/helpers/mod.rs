mod idempotency;
mod request_extractor;

pub use idempotency::notification_idempotency_key;
pub use request_extractor::{
    extract_diamond_request,
    CARAT_WEIGHT,
    CLARITY_WEIGHT,
    COLOR_WEIGHT,
    KEYWORD_WEIGHT,
    PRICE_WEIGHT,
    SHAPE_WEIGHT,
};
