use blake2::{Blake2b512, Digest};

/// Derives the notification idempotency key for one (update, dealer) pair.
///
/// Deterministic: a platform-side redelivery of the same update id produces the same key, which
/// lets the notification store's uniqueness constraint swallow the duplicate insert. The key is
/// only attached when idempotent inserts are enabled; without it the store happily duplicates,
/// which is the historical behaviour.
pub fn notification_idempotency_key(update_id: i64, dealer_telegram_id: i64) -> String {
    let mut hasher = Blake2b512::new();
    hasher.update(update_id.to_be_bytes());
    hasher.update(dealer_telegram_id.to_be_bytes());
    let digest = hasher.finalize();
    digest[..16].iter().map(|b| format!("{b:02x}")).collect()
}
