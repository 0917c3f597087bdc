//! Scores dealer inventories against an extracted request.
//!
//! The scan is sequential on purpose: one backend call in flight at a time bounds the load this
//! gateway can put on the inventory service, and a busy group chat would otherwise multiply that
//! load by the dealer count. A dealer whose fetch fails is logged and skipped; the scan always
//! returns whatever it could gather.
use log::*;

use crate::{
    db_types::{Dealer, DealerMatch, DiamondRequest, InventoryItem},
    traits::InventoryFetcher,
};

/// An item qualifies once its additive score reaches this value. Numerically the same as the
/// message-confidence gate, but the two thresholds are independent policies.
pub const MATCH_SCORE_THRESHOLD: f64 = 0.3;

/// At most this many qualifying items are kept per dealer, in inventory-snapshot order.
pub const MAX_MATCHED_ITEMS: usize = 5;

const SHAPE_MATCH_WEIGHT: f64 = 0.3;
const CARAT_MIN_WEIGHT: f64 = 0.15;
const CARAT_MAX_WEIGHT: f64 = 0.15;
const COLOR_MATCH_WEIGHT: f64 = 0.2;
const CLARITY_MATCH_WEIGHT: f64 = 0.2;
const PRICE_MATCH_WEIGHT: f64 = 0.1;

/// Additive per-item score. Each satisfied criterion contributes its fixed weight; criteria the
/// request leaves unset contribute nothing either way.
pub fn score_item(request: &DiamondRequest, item: &InventoryItem) -> f64 {
    let mut score = 0.0;
    if request.shape.is_some() && request.shape == item.shape {
        score += SHAPE_MATCH_WEIGHT;
    }
    if let Some(carat_min) = request.carat_min {
        if item.weight >= carat_min {
            score += CARAT_MIN_WEIGHT;
        }
    }
    if let Some(carat_max) = request.carat_max {
        if item.weight <= carat_max {
            score += CARAT_MAX_WEIGHT;
        }
    }
    if request.color.is_some() && request.color == item.color {
        score += COLOR_MATCH_WEIGHT;
    }
    if request.clarity.is_some() && request.clarity == item.clarity {
        score += CLARITY_MATCH_WEIGHT;
    }
    if let Some(price_max) = request.price_max {
        if item.total_price() <= price_max.as_f64() {
            score += PRICE_MATCH_WEIGHT;
        }
    }
    score
}

/// Filters one inventory snapshot down to the qualifying items, truncated to the first
/// [`MAX_MATCHED_ITEMS`] in snapshot order. The cut is NOT by score; it is a load-shedding
/// simplification carried over from the original pipeline.
pub fn matching_items(request: &DiamondRequest, inventory: &[InventoryItem]) -> Vec<InventoryItem> {
    inventory.iter().filter(|item| score_item(request, item) >= MATCH_SCORE_THRESHOLD).take(MAX_MATCHED_ITEMS).cloned().collect()
}

/// Scans every dealer's inventory sequentially and returns the dealers with at least one
/// qualifying item. Single attempt per dealer; no retries.
pub async fn scan_dealer_inventories<F: InventoryFetcher>(
    fetcher: &F,
    request: &DiamondRequest,
    dealers: &[Dealer],
) -> Vec<DealerMatch> {
    let mut matches = Vec::new();
    for dealer in dealers {
        let inventory = match fetcher.fetch_inventory(dealer.telegram_id).await {
            Ok(inventory) => inventory,
            Err(e) => {
                warn!("🔎️ Skipping dealer {}: inventory fetch failed. {e}", dealer.telegram_id);
                continue;
            },
        };
        let matched_items = matching_items(request, &inventory);
        trace!("🔎️ Dealer {}: {} of {} stones qualify", dealer.telegram_id, matched_items.len(), inventory.len());
        if !matched_items.is_empty() {
            matches.push(DealerMatch { dealer_telegram_id: dealer.telegram_id, matched_items });
        }
    }
    matches
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use dmg_common::Usd;

    use super::*;
    use crate::{
        db_types::{ClarityGrade, ColorGrade, DiamondShape},
        traits::InventoryFetchError,
    };

    fn item(shape: DiamondShape, weight: f64, color: ColorGrade, clarity: ClarityGrade, ppc: f64) -> InventoryItem {
        InventoryItem {
            stock_number: None,
            shape: Some(shape),
            weight,
            color: Some(color),
            clarity: Some(clarity),
            price_per_carat: ppc,
        }
    }

    fn full_request() -> DiamondRequest {
        DiamondRequest {
            shape: Some(DiamondShape::Round),
            carat_min: Some(1.35),
            carat_max: Some(1.65),
            color: Some(ColorGrade::D),
            clarity: Some(ClarityGrade::Vs1),
            price_max: Some(Usd::from(10_000)),
            ..Default::default()
        }
    }

    #[derive(Clone, Default)]
    struct StubFetcher {
        inventories: HashMap<i64, Vec<InventoryItem>>,
        broken: Vec<i64>,
    }

    impl InventoryFetcher for StubFetcher {
        async fn fetch_inventory(&self, dealer_telegram_id: i64) -> Result<Vec<InventoryItem>, InventoryFetchError> {
            if self.broken.contains(&dealer_telegram_id) {
                return Err(InventoryFetchError::RequestFailed("boom".into()));
            }
            Ok(self.inventories.get(&dealer_telegram_id).cloned().unwrap_or_default())
        }
    }

    fn dealers(ids: &[i64]) -> Vec<Dealer> {
        ids.iter().map(|id| Dealer { telegram_id: *id, name: None }).collect()
    }

    #[test]
    fn perfect_item_scores_the_full_sum() {
        let request = full_request();
        let stone = item(DiamondShape::Round, 1.5, ColorGrade::D, ClarityGrade::Vs1, 5_000.0);
        let score = score_item(&request, &stone);
        assert!((score - 1.1).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn unset_criteria_score_nothing_even_when_fields_agree() {
        // Both sides have no shape; equality of two `None`s must not count as a match.
        let request = DiamondRequest { carat_min: Some(1.0), ..Default::default() };
        let stone = InventoryItem {
            stock_number: None,
            shape: None,
            weight: 2.0,
            color: None,
            clarity: None,
            price_per_carat: 1_000.0,
        };
        let score = score_item(&request, &stone);
        assert!((score - 0.15).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn score_exactly_at_threshold_qualifies() {
        // Shape-only request, shape-matching stone: score is exactly 0.3.
        let request = DiamondRequest { shape: Some(DiamondShape::Pear), ..Default::default() };
        let stone = item(DiamondShape::Pear, 1.0, ColorGrade::M, ClarityGrade::I3, 100.0);
        assert!((score_item(&request, &stone) - MATCH_SCORE_THRESHOLD).abs() < 1e-9);
        assert_eq!(matching_items(&request, &[stone]).len(), 1);
    }

    #[test]
    fn overpriced_stone_loses_only_the_price_weight() {
        let request = full_request();
        // 1.5 ct at $8k/ct = $12k total, over the $10k ceiling.
        let stone = item(DiamondShape::Round, 1.5, ColorGrade::D, ClarityGrade::Vs1, 8_000.0);
        let score = score_item(&request, &stone);
        assert!((score - 1.0).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn matches_are_capped_at_five_in_snapshot_order() {
        let request = DiamondRequest { shape: Some(DiamondShape::Round), ..Default::default() };
        let inventory: Vec<InventoryItem> = (0..8)
            .map(|i| {
                let mut stone = item(DiamondShape::Round, 1.0, ColorGrade::G, ClarityGrade::Si1, 1_000.0);
                stone.stock_number = Some(format!("S-{i}"));
                stone
            })
            .collect();
        let matched = matching_items(&request, &inventory);
        assert_eq!(matched.len(), MAX_MATCHED_ITEMS);
        let kept: Vec<&str> = matched.iter().map(|s| s.stock_number.as_deref().unwrap()).collect();
        assert_eq!(kept, vec!["S-0", "S-1", "S-2", "S-3", "S-4"]);
    }

    #[tokio::test]
    async fn broken_dealer_is_skipped_and_scan_continues() {
        let _ = env_logger::try_init();
        let request = DiamondRequest { shape: Some(DiamondShape::Oval), ..Default::default() };
        let mut fetcher = StubFetcher::default();
        fetcher.inventories.insert(1, vec![item(DiamondShape::Oval, 1.0, ColorGrade::E, ClarityGrade::Vs2, 2_000.0)]);
        fetcher.broken.push(2);
        fetcher.inventories.insert(3, vec![item(DiamondShape::Oval, 2.0, ColorGrade::F, ClarityGrade::Si1, 1_500.0)]);
        let matches = scan_dealer_inventories(&fetcher, &request, &dealers(&[1, 2, 3])).await;
        let ids: Vec<i64> = matches.iter().map(|m| m.dealer_telegram_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn dealers_with_no_qualifying_items_are_omitted() {
        let request = DiamondRequest { shape: Some(DiamondShape::Heart), ..Default::default() };
        let mut fetcher = StubFetcher::default();
        fetcher.inventories.insert(1, vec![item(DiamondShape::Cushion, 1.0, ColorGrade::E, ClarityGrade::Vs2, 2_000.0)]);
        fetcher.inventories.insert(2, Vec::new());
        let matches = scan_dealer_inventories(&fetcher, &request, &dealers(&[1, 2])).await;
        assert!(matches.is_empty());
    }
}
