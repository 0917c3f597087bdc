//! Turns free-text group chat messages into structured [`DiamondRequest`]s.
//!
//! The grammar is deliberately shallow: ordered substring vocabularies for shape and clarity, two
//! regexes for carat, one letter-between-spaces heuristic for color and a `$X`/`Xk` pattern for
//! price. Each detected field adds a fixed weight to the confidence score; nothing is subtracted
//! and the sum is not clamped, so a message hitting every category scores above 1.0.
//!
//! Extraction never fails. A message with no recognizable fields simply comes back with
//! confidence 0 and every field unset.
use dmg_common::Usd;
use regex::Regex;

use crate::db_types::{ColorGrade, DiamondRequest, CLARITY_VOCABULARY, SHAPE_VOCABULARY};

pub const SHAPE_WEIGHT: f64 = 0.30;
pub const CARAT_WEIGHT: f64 = 0.25;
pub const COLOR_WEIGHT: f64 = 0.20;
pub const CLARITY_WEIGHT: f64 = 0.20;
pub const PRICE_WEIGHT: f64 = 0.15;
pub const KEYWORD_WEIGHT: f64 = 0.10;

/// Generic words that mark a message as diamond talk even when no concrete field is present.
/// Checked in order; the first hit is recorded and the weight applied once.
const CONTEXT_KEYWORDS: [&str; 4] = ["diamond", "stone", "gem", "brilliant"];

pub fn extract_diamond_request(text: &str) -> DiamondRequest {
    let haystack = text.to_lowercase();
    let mut request = DiamondRequest::default();

    // First shape in vocabulary order wins, regardless of where it appears in the message.
    if let Some(shape) = SHAPE_VOCABULARY.into_iter().find(|shape| haystack.contains(shape.token())) {
        request.shape = Some(shape);
        request.keywords.push(format!("shape:{shape}"));
        request.confidence += SHAPE_WEIGHT;
    }

    if let Some((carat_min, carat_max)) = extract_carat_band(&haystack) {
        request.carat_min = Some(carat_min);
        request.carat_max = Some(carat_max);
        request.keywords.push(format!("carat:{carat_min:.2}-{carat_max:.2}"));
        request.confidence += CARAT_WEIGHT;
    }

    if let Some(color) = extract_color(&haystack) {
        request.color = Some(color);
        request.keywords.push(format!("color:{color}"));
        request.confidence += COLOR_WEIGHT;
    }

    if let Some(clarity) = CLARITY_VOCABULARY.into_iter().find(|grade| haystack.contains(grade.token())) {
        request.clarity = Some(clarity);
        request.keywords.push(format!("clarity:{clarity}"));
        request.confidence += CLARITY_WEIGHT;
    }

    if let Some(price_max) = extract_price_ceiling(&haystack) {
        request.price_max = Some(price_max);
        request.keywords.push(format!("price:{price_max}"));
        request.confidence += PRICE_WEIGHT;
    }

    if let Some(keyword) = CONTEXT_KEYWORDS.into_iter().find(|keyword| haystack.contains(keyword)) {
        request.keywords.push(keyword.to_string());
        request.confidence += KEYWORD_WEIGHT;
    }

    request
}

/// An explicit range ("1-2 ct", "1 to 2 carats") is taken verbatim. A single value ("1.5 ct")
/// becomes a ±10% band so near-misses in dealer stock still match. Carat is the only recognized
/// weight unit.
fn extract_carat_band(haystack: &str) -> Option<(f64, f64)> {
    let range = Regex::new(r"(\d+(?:\.\d+)?)\s*(?:-|to)\s*(\d+(?:\.\d+)?)\s*(?:carats?|cts?)\b").unwrap();
    if let Some(caps) = range.captures(haystack) {
        let min = caps[1].parse::<f64>().ok()?;
        let max = caps[2].parse::<f64>().ok()?;
        if min > 0.0 && max > 0.0 {
            return Some((min, max));
        }
    }
    let single = Regex::new(r"(\d+(?:\.\d+)?)\s*(?:carats?|cts?)\b").unwrap();
    let caps = single.captures(haystack)?;
    let value = caps[1].parse::<f64>().ok()?;
    (value > 0.0).then_some((value * 0.9, value * 1.1))
}

/// A grade letter only counts when whitespace sits on both sides, or whitespace before and a `+`
/// after ("f+"). A bare letter at the very start or end of the message is therefore missed; that
/// matches the behaviour of the pipeline this replaces and keeps "d" inside ordinary words from
/// registering as a color.
fn extract_color(haystack: &str) -> Option<ColorGrade> {
    let re = Regex::new(r"\s([d-m])[\s+]").unwrap();
    let caps = re.captures(haystack)?;
    caps[1].chars().next().and_then(ColorGrade::from_letter)
}

/// Price ceilings arrive as "$12,500", "$5k" or a bare "10k". A trailing `k` multiplies by 1000.
fn extract_price_ceiling(haystack: &str) -> Option<Usd> {
    let dollars = Regex::new(r"\$\s*(\d[\d,]*(?:\.\d+)?)\s*(k?)").unwrap();
    let bare_thousands = Regex::new(r"(\d[\d,]*(?:\.\d+)?)\s*k\b").unwrap();
    let (raw, kilo) = if let Some(caps) = dollars.captures(haystack) {
        (caps[1].to_string(), !caps[2].is_empty())
    } else if let Some(caps) = bare_thousands.captures(haystack) {
        (caps[1].to_string(), true)
    } else {
        return None;
    };
    let mut value = raw.replace(',', "").parse::<f64>().ok()?;
    if kilo {
        value *= 1000.0;
    }
    if value <= 0.0 {
        return None;
    }
    Usd::try_from(value).ok()
}
