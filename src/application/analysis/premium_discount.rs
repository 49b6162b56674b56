use crate::domain::smc::{PremiumDiscountZone, PriceZone, SwingPoint};

const EQUILIBRIUM: f64 = 0.5;
const PREMIUM: f64 = 0.618;
const DISCOUNT: f64 = 0.382;

/// Splits the range of the last `count` swings and classifies `price` in it.
///
/// Returns `None` with fewer than two swings or a flat range; the caller keeps
/// its previous zone in that case.
pub fn compute_premium_discount(
    swings: &[SwingPoint],
    count: usize,
    price: f64,
) -> Option<PremiumDiscountZone> {
    let recent = &swings[swings.len().saturating_sub(count)..];
    if recent.len() < 2 {
        return None;
    }

    let high = recent.iter().map(|s| s.price).fold(f64::MIN, f64::max);
    let low = recent.iter().map(|s| s.price).fold(f64::MAX, f64::min);
    let range = high - low;
    if range <= 0.0 {
        return None;
    }

    let zone = PremiumDiscountZone {
        high,
        low,
        equilibrium: low + EQUILIBRIUM * range,
        premium_threshold: low + PREMIUM * range,
        discount_threshold: low + DISCOUNT * range,
        current_zone: PriceZone::Equilibrium,
    };
    Some(zone.reclassified(price))
}
