use crate::config::DetectionConfig;
use crate::domain::smc::{LiquidityKind, LiquidityZone, SwingPoint};

/// Relative distance between two prices, measured against their midpoint.
pub fn relative_distance(a: f64, b: f64) -> f64 {
    let avg = (a + b) / 2.0;
    if avg == 0.0 {
        return f64::INFINITY;
    }
    (a - b).abs() / avg.abs()
}

/// Clusters of near-equal swing highs and swing lows.
///
/// The last `liquidity_swing_lookback` swings of each kind are compared
/// pairwise; pairs within `liquidity_tolerance` form a zone, and zones of the
/// same kind within tolerance of each other are merged. A high cluster sits at
/// its highest point, a low cluster at its lowest.
pub fn detect_liquidity_zones(swings: &[SwingPoint], config: &DetectionConfig) -> Vec<LiquidityZone> {
    let mut zones = Vec::new();
    for kind in [LiquidityKind::EqualHighs, LiquidityKind::EqualLows] {
        let wants_high = kind == LiquidityKind::EqualHighs;
        let points: Vec<&SwingPoint> = swings.iter().filter(|s| s.is_high() == wants_high).collect();
        let recent = &points[points.len().saturating_sub(config.liquidity_swing_lookback)..];

        for (n, a) in recent.iter().enumerate() {
            for b in &recent[n + 1..] {
                if relative_distance(a.price, b.price) >= config.liquidity_tolerance {
                    continue;
                }
                let candidate = LiquidityZone {
                    kind,
                    price: if wants_high {
                        a.price.max(b.price)
                    } else {
                        a.price.min(b.price)
                    },
                    source_indices: [a.index, b.index],
                    source_times: [a.time, b.time],
                    bias: kind.bias(),
                    swept: false,
                    strength: a.strength.min(b.strength),
                };
                merge_zone(&mut zones, candidate, config.liquidity_tolerance);
            }
        }
    }
    zones
}

/// Folds `candidate` into an existing zone of the same kind within tolerance,
/// or appends it.
fn merge_zone(zones: &mut Vec<LiquidityZone>, candidate: LiquidityZone, tolerance: f64) {
    let existing = zones.iter_mut().find(|z| {
        z.kind == candidate.kind && relative_distance(z.price, candidate.price) < tolerance
    });
    match existing {
        Some(zone) => absorb(zone, &candidate),
        None => zones.push(candidate),
    }
}

/// Widens `zone` to cover `other`'s sources and extreme.
pub fn absorb(zone: &mut LiquidityZone, other: &LiquidityZone) {
    zone.price = match zone.kind {
        LiquidityKind::EqualHighs => zone.price.max(other.price),
        LiquidityKind::EqualLows => zone.price.min(other.price),
    };
    if other.source_times[0] < zone.source_times[0] {
        zone.source_times[0] = other.source_times[0];
        zone.source_indices[0] = other.source_indices[0];
    }
    if other.source_times[1] > zone.source_times[1] {
        zone.source_times[1] = other.source_times[1];
        zone.source_indices[1] = other.source_indices[1];
    }
    zone.strength = zone.strength.max(other.strength);
}
