use crate::application::analysis::liquidity::{absorb, relative_distance};
use crate::config::DetectionConfig;
use crate::domain::market::Candle;
use crate::domain::smc::{
    Bias, Breaker, FairValueGap, LiquiditySweep, LiquidityKind, LiquidityZone, OrderBlock,
};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Origin candle time plus kind. Indices shift as the window slides, times do not.
type EntityKey = (i64, Bias);

/// What changed in the long-lived entities during one pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryChanges {
    pub new_order_blocks: usize,
    pub touches: usize,
    pub newly_mitigated: usize,
    pub new_breakers: usize,
    pub new_fair_value_gaps: usize,
    pub newly_filled: usize,
    pub new_liquidity_zones: usize,
    pub sweeps: Vec<LiquiditySweep>,
}

/// Long-lived structural entities carried across passes.
///
/// Order blocks, fair value gaps and liquidity zones are created once and then
/// only mutated forward: touches and fill never decrease, `mitigated`, `filled`
/// and `swept` never reset. Entities whose origin candle leaves the window are
/// dropped.
#[derive(Debug, Default)]
pub struct StructureRegistry {
    order_blocks: BTreeMap<EntityKey, OrderBlock>,
    breakers: BTreeMap<EntityKey, Breaker>,
    fair_value_gaps: BTreeMap<EntityKey, FairValueGap>,
    liquidity_zones: Vec<LiquidityZone>,
    /// Newest `source_times[1]` of any evicted liquidity zone.
    liquidity_evicted_through: Option<i64>,
    sweeps: Vec<LiquiditySweep>,
    window: HashMap<i64, usize>,
}

impl StructureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-resolves every entity's index against `candles` and prunes those
    /// whose origin is no longer in the window.
    pub fn begin_pass(&mut self, candles: &[Candle]) {
        self.window = candles.iter().enumerate().map(|(i, c)| (c.time, i)).collect();
        let window = &self.window;

        self.order_blocks.retain(|_, block| match window.get(&block.time) {
            Some(&i) => {
                block.index = i;
                true
            }
            None => false,
        });
        self.breakers.retain(|_, breaker| match window.get(&breaker.time) {
            Some(&i) => {
                breaker.index = i;
                true
            }
            None => false,
        });
        self.fair_value_gaps.retain(|_, gap| match window.get(&gap.time) {
            Some(&i) => {
                gap.index = i;
                true
            }
            None => false,
        });
        self.liquidity_zones.retain_mut(|zone| {
            match (
                window.get(&zone.source_times[0]),
                window.get(&zone.source_times[1]),
            ) {
                (Some(&first), Some(&last)) => {
                    zone.source_indices = [first, last];
                    true
                }
                _ => false,
            }
        });
        self.sweeps.retain_mut(|sweep| match window.get(&sweep.time) {
            Some(&i) => {
                sweep.index = i;
                true
            }
            None => false,
        });
    }

    /// Inserts newly detected blocks, then counts the newest candle as a touch
    /// on every block it trades into, and derives breakers from mitigated ones.
    pub fn update_order_blocks(
        &mut self,
        detected: Vec<OrderBlock>,
        candles: &[Candle],
        config: &DetectionConfig,
        changes: &mut RegistryChanges,
    ) {
        for block in detected {
            let key = (block.time, block.kind);
            if self.order_blocks.contains_key(&key)
                || evicted(&self.order_blocks, config.max_order_blocks, key)
            {
                continue;
            }
            let crowded = self.order_blocks.values().any(|existing| {
                existing.kind == block.kind
                    && existing.index.abs_diff(block.index) <= config.order_block_dedup_distance
            });
            if crowded {
                continue;
            }
            debug!(
                "Registry: new {} order block at {} [{:.5}, {:.5}] strength {:.1}",
                block.kind, block.time, block.bottom, block.top, block.strength
            );
            self.order_blocks.insert(key, block);
            changes.new_order_blocks += 1;
        }
        trim_oldest(&mut self.order_blocks, config.max_order_blocks);

        if let Some(newest) = candles.last() {
            let newest_index = candles.len() - 1;
            for block in self.order_blocks.values_mut() {
                // The impulse candle itself overlaps the block; only later candles revisit it.
                if block.index + 1 >= newest_index {
                    continue;
                }
                let was_mitigated = block.mitigated;
                if block.register_touch(newest, config.order_block_mitigation_touches) {
                    changes.touches += 1;
                    if block.mitigated && !was_mitigated {
                        changes.newly_mitigated += 1;
                        debug!(
                            "Registry: {} order block at {} mitigated after {} touches",
                            block.kind, block.time, block.touches
                        );
                    }
                }
            }
        }

        for block in self.order_blocks.values() {
            if !block.mitigated || block.touches < config.breaker_min_touches {
                continue;
            }
            let key = (block.time, block.kind);
            if !self.breakers.contains_key(&key) {
                self.breakers.insert(key, Breaker::from_order_block(block));
                changes.new_breakers += 1;
            }
        }
        trim_oldest(&mut self.breakers, config.max_breakers);
    }

    /// Inserts newly detected gaps and applies every candle after each gap's
    /// third candle that has not been applied yet.
    pub fn update_fair_value_gaps(
        &mut self,
        detected: Vec<FairValueGap>,
        candles: &[Candle],
        config: &DetectionConfig,
        changes: &mut RegistryChanges,
    ) {
        for gap in detected {
            let key = (gap.time, gap.kind);
            if !self.fair_value_gaps.contains_key(&key)
                && !evicted(&self.fair_value_gaps, config.max_fvgs, key)
            {
                self.fair_value_gaps.insert(key, gap);
                changes.new_fair_value_gaps += 1;
            }
        }
        trim_oldest(&mut self.fair_value_gaps, config.max_fvgs);

        for gap in self.fair_value_gaps.values_mut() {
            let first_exposure = gap.index + 2;
            if gap.filled || first_exposure >= candles.len() {
                continue;
            }
            for candle in &candles[first_exposure..] {
                if gap.apply_fill(candle) {
                    changes.newly_filled += 1;
                    debug!(
                        "Registry: {} FVG at {} filled by candle {}",
                        gap.kind, gap.time, candle.time
                    );
                    break;
                }
            }
        }
    }

    /// Upserts detected zones by kind and price tolerance, trims to
    /// `max_liquidity_zones`, then scans candles after each unswept zone's last
    /// source swing for a sweep. Zones no newer than an evicted one are not
    /// re-admitted, so an evicted zone cannot be swept a second time.
    pub fn update_liquidity(
        &mut self,
        detected: Vec<LiquidityZone>,
        candles: &[Candle],
        config: &DetectionConfig,
        changes: &mut RegistryChanges,
    ) {
        for zone in detected {
            if self
                .liquidity_evicted_through
                .is_some_and(|t| zone.source_times[1] <= t)
            {
                continue;
            }
            let existing = self.liquidity_zones.iter_mut().find(|z| {
                z.kind == zone.kind
                    && relative_distance(z.price, zone.price) < config.liquidity_tolerance
            });
            match existing {
                Some(existing) if existing.swept => {}
                Some(existing) => absorb(existing, &zone),
                None => {
                    self.liquidity_zones.push(zone);
                    changes.new_liquidity_zones += 1;
                }
            }
        }

        self.liquidity_zones.sort_by_key(|z| z.source_times[1]);
        let max = config.max_liquidity_zones;
        if self.liquidity_zones.len() > max {
            let evicted: Vec<LiquidityZone> =
                self.liquidity_zones.drain(..self.liquidity_zones.len() - max).collect();
            let newest = evicted.iter().map(|z| z.source_times[1]).max();
            self.liquidity_evicted_through = self.liquidity_evicted_through.max(newest);
        }

        for zone in self.liquidity_zones.iter_mut().filter(|z| !z.swept) {
            let after = zone.source_indices[1] + 1;
            if after >= candles.len() {
                continue;
            }
            let hit = candles[after..]
                .iter()
                .enumerate()
                .find(|(_, c)| zone.is_swept_by(c));
            if let Some((offset, candle)) = hit {
                zone.swept = true;
                let sweep = LiquiditySweep {
                    kind: zone.kind,
                    bias: zone.bias,
                    zone_price: zone.price,
                    index: after + offset,
                    time: candle.time,
                    extreme: match zone.kind {
                        LiquidityKind::EqualHighs => candle.high,
                        LiquidityKind::EqualLows => candle.low,
                    },
                };
                info!(
                    "Liquidity sweep: {:?} at {:.5} taken by candle {} (extreme {:.5})",
                    sweep.kind, sweep.zone_price, sweep.time, sweep.extreme
                );
                self.sweeps.push(sweep.clone());
                changes.sweeps.push(sweep);
            }
        }

        self.sweeps.sort_by_key(|s| s.time);
        if self.sweeps.len() > max {
            self.sweeps.drain(..self.sweeps.len() - max);
        }
    }

    pub fn order_blocks(&self) -> Vec<OrderBlock> {
        self.order_blocks.values().cloned().collect()
    }

    pub fn breakers(&self) -> Vec<Breaker> {
        self.breakers.values().cloned().collect()
    }

    pub fn fair_value_gaps(&self) -> Vec<FairValueGap> {
        self.fair_value_gaps.values().cloned().collect()
    }

    pub fn liquidity_zones(&self) -> Vec<LiquidityZone> {
        self.liquidity_zones.clone()
    }

    pub fn sweeps(&self) -> Vec<LiquiditySweep> {
        self.sweeps.clone()
    }
}

/// True when `map` is full and `key` is older than everything it retains, so
/// inserting it would only evict it again.
fn evicted<V>(map: &BTreeMap<EntityKey, V>, max: usize, key: EntityKey) -> bool {
    map.len() >= max && map.first_key_value().is_some_and(|(oldest, _)| key < *oldest)
}

/// Evicts the oldest entries beyond `max`.
fn trim_oldest<V>(map: &mut BTreeMap<EntityKey, V>, max: usize) {
    while map.len() > max {
        map.pop_first();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::smc::FvgQuality;
    use std::collections::HashSet;

    fn flat(time: i64, price: f64) -> Candle {
        Candle::new(time, price, price + 0.5, price - 0.5, price)
    }

    fn block(index: usize, time: i64) -> OrderBlock {
        OrderBlock {
            kind: Bias::Bullish,
            index,
            top: 100.0,
            bottom: 95.0,
            time,
            strength: 90.0,
            mitigated: false,
            touches: 0,
            last_touch_time: None,
        }
    }

    #[test]
    fn test_same_snapshot_does_not_double_count_touches() {
        let config = DetectionConfig::default();
        let mut candles: Vec<Candle> = (0..10).map(|t| flat(t, 110.0)).collect();
        candles.push(flat(10, 99.0));

        let mut registry = StructureRegistry::new();
        for _ in 0..3 {
            let mut changes = RegistryChanges::default();
            registry.begin_pass(&candles);
            registry.update_order_blocks(vec![block(2, 2)], &candles, &config, &mut changes);
        }

        let blocks = registry.order_blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].touches, 1);
    }

    #[test]
    fn test_mitigation_spawns_one_breaker() {
        let config = DetectionConfig::default();
        let mut registry = StructureRegistry::new();
        let mut candles: Vec<Candle> = (0..10).map(|t| flat(t, 110.0)).collect();

        for t in 10..14 {
            candles.push(flat(t, 98.0));
            let mut changes = RegistryChanges::default();
            registry.begin_pass(&candles);
            registry.update_order_blocks(vec![block(2, 2)], &candles, &config, &mut changes);
        }

        let blocks = registry.order_blocks();
        assert!(blocks[0].mitigated);
        assert_eq!(blocks[0].touches, 4);
        let breakers = registry.breakers();
        assert_eq!(breakers.len(), 1);
        assert_eq!(breakers[0].kind, Bias::Bearish);
    }

    #[test]
    fn test_entities_pruned_when_origin_leaves_window() {
        let config = DetectionConfig::default();
        let candles: Vec<Candle> = (0..10).map(|t| flat(t, 110.0)).collect();
        let mut registry = StructureRegistry::new();
        let mut changes = RegistryChanges::default();
        registry.begin_pass(&candles);
        registry.update_order_blocks(vec![block(2, 2)], &candles, &config, &mut changes);
        assert_eq!(registry.order_blocks().len(), 1);

        registry.begin_pass(&candles[3..]);
        assert!(registry.order_blocks().is_empty());

        // Survivors are re-indexed against the shifted window
        registry.begin_pass(&candles);
        registry.update_order_blocks(vec![block(5, 5)], &candles, &config, &mut changes);
        registry.begin_pass(&candles[3..]);
        assert_eq!(registry.order_blocks()[0].index, 2);
    }

    fn zone(kind: LiquidityKind, price: f64, first: usize) -> LiquidityZone {
        LiquidityZone {
            kind,
            price,
            source_indices: [first, first + 1],
            source_times: [first as i64, first as i64 + 1],
            bias: kind.bias(),
            swept: false,
            strength: 5,
        }
    }

    #[test]
    fn test_evicted_liquidity_zone_is_not_swept_again() {
        let config = DetectionConfig::default();
        let candles: Vec<Candle> = (0..20).map(|t| flat(t, 100.0)).collect();

        // Oldest zone is sweepable but evicted; equal highs at 100.2 are swept at t=4
        let mut detected = vec![
            zone(LiquidityKind::EqualLows, 99.8, 0),
            zone(LiquidityKind::EqualHighs, 100.2, 2),
        ];
        detected.extend((3..12).map(|i| zone(LiquidityKind::EqualLows, 60.0 + i as f64 * 3.0, i)));
        assert!(detected.len() > config.max_liquidity_zones);

        let mut registry = StructureRegistry::new();
        let mut reported = Vec::new();
        for pass in 0..3 {
            let mut changes = RegistryChanges::default();
            registry.begin_pass(&candles);
            registry.update_liquidity(detected.clone(), &candles, &config, &mut changes);
            if pass > 0 {
                assert_eq!(changes.new_liquidity_zones, 0);
            }
            reported.extend(changes.sweeps);
        }

        let sweeps = registry.sweeps();
        assert_eq!(sweeps.len(), 1);
        assert_eq!(reported.len(), 1);
        assert_eq!((sweeps[0].kind, sweeps[0].time), (LiquidityKind::EqualHighs, 4));

        let unique: HashSet<(i64, u64)> = sweeps
            .iter()
            .map(|s| (s.time, s.zone_price.to_bits()))
            .collect();
        assert_eq!(unique.len(), sweeps.len());

        let zones = registry.liquidity_zones();
        assert_eq!(zones.len(), config.max_liquidity_zones);
        assert!(zones.iter().all(|z| z.price != 99.8));
    }

    #[test]
    fn test_evicted_order_block_is_not_reinserted() {
        let config = DetectionConfig {
            max_order_blocks: 2,
            ..DetectionConfig::default()
        };
        let candles: Vec<Candle> = (0..20).map(|t| flat(t, 110.0)).collect();
        let detected = vec![block(2, 2), block(6, 6), block(10, 10)];

        let mut registry = StructureRegistry::new();
        let mut changes = RegistryChanges::default();
        registry.begin_pass(&candles);
        registry.update_order_blocks(detected.clone(), &candles, &config, &mut changes);
        assert_eq!(changes.new_order_blocks, 3);

        for _ in 0..2 {
            let mut changes = RegistryChanges::default();
            registry.begin_pass(&candles);
            registry.update_order_blocks(detected.clone(), &candles, &config, &mut changes);
            assert_eq!(changes.new_order_blocks, 0);
        }
        let times: Vec<i64> = registry.order_blocks().iter().map(|b| b.time).collect();
        assert_eq!(times, vec![6, 10]);
    }

    #[test]
    fn test_gap_backfills_history_once() {
        let config = DetectionConfig::default();
        let mut candles: Vec<Candle> = (0..5).map(|t| flat(t, 100.0)).collect();
        candles.push(flat(5, 102.0)); // dips to 101.5
        let gap = FairValueGap {
            kind: Bias::Bullish,
            index: 1,
            top: 103.0,
            bottom: 101.0,
            time: 1,
            filled: false,
            fill_percentage: 0.0,
            quality: FvgQuality::High,
            last_fill_time: None,
        };

        let mut registry = StructureRegistry::new();
        let mut changes = RegistryChanges::default();
        registry.begin_pass(&candles);
        registry.update_fair_value_gaps(vec![gap.clone()], &candles, &config, &mut changes);
        // Candles 3 and 4 trade at 100.5 at most and never reach the gap
        let stored = &registry.fair_value_gaps()[0];
        assert!((stored.fill_percentage - 50.0).abs() < 1e-9);
        assert!(!stored.filled);
        assert_eq!(stored.last_fill_time, Some(5));
    }
}
