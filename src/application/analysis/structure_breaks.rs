use super::swings::alternating_swings;
use crate::domain::smc::{Bias, ChangeOfCharacter, StructuralBreak, SwingKind, SwingPoint};

/// Breaks of structure: each swing compared with the previous swing of the same
/// kind. A high above the prior high by more than `min_break_pct` is bullish, a
/// low below the prior low by the same margin is bearish. Keeps the last
/// `max_events`, oldest first.
pub fn detect_structure_breaks(
    swings: &[SwingPoint],
    min_break_pct: f64,
    max_events: usize,
) -> Vec<StructuralBreak> {
    let mut last_high: Option<&SwingPoint> = None;
    let mut last_low: Option<&SwingPoint> = None;
    let mut breaks = Vec::new();

    for swing in swings {
        match swing.kind {
            SwingKind::High => {
                if let Some(prev) = last_high
                    && swing.price > prev.price * (1.0 + min_break_pct)
                {
                    breaks.push(StructuralBreak {
                        kind: Bias::Bullish,
                        index: swing.index,
                        break_price: prev.price,
                        new_price: swing.price,
                        time: swing.time,
                    });
                }
                last_high = Some(swing);
            }
            SwingKind::Low => {
                if let Some(prev) = last_low
                    && swing.price < prev.price * (1.0 - min_break_pct)
                {
                    breaks.push(StructuralBreak {
                        kind: Bias::Bearish,
                        index: swing.index,
                        break_price: prev.price,
                        new_price: swing.price,
                        time: swing.time,
                    });
                }
                last_low = Some(swing);
            }
        }
    }

    keep_last(breaks, max_events)
}

/// Changes of character over the alternating swing sequence.
///
/// Bullish: low, high, lower low, then a high above the high two points back.
/// Bearish: high, low, higher high, then a low below the low two points back.
pub fn detect_changes_of_character(swings: &[SwingPoint], max_events: usize) -> Vec<ChangeOfCharacter> {
    let zigzag = alternating_swings(swings);
    let mut events = Vec::new();

    for w in zigzag.windows(4) {
        let (first, pivot, third, last) = (&w[0], &w[1], &w[2], &w[3]);
        let event = match last.kind {
            SwingKind::High if third.price < first.price && last.price > pivot.price => {
                Some(Bias::Bullish)
            }
            SwingKind::Low if third.price > first.price && last.price < pivot.price => {
                Some(Bias::Bearish)
            }
            _ => None,
        };

        if let Some(kind) = event {
            events.push(ChangeOfCharacter {
                kind,
                index: last.index,
                reversal_price: pivot.price,
                new_price: last.price,
                time: last.time,
            });
        }
    }

    keep_last(events, max_events)
}

fn keep_last<T>(mut events: Vec<T>, max: usize) -> Vec<T> {
    if events.len() > max {
        events.drain(..events.len() - max);
    }
    events
}
