//! Enforcement of the market-data contract on fetched candle sequences

use crate::data::{Candle, Timeframe};
use tracing::warn;

/// Clean a collaborator-supplied candle sequence.
///
/// Drops candles that fail [`Candle::validate`] or do not strictly increase
/// in timestamp. When the spacing between two consecutive candles exceeds
/// `max_missing_bars` missing bars, everything before the gap is dropped so
/// the result is the most recent contiguous run. Nothing is interpolated.
pub fn sanitize(candles: Vec<Candle>, timeframe: Timeframe, max_missing_bars: u32) -> Vec<Candle> {
    let max_spacing = timeframe.seconds() * (i64::from(max_missing_bars) + 1);
    let mut clean: Vec<Candle> = Vec::with_capacity(candles.len());

    for candle in candles {
        if let Err(e) = candle.validate() {
            warn!("Dropping candle: {}", e);
            continue;
        }
        if let Some(prev) = clean.last() {
            if candle.timestamp <= prev.timestamp {
                warn!(
                    "Dropping non-increasing candle at {} (previous {})",
                    candle.timestamp, prev.timestamp
                );
                continue;
            }
            let spacing = (candle.timestamp - prev.timestamp).num_seconds();
            if spacing > max_spacing {
                warn!(
                    "Gap of {} bars before {}: dropping {} older candles",
                    spacing / timeframe.seconds() - 1,
                    candle.timestamp,
                    clean.len()
                );
                clean.clear();
            }
        }
        clean.push(candle);
    }

    clean
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn candle_at(hour: i64) -> Candle {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hour);
        Candle::new(100.0, 101.0, 99.0, 100.0, 1.0, ts)
    }

    #[test]
    fn test_keeps_single_missing_bar() {
        let out = sanitize(vec![candle_at(0), candle_at(1), candle_at(3)], Timeframe::H1, 1);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_drops_history_before_large_gap() {
        let out = sanitize(
            vec![candle_at(0), candle_at(1), candle_at(5), candle_at(6)],
            Timeframe::H1,
            1,
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].timestamp, candle_at(5).timestamp);
    }

    #[test]
    fn test_drops_duplicates_and_invalid() {
        let mut bad = candle_at(2);
        bad.volume = -5.0;
        let out = sanitize(
            vec![candle_at(0), candle_at(1), candle_at(1), bad, candle_at(2)],
            Timeframe::H1,
            1,
        );
        assert_eq!(out.len(), 3);
    }
}
