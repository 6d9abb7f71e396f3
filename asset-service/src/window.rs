//! Per-feed time-window visibility policy.
//!
//! Each feed carries a freshness lag modeling real-world measurement and
//! settlement delay; data newer than `now - lag` is never exposed. `now` is
//! always an explicit parameter so the policy stays deterministic in tests.

use time::{Duration, OffsetDateTime, Time};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    RealtimeConsumption,
    RealtimeGeneration,
    SystemMarginalPrice,
    MarketClearingPrice,
    DemandForecast,
}

impl FeedKind {
    /// Latest timestamp this feed may expose at `now`, or `None` when the
    /// feed carries no lag.
    pub fn freshness_limit(self, now: OffsetDateTime) -> Option<OffsetDateTime> {
        match self {
            // Grid metering settles two hours behind the wall clock.
            FeedKind::RealtimeConsumption => Some(now - Duration::hours(2)),
            // Generation figures finalize when the day closes: expose up to
            // the last second of the previous day, in `now`'s offset.
            FeedKind::RealtimeGeneration => {
                Some(now.replace_time(Time::MIDNIGHT) - Duration::seconds(1))
            }
            // Market settlement runs four hours behind.
            FeedKind::SystemMarginalPrice => Some(now - Duration::hours(4)),
            // Clearing prices are published day-ahead and forecasts are
            // forward-looking; neither is truncated.
            FeedKind::MarketClearingPrice | FeedKind::DemandForecast => None,
        }
    }
}

/// Result of clamping a requested range against a feed's freshness limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClampedRange {
    /// Inclusive bounds the store may be queried with.
    Window {
        start: OffsetDateTime,
        end: OffsetDateTime,
    },
    /// The caller asked entirely for not-yet-available data. This is valid
    /// output of length zero; the store must not be touched.
    Empty,
}

/// Clamp `[start, end]` so nothing newer than the feed's freshness limit
/// leaks out. Clamping an already-clamped range is a no-op.
pub fn clamp(
    feed: FeedKind,
    start: OffsetDateTime,
    end: OffsetDateTime,
    now: OffsetDateTime,
) -> ClampedRange {
    let Some(limit) = feed.freshness_limit(now) else {
        return ClampedRange::Window { start, end };
    };

    if start > limit {
        return ClampedRange::Empty;
    }

    ClampedRange::Window {
        start,
        end: end.min(limit),
    }
}
