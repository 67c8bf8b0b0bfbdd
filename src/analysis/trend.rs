/// Rolling AQI history and trend statistics.
///
/// The history is bounded twice: entries older than the window (24 h,
/// relative to the newest entry) are dropped, and at most `max_entries`
/// are kept, oldest first. When fewer than `min_entries` real samples
/// exist, deterministic synthetic entries are back-filled so the
/// statistics stay defined. Back-filled entries carry `synthetic = true`
/// and are replaced as soon as real data arrives.
///
/// # Clock injection
/// The tracker never reads the clock. Eviction is relative to the newest
/// entry's timestamp, so tests are deterministic without mocking.

use chrono::{DateTime, Duration, FixedOffset, Offset, Timelike, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// Change between the two latest real samples below which the trend is "stable".
pub const STABLE_CHANGE_THRESHOLD: f64 = 5.0;

/// A rise between the two latest real samples above this raises an alert.
pub const RAPID_CHANGE_THRESHOLD: f64 = 20.0;

/// Back-filled samples deviate from the current AQI by at most this much.
pub const BACKFILL_JITTER: f64 = 10.0;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Bounds for the history window.
#[derive(Debug, Clone)]
pub struct TrendConfig {
    pub window: Duration,
    pub max_entries: usize,
    pub min_entries: usize,
    /// Offset used to compute `hour_of_day` for display.
    pub utc_offset: FixedOffset,
}

impl Default for TrendConfig {
    fn default() -> Self {
        TrendConfig {
            window: Duration::hours(24),
            max_entries: 24,
            min_entries: 6,
            utc_offset: Utc.fix(),
        }
    }
}

// ---------------------------------------------------------------------------
// History types
// ---------------------------------------------------------------------------

/// One AQI sample in the history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub aqi: f64,
    pub hour_of_day: u32,
    /// True for back-filled samples that were never measured.
    pub synthetic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Stable,
    Worsening,
    Improving,
}

impl TrendDirection {
    pub fn label(&self) -> &'static str {
        match self {
            TrendDirection::Stable => "Stable",
            TrendDirection::Worsening => "Worsening",
            TrendDirection::Improving => "Improving",
        }
    }
}

/// Summary statistics over the retained history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendStats {
    pub max: f64,
    pub min: f64,
    pub average: f64,
    /// Hour of day of the first entry reaching `max`.
    pub peak_hour: u32,
    /// `max - min`.
    pub variability: f64,
    pub direction: TrendDirection,
    /// Latest minus previous real sample; `None` with fewer than two.
    pub recent_change: Option<f64>,
    pub description: String,
    pub sample_count: usize,
    pub real_count: usize,
}

/// Trend condition consumed by the alert evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrendSignal {
    /// The latest real sample rose by more than `RAPID_CHANGE_THRESHOLD`.
    RapidDeterioration { change: f64 },
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// Bounded, time-ordered AQI history for the current selection.
#[derive(Debug, Clone, Default)]
pub struct TrendTracker {
    config: TrendConfig,
    entries: Vec<HistoryEntry>,
}

impl TrendTracker {
    pub fn new(mut config: TrendConfig) -> Self {
        config.min_entries = config.min_entries.min(config.max_entries);
        TrendTracker {
            config,
            entries: Vec::new(),
        }
    }

    /// All retained entries, oldest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of measured (non-synthetic) entries.
    pub fn real_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.synthetic).count()
    }

    /// Drops all history, e.g. when the selected location changes.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Records a measured sample, then evicts and back-fills.
    ///
    /// Samples arriving out of order are inserted at their timestamp so the
    /// history stays non-decreasing in time. A sample with the same
    /// timestamp as a recorded one replaces it.
    pub fn append(&mut self, aqi: f64, timestamp: DateTime<Utc>) {
        self.entries.retain(|e| !e.synthetic);

        if let Some(existing) = self.entries.iter_mut().find(|e| e.timestamp == timestamp) {
            existing.aqi = aqi;
        } else {
            let entry = HistoryEntry {
                timestamp,
                aqi,
                hour_of_day: self.hour_of(timestamp),
                synthetic: false,
            };
            let pos = self.entries.partition_point(|e| e.timestamp <= timestamp);
            self.entries.insert(pos, entry);
        }

        self.evict();
        self.backfill(aqi);
    }

    fn hour_of(&self, timestamp: DateTime<Utc>) -> u32 {
        timestamp.with_timezone(&self.config.utc_offset).hour()
    }

    fn evict(&mut self) {
        let Some(newest) = self.entries.last().map(|e| e.timestamp) else {
            return;
        };
        let cutoff = newest - self.config.window;
        self.entries.retain(|e| e.timestamp >= cutoff);

        if self.entries.len() > self.config.max_entries {
            let excess = self.entries.len() - self.config.max_entries;
            self.entries.drain(..excess);
        }
    }

    /// Prepends synthetic samples until `min_entries` is reached.
    ///
    /// Samples are spaced up to one hour apart before the oldest real entry,
    /// squeezed so they never fall outside the window. Values are the
    /// current AQI plus jitter from an RNG seeded by the oldest real sample,
    /// so the same history always back-fills identically.
    fn backfill(&mut self, current_aqi: f64) {
        let needed = self.config.min_entries.saturating_sub(self.entries.len());
        if needed == 0 {
            return;
        }
        let (Some(oldest), Some(newest)) = (self.entries.first(), self.entries.last()) else {
            return;
        };
        let anchor = oldest.timestamp;
        let cutoff = newest.timestamp - self.config.window;
        let available = (anchor - cutoff).num_seconds().max(0);
        let step = Duration::seconds((available / needed as i64).min(3600));

        let seed = (anchor.timestamp() as u64) ^ current_aqi.to_bits();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut filled = Vec::with_capacity(needed + self.entries.len());
        for k in (1..=needed as i32).rev() {
            let timestamp = anchor - step * k;
            let jitter = rng.gen_range(-BACKFILL_JITTER..=BACKFILL_JITTER);
            filled.push(HistoryEntry {
                timestamp,
                aqi: (current_aqi + jitter).max(0.0).round(),
                hour_of_day: self.hour_of(timestamp),
                synthetic: true,
            });
        }
        filled.append(&mut self.entries);
        self.entries = filled;
    }

    /// Latest minus previous real sample.
    pub fn recent_change(&self) -> Option<f64> {
        let mut real = self.entries.iter().rev().filter(|e| !e.synthetic);
        let latest = real.next()?;
        let previous = real.next()?;
        Some(latest.aqi - previous.aqi)
    }

    /// Rapid-deterioration signal for the alert evaluator.
    pub fn signal(&self) -> Option<TrendSignal> {
        self.recent_change()
            .filter(|change| *change > RAPID_CHANGE_THRESHOLD)
            .map(|change| TrendSignal::RapidDeterioration { change })
    }

    /// Statistics over every retained entry. `None` when the history is empty.
    pub fn stats(&self) -> Option<TrendStats> {
        let first = self.entries.first()?;

        let mut max = first.aqi;
        let mut min = first.aqi;
        let mut peak_hour = first.hour_of_day;
        let mut sum = 0.0;
        for entry in &self.entries {
            // Strict comparison keeps the earliest peak.
            if entry.aqi > max {
                max = entry.aqi;
                peak_hour = entry.hour_of_day;
            }
            min = min.min(entry.aqi);
            sum += entry.aqi;
        }

        let recent_change = self.recent_change();
        let (direction, description) = match recent_change {
            None => (
                TrendDirection::Stable,
                "Insufficient data for trend analysis".to_string(),
            ),
            Some(change) if change.abs() < STABLE_CHANGE_THRESHOLD => (
                TrendDirection::Stable,
                "Air quality has remained stable recently".to_string(),
            ),
            Some(change) if change > 0.0 => (
                TrendDirection::Worsening,
                format!("Air quality has worsened by {:.0} points", change.abs()),
            ),
            Some(change) => (
                TrendDirection::Improving,
                format!("Air quality has improved by {:.0} points", change.abs()),
            ),
        };

        Some(TrendStats {
            max,
            min,
            average: sum / self.entries.len() as f64,
            peak_hour,
            variability: max - min,
            direction,
            recent_change,
            description,
            sample_count: self.entries.len(),
            real_count: self.real_count(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
