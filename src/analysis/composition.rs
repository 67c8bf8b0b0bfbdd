/// Pollutant aggregation: dominant pollutant and pollution composition.
///
/// Two distinct notions of "worst pollutant" live here and they can
/// disagree:
/// - the *dominant* pollutant has the highest raw observed value;
/// - the *primary driver* has the highest share of the normalized
///   (value / safe limit) pollution score.

use std::collections::BTreeMap;

use crate::model::{PollutantKey, PollutantMap};
use crate::reference::limit_for;

/// Share of the total pollution score per pollutant, in percent.
pub type Composition = BTreeMap<PollutantKey, f64>;

/// Observed values that count as "present": finite and strictly positive.
fn present(pollutants: &PollutantMap) -> impl Iterator<Item = (PollutantKey, f64)> + '_ {
    pollutants
        .iter()
        .map(|(k, v)| (*k, *v))
        .filter(|(_, v)| v.is_finite() && *v > 0.0)
}

/// Returns the pollutant with the highest raw observed value.
///
/// Ties resolve to the first pollutant in table order. Returns `None` when
/// no pollutant has a positive value.
pub fn dominant_pollutant(pollutants: &PollutantMap) -> Option<PollutantKey> {
    let mut best: Option<(PollutantKey, f64)> = None;
    for (key, value) in present(pollutants) {
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((key, value)),
        }
    }
    best.map(|(key, _)| key)
}

/// Computes each present pollutant's percentage of the total normalized
/// pollution score.
///
/// score = observed / safe_limit, share = score / Σscores × 100.
/// Shares sum to 100, or are all 0 when there is no pollutant data.
pub fn composition(pollutants: &PollutantMap) -> Composition {
    let scores: Vec<(PollutantKey, f64)> = present(pollutants)
        .map(|(key, value)| (key, value / limit_for(key).safe_limit))
        .collect();
    let total: f64 = scores.iter().map(|(_, s)| s).sum();

    scores
        .into_iter()
        .map(|(key, score)| {
            let share = if total > 0.0 { score / total * 100.0 } else { 0.0 };
            (key, share)
        })
        .collect()
}

/// The pollutant with the highest composition share, with its share.
///
/// Ties resolve to the first pollutant in table order; `None` when every
/// share is zero.
pub fn primary_driver(composition: &Composition) -> Option<(PollutantKey, f64)> {
    let mut best: Option<(PollutantKey, f64)> = None;
    for (key, share) in composition {
        if *share <= 0.0 {
            continue;
        }
        match best {
            Some((_, best_share)) if *share <= best_share => {}
            _ => best = Some((*key, *share)),
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
