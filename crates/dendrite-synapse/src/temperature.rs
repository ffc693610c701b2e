//! Sampling temperature baselines and precedence.

/// Yes/no answers, fixed label sets, faithful extraction.
pub const DETERMINISTIC: f64 = 0.1;
/// Judgement calls: ranking, sentiment, open analysis.
pub const ANALYTICAL: f64 = 0.3;
/// Rewriting text.
pub const CREATIVE: f64 = 0.7;

/// Per-call value, then the synapse's configured value, then the baseline.
/// An explicit `0.0` is a real value, not "unset".
pub fn resolve(call: Option<f64>, configured: Option<f64>, baseline: f64) -> f64 {
    call.or(configured).unwrap_or(baseline)
}
