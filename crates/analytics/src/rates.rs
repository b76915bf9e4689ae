//! Zero-safe ratio helpers. A non-positive denominator yields 0, never NaN
//! or infinity.

/// `numerator / denominator * 100`, or 0 when `denominator <= 0`.
pub fn safe_rate(numerator: f64, denominator: f64) -> f64 {
    finite_or_zero(safe_ratio(numerator, denominator) * 100.0)
}

/// `numerator / denominator`, or 0 when `denominator <= 0`.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator.is_nan() || denominator <= 0.0 {
        return 0.0;
    }
    finite_or_zero(numerator / denominator)
}

/// [`safe_rate`] over integer counts.
pub fn count_rate(numerator: i64, denominator: i64) -> f64 {
    safe_rate(numerator as f64, denominator as f64)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
