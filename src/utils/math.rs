// src/utils/math.rs

/// Rounds to 2 decimal places, the precision every stored rate uses.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `numerator / denominator * 100`, clamped to [0, 100] and rounded.
/// A zero (or negative) denominator yields 0.
pub fn percentage(numerator: i64, denominator: i64) -> f64 {
    round2(raw_percentage(numerator, denominator))
}

/// As [`percentage`] but unrounded, for values that feed a further average.
pub fn raw_percentage(numerator: i64, denominator: i64) -> f64 {
    if denominator <= 0 {
        return 0.0;
    }
    (numerator as f64 / denominator as f64 * 100.0).clamp(0.0, 100.0)
}

/// Arithmetic mean of percentages, rounded once. Empty input yields 0.
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0_f64, 0_u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return 0.0;
    }
    round2((sum / f64::from(count)).clamp(0.0, 100.0))
}
